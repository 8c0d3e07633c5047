// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Candidate operations per client family.

use std::str::FromStr;

use crate::config::ClientFamily;
use crate::error::InstallError;

/// Operations of a client family that may be wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterSpec {
    pub family: ClientFamily,
    pub operations: &'static [&'static str],
}

pub const POSTGRES: AdapterSpec = AdapterSpec {
    family: ClientFamily::Postgres,
    operations: &["exec", "exec_params", "exec_prepared", "query", "prepare"],
};

pub const MYSQL: AdapterSpec = AdapterSpec {
    family: ClientFamily::Mysql,
    operations: &["query", "prepare"],
};

pub const REDIS: AdapterSpec = AdapterSpec {
    family: ClientFamily::Redis,
    operations: &["call", "pipelined", "multi"],
};

pub const CLICKHOUSE: AdapterSpec = AdapterSpec {
    family: ClientFamily::Clickhouse,
    operations: &["query", "select", "insert", "execute", "command"],
};

/// Every adapter, in [`ClientFamily::ALL`] order.
pub const ALL: &[AdapterSpec] = &[POSTGRES, MYSQL, REDIS, CLICKHOUSE];

impl AdapterSpec {
    /// The adapter for `family`.
    pub fn for_family(family: ClientFamily) -> &'static AdapterSpec {
        match family {
            ClientFamily::Postgres => &POSTGRES,
            ClientFamily::Mysql => &MYSQL,
            ClientFamily::Redis => &REDIS,
            ClientFamily::Clickhouse => &CLICKHOUSE,
        }
    }

    /// The adapter for a family name or alias such as `pg` or `mysql2`.
    pub fn by_name(name: &str) -> Result<&'static AdapterSpec, InstallError> {
        ClientFamily::from_str(name)
            .map(Self::for_family)
            .map_err(|_| InstallError::UnknownFamily(name.to_string()))
    }

    pub fn is_candidate(&self, operation: &str) -> bool {
        self.operations.contains(&operation)
    }

    /// Candidate operations the client actually supports, in adapter order.
    pub fn intersect(&self, supported: &[&'static str]) -> Vec<&'static str> {
        self.operations
            .iter()
            .copied()
            .filter(|op| supported.contains(op))
            .collect()
    }
}
