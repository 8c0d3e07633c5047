// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Thread-local re-entrancy guard.
//!
//! A wrapped client operation may call other wrapped operations of the same
//! family (a pipelined redis call issuing `call`, a `prepare` running `query`).
//! Only the outermost call is enriched.

use std::cell::RefCell;
use std::collections::HashSet;

use crate::config::ClientFamily;

thread_local! {
    static ACTIVE: RefCell<HashSet<ClientFamily>> = RefCell::new(HashSet::new());
}

/// Marks `family` as active on this thread until dropped.
#[derive(Debug)]
#[must_use = "the guard clears the flag when dropped"]
pub struct ReentrancyGuard {
    family: ClientFamily,
}

impl ReentrancyGuard {
    /// Set the flag for `family`, or return `None` if it is already set on
    /// this thread.
    pub fn enter(family: ClientFamily) -> Option<Self> {
        let inserted = ACTIVE.with(|active| active.borrow_mut().insert(family));
        inserted.then_some(Self { family })
    }

    /// Whether a wrapped call of `family` is in progress on this thread.
    pub fn is_active(family: ClientFamily) -> bool {
        ACTIVE.with(|active| active.borrow().contains(&family))
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        // Runs on unwind too; a panicking client must not leave the flag set.
        let _ = ACTIVE.try_with(|active| active.borrow_mut().remove(&self.family));
    }
}
