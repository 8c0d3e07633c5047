// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Wrapped client calls end to end, with recorded spans.

use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use spanwright::config::{ClientFamily, EnrichmentConfig, SharedConfig};
use spanwright::enrich::SpanEnricher;
use spanwright::instrument::{InstallOutcome, InstrumentableClient, Installer};
use spanwright::resolve::{CallContextResolver, StaticFrames, StaticRegistry};
use spanwright::telemetry::{attributes, CallOutcome, RecordedSpan, RecordingTracer, SpanHandle};
use spanwright::types::{AttributeValue, CallContext, StackFrame};

#[derive(Debug, Default)]
struct PgConnection {
    executed: RefCell<Vec<String>>,
}

impl PgConnection {
    fn exec(&self, sql: &str) -> Result<usize, String> {
        if sql.is_empty() {
            return Err("empty query".to_string());
        }
        self.executed.borrow_mut().push(sql.to_string());
        Ok(self.executed.borrow().len())
    }

    fn close(&self) -> bool {
        true
    }
}

impl InstrumentableClient for PgConnection {
    const FAMILY: ClientFamily = ClientFamily::Postgres;

    fn operations() -> &'static [&'static str] {
        &["exec", "query", "close"]
    }
}

#[derive(Debug, Default)]
struct RedisClient {
    commands: Vec<String>,
}

impl RedisClient {
    fn pipelined<F: FnOnce(&mut Vec<String>)>(&mut self, build: F) -> usize {
        build(&mut self.commands);
        self.commands.len()
    }
}

impl InstrumentableClient for RedisClient {
    const FAMILY: ClientFamily = ClientFamily::Redis;

    fn operations() -> &'static [&'static str] {
        &["call", "pipelined"]
    }
}

fn checkout_frames() -> Vec<StackFrame> {
    vec![
        StackFrame::new("/home/ci/.cargo/registry/src/index/pg-0.1/src/conn.rs", "Conn#exec"),
        StackFrame::new("/myapp/app/models/checkout.rb", "Checkout#complete").with_line(88),
        StackFrame::new("/myapp/app/controllers/checkouts_controller.rb", "CheckoutsController#create").with_line(14),
    ]
}

struct Harness {
    installer: Installer,
    tracer: RecordingTracer,
    config: Arc<SharedConfig>,
}

fn harness(frames: Vec<StackFrame>, config: EnrichmentConfig) -> Harness {
    let tracer = RecordingTracer::new();
    let config = Arc::new(SharedConfig::new(config.with_app_root("/myapp")));
    let resolver = CallContextResolver::new(
        Arc::new(StaticFrames::new(frames)),
        Arc::new(StaticRegistry::new(["Checkout", "User"])),
    );
    let enricher = SpanEnricher::new(resolver, Arc::clone(&config));
    let installer = Installer::with_tracer(enricher, Arc::new(tracer.clone()));
    Harness {
        installer,
        tracer,
        config,
    }
}

fn only_span(tracer: &RecordingTracer) -> RecordedSpan {
    let spans = tracer.spans();
    assert_eq!(spans.len(), 1, "expected exactly one span");
    spans.into_iter().next().unwrap()
}

#[test]
fn wrapped_call_sets_db_attributes_and_forwards_result() {
    let h = harness(checkout_frames(), EnrichmentConfig::default());
    h.installer.install::<PgConnection>().unwrap();
    let client = h.installer.wrap(PgConnection::default());

    let sql = "SELECT * FROM checkouts";
    let result = client.call("exec", Some(sql), |c| c.exec(sql));
    assert_eq!(result, Ok(1));

    let span = only_span(&h.tracer);
    assert_eq!(span.name(), "EXEC postgresql");
    assert_eq!(span.attribute(attributes::DB_SYSTEM), Some("postgresql".into()));
    assert_eq!(span.attribute(attributes::DB_OPERATION), Some("EXEC".into()));
    assert_eq!(span.attribute(attributes::DB_STATEMENT), Some(sql.into()));
}

#[test]
fn errors_pass_through_unchanged() {
    let h = harness(checkout_frames(), EnrichmentConfig::default());
    h.installer.install::<PgConnection>().unwrap();
    let client = h.installer.wrap(PgConnection::default());

    let result = client.call("exec", Some(""), |c| c.exec(""));
    assert_eq!(result, Err("empty query".to_string()));
    assert_eq!(h.tracer.len(), 1);
}

#[test]
fn fast_call_attaches_no_timing_or_source() {
    let h = harness(checkout_frames(), EnrichmentConfig::default());
    h.installer.install::<PgConnection>().unwrap();
    let client = h.installer.wrap(PgConnection::default());

    client.call("exec", None, |c| c.exec("SELECT 1")).unwrap();

    let span = only_span(&h.tracer);
    assert!(!span.has_attribute(attributes::DB_QUERY_DURATION_MS));
    assert!(!span.has_attribute(attributes::DB_QUERY_SLOW_THRESHOLD_MS));
    assert!(!span.has_attribute(attributes::CODE_FILEPATH));
    assert!(!span.has_attribute(attributes::CODE_MODEL));
}

#[test]
fn slow_call_attaches_timing_source_and_model() {
    let h = harness(
        checkout_frames(),
        EnrichmentConfig::default().with_threshold(ClientFamily::Postgres, 20.0),
    );
    h.installer.install::<PgConnection>().unwrap();
    let client = h.installer.wrap(PgConnection::default());

    client.call("exec", None, |c| {
        std::thread::sleep(Duration::from_millis(25));
        c.exec("UPDATE checkouts SET state = 'paid'")
    })
    .unwrap();

    let span = only_span(&h.tracer);
    let duration = span
        .attribute(attributes::DB_QUERY_DURATION_MS)
        .and_then(|v| v.as_f64())
        .unwrap();
    assert!(duration >= 20.0, "duration {duration}");
    assert_eq!(
        span.attribute(attributes::DB_QUERY_SLOW_THRESHOLD_MS),
        Some(AttributeValue::Float(20.0))
    );
    assert_eq!(span.attribute(attributes::CODE_FILEPATH), Some("app/models/checkout.rb".into()));
    assert_eq!(span.attribute(attributes::CODE_LINENO), Some(AttributeValue::Int(88)));
    assert_eq!(span.attribute(attributes::CODE_MODEL), Some("Checkout".into()));
    assert_eq!(span.attribute(attributes::CODE_MODEL_METHOD), Some("complete".into()));
}

#[test]
fn threshold_scenarios_with_exact_durations() {
    let h = harness(checkout_frames(), EnrichmentConfig::default());
    let enricher = h.installer.enricher();
    let captured = enricher.capture();

    let mut fast = RecordedSpan::new("EXEC postgresql");
    let outcome = enricher.enrich(ClientFamily::Postgres, &mut fast, &captured, Duration::from_millis(50));
    assert_eq!(outcome, CallOutcome::BelowThreshold);
    assert!(!fast.has_attribute(attributes::DB_QUERY_DURATION_MS));

    let mut slow = RecordedSpan::new("EXEC postgresql");
    let outcome = enricher.enrich(ClientFamily::Postgres, &mut slow, &captured, Duration::from_millis(250));
    assert_eq!(outcome, CallOutcome::Enriched);
    assert_eq!(slow.attribute(attributes::DB_QUERY_DURATION_MS), Some(AttributeValue::Float(250.0)));
    assert_eq!(
        slow.attribute(attributes::DB_QUERY_SLOW_THRESHOLD_MS),
        Some(AttributeValue::Float(200.0))
    );
    assert_eq!(slow.attribute(attributes::CODE_FILEPATH), Some("app/models/checkout.rb".into()));
    assert_eq!(slow.attribute(attributes::CODE_LINENO), Some(AttributeValue::Int(88)));
}

#[test]
fn nested_call_on_same_thread_is_enriched_once() {
    let h = harness(checkout_frames(), EnrichmentConfig::default());
    h.installer.install::<PgConnection>().unwrap();
    let client = h.installer.wrap(PgConnection::default());

    let inner = client.call("query", None, |_| client.call("exec", None, |c| c.exec("SELECT 1")));
    assert_eq!(inner, Ok(1));

    let span = only_span(&h.tracer);
    assert_eq!(span.attribute(attributes::DB_OPERATION), Some("QUERY".into()));

    // The flag is cleared once the outer call returns
    client.call("exec", None, |c| c.exec("SELECT 2")).unwrap();
    assert_eq!(h.tracer.len(), 2);
}

#[test]
fn panicking_operation_clears_the_guard() {
    let h = harness(checkout_frames(), EnrichmentConfig::default());
    h.installer.install::<PgConnection>().unwrap();
    let client = h.installer.wrap(PgConnection::default());

    let result = catch_unwind(AssertUnwindSafe(|| {
        client.call("exec", None, |_| -> usize { panic!("connection reset") })
    }));
    assert!(result.is_err());

    client.call("exec", None, |c| c.exec("SELECT 1")).unwrap();
    assert_eq!(h.tracer.len(), 2);
}

#[test]
fn uninstalled_operations_and_types_pass_through() {
    let h = harness(checkout_frames(), EnrichmentConfig::default());
    let before_install = h.installer.wrap(PgConnection::default());
    before_install.call("exec", None, |c| c.exec("SELECT 1")).unwrap();
    assert!(h.tracer.is_empty());

    h.installer.install::<PgConnection>().unwrap();
    let client = h.installer.wrap(PgConnection::default());
    assert!(client.call("close", None, |c| c.close()));
    assert!(h.tracer.is_empty());
}

#[test]
fn install_twice_is_detected() {
    let h = harness(checkout_frames(), EnrichmentConfig::default());
    assert!(matches!(
        h.installer.install::<PgConnection>().unwrap(),
        InstallOutcome::Installed(_)
    ));
    assert!(matches!(
        h.installer.install::<PgConnection>().unwrap(),
        InstallOutcome::AlreadyInstalled(_)
    ));

    let client = h.installer.wrap(PgConnection::default());
    client.call("exec", None, |c| c.exec("SELECT 1")).unwrap();
    assert_eq!(h.tracer.len(), 1);
}

#[test]
fn completion_callbacks_are_forwarded() {
    let h = harness(
        checkout_frames(),
        EnrichmentConfig::default().with_enabled(ClientFamily::Redis, true),
    );
    h.installer.install::<RedisClient>().unwrap();
    let mut client = h.installer.wrap(RedisClient::default());

    let queued = client.call_mut("pipelined", None, |c| {
        c.pipelined(|pipe| {
            pipe.push("INCR hits".to_string());
            pipe.push("EXPIRE hits 60".to_string());
        })
    });
    assert_eq!(queued, 2);
    assert_eq!(client.inner().commands.len(), 2);

    // Redis defaults to a 0 ms threshold, so every resolved call is enriched
    let span = only_span(&h.tracer);
    assert_eq!(span.name(), "PIPELINED redis");
    assert!(span.has_attribute(attributes::DB_QUERY_DURATION_MS));
    assert_eq!(
        span.attribute(attributes::DB_QUERY_SLOW_THRESHOLD_MS),
        Some(AttributeValue::Float(0.0))
    );
}

#[test]
fn formatter_renames_regardless_of_threshold() {
    let config = EnrichmentConfig::default()
        .with_span_name_formatter(|name: &str, ctx: &CallContext| {
            Ok(format!("{}.{} {}", ctx.model_name(), ctx.method_name().unwrap_or("?"), name))
        });
    let h = harness(checkout_frames(), config);
    h.installer.install::<PgConnection>().unwrap();
    let client = h.installer.wrap(PgConnection::default());

    client.call("exec", None, |c| c.exec("SELECT 1")).unwrap();

    let span = only_span(&h.tracer);
    assert_eq!(span.name(), "Checkout.complete EXEC postgresql");
    assert!(!span.has_attribute(attributes::DB_QUERY_DURATION_MS));
}

#[test]
fn formatter_error_keeps_name_and_result() {
    let config = EnrichmentConfig::default()
        .with_span_name_formatter(|_: &str, _: &CallContext| Err(anyhow::anyhow!("template missing")));
    let h = harness(checkout_frames(), config);
    h.installer.install::<PgConnection>().unwrap();
    let client = h.installer.wrap(PgConnection::default());

    let result = client.call("exec", None, |c| c.exec("SELECT 1"));
    assert_eq!(result, Ok(1));
    assert_eq!(only_span(&h.tracer).name(), "EXEC postgresql");
}

#[test]
fn formatter_not_called_without_model() {
    let config = EnrichmentConfig::default()
        .with_span_name_formatter(|_: &str, _: &CallContext| Ok("renamed".to_string()));
    let frames = vec![StackFrame::new("/myapp/app/jobs/cleanup_job.rb", "perform").with_line(3)];
    let h = harness(frames, config);
    h.installer.install::<PgConnection>().unwrap();
    let client = h.installer.wrap(PgConnection::default());

    client.call("exec", None, |c| c.exec("DELETE FROM sessions")).unwrap();
    assert_eq!(only_span(&h.tracer).name(), "EXEC postgresql");
}

#[test]
fn disabling_a_family_at_runtime_stops_wrapping() {
    let h = harness(checkout_frames(), EnrichmentConfig::default());
    h.installer.install::<PgConnection>().unwrap();
    let client = h.installer.wrap(PgConnection::default());

    h.config
        .update(|config| config.with_enabled(ClientFamily::Postgres, false));
    assert_eq!(client.call("exec", None, |c| c.exec("SELECT 1")), Ok(1));
    assert!(h.tracer.is_empty());
}

#[test]
fn threads_are_guarded_independently() {
    let h = harness(checkout_frames(), EnrichmentConfig::default());
    h.installer.install::<PgConnection>().unwrap();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let client = h.installer.wrap(PgConnection::default());
                client.call("exec", None, |c| c.exec("SELECT 1")).unwrap();
            });
        }
    });
    assert_eq!(h.tracer.len(), 4);
}
