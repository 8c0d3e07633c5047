// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Resolution against the real stack of this test binary.
//!
//! Skipped when the binary carries no usable debug info.

use std::sync::Arc;

use spanwright::config::{EnrichmentConfig, ResolverSettings, SharedConfig};
use spanwright::enrich::SpanEnricher;
use spanwright::resolve::{BacktraceFrames, CallContextResolver, EmptyRegistry, FrameSource};
use spanwright::types::AttributionKind;

const THIS_FILE: &str = "tests/live_backtrace.rs";

fn live_resolver() -> Option<CallContextResolver> {
    let frames = BacktraceFrames::new();
    if !frames.is_supported() {
        eprintln!("stack introspection unavailable, skipping");
        return None;
    }
    Some(CallContextResolver::new(Arc::new(frames), Arc::new(EmptyRegistry)))
}

fn settings() -> ResolverSettings {
    ResolverSettings::new(env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn namespace_context_names_calling_test() {
    let Some(resolver) = live_resolver() else {
        return;
    };

    let context = resolver.resolve_namespace_context(&settings()).unwrap();
    assert_eq!(context.attribution_kind, AttributionKind::PathFallback);
    assert_eq!(context.class_name, "LiveBacktrace");
    assert_eq!(context.method_name.as_deref(), Some("namespace_context_names_calling_test"));
    assert_eq!(context.filepath.as_deref(), Some(THIS_FILE));
    assert!(context.line.is_some());
}

#[test]
fn source_location_points_into_this_file() {
    let Some(resolver) = live_resolver() else {
        return;
    };

    let location = resolver.source_location(&settings()).unwrap();
    assert_eq!(location.filepath, THIS_FILE);
    assert!(location.line.is_some());

    let (source, model) = resolver.resolve_call_site(&settings());
    assert_eq!(source.map(|s| s.filepath).as_deref(), Some(THIS_FILE));
    assert!(model.is_none());
}

#[test]
fn enricher_capture_sees_the_caller() {
    let Some(resolver) = live_resolver() else {
        return;
    };
    let config = EnrichmentConfig::default().with_app_root(env!("CARGO_MANIFEST_DIR"));
    let enricher = SpanEnricher::new(resolver, Arc::new(SharedConfig::new(config)));

    let captured = enricher.capture();
    assert_eq!(captured.source.map(|s| s.filepath).as_deref(), Some(THIS_FILE));
    assert!(captured.model.is_none());
}

#[test]
fn outside_app_root_resolves_nothing() {
    let Some(resolver) = live_resolver() else {
        return;
    };

    let elsewhere = ResolverSettings::new("/nonexistent/app");
    assert!(resolver.resolve_namespace_context(&elsewhere).is_none());
    assert!(resolver.source_location(&elsewhere).is_none());
}
