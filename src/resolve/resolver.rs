// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Call-context resolution.
//!
//! Two walks over the same frames with different strictness:
//!
//! - [`CallContextResolver::resolve_model_context`] attributes a database call
//!   to a domain model and only trusts names the [`DomainRegistry`] confirms.
//! - [`CallContextResolver::resolve_namespace_context`] records which
//!   application code opened a span and accepts unconfirmed guesses.

use std::ops::ControlFlow;
use std::sync::Arc;

use tracing::debug;

use crate::config::ResolverSettings;
use crate::types::{AttributionKind, CallContext, SourceLocation, StackFrame};

use super::frames::{BacktraceFrames, FrameFilter, FrameSource};
use super::label::{parse_label, strip_wrapper_marker};
use super::path::infer_class_from_path;
use super::registry::{DomainRegistry, EmptyRegistry};

/// Resolves call contexts from a frame source and a domain registry.
#[derive(Clone)]
pub struct CallContextResolver {
    frames: Arc<dyn FrameSource>,
    registry: Arc<dyn DomainRegistry>,
}

impl std::fmt::Debug for CallContextResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallContextResolver")
            .field("supported", &self.frames.is_supported())
            .finish_non_exhaustive()
    }
}

impl Default for CallContextResolver {
    fn default() -> Self {
        Self::new(Arc::new(BacktraceFrames::new()), Arc::new(EmptyRegistry))
    }
}

impl CallContextResolver {
    pub fn new(frames: Arc<dyn FrameSource>, registry: Arc<dyn DomainRegistry>) -> Self {
        Self { frames, registry }
    }

    /// Resolver over live frames of the calling thread.
    pub fn live(registry: Arc<dyn DomainRegistry>) -> Self {
        Self::new(Arc::new(BacktraceFrames::new()), registry)
    }

    /// Replace the frame source.
    pub fn with_frames(mut self, frames: Arc<dyn FrameSource>) -> Self {
        self.frames = frames;
        self
    }

    /// Replace the domain registry.
    pub fn with_registry(mut self, registry: Arc<dyn DomainRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn frames(&self) -> &Arc<dyn FrameSource> {
        &self.frames
    }

    pub fn registry(&self) -> &Arc<dyn DomainRegistry> {
        &self.registry
    }

    /// Attribute the current call to a confirmed domain model.
    ///
    /// Vendor frames are skipped, but labels are inspected whether or not the
    /// frame is inside the application root. The first confirmed frame in
    /// enumeration order wins.
    pub fn resolve_model_context(&self, settings: &ResolverSettings) -> Option<CallContext> {
        if !self.frames.is_supported() {
            debug!("Stack introspection unavailable, skipping model context");
            return None;
        }

        let filter = FrameFilter::new(settings);
        let mut walk = ModelWalk::default();
        filter.walk_considered(self.frames.as_ref(), |frame, path| {
            walk.visit(&filter, self.registry.as_ref(), frame, path)
        });

        let model = walk.model;
        if model.is_none() {
            debug!(app_root = %settings.app_root, "No confirmed model context");
        }
        model
    }

    /// Describe the first application frame of the current call.
    ///
    /// No registry confirmation: labels that do not parse fall back to a
    /// class inferred from the file name and the bare label as the method.
    pub fn resolve_namespace_context(&self, settings: &ResolverSettings) -> Option<CallContext> {
        if !self.frames.is_supported() {
            debug!("Stack introspection unavailable, skipping namespace context");
            return None;
        }

        let filter = FrameFilter::new(settings);
        let frame = filter.first_candidate(self.frames.as_ref())?;
        let path = frame.path.as_deref()?;
        let label = frame.label.as_deref().unwrap_or("");

        let (attribution_kind, class_name, method_name) = match parse_label(label) {
            Some(parsed) => (AttributionKind::Label, parsed.class_name, parsed.method_name),
            None => {
                let method = strip_wrapper_marker(label.trim());
                (
                    AttributionKind::PathFallback,
                    infer_class_from_path(path),
                    (!method.is_empty()).then(|| method.to_string()),
                )
            }
        };

        if class_name.is_empty() {
            return None;
        }

        Some(CallContext {
            attribution_kind,
            class_name,
            method_name,
            filepath: Some(filter.relative_path(path)),
            line: frame.line,
        })
    }

    /// Root-relative location of the first application frame.
    pub fn source_location(&self, settings: &ResolverSettings) -> Option<SourceLocation> {
        if !self.frames.is_supported() {
            return None;
        }

        let filter = FrameFilter::new(settings);
        let frame = filter.first_candidate(self.frames.as_ref())?;
        let path = frame.path.as_deref()?;
        Some(SourceLocation {
            filepath: filter.relative_path(path),
            line: frame.line,
        })
    }

    /// Source location and model context from a single walk.
    ///
    /// Same results as [`Self::source_location`] and
    /// [`Self::resolve_model_context`], but the frames are produced once.
    pub fn resolve_call_site(
        &self,
        settings: &ResolverSettings,
    ) -> (Option<SourceLocation>, Option<CallContext>) {
        if !self.frames.is_supported() {
            debug!("Stack introspection unavailable, skipping call site");
            return (None, None);
        }

        let filter = FrameFilter::new(settings);
        let mut walk = ModelWalk::default();
        let mut model_done = false;
        let mut source = None;

        filter.walk_considered(self.frames.as_ref(), |frame, path| {
            if source.is_none() && filter.in_app_root(path) {
                source = Some(SourceLocation {
                    filepath: filter.relative_path(path),
                    line: frame.line,
                });
            }
            if !model_done {
                model_done = walk
                    .visit(&filter, self.registry.as_ref(), frame, path)
                    .is_break();
            }
            if model_done && source.is_some() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        (source, walk.model)
    }
}

/// State of the model-context walk, fed one considered frame at a time.
#[derive(Debug, Default)]
struct ModelWalk {
    model: Option<CallContext>,
    found_app_code: bool,
}

impl ModelWalk {
    fn visit(
        &mut self,
        filter: &FrameFilter<'_>,
        registry: &dyn DomainRegistry,
        frame: &StackFrame,
        path: &str,
    ) -> ControlFlow<()> {
        let in_root = filter.in_app_root(path);

        if let Some(parsed) = frame.label.as_deref().and_then(parse_label) {
            let correlation = registry.is_known_domain_type(&parsed.class_name);
            if correlation.confirmed {
                match self.model.as_mut() {
                    None => {
                        self.model = Some(confirmed_context(
                            filter,
                            frame,
                            path,
                            AttributionKind::Label,
                            correlation.canonical_name,
                            parsed.method_name,
                        ));
                    }
                    Some(found) if found.method_name.is_none() => {
                        found.method_name = parsed.method_name;
                    }
                    Some(_) => {}
                }
            }
        }

        if in_root {
            self.found_app_code = true;

            if self.model.is_none() && filter.in_models_dir(path) {
                let inferred = infer_class_from_path(path);
                if !inferred.is_empty() {
                    let correlation = registry.is_known_domain_type(&inferred);
                    if correlation.confirmed {
                        self.model = Some(confirmed_context(
                            filter,
                            frame,
                            path,
                            AttributionKind::PathFallback,
                            correlation.canonical_name,
                            None,
                        ));
                    }
                }
            }
        } else if self.found_app_code && self.model.is_none() {
            // Walked out of application code without a confirmed model.
            return ControlFlow::Break(());
        }

        match &self.model {
            Some(found) if found.method_name.is_some() || self.found_app_code => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    }
}

fn confirmed_context(
    filter: &FrameFilter<'_>,
    frame: &StackFrame,
    path: &str,
    attribution_kind: AttributionKind,
    class_name: String,
    method_name: Option<String>,
) -> CallContext {
    let in_root = filter.in_app_root(path);
    CallContext {
        attribution_kind,
        class_name,
        method_name,
        filepath: in_root.then(|| filter.relative_path(path)),
        line: if in_root { frame.line } else { None },
    }
}
