// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Frame sources and application-frame filtering.
//!
//! A [`FrameSource`] yields caller frames innermost-first and lets the visitor
//! stop the walk early; producing frames is the expensive part, so every scan
//! in this crate short-circuits.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;

use crate::config::ResolverSettings;
use crate::types::StackFrame;

use super::label::label_from_symbol;

/// A lazily produced sequence of caller frames.
pub trait FrameSource: Send + Sync {
    /// Whether this source can produce frames at all in the current runtime.
    fn is_supported(&self) -> bool {
        true
    }

    /// Visit frames innermost-first until `visit` breaks or frames run out.
    fn walk(&self, visit: &mut dyn FnMut(&StackFrame) -> ControlFlow<()>);
}

/// Pre-captured frames, e.g. from explicit context propagation or tests.
#[derive(Debug, Clone)]
pub struct StaticFrames {
    frames: Vec<StackFrame>,
    supported: bool,
}

impl StaticFrames {
    /// Source that replays `frames` in order.
    pub fn new(frames: Vec<StackFrame>) -> Self {
        Self {
            frames,
            supported: true,
        }
    }

    /// Source that reports no introspection support.
    pub fn unsupported() -> Self {
        Self {
            frames: Vec::new(),
            supported: false,
        }
    }

    /// The frames this source replays.
    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }
}

impl Default for StaticFrames {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl From<Vec<StackFrame>> for StaticFrames {
    fn from(frames: Vec<StackFrame>) -> Self {
        Self::new(frames)
    }
}

impl FrameSource for StaticFrames {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn walk(&self, visit: &mut dyn FnMut(&StackFrame) -> ControlFlow<()>) {
        for frame in &self.frames {
            if visit(frame).is_break() {
                break;
            }
        }
    }
}

/// Symbol prefixes of frames that belong to the engine itself.
const INTERNAL_SYMBOL_PREFIXES: &[&str] = &["spanwright::", "<spanwright::", "backtrace::", "<backtrace::"];

static BACKTRACE_SUPPORTED: Lazy<bool> = Lazy::new(detect_backtrace_support);

/// Resolve symbols for the current thread and report whether any frame carries
/// a file name. Stripped binaries and some sandboxes resolve nothing.
fn detect_backtrace_support() -> bool {
    let mut resolved = false;
    backtrace::trace(|frame| {
        backtrace::resolve_frame(frame, |symbol| {
            if symbol.filename().is_some() {
                resolved = true;
            }
        });
        !resolved
    });
    tracing::debug!(supported = resolved, "Checked stack introspection support");
    resolved
}

/// Live caller frames from the `backtrace` crate.
#[derive(Debug, Clone)]
pub struct BacktraceFrames {
    base_dir: Option<PathBuf>,
}

impl BacktraceFrames {
    /// Source that absolutizes relative file names against the current directory.
    pub fn new() -> Self {
        Self {
            base_dir: std::env::current_dir().ok(),
        }
    }

    /// Source that absolutizes relative file names against `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn absolute(&self, path: &Path) -> String {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path).to_string_lossy().into_owned(),
            _ => path.to_string_lossy().into_owned(),
        }
    }
}

impl Default for BacktraceFrames {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for BacktraceFrames {
    fn is_supported(&self) -> bool {
        *BACKTRACE_SUPPORTED
    }

    fn walk(&self, visit: &mut dyn FnMut(&StackFrame) -> ControlFlow<()>) {
        let mut flow = ControlFlow::Continue(());
        backtrace::trace(|frame| {
            // Inlined calls resolve to several symbols for one frame, innermost first.
            backtrace::resolve_frame(frame, |symbol| {
                if flow.is_break() {
                    return;
                }

                let name = symbol.name().map(|n| format!("{:#}", n));
                if let Some(ref name) = name {
                    if INTERNAL_SYMBOL_PREFIXES.iter().any(|p| name.starts_with(p)) {
                        return;
                    }
                }

                let frame = StackFrame {
                    path: symbol.filename().map(|p| self.absolute(p)),
                    label: name.as_deref().map(label_from_symbol),
                    line: symbol.lineno(),
                };
                flow = visit(&frame);
            });
            flow.is_continue()
        });
    }
}

/// Classifies frames as dependency code or application code.
#[derive(Debug, Clone, Copy)]
pub struct FrameFilter<'a> {
    settings: &'a ResolverSettings,
}

impl<'a> FrameFilter<'a> {
    pub fn new(settings: &'a ResolverSettings) -> Self {
        Self { settings }
    }

    fn root(&self) -> &str {
        self.settings.app_root.trim_end_matches(['/', '\\'])
    }

    /// Whether `path` contains any vendor marker.
    pub fn is_vendor(&self, path: &str) -> bool {
        self.settings
            .vendor_markers
            .iter()
            .any(|marker| !marker.is_empty() && path.contains(marker.as_str()))
    }

    /// Whether `path` lies under the application root, on a component boundary.
    pub fn in_app_root(&self, path: &str) -> bool {
        if self.settings.app_root.is_empty() {
            return false;
        }
        match path.strip_prefix(self.root()) {
            Some(rest) => rest.starts_with(['/', '\\']),
            None => false,
        }
    }

    /// Path present, not vendor, and under the application root.
    pub fn is_candidate(&self, frame: &StackFrame) -> bool {
        match frame.path.as_deref() {
            Some(path) => !self.is_vendor(path) && self.in_app_root(path),
            None => false,
        }
    }

    /// Whether `path` sits under the conventional models directory.
    pub fn in_models_dir(&self, path: &str) -> bool {
        let segment = self.settings.model_path_segment.as_str();
        !segment.is_empty() && path.contains(segment)
    }

    /// `path` with the application root and separator removed.
    pub fn relative_path(&self, path: &str) -> String {
        if !self.in_app_root(path) {
            return path.to_string();
        }
        path[self.root().len()..]
            .trim_start_matches(['/', '\\'])
            .to_string()
    }

    /// Visit every frame that has a path and is not vendor code.
    pub fn walk_considered<F>(&self, source: &dyn FrameSource, mut visit: F)
    where
        F: FnMut(&StackFrame, &str) -> ControlFlow<()>,
    {
        source.walk(&mut |frame| match frame.path.as_deref() {
            Some(path) if !self.is_vendor(path) => visit(frame, path),
            _ => ControlFlow::Continue(()),
        });
    }

    /// First considered frame satisfying `predicate`.
    pub fn first_matching<P>(&self, source: &dyn FrameSource, mut predicate: P) -> Option<StackFrame>
    where
        P: FnMut(&StackFrame) -> bool,
    {
        let mut found = None;
        self.walk_considered(source, |frame, _| {
            if predicate(frame) {
                found = Some(frame.clone());
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        found
    }

    /// First application frame.
    pub fn first_candidate(&self, source: &dyn FrameSource) -> Option<StackFrame> {
        self.first_matching(source, |frame| self.is_candidate(frame))
    }
}
