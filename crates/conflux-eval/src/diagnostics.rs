//! Structured diagnostics — spec §7 Error Handling Design.
//!
//! A [`DiagnosticMessage`] is the user-facing rendering of a
//! [`Bottom`](conflux_model::Bottom): a severity, a message, the
//! positions that contributed (sorted only here, at emission time — see
//! §4.I), and optionally related positions or a suggested fix. A
//! [`DiagnosticCollector`] accumulates these across a whole evaluation
//! run so the caller gets every bottom, not just the first.

use conflux_core::Position;
use conflux_model::Bottom;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Clone, Debug)]
pub struct RelatedInfo {
    pub position: Position,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct Fix {
    pub description: String,
}

#[derive(Clone, Debug)]
pub struct DiagnosticMessage {
    pub severity: Severity,
    pub message: String,
    pub positions: Vec<Position>,
    pub related: Vec<RelatedInfo>,
    pub fix: Option<Fix>,
}

impl DiagnosticMessage {
    /// Render a bottom as a diagnostic, sorting its positions by
    /// `(file, offset)` for stable, deterministic output.
    pub fn from_bottom(bottom: &Bottom) -> Self {
        let mut positions = bottom.positions.clone();
        positions.sort_by_key(|p| p.sort_key());
        Self {
            severity: Severity::Error,
            message: bottom.message.clone(),
            positions,
            related: Vec::new(),
            fix: None,
        }
    }

    pub fn with_related(mut self, related: RelatedInfo) -> Self {
        self.related.push(related);
        self
    }

    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollector {
    messages: Vec<DiagnosticMessage>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: DiagnosticMessage) {
        self.messages.push(message);
    }

    pub fn push_bottom(&mut self, bottom: &Bottom) {
        self.push(DiagnosticMessage::from_bottom(bottom));
    }

    pub fn messages(&self) -> &[DiagnosticMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }
}
