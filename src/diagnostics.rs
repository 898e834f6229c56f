//! Warning collection
//!
//! Every stage takes a `&mut Diagnostics` so that warnings are counted per run instead of in
//! global state. Each warning is also emitted through `tracing` as it happens.

/// Collector for non-fatal conditions raised while processing a database
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    warnings: Vec<String>,
}

impl Diagnostics {
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.warnings.push(message);
    }

    /// Record a warning when `condition` does not hold
    pub fn warn_unless(&mut self, condition: bool, message: impl FnOnce() -> String) {
        if !condition {
            self.warn(message());
        }
    }

    /// Number of warnings recorded so far
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// All recorded warnings, in order
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Whether any recorded warning contains `needle`
    #[must_use]
    pub fn has_warning(&self, needle: &str) -> bool {
        self.warnings.iter().any(|w| w.contains(needle))
    }
}
