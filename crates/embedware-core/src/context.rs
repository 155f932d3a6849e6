//! Context forwarded to embedded plugin construction.

use tokio_util::sync::CancellationToken;
use tracing::Span;

/// Opaque context handed to every construct call.
///
/// The registry only records its build diagnostics inside [`span`](Self::span);
/// everything else is for the plugin. Cloning is cheap and clones share the
/// same shutdown token.
#[derive(Debug, Clone)]
pub struct PluginContext {
    span: Span,
    shutdown: CancellationToken,
}

impl PluginContext {
    /// Creates a context attached to the current span with a fresh shutdown token.
    pub fn new() -> Self {
        Self {
            span: Span::current(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Replaces the span diagnostics are recorded in.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Replaces the shutdown token, e.g. with a child of the host's token.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Span that build and construct diagnostics belong to.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Token cancelled when the host begins shutting down.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Returns `true` once the host has started shutting down.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl Default for PluginContext {
    fn default() -> Self {
        Self::new()
    }
}
