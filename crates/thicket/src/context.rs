//! Evaluation context configuration

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::EvalError;
use crate::registry::FunctionRegistry;

/// Callback run when a runtime error escapes a script or closure.
pub type Reaction = Arc<dyn Fn(&EvalError) + Send + Sync>;

/// Configuration and state for evaluation.
///
/// This is passed through all evaluation calls and controls
/// behavior like recursion limits and interruption.
#[derive(Clone)]
pub struct EvalContext {
    /// Maximum call depth (stack overflow protection)
    pub max_call_depth: usize,

    /// Interrupt flag - set to true to abort evaluation
    pub interrupt: Arc<AtomicBool>,

    /// Whether to trace evaluation (for debugging)
    pub trace: bool,

    /// Builtins available to the script
    pub registry: Arc<FunctionRegistry>,

    reaction: Option<Reaction>,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self {
            max_call_depth: 1000,
            interrupt: Arc::new(AtomicBool::new(false)),
            trace: false,
            registry: Arc::new(FunctionRegistry::with_prelude()),
            reaction: None,
        }
    }
}

impl fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalContext")
            .field("max_call_depth", &self.max_call_depth)
            .field("interrupt", &self.interrupt)
            .field("trace", &self.trace)
            .field("registry", &self.registry)
            .field("reaction", &self.reaction.is_some())
            .finish()
    }
}

impl EvalContext {
    /// Create a new context with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific registry (builder style).
    pub fn with_registry(mut self, registry: Arc<FunctionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Set the call depth limit (builder style).
    pub fn with_max_call_depth(mut self, max_depth: usize) -> Self {
        self.max_call_depth = max_depth;
        self
    }

    /// Enable per-node tracing (builder style).
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Install a hook for runtime errors that escape (builder style).
    pub fn with_reaction(mut self, reaction: impl Fn(&EvalError) + Send + Sync + 'static) -> Self {
        self.reaction = Some(Arc::new(reaction));
        self
    }

    /// Hand an escaping error to the reaction hook, if one is installed.
    pub fn react(&self, err: &EvalError) {
        match &self.reaction {
            Some(reaction) => reaction(err),
            None => tracing::debug!(error = %err, "unhandled runtime error"),
        }
    }

    /// Check if evaluation has been interrupted.
    pub fn is_interrupted(&self) -> bool {
        self.interrupt.load(Ordering::Relaxed)
    }

    /// Request interruption of evaluation.
    pub fn interrupt(&self) {
        self.interrupt.store(true, Ordering::Relaxed);
    }

    /// Reset the interrupt flag.
    pub fn reset_interrupt(&self) {
        self.interrupt.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_interrupt_flag_is_shared() {
        let ctx = EvalContext::new();
        let copy = ctx.clone();
        ctx.interrupt();
        assert!(copy.is_interrupted());
        copy.reset_interrupt();
        assert!(!ctx.is_interrupted());
    }

    #[test]
    fn test_reaction_runs() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let ctx = EvalContext::new().with_reaction(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        ctx.react(&EvalError::Interrupted);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_registry_has_prelude() {
        assert!(EvalContext::new().registry.contains("add"));
    }
}
