/// The tool's named log context and its propagation switch.
///
/// Records emitted by this crate carry targets under [`TOOL_TARGET`]. The
/// tool layer always renders them; an ancestor layer (a host embedding the
/// tool, or the catch-all layer installed by [`super::init_logging`]) only
/// sees them while propagation is enabled. Disabling propagation is what
/// keeps a warning from being printed twice.
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::Metadata;
use tracing_subscriber::filter::DynFilterFn;
use tracing_subscriber::layer::Context;

use crate::cli::OutputFormat;
use crate::cli::output::write_error;
use crate::exit::Classified;
use crate::types::ErrorOutput;

/// Target prefix shared by every record this crate emits.
pub const TOOL_TARGET: &str = "cmdwrap";

static PROPAGATE: AtomicBool = AtomicBool::new(true);

/// Stop tool records from reaching ancestor layers.
///
/// Returns `true` only on the call that actually flipped the flag.
pub fn disable_propagation() -> bool {
    PROPAGATE.swap(false, Ordering::SeqCst)
}

/// Whether tool records currently reach ancestor layers.
#[must_use]
pub fn propagates() -> bool {
    PROPAGATE.load(Ordering::SeqCst)
}

#[cfg(test)]
pub(crate) fn reset_propagation() {
    PROPAGATE.store(true, Ordering::SeqCst);
}

pub(crate) fn is_tool_target(target: &str) -> bool {
    target
        .strip_prefix(TOOL_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

fn admits_ancestor(target: &str, propagate: bool) -> bool {
    propagate || !is_tool_target(target)
}

/// Per-layer filter for any layer that stands in for an ancestor logger.
///
/// Evaluated on every record (not cached per callsite), so it follows the
/// propagation flag even for callsites registered before it flipped.
#[must_use]
pub fn ancestor_filter<S>() -> DynFilterFn<S, impl Fn(&Metadata<'_>, &Context<'_, S>) -> bool> {
    DynFilterFn::new(|meta: &Metadata<'_>, _cx: &Context<'_, S>| {
        admits_ancestor(meta.target(), propagates())
    })
}

/// What the invocation wrapper needs from logging.
pub trait RunLog {
    /// Detach this tool's records from ancestor loggers. Idempotent.
    fn disable_propagation(&self);

    /// Surface an expected failure: its message only, no backtrace.
    fn classified(&self, err: &dyn Classified);

    /// Record an unexpected failure at error severity with full detail.
    fn unclassified(&self, err: &anyhow::Error);
}

/// The process-wide log context named after the tool.
#[derive(Debug, Clone, Copy)]
pub struct LogContext {
    name: &'static str,
    format: OutputFormat,
}

impl LogContext {
    /// Context for this tool; classified failures are written in `format`.
    #[must_use]
    pub fn new(format: OutputFormat) -> Self {
        Self {
            name: TOOL_TARGET,
            format,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl RunLog for LogContext {
    fn disable_propagation(&self) {
        if disable_propagation() {
            tracing::trace!(context = self.name, "log propagation disabled");
        }
    }

    fn classified(&self, err: &dyn Classified) {
        tracing::debug!(
            code = %err.exit_code(),
            kind = err.slug(),
            "subcommand ended with a classified failure"
        );
        write_error(&ErrorOutput::from_classified(err), self.format);
    }

    fn unclassified(&self, err: &anyhow::Error) {
        // `{:?}` on anyhow::Error renders the cause chain and any captured backtrace.
        tracing::error!("{err:?}");
    }
}
