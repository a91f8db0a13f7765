//! The reporting sink invoked when a resolved failure should be logged.

use crate::context::ContextCell;
use crate::fault::Fault;
use crate::Level;

/// A sink for resolved failures.
///
/// The engine decides *whether* to report and with which channels and level;
/// the sink decides what reporting means. The context is absent when
/// reporting was requested but context construction was skipped.
pub trait Reporter {
    /// Reports one resolved failure.
    fn report(&self, fault: &Fault, context: Option<&ContextCell>);
}

/// Reports failures as `tracing` events.
///
/// The resolved channels and known tags travel as event fields; the resolved
/// reporting level maps onto the nearest `tracing` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, fault: &Fault, context: Option<&ContextCell>) {
        let (level, channels, known) = match context {
            Some(cell) => {
                let context = cell.read();
                (
                    context.level(),
                    context.channels().join(","),
                    context.known().join(","),
                )
            }
            None => (Level::default(), String::new(), String::new()),
        };

        match level {
            Level::Debug => {
                tracing::debug!(%fault, %level, channels, known, "failure resolved");
            }
            Level::Info | Level::Notice => {
                tracing::info!(%fault, %level, channels, known, "failure resolved");
            }
            Level::Warning => {
                tracing::warn!(%fault, %level, channels, known, "failure resolved");
            }
            Level::Error | Level::Critical | Level::Alert | Level::Emergency => {
                tracing::error!(%fault, %level, channels, known, "failure resolved");
            }
        }
    }
}

/// Discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _fault: &Fault, _context: Option<&ContextCell>) {}
}
