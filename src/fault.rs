//! The failure value that travels through the engine.
//!
//! A [`Fault`] pairs a boxed error with the call-stack trace captured at the
//! moment it was created, plus a unique identity used to associate it with a
//! diagnostic context while callbacks run. Faults clone cheaply (the payload
//! is shared), implement [`std::error::Error`] themselves, and support
//! polymorphic type tests over the whole error source chain.

use std::error::Error as StdError;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::stack::{BacktraceSource, RawFrame, StackSource};

static NEXT_FAULT_ID: AtomicU64 = AtomicU64::new(1);

/// The unique identity of one [`Fault`] instance.
///
/// Identities are process-unique and never reused; they key the
/// fault-to-context association table while a failure is being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaultId(u64);

impl fmt::Display for FaultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fault#{}", self.0)
    }
}

#[derive(Debug)]
struct FaultInner {
    id: FaultId,
    error: Box<dyn StdError + Send + Sync>,
    /// Captured trace, innermost call first.
    trace: Vec<RawFrame>,
}

/// A failure captured inside a wrapped unit of work.
///
/// The trace is captured eagerly at construction, innermost frame first, so
/// the diagnostic builder can later fuse it with tracked call-site metadata.
/// All clones share the same payload and identity.
#[derive(Debug, Clone)]
pub struct Fault(Arc<FaultInner>);

impl Fault {
    /// Wraps an error, capturing the current call stack.
    #[must_use]
    pub fn new(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::capture_with(error, &BacktraceSource)
    }

    /// Wraps an error, capturing the stack through the given source.
    #[must_use]
    pub fn capture_with(
        error: impl StdError + Send + Sync + 'static,
        source: &dyn StackSource,
    ) -> Self {
        Self::with_trace(error, source.capture())
    }

    /// Wraps an error with an explicit trace (innermost call first).
    #[must_use]
    pub fn with_trace(
        error: impl StdError + Send + Sync + 'static,
        trace: Vec<RawFrame>,
    ) -> Self {
        Self::from_boxed(Box::new(error), trace)
    }

    /// Wraps an already-boxed error with an explicit trace.
    #[must_use]
    pub fn from_boxed(error: Box<dyn StdError + Send + Sync>, trace: Vec<RawFrame>) -> Self {
        Self(Arc::new(FaultInner {
            id: FaultId(NEXT_FAULT_ID.fetch_add(1, Ordering::Relaxed)),
            error,
            trace,
        }))
    }

    /// Creates a fault from a plain message, capturing the current stack.
    #[must_use]
    pub fn from_message(message: impl Into<String>) -> Self {
        let error: Box<dyn StdError + Send + Sync> = message.into().into();
        Self::from_boxed(error, BacktraceSource.capture())
    }

    /// The fault's process-unique identity.
    #[must_use]
    pub fn id(&self) -> FaultId {
        self.0.id
    }

    /// The wrapped error.
    #[must_use]
    pub fn error(&self) -> &(dyn StdError + 'static) {
        self.0.error.as_ref()
    }

    /// The error's display message.
    #[must_use]
    pub fn message(&self) -> String {
        self.0.error.to_string()
    }

    /// The captured trace, innermost call first.
    #[must_use]
    pub fn trace(&self) -> &[RawFrame] {
        &self.0.trace
    }

    /// Whether the wrapped error, or anything in its source chain, is of
    /// type `E`.
    ///
    /// Walking the source chain gives catch rules subtype-like matching:
    /// a wrapper error still matches a rule declared for its cause.
    #[must_use]
    pub fn is<E: StdError + 'static>(&self) -> bool {
        self.downcast_ref::<E>().is_some()
    }

    /// The first error of type `E` in the source chain, if any.
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        let mut current: Option<&(dyn StdError + 'static)> = Some(self.error());
        while let Some(err) = current {
            if let Some(found) = err.downcast_ref::<E>() {
                return Some(found);
            }
            current = err.source();
        }
        None
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.error.fmt(f)
    }
}

impl StdError for Fault {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.error())
    }
}

/// Creates a [`Fault`] from a formatted message, capturing the current call
/// stack.
///
/// # Examples
///
/// ```rust,ignore
/// return Err(fault!("record {} not found", id));
/// ```
#[macro_export]
macro_rules! fault {
    ($($arg:tt)*) => {
        $crate::Fault::from_message(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[derive(Debug, thiserror::Error)]
    #[error("wrapper: {source}")]
    struct Wrapper {
        #[source]
        source: io::Error,
    }

    #[test]
    fn test_identity_is_unique_and_shared_by_clones() {
        let a = Fault::with_trace(io::Error::other("a"), vec![]);
        let b = Fault::with_trace(io::Error::other("b"), vec![]);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), a.clone().id());
    }

    #[test]
    fn test_downcast_walks_the_source_chain() {
        let fault = Fault::with_trace(
            Wrapper {
                source: io::Error::new(io::ErrorKind::NotFound, "gone"),
            },
            vec![],
        );

        assert!(fault.is::<Wrapper>());
        assert!(fault.is::<io::Error>());
        let inner = fault.downcast_ref::<io::Error>().unwrap();
        assert_eq!(inner.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_is_rejects_unrelated_types() {
        let fault = Fault::with_trace(io::Error::other("boom"), vec![]);
        assert!(!fault.is::<std::fmt::Error>());
    }

    #[test]
    fn test_message_delegates_to_the_error() {
        let fault = Fault::with_trace(io::Error::other("boom"), vec![]);
        assert_eq!(fault.message(), "boom");
        assert_eq!(fault.to_string(), "boom");
    }

    #[test]
    fn test_fault_macro_formats_the_message() {
        let fault = fault!("record {} not found", 42);
        assert_eq!(fault.message(), "record 42 not found");
    }
}
