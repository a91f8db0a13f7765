//! Call-stack capture and the meta call-stack tracker.

mod raw;
mod tracker;

pub use raw::{normalise_capture, BacktraceSource, RawFrame, ScriptedSource, StackSource};
pub use tracker::{kinds, MetaCallStack, MetaValue, StoredMeta};
