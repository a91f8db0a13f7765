//! The meta call-stack tracker.
//!
//! [`MetaCallStack`] shadows the live call stack and lets code at any depth
//! attach metadata to "the current logical call position". Metadata survives
//! nested wrapped calls, and is forgotten once control returns past the
//! position it was recorded at, or a sibling call path is taken instead.
//!
//! The tracker is deliberately loosely typed: records carry a string kind tag
//! plus a [`MetaValue`] payload, and are only resolved into typed meta records
//! when a diagnostic context is built. An unknown tag at that point surfaces
//! as [`Error::InvalidMetaType`](crate::Error::InvalidMetaType).

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::stack::RawFrame;

/// The kind tags used by the engine for tracked metadata.
pub mod kinds {
    /// Free-text situation summaries.
    pub const SUMMARY: &str = "summary";
    /// Structured key/value context data.
    pub const CONTEXT: &str = "context";
    /// Wrapped-execution boundary markers.
    pub const BOUNDARY: &str = "boundary";
}

/// The payload of one tracked metadata record.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    /// A free-text summary.
    Text(String),
    /// Structured key/value context data.
    Data(Map<String, Value>),
    /// An execution-boundary marker: which catcher owns it, and the "known
    /// issue" tags attached to it once the catch rules resolved them.
    Marker {
        /// The identity of the owning catcher instance.
        owner: u64,
        /// The known-issue tags, patched in after rule resolution.
        known: Vec<String>,
    },
}

/// One metadata record, pinned to the call position it was recorded at.
#[derive(Debug, Clone)]
pub struct StoredMeta {
    kind: String,
    frame: RawFrame,
    value: MetaValue,
}

impl StoredMeta {
    /// The record's kind tag.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The frame the record was attached to.
    #[must_use]
    pub fn frame(&self) -> &RawFrame {
        &self.frame
    }

    /// The record's payload.
    #[must_use]
    pub fn value(&self) -> &MetaValue {
        &self.value
    }
}

/// Tracks the live call stack and the metadata linked to points in it.
///
/// One instance lives per [`Scope`](crate::Scope); every `summary()` /
/// `context()` / execution-boundary call mutates it, and building a
/// diagnostic context reads and prunes it.
#[derive(Debug, Default)]
pub struct MetaCallStack {
    /// The current shadow copy of the live call stack, oldest-call-first.
    stack: Vec<RawFrame>,
    /// Pending metadata, keyed by stack position.
    meta: BTreeMap<usize, Vec<StoredMeta>>,
}

impl MetaCallStack {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored stack snapshot, oldest-call-first.
    #[must_use]
    pub fn stack(&self) -> &[RawFrame] {
        &self.stack
    }

    /// All pending metadata, keyed by stack position.
    #[must_use]
    pub fn all_meta(&self) -> &BTreeMap<usize, Vec<StoredMeta>> {
        &self.meta
    }

    /// The pending metadata at one stack position.
    #[must_use]
    pub fn meta_at(&self, index: usize) -> &[StoredMeta] {
        self.meta.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Records metadata at the top of the given (already normalised,
    /// oldest-first) stack snapshot.
    ///
    /// Replacing the stored snapshot prunes metadata recorded under call
    /// paths that are no longer live. When `exclusive_at_top` is set,
    /// existing records of the same kind at the top position are removed
    /// first. Pushing the same kind at the same source line overwrites the
    /// earlier record, so loops re-annotate instead of accumulating.
    pub fn push_meta_data(
        &mut self,
        kind: &str,
        value: MetaValue,
        new_stack: Vec<RawFrame>,
        exclusive_at_top: bool,
    ) {
        self.replace_stack(new_stack);

        if self.stack.is_empty() {
            return;
        }

        if exclusive_at_top {
            self.remove_kind_from_top(kind);
        }

        self.record(kind, value);
    }

    /// Finds the first record of `kind` whose value satisfies `matches`, and
    /// replaces its value.
    ///
    /// Used to patch an execution-boundary record with its resolved known
    /// tags: the boundary is pushed before the tags are known, then updated
    /// once rule matching has determined them.
    pub fn replace_meta_value(
        &mut self,
        kind: &str,
        matches: impl Fn(&MetaValue) -> bool,
        new_value: MetaValue,
    ) {
        for records in self.meta.values_mut() {
            for record in records.iter_mut() {
                if record.kind == kind && matches(&record.value) {
                    record.value = new_value;
                    return;
                }
            }
        }
    }

    /// Prunes metadata that falls outside the common prefix between the
    /// stored snapshot and an error's captured trace (oldest-first).
    ///
    /// Frames are compared by source position only, because function names
    /// differ between capture mechanisms.
    pub fn prune_for_trace(&mut self, trace: &[RawFrame]) {
        let diff_pos = self.find_diff_pos(trace, true);
        self.prune_beyond(diff_pos);
    }

    /// Stores a new snapshot, pruning metadata past the divergence point.
    fn replace_stack(&mut self, new_stack: Vec<RawFrame>) {
        let diff_pos = self.find_diff_pos(&new_stack, false);
        self.prune_beyond(diff_pos);

        self.stack = new_stack;
    }

    /// Finds the first position where the stored stack and the new stack
    /// disagree. Positions past the end of either stack count as
    /// disagreement. When both stacks agree everywhere, the last compared
    /// position is returned, so nothing inside the common prefix is pruned.
    fn find_diff_pos(&self, new_stack: &[RawFrame], by_position: bool) -> usize {
        if self.stack.is_empty() {
            return 0;
        }

        let mut index = 0;
        for (i, new_frame) in new_stack.iter().enumerate() {
            index = i;
            match self.stack.get(i) {
                Some(old_frame) => {
                    let same = if by_position {
                        new_frame.same_position(old_frame)
                    } else {
                        new_frame == old_frame
                    };
                    if !same {
                        break;
                    }
                }
                None => break,
            }
        }
        index
    }

    /// Drops all metadata stored past the divergence position.
    ///
    /// Metadata at the divergence position itself survives: that position is
    /// still the same logical frame, merely executing a different line now.
    fn prune_beyond(&mut self, diff_pos: usize) {
        self.meta.retain(|&index, _| index <= diff_pos);
    }

    /// Records one metadata record at the top of the stored stack.
    fn record(&mut self, kind: &str, value: MetaValue) {
        let top_index = self.stack.len() - 1;
        let frame = self.stack[top_index].clone();

        let records = self.meta.entry(top_index).or_default();

        // same kind at the same line: overwrite in place (loop re-annotation)
        let existing = records
            .iter()
            .position(|r| r.kind == kind && r.frame.line == frame.line);

        let record = StoredMeta {
            kind: kind.to_string(),
            frame,
            value,
        };

        match existing {
            Some(index) => records[index] = record,
            None => records.push(record),
        }
    }

    /// Removes records of one kind from the top stack position.
    fn remove_kind_from_top(&mut self, kind: &str) {
        let top_index = self.stack.len() - 1;
        if let Some(records) = self.meta.get_mut(&top_index) {
            records.retain(|r| r.kind != kind);
        }
    }
}
