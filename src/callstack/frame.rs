//! Immutable diagnostic stack frames.

use std::path::{Path, PathBuf};

use crate::callstack::{MetaPayload, MetaRecord};
use crate::config::Config;
use crate::stack::RawFrame;

/// One frame of a built diagnostic call stack.
///
/// Frames are immutable value objects: tagging a frame with a further record
/// produces a new frame via [`with_extra_meta`](Frame::with_extra_meta)
/// rather than mutating shared state. The derived booleans are set from the
/// marker records appended to the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    position: RawFrame,
    meta: Vec<MetaRecord>,
    is_application: bool,
    thrown_here: bool,
    caught_here: bool,
    is_last_application: bool,
}

impl Frame {
    /// Creates a frame from its position, metadata and classification.
    #[must_use]
    pub fn new(position: RawFrame, meta: Vec<MetaRecord>, is_application: bool) -> Self {
        Self {
            position,
            meta,
            is_application,
            thrown_here: false,
            caught_here: false,
            is_last_application: false,
        }
    }

    /// Returns a copy of this frame with one further record appended.
    ///
    /// The derived booleans of the copy are the logical OR of the existing
    /// flags and the flag implied by the new record's payload, so tagging is
    /// cumulative and order-independent.
    #[must_use]
    pub fn with_extra_meta(&self, record: MetaRecord) -> Self {
        let mut copy = self.clone();
        match record.payload() {
            MetaPayload::ExceptionThrown => copy.thrown_here = true,
            MetaPayload::ExceptionCaught => copy.caught_here = true,
            MetaPayload::LastApplicationFrame => copy.is_last_application = true,
            _ => {}
        }
        copy.meta.push(record);
        copy
    }

    /// The frame's source position.
    #[must_use]
    pub fn position(&self) -> &RawFrame {
        &self.position
    }

    /// The source file, as a displayable string (empty when unknown).
    #[must_use]
    pub fn file(&self) -> String {
        self.position.file_display()
    }

    /// The source file relative to the configured project root, when a file
    /// is known. Files outside the root are returned unchanged.
    #[must_use]
    pub fn project_file(&self, config: &Config) -> Option<PathBuf> {
        self.position
            .file
            .as_ref()
            .map(|file| config.project_file(Path::new(file)))
    }

    /// The source line, when known.
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        self.position.line
    }

    /// The function containing the call site, when known.
    #[must_use]
    pub fn function(&self) -> Option<&str> {
        self.position.function.as_deref()
    }

    /// The metadata records attached to this frame, in attachment order.
    #[must_use]
    pub fn meta(&self) -> &[MetaRecord] {
        &self.meta
    }

    /// The metadata records of one kind tag; see [`MetaPayload::kind`].
    #[must_use]
    pub fn meta_of_kind(&self, kind: &str) -> Vec<&MetaRecord> {
        self.meta
            .iter()
            .filter(|record| record.kind() == kind)
            .collect()
    }

    /// Whether the frame belongs to the application rather than a dependency.
    #[must_use]
    pub fn is_application_frame(&self) -> bool {
        self.is_application
    }

    /// Whether the frame belongs to dependency code under the configured
    /// dependency directory.
    #[must_use]
    pub fn is_vendor_frame(&self) -> bool {
        !self.is_application
    }

    /// Whether the failure was thrown at this frame.
    #[must_use]
    pub fn thrown_here(&self) -> bool {
        self.thrown_here
    }

    /// Whether the failure was caught at this frame.
    #[must_use]
    pub fn caught_here(&self) -> bool {
        self.caught_here
    }

    /// Whether this is the deepest application frame.
    #[must_use]
    pub fn is_last_application_frame(&self) -> bool {
        self.is_last_application
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Frame {
        Frame::new(RawFrame::at("app.rs", 10, "app::run"), vec![], true)
    }

    fn marker(payload: MetaPayload) -> MetaRecord {
        MetaRecord::new(RawFrame::at("app.rs", 10, "app::run"), payload)
    }

    #[test]
    fn test_tagging_produces_a_new_frame() {
        let original = base();
        let tagged = original.with_extra_meta(marker(MetaPayload::ExceptionThrown));

        assert!(!original.thrown_here());
        assert!(tagged.thrown_here());
        assert_eq!(original.meta().len(), 0);
        assert_eq!(tagged.meta().len(), 1);
    }

    #[test]
    fn test_flags_accumulate_across_tags() {
        let frame = base()
            .with_extra_meta(marker(MetaPayload::LastApplicationFrame))
            .with_extra_meta(marker(MetaPayload::ExceptionCaught));

        assert!(frame.is_last_application_frame());
        assert!(frame.caught_here());
        assert!(!frame.thrown_here());
        assert_eq!(frame.meta().len(), 2);
    }

    #[test]
    fn test_meta_filters_by_kind_tag() {
        let frame = base()
            .with_extra_meta(marker(MetaPayload::Summary("a".into())))
            .with_extra_meta(marker(MetaPayload::ExceptionThrown))
            .with_extra_meta(marker(MetaPayload::Summary("b".into())));

        assert_eq!(frame.meta_of_kind("summary").len(), 2);
        assert_eq!(frame.meta_of_kind("exception-thrown").len(), 1);
        assert!(frame.meta_of_kind("context").is_empty());
    }

    #[test]
    fn test_plain_meta_does_not_set_flags() {
        let frame = base().with_extra_meta(marker(MetaPayload::Summary("busy".into())));
        assert!(!frame.thrown_here());
        assert!(!frame.caught_here());
        assert!(!frame.is_last_application_frame());
    }
}
