//! The built diagnostic call stack and its frame model.

mod frame;
mod meta;

pub use frame::Frame;
pub use meta::{MetaPayload, MetaRecord};

use crate::{Error, Result};

/// An ordered, seekable, reversible sequence of diagnostic [`Frame`]s.
///
/// Stacks are built oldest-call-first; [`reverse`](CallStack::reverse) flips
/// them into innermost-first trace order. The cursor-based iteration mirrors
/// explicit-cursor traversal so hosts can walk the stack incrementally, and
/// [`IntoIterator`] is provided for plain `for` loops.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: Vec<Frame>,
    cursor: usize,
}

impl CallStack {
    /// Creates a stack from already-built frames.
    #[must_use]
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames, cursor: 0 }
    }

    /// The number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the stack has no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The frame at `index`, if it exists.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Replaces the frame at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] when `index` is not a valid position.
    pub fn set(&mut self, index: usize, frame: Frame) -> Result<()> {
        let len = self.frames.len();
        match self.frames.get_mut(index) {
            Some(slot) => {
                *slot = frame;
                Ok(())
            }
            None => Err(Error::OutOfRange { index, len }),
        }
    }

    /// Moves the cursor to `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] when `index` is not a valid position.
    pub fn seek(&mut self, index: usize) -> Result<()> {
        if index >= self.frames.len() {
            return Err(Error::OutOfRange {
                index,
                len: self.frames.len(),
            });
        }
        self.cursor = index;
        Ok(())
    }

    /// Moves the cursor back to the first frame.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// The frame under the cursor, if the cursor is within bounds.
    #[must_use]
    pub fn current(&self) -> Option<&Frame> {
        self.frames.get(self.cursor)
    }

    /// The cursor's position.
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Advances the cursor one frame.
    pub fn advance(&mut self) {
        self.cursor += 1;
    }

    /// Reverses the frame order in place and rewinds the cursor.
    pub fn reverse(&mut self) {
        self.frames.reverse();
        self.cursor = 0;
    }

    /// Iterates the frames in stored order.
    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    /// The deepest application frame, or `None` when no frame carries the
    /// marker (including when diagnostics are disabled).
    #[must_use]
    pub fn last_application_frame(&self) -> Option<&Frame> {
        self.scan_back(Frame::is_last_application_frame)
    }

    /// The stored index of the deepest application frame.
    #[must_use]
    pub fn last_application_frame_index(&self) -> Option<usize> {
        self.scan_back_index(Frame::is_last_application_frame)
    }

    /// The frame the failure was thrown at.
    #[must_use]
    pub fn exception_thrown_frame(&self) -> Option<&Frame> {
        self.scan_back(Frame::thrown_here)
    }

    /// The stored index of the frame the failure was thrown at.
    #[must_use]
    pub fn exception_thrown_frame_index(&self) -> Option<usize> {
        self.scan_back_index(Frame::thrown_here)
    }

    /// The frame the failure was caught at.
    #[must_use]
    pub fn exception_caught_frame(&self) -> Option<&Frame> {
        self.scan_back(Frame::caught_here)
    }

    /// The stored index of the frame the failure was caught at.
    #[must_use]
    pub fn exception_caught_frame_index(&self) -> Option<usize> {
        self.scan_back_index(Frame::caught_here)
    }

    fn scan_back(&self, pred: impl Fn(&Frame) -> bool) -> Option<&Frame> {
        self.frames.iter().rev().find(|f| pred(f))
    }

    fn scan_back_index(&self, pred: impl Fn(&Frame) -> bool) -> Option<usize> {
        self.frames.iter().rposition(|f| pred(f))
    }
}

impl std::ops::Index<usize> for CallStack {
    type Output = Frame;

    fn index(&self, index: usize) -> &Frame {
        &self.frames[index]
    }
}

impl<'a> IntoIterator for &'a CallStack {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::RawFrame;

    fn frame(file: &str, line: u32) -> Frame {
        Frame::new(RawFrame::at(file, line, "f"), vec![], true)
    }

    fn stack() -> CallStack {
        CallStack::new(vec![
            frame("main.rs", 10),
            frame("app.rs", 20),
            frame("deep.rs", 30),
        ])
    }

    #[test]
    fn test_seek_and_current() {
        let mut stack = stack();
        stack.seek(2).unwrap();
        assert_eq!(stack.current().unwrap().line(), Some(30));

        stack.rewind();
        assert_eq!(stack.current().unwrap().line(), Some(10));
    }

    #[test]
    fn test_seek_out_of_range() {
        let mut stack = stack();
        let err = stack.seek(3).unwrap_err();
        match err {
            Error::OutOfRange { index, len } => {
                assert_eq!(index, 3);
                assert_eq!(len, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_set_replaces_in_bounds_only() {
        let mut stack = stack();
        stack.set(1, frame("other.rs", 99)).unwrap();
        assert_eq!(stack[1].line(), Some(99));
        assert!(stack.set(5, frame("other.rs", 1)).is_err());
    }

    #[test]
    fn test_double_reverse_restores_original_order() {
        let mut stack = stack();
        let original: Vec<Option<u32>> = stack.iter().map(Frame::line).collect();

        stack.reverse();
        assert_eq!(stack[0].line(), Some(30));
        stack.reverse();

        let restored: Vec<Option<u32>> = stack.iter().map(Frame::line).collect();
        assert_eq!(original, restored);
        assert_eq!(stack.position(), 0);
    }

    #[test]
    fn test_derived_lookups_scan_from_the_end() {
        let marker = |payload| MetaRecord::new(RawFrame::at("x.rs", 1, "f"), payload);
        let frames = vec![
            frame("main.rs", 10).with_extra_meta(marker(MetaPayload::LastApplicationFrame)),
            frame("app.rs", 20).with_extra_meta(marker(MetaPayload::LastApplicationFrame)),
            frame("deep.rs", 30).with_extra_meta(marker(MetaPayload::ExceptionThrown)),
        ];
        let stack = CallStack::new(frames);

        // the scan returns the record closest to the end of storage order
        assert_eq!(stack.last_application_frame_index(), Some(1));
        assert_eq!(stack.exception_thrown_frame_index(), Some(2));
        assert!(stack.exception_caught_frame().is_none());
    }

    #[test]
    fn test_cursor_walk_visits_every_frame() {
        let mut stack = stack();
        let mut lines = Vec::new();
        stack.rewind();
        while let Some(frame) = stack.current() {
            lines.push(frame.line());
            stack.advance();
        }
        assert_eq!(lines, vec![Some(10), Some(20), Some(30)]);
    }
}
