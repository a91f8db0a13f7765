//! Typed per-frame metadata records.

use serde_json::{Map, Value};

use crate::stack::{kinds, MetaValue, RawFrame, StoredMeta};
use crate::{Error, Result};

/// The payload of one typed metadata record.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaPayload {
    /// A free-text summary of what the code was doing.
    Summary(String),
    /// Structured key/value context data.
    Context(Map<String, Value>),
    /// A wrapped-execution boundary existed at this position.
    ExecutionMarker {
        /// The identity of the catcher instance that owns the boundary.
        owner: u64,
        /// The known-issue tags attached to the boundary at resolution time.
        known: Vec<String>,
    },
    /// The failure was thrown at this position.
    ExceptionThrown,
    /// The failure was caught by the boundary at this position.
    ExceptionCaught,
    /// The deepest application frame before control entered dependency code.
    LastApplicationFrame,
}

impl MetaPayload {
    /// The payload's kind tag.
    ///
    /// Tracked payloads use the tracker's kind tags ([`kinds::SUMMARY`],
    /// [`kinds::CONTEXT`], [`kinds::BOUNDARY`]); the derived marker payloads
    /// use `"exception-thrown"`, `"exception-caught"` and
    /// `"last-application-frame"`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            MetaPayload::Summary(_) => kinds::SUMMARY,
            MetaPayload::Context(_) => kinds::CONTEXT,
            MetaPayload::ExecutionMarker { .. } => kinds::BOUNDARY,
            MetaPayload::ExceptionThrown => "exception-thrown",
            MetaPayload::ExceptionCaught => "exception-caught",
            MetaPayload::LastApplicationFrame => "last-application-frame",
        }
    }
}

/// One typed metadata record, carrying the position it originated from.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaRecord {
    origin: RawFrame,
    payload: MetaPayload,
}

impl MetaRecord {
    /// Creates a record from its origin and payload.
    #[must_use]
    pub fn new(origin: RawFrame, payload: MetaPayload) -> Self {
        Self { origin, payload }
    }

    /// Resolves a tracker record into its typed form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMetaType`] when the stored kind tag and payload
    /// shape do not correspond to a known record type.
    pub fn from_stored(stored: &StoredMeta) -> Result<Self> {
        let payload = match (stored.kind(), stored.value()) {
            (kinds::SUMMARY, MetaValue::Text(text)) => MetaPayload::Summary(text.clone()),
            (kinds::CONTEXT, MetaValue::Data(data)) => MetaPayload::Context(data.clone()),
            (kinds::BOUNDARY, MetaValue::Marker { owner, known }) => MetaPayload::ExecutionMarker {
                owner: *owner,
                known: known.clone(),
            },
            (kind, _) => {
                return Err(Error::InvalidMetaType {
                    kind: kind.to_string(),
                })
            }
        };
        Ok(Self {
            origin: stored.frame().clone(),
            payload,
        })
    }

    /// The position the record was attached at.
    #[must_use]
    pub fn origin(&self) -> &RawFrame {
        &self.origin
    }

    /// The record's payload.
    #[must_use]
    pub fn payload(&self) -> &MetaPayload {
        &self.payload
    }

    /// The payload's kind tag; see [`MetaPayload::kind`].
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }

    /// The known tags, when this record is an execution marker.
    #[must_use]
    pub fn known_tags(&self) -> Option<&[String]> {
        match &self.payload {
            MetaPayload::ExecutionMarker { known, .. } => Some(known),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_known_kind_tags() {
        let mut tracker = crate::stack::MetaCallStack::new();
        tracker.push_meta_data(
            kinds::SUMMARY,
            MetaValue::Text("working".into()),
            vec![RawFrame::at("main.rs", 1, "main")],
            false,
        );

        let record = MetaRecord::from_stored(&tracker.meta_at(0)[0]).unwrap();
        assert_eq!(record.payload(), &MetaPayload::Summary("working".into()));
        assert_eq!(record.origin().line, Some(1));
    }

    #[test]
    fn test_rejects_unknown_kind_tags() {
        let mut tracker = crate::stack::MetaCallStack::new();
        tracker.push_meta_data(
            "mystery",
            MetaValue::Text("?".into()),
            vec![RawFrame::at("main.rs", 1, "main")],
            false,
        );

        let err = MetaRecord::from_stored(&tracker.meta_at(0)[0]).unwrap_err();
        match err {
            Error::InvalidMetaType { kind } => assert_eq!(kind, "mystery"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_mismatched_payload_shape() {
        let mut tracker = crate::stack::MetaCallStack::new();
        tracker.push_meta_data(
            kinds::SUMMARY,
            MetaValue::Marker {
                owner: 1,
                known: vec![],
            },
            vec![RawFrame::at("main.rs", 1, "main")],
            false,
        );

        assert!(MetaRecord::from_stored(&tracker.meta_at(0)[0]).is_err());
    }
}
