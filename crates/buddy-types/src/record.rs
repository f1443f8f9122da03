//! Structured records embedded in assistant responses.
//!
//! The assistant asks the client to persist data by wrapping a JSON object in
//! a pair of sentinel markers. Two vocabularies exist; they share one extraction
//! algorithm and differ only in marker text and the fields they carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A JSON object carried by a directive. Its fields are opaque to Buddy.
pub type RecordPayload = serde_json::Map<String, serde_json::Value>;

/// Kind of structured record a directive carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// "Save this logged check-in" directive.
    EntrySave,
    /// "Onboarding intake finished" directive.
    IntakeComplete,
}

impl RecordKind {
    pub const ALL: [RecordKind; 2] = [RecordKind::EntrySave, RecordKind::IntakeComplete];

    pub fn begin_marker(&self) -> &'static str {
        match self {
            RecordKind::EntrySave => "[ENTRY_SAVE]",
            RecordKind::IntakeComplete => "[INTAKE_COMPLETE]",
        }
    }

    pub fn end_marker(&self) -> &'static str {
        match self {
            RecordKind::EntrySave => "[/ENTRY_SAVE]",
            RecordKind::IntakeComplete => "[/INTAKE_COMPLETE]",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::EntrySave => write!(f, "entry_save"),
            RecordKind::IntakeComplete => write!(f, "intake_complete"),
        }
    }
}

/// An extracted record as handed to the persistence collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: Uuid,
    pub kind: RecordKind,
    pub recorded_at: DateTime<Utc>,
    pub payload: RecordPayload,
}

impl StoredRecord {
    pub fn new(kind: RecordKind, payload: RecordPayload) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind,
            recorded_at: Utc::now(),
            payload,
        }
    }
}
