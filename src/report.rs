//! Session report encoding
//!
//! Turns session statistics into the JSON document written at the end of a
//! session (and returned by the stats readers).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::error::RecognitionError;
use crate::session::Session;
use crate::types::SessionStats;
use crate::{GESTURE_VERSION, PRODUCER_NAME};

/// File name used when no output path is given
pub const DEFAULT_REPORT_FILE: &str = "final_session.json";

/// Producer metadata attached to each report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Persisted session statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    #[serde(flatten)]
    pub stats: SessionStats,
    /// RFC 3339 time the report was generated
    pub timestamp: String,
    pub session_id: String,
    pub started_at: String,
    pub producer: ReportProducer,
}

/// Builds [`SessionReport`]s stamped with a stable producer instance
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Report for a session as of now
    pub fn encode(&self, session: &Session) -> SessionReport {
        self.encode_stats(
            session.stats(),
            session.id(),
            session.started_at(),
            Utc::now(),
        )
    }

    pub fn encode_stats(
        &self,
        stats: SessionStats,
        session_id: &str,
        started_at: DateTime<Utc>,
        generated_at: DateTime<Utc>,
    ) -> SessionReport {
        SessionReport {
            stats,
            timestamp: generated_at.to_rfc3339(),
            session_id: session_id.to_string(),
            started_at: started_at.to_rfc3339(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: GESTURE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
        }
    }

    pub fn encode_to_json(&self, session: &Session) -> Result<String, RecognitionError> {
        Ok(serde_json::to_string_pretty(&self.encode(session))?)
    }
}

impl SessionReport {
    pub fn to_json(&self) -> Result<String, RecognitionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON, replacing any existing file
    pub fn write_to(&self, path: &Path) -> Result<(), RecognitionError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
