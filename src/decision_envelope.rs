// =============================================================================
// Analysis Envelope — audit record of every analyze action
// =============================================================================
//
// Captures what was asked and what came out (or why it was rejected).  The
// engine never reads these back; each analysis is independent.
// =============================================================================

use serde::Serialize;

use crate::engine::DecisionResult;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisEnvelope {
    /// Unique identifier for this analysis (UUID v4).
    pub id: String,

    pub symbol: String,

    /// "COMPLETED" or "REJECTED".
    pub status: String,

    /// "Auto" or "Manual".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,

    /// Rejection reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Non-fatal notes, e.g. the manual fallback.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// ISO 8601 timestamp of when this envelope was created.
    pub created_at: String,
}

impl AnalysisEnvelope {
    pub fn completed(symbol: impl Into<String>, result: &DecisionResult, warnings: Vec<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.into(),
            status: "COMPLETED".to_string(),
            source: Some(result.source.to_string()),
            decision: Some(result.decision.to_string()),
            score: Some(result.score),
            reason: None,
            warnings,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn rejected(symbol: impl Into<String>, reason: impl Into<String>, warnings: Vec<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.into(),
            status: "REJECTED".to_string(),
            source: None,
            decision: None,
            score: None,
            reason: Some(reason.into()),
            warnings,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
