use thiserror::Error;

/// Failures that cross the analysis boundary. Malformed model output never
/// ends up here; it degrades to an empty result instead.
#[derive(Debug, Error)]
pub enum AnalysisFailure {
    /// The request never completed: connect, send or body read failed.
    #[error("model transport failed: {0}")]
    Transport(String),
    /// The provider answered with a non-success status (auth, rate limit, outage).
    #[error("model provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl AnalysisFailure {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AnalysisFailure::Rejected { status: 429, .. })
    }
}
