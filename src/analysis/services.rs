use std::sync::Arc;

use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::client::VisionClient;
use super::dto::AnalysisResult;
use super::enrich::Enricher;
use super::error::AnalysisFailure;
use super::normalize::normalize_reply;
use super::prompt::build_request;

/// Source of the wall-clock hour used for the meal label.
pub trait Clock: Send + Sync {
    fn current_hour(&self) -> u8;
}

/// Local time using an offset captured once at startup.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn current_hour(&self) -> u8 {
        OffsetDateTime::now_utc().to_offset(self.offset).hour()
    }
}

/// End-to-end analysis: build request, call the model, normalize, enrich.
pub struct Analyzer {
    client: Arc<dyn VisionClient>,
    enricher: Enricher,
    clock: Arc<dyn Clock>,
    model: String,
}

impl Analyzer {
    pub fn new(
        client: Arc<dyn VisionClient>,
        enricher: Enricher,
        clock: Arc<dyn Clock>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            enricher,
            clock,
            model: model.into(),
        }
    }

    /// Only transport-class failures are returned as errors; anything wrong
    /// with the model's reply yields an empty result.
    #[instrument(skip(self, image_b64), fields(analysis_id = %Uuid::new_v4(), model = %self.model, image_len = image_b64.len()))]
    pub async fn analyze(&self, image_b64: &str) -> Result<AnalysisResult, AnalysisFailure> {
        let request = build_request(&self.model, image_b64);
        let reply = self.client.complete(&request).await?;
        debug!(raw_reply = %reply, "model reply");

        let foods = normalize_reply(&reply);
        let result = self.enricher.finalize(foods, self.clock.current_hour());
        info!(
            foods = result.foods.len(),
            total_calories = result.total_calories,
            meal_type = %result.meal_type,
            health_score = result.health_score,
            "analysis complete"
        );
        Ok(result)
    }
}
