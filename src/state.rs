use crate::analysis::client::{OpenRouterClient, VisionClient};
use crate::analysis::enrich::Enricher;
use crate::analysis::nutrition::NutritionTable;
use crate::analysis::services::{Analyzer, Clock, SystemClock};
use crate::config::AppConfig;
use std::sync::Arc;
use time::UtcOffset;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub analyzer: Arc<Analyzer>,
}

impl AppState {
    pub fn init(local_offset: UtcOffset) -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let table = match &config.nutrition_table_path {
            Some(path) => NutritionTable::from_json_file(path)?,
            None => NutritionTable::builtin(),
        };
        if table.is_empty() {
            warn!("nutrition table is empty; results will not be enriched");
        }
        let enricher = Enricher::new(table);
        info!(
            entries = enricher.table().len(),
            model = %config.model.model,
            base_url = %config.model.base_url,
            "analysis pipeline ready"
        );

        let client = Arc::new(OpenRouterClient::new(&config.model)?) as Arc<dyn VisionClient>;
        let clock = Arc::new(SystemClock::new(local_offset)) as Arc<dyn Clock>;
        let analyzer = Arc::new(Analyzer::new(
            client,
            enricher,
            clock,
            config.model.model.clone(),
        ));

        Ok(Self::from_parts(config, analyzer))
    }

    pub fn from_parts(config: Arc<AppConfig>, analyzer: Arc<Analyzer>) -> Self {
        Self { config, analyzer }
    }

    #[cfg(test)]
    pub fn fake(vision: crate::analysis::services::test_support::FakeVision, hour: u8) -> Self {
        use crate::analysis::services::test_support::FixedHour;
        use crate::config::ModelConfig;

        let config = Arc::new(AppConfig {
            listen_addr: ([127, 0, 0, 1], 0).into(),
            model: ModelConfig {
                base_url: "http://fake.local".into(),
                api_key: "test".into(),
                model: "vision-test".into(),
                referer: "test".into(),
                title: "test".into(),
                timeout_secs: None,
            },
            nutrition_table_path: None,
        });
        let analyzer = Arc::new(Analyzer::new(
            Arc::new(vision),
            Enricher::new(NutritionTable::builtin()),
            Arc::new(FixedHour(hour)),
            config.model.model.clone(),
        ));
        Self::from_parts(config, analyzer)
    }
}
