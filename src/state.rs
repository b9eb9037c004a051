//! Application state: problem catalog, the coach, and its text generator.
//!
//! Sessions are not stored here. Each WebSocket connection owns its own
//! `Session`, so nothing mutable is shared between conversations.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::catalog::ProblemCatalog;
use crate::coach::Coach;
use crate::config::{load_coach_config_from_env, CoachConfig};
use crate::llm::TextGenerator;
use crate::offline::OfflineGenerator;
use crate::openai::OpenAI;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<ProblemCatalog>,
    pub coach: Arc<Coach>,
}

impl AppState {
    /// Build state from env: load config, build the catalog, pick OpenAI or the offline generator.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Self {
        let cfg = load_coach_config_from_env().unwrap_or_default();
        let catalog = Arc::new(ProblemCatalog::new(cfg.problems.clone()));

        let generator: Arc<dyn TextGenerator> = match OpenAI::from_env() {
            Some(oa) => {
                info!(target: "interview_coach", base_url = %oa.base_url, fast_model = %oa.fast_model, strong_model = %oa.strong_model, "OpenAI enabled.");
                Arc::new(oa)
            }
            None => {
                info!(target: "interview_coach", "OpenAI disabled (no OPENAI_API_KEY). Using offline coach.");
                Arc::new(OfflineGenerator::new(catalog.clone()))
            }
        };

        Self::new(cfg, catalog, generator)
    }

    pub fn new(cfg: CoachConfig, catalog: Arc<ProblemCatalog>, generator: Arc<dyn TextGenerator>) -> Self {
        info!(
            target: "interview_coach",
            problems = catalog.len(),
            max_guidance_attempts = cfg.coaching.max_guidance_attempts,
            history_window = cfg.coaching.history_window,
            "Coach ready"
        );
        let coach = Arc::new(Coach::new(generator, catalog.clone(), &cfg.coaching, cfg.prompts));
        Self { catalog, coach }
    }

    /// Offline coach with default config; used by tests and local runs.
    pub fn offline() -> Self {
        let catalog = Arc::new(ProblemCatalog::default());
        let generator = Arc::new(OfflineGenerator::new(catalog.clone()));
        Self::new(CoachConfig::default(), catalog, generator)
    }
}
