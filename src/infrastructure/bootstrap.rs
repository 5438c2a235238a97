use std::sync::Arc;

use crate::application::{EvaluationService, PatientChatService, SessionMemoryStore};
use crate::infrastructure::case_store::CaseRepository;
use crate::infrastructure::config::Settings;
use crate::infrastructure::llm_clients::{LLMClient, RouterClient};

/// Shared service instances, constructed once at startup and handed to the
/// HTTP layer explicitly.
pub struct AppState {
    pub cases: Arc<CaseRepository>,
    pub chat: Arc<PatientChatService>,
    pub evaluation: Arc<EvaluationService>,
}

pub fn build_state(settings: &Settings) -> AppState {
    let llm: Arc<dyn LLMClient> = Arc::new(RouterClient::new());
    let llm_config = settings.llm_config();

    let cases = Arc::new(CaseRepository::new(&settings.cases_dir));
    let memory = Arc::new(SessionMemoryStore::new());

    let chat = Arc::new(PatientChatService::new(
        cases.clone(),
        memory,
        llm.clone(),
        llm_config.clone(),
    ));
    let evaluation = Arc::new(EvaluationService::new(cases.clone(), llm, llm_config));

    AppState {
        cases,
        chat,
        evaluation,
    }
}
