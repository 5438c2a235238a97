use crate::application::use_cases::prompt_engine::PromptEngine;
use crate::application::use_cases::session_memory::SessionMemoryStore;
use crate::domain::chat::ChatMessage;
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::case_store::CaseRepository;
use crate::infrastructure::llm_clients::LLMClient;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Key for an active conversation. A struct key rather than a joined string,
/// so a session id containing the separator cannot collide with another
/// pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BindingKey {
    session_id: String,
    case_id: String,
}

impl BindingKey {
    fn new(session_id: &str, case_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            case_id: case_id.to_string(),
        }
    }
}

/// Cached persona context for one (session, case) pair. Conversation history
/// lives only in the session memory store; the binding carries just the
/// system prompt.
struct ConversationBinding {
    system_prompt: String,
}

pub struct PatientChatService {
    cases: Arc<CaseRepository>,
    memory: Arc<SessionMemoryStore>,
    llm: Arc<dyn LLMClient>,
    llm_config: LLMConfig,
    bindings: RwLock<HashMap<BindingKey, Arc<ConversationBinding>>>,
}

impl PatientChatService {
    pub fn new(
        cases: Arc<CaseRepository>,
        memory: Arc<SessionMemoryStore>,
        llm: Arc<dyn LLMClient>,
        llm_config: LLMConfig,
    ) -> Self {
        Self {
            cases,
            memory,
            llm,
            llm_config,
            bindings: RwLock::new(HashMap::new()),
        }
    }

    fn get_or_create_binding(
        &self,
        session_id: &str,
        case_id: &str,
    ) -> Result<Arc<ConversationBinding>> {
        let key = BindingKey::new(session_id, case_id);
        if let Some(binding) = self.bindings.read().unwrap().get(&key) {
            return Ok(binding.clone());
        }

        let case = self
            .cases
            .get(case_id)?
            .ok_or_else(|| AppError::NotFound(format!("Case {} not found", case_id)))?;

        let binding = Arc::new(ConversationBinding {
            system_prompt: PromptEngine::build_persona_prompt(&case),
        });

        let mut bindings = self.bindings.write().unwrap();
        Ok(bindings.entry(key).or_insert(binding).clone())
    }

    /// Send one student message and return the simulated patient's reply
    /// verbatim.
    ///
    /// The session transcript lock is held across the model call, so two
    /// concurrent messages in the same session commit as one ordering or the
    /// other, never interleaved. Model failures propagate; there is no retry
    /// and no fallback reply.
    pub async fn send_message(
        &self,
        session_id: &str,
        case_id: &str,
        message: &str,
    ) -> Result<String> {
        let binding = self.get_or_create_binding(session_id, case_id)?;
        let handle = self.memory.get_or_create(session_id);
        let mut transcript = handle.lock().await;

        let input = PromptEngine::build_patient_input(&transcript, message);
        let reply = self
            .llm
            .generate(&self.llm_config, &binding.system_prompt, &input)
            .await?;

        transcript.push(ChatMessage::student(message));
        transcript.push(ChatMessage::patient(reply.clone()));

        Ok(reply)
    }

    pub async fn history(&self, session_id: &str) -> Vec<ChatMessage> {
        self.memory.read(session_id).await
    }

    /// Drop the conversation binding and delete the session transcript.
    pub fn end_session(&self, session_id: &str, case_id: &str) {
        self.bindings
            .write()
            .unwrap()
            .remove(&BindingKey::new(session_id, case_id));
        self.memory.delete(session_id);
    }
}
