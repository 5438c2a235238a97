pub mod use_cases;

pub use use_cases::chat_service::PatientChatService;
pub use use_cases::evaluation_service::EvaluationService;
pub use use_cases::session_memory::SessionMemoryStore;
