pub mod chat_service;
pub mod evaluation_service;
pub mod metrics_service;
pub mod prompt_engine;
pub mod session_memory;
