pub mod case;
pub mod chat;
pub mod error;
pub mod evaluation;
pub mod llm_config;
