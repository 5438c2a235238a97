pub mod bootstrap;
pub mod case_store;
pub mod config;
pub mod llm_clients;
