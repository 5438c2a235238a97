use std::sync::{Arc, Mutex};

use crate::infrastructure::bootstrap;
use crate::infrastructure::config::Settings;
use crate::interfaces::http;

pub async fn run() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();

    let settings = Settings::load()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string()))?;

    let state = Arc::new(bootstrap::build_state(&settings));
    match state.cases.load_all() {
        Ok(cases) => tracing::info!(count = cases.len(), "Loaded case records"),
        Err(err) => tracing::warn!(error = %err, "Failed to load case records"),
    }

    let logs = Arc::new(Mutex::new(Vec::new()));
    tracing::info!(host = %settings.host, port = settings.port, "Starting virtual patient API");
    http::start_server(state, &settings, logs)?.await
}
