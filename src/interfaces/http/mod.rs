use crate::domain::chat::ChatMessage;
use crate::domain::error::AppError;
use crate::infrastructure::bootstrap::AppState;
use crate::infrastructure::config::Settings;
use actix_cors::Cors;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub app: Arc<AppState>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    pub session_id: String,
    pub case_id: String,
    #[validate(length(min = 1, max = 4096))]
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub response: String,
    pub case_id: String,
}

#[derive(Deserialize)]
pub struct EndSessionRequest {
    pub session_id: String,
    pub case_id: String,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
pub struct EvaluationRequest {
    pub session_id: String,
    pub case_id: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
pub struct AckResponse {
    pub message: String,
}

fn error_response(err: &AppError) -> HttpResponse {
    match err {
        AppError::NotFound(_) => HttpResponse::NotFound().body(err.to_string()),
        AppError::ValidationError(_) => HttpResponse::BadRequest().body(err.to_string()),
        AppError::LLMError(_) => HttpResponse::BadGateway().body(err.to_string()),
        _ => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

#[post("/chat")]
async fn chat(data: web::Data<HttpState>, req: web::Json<ChatRequest>) -> impl Responder {
    if let Err(err) = req.validate() {
        return HttpResponse::BadRequest().body(err.to_string());
    }

    add_log(
        &data.logs,
        "INFO",
        "Chat",
        &format!(
            "Student message for case {} (session {})",
            req.case_id, req.session_id
        ),
    );

    match data
        .app
        .chat
        .send_message(&req.session_id, &req.case_id, &req.message)
        .await
    {
        Ok(response) => HttpResponse::Ok().json(ChatResponse {
            session_id: req.session_id.clone(),
            response,
            case_id: req.case_id.clone(),
        }),
        Err(err) => {
            add_log(&data.logs, "ERROR", "Chat", &format!("Chat failed: {}", err));
            error_response(&err)
        }
    }
}

#[post("/chat/end-session")]
async fn end_session(
    data: web::Data<HttpState>,
    req: web::Json<EndSessionRequest>,
) -> impl Responder {
    data.app.chat.end_session(&req.session_id, &req.case_id);
    add_log(
        &data.logs,
        "INFO",
        "Chat",
        &format!("Ended session {}", req.session_id),
    );
    HttpResponse::Ok().json(AckResponse {
        message: "Session ended successfully".to_string(),
    })
}

#[get("/chat/history/{session_id}")]
async fn chat_history(data: web::Data<HttpState>, path: web::Path<String>) -> impl Responder {
    let session_id = path.into_inner();
    let messages = data.app.chat.history(&session_id).await;
    HttpResponse::Ok().json(HistoryResponse {
        session_id,
        messages,
    })
}

#[post("/evaluate")]
async fn evaluate(data: web::Data<HttpState>, req: web::Json<EvaluationRequest>) -> impl Responder {
    add_log(
        &data.logs,
        "INFO",
        "Evaluation",
        &format!(
            "Evaluating session {} against case {}",
            req.session_id, req.case_id
        ),
    );

    let result = data
        .app
        .evaluation
        .evaluate(&req.session_id, &req.case_id, &req.messages)
        .await;

    if let Some(error) = &result.error {
        add_log(
            &data.logs,
            "ERROR",
            "Evaluation",
            &format!("Evaluation degraded: {}", error),
        );
    }

    // Evaluation is advisory: degraded results are still a 200.
    HttpResponse::Ok().json(result)
}

#[get("/cases")]
async fn list_cases(data: web::Data<HttpState>) -> impl Responder {
    match data.app.cases.list() {
        Ok(cases) => HttpResponse::Ok().json(cases),
        Err(err) => {
            add_log(
                &data.logs,
                "ERROR",
                "Cases",
                &format!("Failed to list cases: {}", err),
            );
            error_response(&err)
        }
    }
}

#[get("/cases/{case_id}")]
async fn get_case(data: web::Data<HttpState>, path: web::Path<String>) -> impl Responder {
    let case_id = path.into_inner();
    match data.app.cases.get(&case_id) {
        Ok(Some(case)) => HttpResponse::Ok().json(case),
        Ok(None) => HttpResponse::NotFound().body(format!("Case {} not found", case_id)),
        Err(err) => {
            add_log(
                &data.logs,
                "ERROR",
                "Cases",
                &format!("Failed to read case {}: {}", case_id, err),
            );
            error_response(&err)
        }
    }
}

#[post("/cases/reload")]
async fn reload_cases(data: web::Data<HttpState>) -> impl Responder {
    data.app.cases.reload();
    match data.app.cases.load_all() {
        Ok(cases) => {
            add_log(
                &data.logs,
                "INFO",
                "Cases",
                &format!("Reloaded {} case records", cases.len()),
            );
            HttpResponse::Ok().json(AckResponse {
                message: "Cases reloaded successfully".to_string(),
            })
        }
        Err(err) => {
            add_log(
                &data.logs,
                "ERROR",
                "Cases",
                &format!("Reload failed: {}", err),
            );
            error_response(&err)
        }
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = data.logs.lock().unwrap();
    HttpResponse::Ok().json(&*logs)
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "healthy" }))
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = logs.lock().unwrap();
    logs.push(entry.clone());
    if logs.len() > 100 {
        logs.remove(0);
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

pub fn start_server(
    app_state: Arc<AppState>,
    settings: &Settings,
    logs: Arc<Mutex<Vec<LogEntry>>>,
) -> std::io::Result<Server> {
    let state = web::Data::new(HttpState {
        app: app_state,
        logs,
    });
    let origins = settings.cors_origins.clone();

    let server = HttpServer::new(move || {
        let mut cors = Cors::default()
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();
        for origin in &origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .service(health)
            .service(
                web::scope("/api")
                    .service(chat)
                    .service(end_session)
                    .service(chat_history)
                    .service(evaluate)
                    .service(list_cases)
                    .service(get_case)
                    .service(reload_cases)
                    .service(get_logs),
            )
    })
    .bind((settings.host.as_str(), settings.port))?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{EvaluationService, PatientChatService, SessionMemoryStore};
    use crate::domain::error::Result;
    use crate::domain::llm_config::LLMConfig;
    use crate::infrastructure::case_store::CaseRepository;
    use crate::infrastructure::llm_clients::LLMClient;
    use actix_web::{test, App};
    use async_trait::async_trait;
    use std::fs;
    use tempfile::TempDir;

    struct StaticClient {
        output: String,
    }

    #[async_trait]
    impl LLMClient for StaticClient {
        async fn generate(
            &self,
            _config: &LLMConfig,
            _system: &str,
            _user: &str,
        ) -> Result<String> {
            Ok(self.output.clone())
        }
    }

    fn state_with_case(dir: &TempDir, llm_output: &str) -> web::Data<HttpState> {
        let case = serde_json::json!({
            "id": "case_001",
            "patient_name": "Sarah Chen",
            "age": 28,
            "gender": "female",
            "chief_complaint": "I can't sleep",
            "condition": "Major depressive disorder",
            "background": "Software engineer",
            "symptoms": "insomnia, low mood",
            "medical_history": "none",
        });
        fs::write(dir.path().join("case_001.json"), case.to_string()).unwrap();

        let llm: Arc<dyn LLMClient> = Arc::new(StaticClient {
            output: llm_output.to_string(),
        });
        let llm_config = LLMConfig::default();
        let cases = Arc::new(CaseRepository::new(dir.path()));
        let memory = Arc::new(SessionMemoryStore::new());
        let chat_service = Arc::new(PatientChatService::new(
            cases.clone(),
            memory,
            llm.clone(),
            llm_config.clone(),
        ));
        let evaluation = Arc::new(EvaluationService::new(cases.clone(), llm, llm_config));

        web::Data::new(HttpState {
            app: Arc::new(AppState {
                cases,
                chat: chat_service,
                evaluation,
            }),
            logs: Arc::new(Mutex::new(Vec::new())),
        })
    }

    #[actix_web::test]
    async fn test_chat_roundtrip_and_history() {
        let dir = TempDir::new().unwrap();
        let state = state_with_case(&dir, "I haven't slept in a week.");
        let app = test::init_service(
            App::new().app_data(state).service(
                web::scope("/api")
                    .service(chat)
                    .service(chat_history),
            ),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/chat")
            .set_json(serde_json::json!({
                "session_id": "s1",
                "case_id": "case_001",
                "message": "How are you sleeping?"
            }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["response"], "I haven't slept in a week.");
        assert_eq!(body["case_id"], "case_001");

        let req = test::TestRequest::get()
            .uri("/api/chat/history/s1")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][1]["role"], "assistant");
    }

    #[actix_web::test]
    async fn test_chat_unknown_case_is_404() {
        let dir = TempDir::new().unwrap();
        let state = state_with_case(&dir, "unused");
        let app =
            test::init_service(App::new().app_data(state).service(web::scope("/api").service(chat)))
                .await;

        let req = test::TestRequest::post()
            .uri("/api/chat")
            .set_json(serde_json::json!({
                "session_id": "s1",
                "case_id": "nope",
                "message": "Hello"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn test_empty_message_is_rejected() {
        let dir = TempDir::new().unwrap();
        let state = state_with_case(&dir, "unused");
        let app =
            test::init_service(App::new().app_data(state).service(web::scope("/api").service(chat)))
                .await;

        let req = test::TestRequest::post()
            .uri("/api/chat")
            .set_json(serde_json::json!({
                "session_id": "s1",
                "case_id": "case_001",
                "message": ""
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_evaluate_degrades_to_200() {
        let dir = TempDir::new().unwrap();
        let state = state_with_case(&dir, "not json at all");
        let app = test::init_service(
            App::new()
                .app_data(state)
                .service(web::scope("/api").service(evaluate)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/evaluate")
            .set_json(serde_json::json!({
                "session_id": "s1",
                "case_id": "case_001",
                "messages": [{"role": "user", "content": "How is your sleep?"}]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["scores"]["overall_score"], 0.0);
        assert_eq!(body["feedback"], "Error evaluating conversation");
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn test_case_endpoints() {
        let dir = TempDir::new().unwrap();
        let state = state_with_case(&dir, "unused");
        let app = test::init_service(
            App::new().app_data(state).service(
                web::scope("/api")
                    .service(list_cases)
                    .service(get_case),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/cases").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let req = test::TestRequest::get()
            .uri("/api/cases/case_001")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["patient_name"], "Sarah Chen");

        let req = test::TestRequest::get()
            .uri("/api/cases/unknown")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }
}
