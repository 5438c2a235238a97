use crate::application::use_cases::metrics_service;
use crate::application::use_cases::prompt_engine::PromptEngine;
use crate::domain::chat::ChatMessage;
use crate::domain::error::{AppError, Result};
use crate::domain::evaluation::{EvaluationResult, EvaluationScore};
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::case_store::CaseRepository;
use crate::infrastructure::llm_clients::LLMClient;
use serde::Deserialize;
use std::sync::Arc;

/// Rubric JSON as returned by the evaluating model. Every field defaults, so
/// a well-formed object with missing keys still parses; anything that is not
/// a JSON object fails and degrades.
#[derive(Debug, Default, Deserialize)]
struct RubricOutput {
    #[serde(default)]
    rapport_building: f64,
    #[serde(default)]
    active_listening_empathy: f64,
    #[serde(default)]
    psychiatric_history: f64,
    #[serde(default)]
    risk_assessment: f64,
    #[serde(default)]
    biopsychosocial_assessment: f64,
    #[serde(default)]
    communication_skills: f64,
    #[serde(default)]
    cultural_sensitivity: f64,
    #[serde(default)]
    interview_structure: f64,
    #[serde(default)]
    overall_score: f64,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    areas_for_improvement: Vec<String>,
    #[serde(default)]
    feedback: String,
}

pub struct EvaluationService {
    cases: Arc<CaseRepository>,
    llm: Arc<dyn LLMClient>,
    llm_config: LLMConfig,
}

impl EvaluationService {
    pub fn new(cases: Arc<CaseRepository>, llm: Arc<dyn LLMClient>, llm_config: LLMConfig) -> Self {
        Self {
            cases,
            llm,
            llm_config,
        }
    }

    /// Evaluate the student's interview over the given transcript.
    ///
    /// Never fails at this boundary: an unknown case, a model failure or
    /// malformed model output all degrade to a zero-scored result with the
    /// `error` field set. Evaluation is advisory and must not break a
    /// student session.
    pub async fn evaluate(
        &self,
        session_id: &str,
        case_id: &str,
        messages: &[ChatMessage],
    ) -> EvaluationResult {
        match self.run_evaluation(case_id, messages).await {
            Ok(rubric) => EvaluationResult {
                session_id: session_id.to_string(),
                case_id: case_id.to_string(),
                scores: EvaluationScore {
                    rapport_building: rubric.rapport_building,
                    active_listening_empathy: rubric.active_listening_empathy,
                    psychiatric_history: rubric.psychiatric_history,
                    risk_assessment: rubric.risk_assessment,
                    biopsychosocial_assessment: rubric.biopsychosocial_assessment,
                    communication_skills: rubric.communication_skills,
                    cultural_sensitivity: rubric.cultural_sensitivity,
                    interview_structure: rubric.interview_structure,
                    overall_score: rubric.overall_score,
                },
                strengths: rubric.strengths,
                areas_for_improvement: rubric.areas_for_improvement,
                feedback: rubric.feedback,
                metrics: Some(metrics_service::calculate_all(messages)),
                error: None,
            },
            Err(err) => Self::degraded_result(session_id, case_id, err.to_string()),
        }
    }

    async fn run_evaluation(&self, case_id: &str, messages: &[ChatMessage]) -> Result<RubricOutput> {
        let case = self
            .cases
            .get(case_id)?
            .ok_or_else(|| AppError::NotFound(format!("Case {} not found", case_id)))?;

        let prompt = PromptEngine::build_evaluation_prompt(&case, messages);
        let output = self.llm.generate(&self.llm_config, "", &prompt).await?;

        let payload = PromptEngine::extract_json_payload(&output);
        serde_json::from_str(&payload).map_err(|err| {
            AppError::ParseError(format!(
                "Evaluation output is not valid JSON: {} (raw output: {})",
                err, output
            ))
        })
    }

    fn degraded_result(session_id: &str, case_id: &str, error: String) -> EvaluationResult {
        EvaluationResult {
            session_id: session_id.to_string(),
            case_id: case_id.to_string(),
            scores: EvaluationScore::default(),
            strengths: Vec::new(),
            areas_for_improvement: Vec::new(),
            feedback: "Error evaluating conversation".to_string(),
            metrics: None,
            error: Some(error),
        }
    }
}
