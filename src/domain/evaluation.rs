use serde::{Deserialize, Serialize};

/// The nine rubric dimensions, each scored 0-100 by the evaluating model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationScore {
    pub rapport_building: f64,
    pub active_listening_empathy: f64,
    pub psychiatric_history: f64,
    pub risk_assessment: f64,
    pub biopsychosocial_assessment: f64,
    pub communication_skills: f64,
    pub cultural_sensitivity: f64,
    pub interview_structure: f64,
    pub overall_score: f64,
}

/// Descriptive statistics over a transcript. These do not contribute to the
/// rubric score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMetrics {
    pub information_density: f64,
    pub emotional_tendency: f64,
    pub response_length: f64,
    pub turn_number: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub session_id: String,
    pub case_id: String,
    pub scores: EvaluationScore,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub feedback: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ConversationMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
