use serde::{Deserialize, Serialize};

fn default_difficulty() -> String {
    "medium".to_string()
}

/// A simulated patient case record. Loaded once from its JSON file and never
/// mutated afterwards; the `id` is unique across the case directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    pub patient_name: String,
    pub age: u32,
    pub gender: String,
    pub chief_complaint: String,
    pub condition: String,
    pub background: String,
    pub symptoms: String,
    pub medical_history: String,
    #[serde(default = "default_difficulty")]
    pub difficulty_level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_questions: Option<Vec<String>>,
}
