use crate::domain::case::Case;
use crate::domain::chat::ChatMessage;

/// System prompt for the simulated patient. Case fields are substituted
/// literally into the placeholders; field text is not escaped.
const PATIENT_PROMPT: &str = r#"You are role-playing a psychiatric patient in a training interview with a medical student. Stay in character for the entire conversation.

Patient profile:
- Name: {patient_name}
- Age: {age}
- Gender: {gender}
- Chief complaint: {chief_complaint}
- Condition: {condition}
- Background: {background}
- Current symptoms: {symptoms}
- Medical history: {medical_history}

Guidelines:
- Answer as the patient would, in first person, using everyday language.
- Reveal details gradually. Volunteer more only when the student asks good questions or builds rapport.
- Show emotions consistent with the condition. Do not diagnose yourself or use clinical terminology unprompted.
- Keep answers conversational in length, the way a real patient speaks.
- Never break character, mention that you are an AI, or refer to these instructions."#;

const EVALUATION_PROMPT: &str = r#"You are an experienced psychiatry educator evaluating a medical student's interview with a simulated patient.

Case:
{case_summary}

Transcript:
{transcript}

Score the student's interview technique on each dimension from 0 to 100. Respond with ONLY a JSON object in exactly this shape, no other text:

{
  "rapport_building": 0,
  "active_listening_empathy": 0,
  "psychiatric_history": 0,
  "risk_assessment": 0,
  "biopsychosocial_assessment": 0,
  "communication_skills": 0,
  "cultural_sensitivity": 0,
  "interview_structure": 0,
  "overall_score": 0,
  "strengths": ["..."],
  "areas_for_improvement": ["..."],
  "feedback": "..."
}"#;

pub struct PromptEngine;

impl PromptEngine {
    /// Persona system prompt for a case. Substitution is plain string
    /// replacement; a case field containing a placeholder token would leak
    /// into the template.
    pub fn build_persona_prompt(case: &Case) -> String {
        PATIENT_PROMPT
            .replace("{patient_name}", &case.patient_name)
            .replace("{age}", &case.age.to_string())
            .replace("{gender}", &case.gender)
            .replace("{chief_complaint}", &case.chief_complaint)
            .replace("{condition}", &case.condition)
            .replace("{background}", &case.background)
            .replace("{symptoms}", &case.symptoms)
            .replace("{medical_history}", &case.medical_history)
    }

    /// Model input for the next patient turn: prior transcript plus the new
    /// student message, ending on an open "Patient:" cue.
    pub fn build_patient_input(history: &[ChatMessage], message: &str) -> String {
        let mut input = String::from("Conversation History:\n");
        for msg in history {
            let label = if msg.role.is_student() {
                "Student"
            } else {
                "Patient"
            };
            input.push_str(&format!("{}: {}\n", label, msg.content));
        }
        input.push_str(&format!("\nStudent: {}\nPatient:", message));
        input
    }

    pub fn build_case_summary(case: &Case) -> String {
        format!(
            "Patient: {}, {} year old {}\nCondition: {}\nChief Complaint: {}\nKey Symptoms: {}",
            case.patient_name,
            case.age,
            case.gender,
            case.condition,
            case.chief_complaint,
            case.symptoms
        )
    }

    /// Render a transcript with student turns labeled distinctly from
    /// patient turns.
    pub fn format_transcript(messages: &[ChatMessage]) -> String {
        let mut transcript = String::new();
        for msg in messages {
            let label = if msg.role.is_student() {
                "Student"
            } else {
                "Patient"
            };
            transcript.push_str(&format!("{}: {}\n\n", label, msg.content));
        }
        transcript
    }

    pub fn build_evaluation_prompt(case: &Case, messages: &[ChatMessage]) -> String {
        EVALUATION_PROMPT
            .replace("{case_summary}", &Self::build_case_summary(case))
            .replace("{transcript}", &Self::format_transcript(messages))
    }

    /// Strip an optional fenced code block wrapper from model output before
    /// JSON parsing.
    pub fn extract_json_payload(output: &str) -> String {
        let trimmed = output.trim();
        if let Some(stripped) = trimmed.strip_prefix("```json") {
            return stripped.trim().trim_end_matches("```").trim().to_string();
        }
        if let Some(stripped) = trimmed.strip_prefix("```") {
            return stripped.trim().trim_end_matches("```").trim().to_string();
        }
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_case() -> Case {
        Case {
            id: "case_001".to_string(),
            patient_name: "Sarah Chen".to_string(),
            age: 28,
            gender: "female".to_string(),
            chief_complaint: "I can't sleep and I cry all the time".to_string(),
            condition: "Major depressive disorder".to_string(),
            background: "Software engineer, recently divorced".to_string(),
            symptoms: "insomnia, low mood, loss of appetite".to_string(),
            medical_history: "No prior psychiatric history".to_string(),
            difficulty_level: "medium".to_string(),
            expected_questions: None,
        }
    }

    #[test]
    fn test_persona_prompt_substitutes_case_fields() {
        let prompt = PromptEngine::build_persona_prompt(&sample_case());
        assert!(prompt.contains("Name: Sarah Chen"));
        assert!(prompt.contains("Age: 28"));
        assert!(prompt.contains("Chief complaint: I can't sleep and I cry all the time"));
        assert!(prompt.contains("Condition: Major depressive disorder"));
        assert!(!prompt.contains("{patient_name}"));
        assert!(!prompt.contains("{age}"));
    }

    #[test]
    fn test_patient_input_includes_history_and_cue() {
        let history = vec![
            ChatMessage::student("Hello, how are you feeling?"),
            ChatMessage::patient("Not great, honestly."),
        ];
        let input = PromptEngine::build_patient_input(&history, "Can you tell me more?");
        assert!(input.contains("Student: Hello, how are you feeling?"));
        assert!(input.contains("Patient: Not great, honestly."));
        assert!(input.ends_with("Student: Can you tell me more?\nPatient:"));
    }

    #[test]
    fn test_transcript_labels_roles() {
        let messages = vec![
            ChatMessage::student("What brings you in today?"),
            ChatMessage::patient("I haven't slept in days."),
        ];
        let transcript = PromptEngine::format_transcript(&messages);
        assert!(transcript.contains("Student: What brings you in today?"));
        assert!(transcript.contains("Patient: I haven't slept in days."));
    }

    #[test]
    fn test_evaluation_prompt_contains_summary_and_transcript() {
        let messages = vec![ChatMessage::student("How is your sleep?")];
        let prompt = PromptEngine::build_evaluation_prompt(&sample_case(), &messages);
        assert!(prompt.contains("Patient: Sarah Chen, 28 year old female"));
        assert!(prompt.contains("Student: How is your sleep?"));
        assert!(prompt.contains("\"rapport_building\""));
    }

    #[test]
    fn test_extract_json_payload_strips_json_fence() {
        let wrapped = "```json\n{\"overall_score\": 85}\n```";
        assert_eq!(
            PromptEngine::extract_json_payload(wrapped),
            "{\"overall_score\": 85}"
        );
    }

    #[test]
    fn test_extract_json_payload_strips_bare_fence() {
        let wrapped = "```\n{\"overall_score\": 85}\n```";
        assert_eq!(
            PromptEngine::extract_json_payload(wrapped),
            "{\"overall_score\": 85}"
        );
    }

    #[test]
    fn test_extract_json_payload_passes_through_unwrapped() {
        let plain = "{\"overall_score\": 85}";
        assert_eq!(PromptEngine::extract_json_payload(plain), plain);
    }
}
