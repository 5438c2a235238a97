use crate::domain::chat::ChatMessage;
use crate::domain::evaluation::ConversationMetrics;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static WORD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());

/// Closed clinical vocabulary for the information-density statistic.
static MEDICAL_TERMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "symptoms",
        "depression",
        "anxiety",
        "mood",
        "sleep",
        "appetite",
        "suicidal",
        "therapy",
        "medication",
        "diagnosis",
        "treatment",
        "psychiatric",
        "mental",
        "stress",
        "trauma",
        "bipolar",
        "panic",
        "obsessive",
        "compulsive",
        "psychotic",
        "hallucination",
        "delusion",
        "mania",
        "substance",
        "alcohol",
        "drug",
        "withdrawal",
        "ptsd",
    ]
    .into_iter()
    .collect()
});

static POSITIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "thank",
        "understand",
        "help",
        "support",
        "appreciate",
        "sorry",
        "concerned",
        "care",
        "comfort",
        "safe",
        "better",
        "hope",
    ]
    .into_iter()
    .collect()
});

static NEGATIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "wrong", "bad", "fault", "blame", "stupid", "waste", "annoying", "bother", "problem",
        "difficult", "harsh",
    ]
    .into_iter()
    .collect()
});

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn student_tokens(message: &ChatMessage) -> Vec<String> {
    WORD_PATTERN
        .find_iter(&message.content.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Fraction of student word tokens that exactly match the clinical
/// vocabulary. Counts every occurrence; 0.0 when the student produced no
/// tokens.
pub fn information_density(messages: &[ChatMessage]) -> f64 {
    let mut total_words = 0usize;
    let mut medical_hits = 0usize;

    for msg in messages.iter().filter(|m| m.role.is_student()) {
        for token in student_tokens(msg) {
            total_words += 1;
            if MEDICAL_TERMS.contains(token.as_str()) {
                medical_hits += 1;
            }
        }
    }

    if total_words == 0 {
        return 0.0;
    }
    round3(medical_hits as f64 / total_words as f64)
}

/// (positive - negative) / (positive + negative) over the *set* of distinct
/// student tokens, so a repeated word counts at most once per vocabulary
/// term. 0.0 when no emotionally loaded word appears.
pub fn emotional_tendency(messages: &[ChatMessage]) -> f64 {
    let words: HashSet<String> = messages
        .iter()
        .filter(|m| m.role.is_student())
        .flat_map(|m| student_tokens(m))
        .collect();

    let positive_count = words
        .iter()
        .filter(|w| POSITIVE_WORDS.contains(w.as_str()))
        .count();
    let negative_count = words
        .iter()
        .filter(|w| NEGATIVE_WORDS.contains(w.as_str()))
        .count();

    let total = positive_count + negative_count;
    if total == 0 {
        return 0.0;
    }
    round3((positive_count as f64 - negative_count as f64) / total as f64)
}

/// Mean whitespace-split word count per student turn; 0.0 with no student
/// turns.
pub fn response_length(messages: &[ChatMessage]) -> f64 {
    let student_messages: Vec<&ChatMessage> =
        messages.iter().filter(|m| m.role.is_student()).collect();

    if student_messages.is_empty() {
        return 0.0;
    }

    let total_length: usize = student_messages
        .iter()
        .map(|m| m.content.split_whitespace().count())
        .sum();

    round2(total_length as f64 / student_messages.len() as f64)
}

/// Total turn count, every role included.
pub fn turn_number(messages: &[ChatMessage]) -> usize {
    messages.len()
}

pub fn calculate_all(messages: &[ChatMessage]) -> ConversationMetrics {
    ConversationMetrics {
        information_density: information_density(messages),
        emotional_tendency: emotional_tendency(messages),
        response_length: response_length(messages),
        turn_number: turn_number(messages),
    }
}
