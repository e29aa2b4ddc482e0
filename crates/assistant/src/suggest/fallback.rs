//! Static follow-up questions used when mining comes up short.

const FALLBACK_QUESTIONS: [&str; 4] = [
    "How to create a new patient registration?",
    "How to assign a bed to a patient?",
    "How to view items present in the inventory store?",
    "How to generate a hospital bill?",
];

/// The default follow-up questions, always in the same order.
pub fn fallback_questions() -> Vec<String> {
    FALLBACK_QUESTIONS.iter().map(|q| q.to_string()).collect()
}
