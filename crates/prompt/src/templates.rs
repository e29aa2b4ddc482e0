//! Built-in prompt templates and the override-aware template library.

use crate::loader::{list_prompts, load_prompt};
use crate::types::PromptDefinition;
use std::collections::HashMap;
use std::path::Path;

/// Retrieval-augmented answer prompt.
pub const RAG_ANSWER_ID: &str = "answer.rag";

/// Context-free answer prompt.
pub const PLAIN_ANSWER_ID: &str = "answer.plain";

/// Instruction block for clinical answers. Variables: `history`, `context`, `question`.
const RAG_ANSWER_TEMPLATE: &str = r#"You are a clinical documentation assistant that helps healthcare providers extract and analyse patient information from medical records, discharge summaries, clinical notes and external lab reports. Answer accurately and concisely using only the material between the <context> and </context> tags, taking earlier exchanges between the <chat_history> and </chat_history> tags into account.

### Answering
- Answer the query directly, using precise medical terminology where it fits.
- Pull patient information out of the context and organise it clearly.
- When a query holds several clinical questions, answer each in its own labelled section.
- When asked for a complete summary of a report, give every detail the context holds, grouped by category.
- Prefer bullet points, short paragraphs or tables, and surface key findings, diagnoses, treatments and recommendations.
- When information is missing, say: "The patient record does not contain information about that specific question."
- Do not speculate, do not use outside knowledge, and do not elaborate unless a full summary was requested.

### Patient identity
- Identify the patient the query refers to and check whether it matches the context or differs from the chat history.
- When the query names a different patient (by name, ID or case), answer only from the current context for that patient.
- When the context has nothing on the queried patient, say: "I don't have information about that patient in the current records. The information I have is for [current patient name/ID]."
- When the patient's identity is unclear, say: "Patient identity is unclear in the context; using available data for [current patient name/ID if determinable]."
- Never combine data belonging to different patients.

### External lab reports
- Match a lab report to the patient by Unique Health ID (UHID) first, then by name (allowing minor spelling variations), then by age, gender, referring doctor and a test date consistent with the treatment timeline.
- Relate lab findings to the clinical history and current presentation, and name the source (for example "Per external lab report").
- When internal and external results conflict, present both and attribute each.
- When lab data is incomplete or cannot be matched, say: "External lab report data is incomplete or does not match the patient reliably."

### Response structure
- Confirm the patient's name or ID when the context provides it.
- Break complex queries into parts and address them in clinical order.
- For complete summaries use these sections: Patient Demographics, Medical History, Diagnoses, Treatments, Procedures, Lab Results, Clinical Notes.
- When the context and the chat history disagree, prefer the more recent context.

<chat_history>
{{history}}
</chat_history>

<context>
{{context}}
</context>

<question>
{{question}}
</question>
"#;

/// Minimal prompt used without retrieval and as the composition fallback.
const PLAIN_ANSWER_TEMPLATE: &str = "Question:\n{{question}}\nAnswer: ";

/// Built-in definitions keyed by id.
pub fn builtin_definitions() -> Vec<PromptDefinition> {
    vec![
        PromptDefinition {
            id: RAG_ANSWER_ID.to_string(),
            title: "Clinical answer with retrieved context".to_string(),
            api_version: "1.0".to_string(),
            created_by: "medrag".to_string(),
            template: RAG_ANSWER_TEMPLATE.to_string(),
        },
        PromptDefinition {
            id: PLAIN_ANSWER_ID.to_string(),
            title: "Plain answer".to_string(),
            api_version: "1.0".to_string(),
            created_by: "medrag".to_string(),
            template: PLAIN_ANSWER_TEMPLATE.to_string(),
        },
    ]
}

/// Set of prompt definitions the composer renders from.
///
/// Starts from the built-ins; a YAML file `<id>.yml` in the overrides
/// directory replaces the built-in with the same id.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    definitions: HashMap<String, PromptDefinition>,
}

impl PromptLibrary {
    /// Library holding only the built-in templates.
    pub fn builtin() -> Self {
        let definitions = builtin_definitions()
            .into_iter()
            .map(|def| (def.id.clone(), def))
            .collect();
        Self { definitions }
    }

    /// Built-ins overlaid with any valid overrides found in `overrides_dir`.
    ///
    /// Files with an unknown id or invalid content are logged and skipped.
    pub fn with_overrides(overrides_dir: Option<&Path>) -> Self {
        let mut library = Self::builtin();

        let Some(dir) = overrides_dir else {
            return library;
        };

        let available = match list_prompts(dir) {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!("Cannot list prompt overrides in {:?}: {}", dir, e);
                return library;
            }
        };

        for id in &available {
            if library.get(id).is_none() {
                tracing::warn!("Ignoring prompt override '{}': no template uses that id", id);
                continue;
            }
            match load_prompt(dir, id) {
                Ok(def) => {
                    tracing::info!("Using prompt override for '{}' from {:?}", id, dir);
                    library.definitions.insert(id.clone(), def);
                }
                Err(e) => {
                    tracing::warn!("Ignoring invalid prompt override '{}': {}", id, e);
                }
            }
        }

        library
    }

    /// Look up a definition by id.
    pub fn get(&self, id: &str) -> Option<&PromptDefinition> {
        self.definitions.get(id)
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_library() {
        let library = PromptLibrary::builtin();
        let rag = library.get(RAG_ANSWER_ID).unwrap();
        assert!(rag.template.contains("<context>"));
        assert!(rag.template.contains("Never combine data belonging to different patients"));
        assert!(library.get(PLAIN_ANSWER_ID).is_some());
        assert!(library.get("answer.unknown").is_none());
    }

    #[test]
    fn test_override_replaces_builtin() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("answer.plain.yml"),
            r#"
id: answer.plain
title: Short answer
apiVersion: "1.1"
template: "Q: {{question}}"
"#,
        )
        .unwrap();

        let library = PromptLibrary::with_overrides(Some(temp.path()));
        assert_eq!(library.get(PLAIN_ANSWER_ID).unwrap().template, "Q: {{question}}");
        // Untouched ids keep the built-in
        assert!(library
            .get(RAG_ANSWER_ID)
            .unwrap()
            .template
            .contains("<chat_history>"));
    }

    #[test]
    fn test_unknown_override_id_is_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("answer.triage.yml"),
            r#"
id: answer.triage
title: Triage
apiVersion: "1.0"
template: "{{question}}"
"#,
        )
        .unwrap();

        let library = PromptLibrary::with_overrides(Some(temp.path()));
        assert!(library.get("answer.triage").is_none());
        assert!(library.get(RAG_ANSWER_ID).is_some());
    }

    #[test]
    fn test_invalid_override_is_ignored() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("answer.rag.yml"), "invalid: yaml: content:").unwrap();

        let library = PromptLibrary::with_overrides(Some(temp.path()));
        assert!(library
            .get(RAG_ANSWER_ID)
            .unwrap()
            .template
            .contains("<question>"));
    }
}
