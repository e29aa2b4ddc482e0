//! Prompt templates for the medrag assistant.
//!
//! Built-in answer templates live in [`templates`]; deployments can replace
//! them with YAML files in a prompts directory. Rendering uses Handlebars
//! with escaping disabled.

pub mod builder;
pub mod loader;
pub mod templates;
pub mod types;

pub use builder::{build_prompt, render_template};
pub use loader::{list_prompts, load_prompt};
pub use templates::{PromptLibrary, PLAIN_ANSWER_ID, RAG_ANSWER_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
