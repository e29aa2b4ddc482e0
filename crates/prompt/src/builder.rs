//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use medrag_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Variables are inserted verbatim; no HTML escaping is applied and
/// missing variables render as empty strings.
///
/// # Example
/// ```no_run
/// use medrag_prompt::{build_prompt, PromptLibrary, PLAIN_ANSWER_ID};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let library = PromptLibrary::builtin();
/// let def = library.get(PLAIN_ANSWER_ID).unwrap();
///
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "What is the dose?".to_string());
///
/// let built = build_prompt(def, &vars)?;
/// println!("{}", built.text);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: &HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let text = render_template(&definition.template, variables)?;

    let mut resolved: Vec<String> = variables.keys().cloned().collect();
    resolved.sort();

    Ok(BuiltPrompt::new(text, definition.id.clone(), resolved))
}

/// Render a Handlebars template with variables.
pub fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
