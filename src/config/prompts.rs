//! Prompt templates for Legis.
//!
//! Prompts can be customized by placing a `rag.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for the chat engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    /// System prompt sent with every answer.
    pub system: String,
    /// Wraps retrieved passages. Variables: `context`.
    pub context: String,
    /// Rewrites a follow-up into a standalone question. Variables: `history`, `question`.
    pub condense: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an expert on the 118th Congress's Senate Hearings.
Your role is to provide detailed, accurate information about legislation, hearings, and congressional activities.
When asked about specific legislation or hearings, provide relevant details from the documents.
If you don't know something, say so rather than making up information.
Keep your answers focused on the actual content from the Senate hearings."#
                .to_string(),

            context: r#"Excerpts from the legislative document collection are below.
--------------------
{{context}}
--------------------
Use these excerpts, together with the conversation so far, to answer the next message.
If the excerpts do not cover the question, say so."#
                .to_string(),

            condense: r#"Below is a conversation about Senate legislation and hearings, followed by a new message.
Rewrite the new message as a single standalone question that keeps every detail needed to search the documents.
Reply with the question only.

Conversation:
{{history}}

New message: {{question}}

Standalone question:"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
