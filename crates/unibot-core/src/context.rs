use serde::{Deserialize, Serialize};

/// A single entry in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEntry {
    /// "user" or "assistant".
    pub role: String,
    /// The message content.
    pub content: String,
}

/// Conversation context passed to an LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// System prompt sent ahead of the conversation.
    pub system_prompt: String,
    /// Conversation history (oldest first).
    pub history: Vec<ContextEntry>,
    /// The current user message.
    pub current_message: String,
    /// Override the provider's default model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Override the provider's default temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A structured message for API-based providers (OpenAI, Anthropic, etc.).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    /// "user" or "assistant".
    pub role: String,
    /// The message content.
    pub content: String,
}

impl Context {
    /// A single-turn context with no system prompt.
    ///
    /// Retrieval prompts carry their instructions inline, so most calls use this.
    pub fn new(message: &str) -> Self {
        Self {
            system_prompt: String::new(),
            history: Vec::new(),
            current_message: message.to_string(),
            model: None,
            temperature: None,
        }
    }

    /// A single-turn context with a system prompt.
    pub fn with_system(system: &str, message: &str) -> Self {
        Self {
            system_prompt: system.to_string(),
            ..Self::new(message)
        }
    }

    /// Flatten the context into one labelled transcript, for logs and the CLI.
    pub fn to_prompt_string(&self) -> String {
        let mut parts = Vec::new();

        if !self.system_prompt.is_empty() {
            parts.push(format!("[System]\n{}", self.system_prompt));
        }

        for entry in &self.history {
            let role = if entry.role == "user" { "User" } else { "Assistant" };
            parts.push(format!("[{role}]\n{}", entry.content));
        }

        parts.push(format!("[User]\n{}", self.current_message));
        parts.join("\n\n")
    }

    /// Convert context to structured API messages.
    ///
    /// Returns `(system_prompt, messages)`. The system prompt is separated
    /// because Anthropic and Gemini require it outside the messages array.
    pub fn to_api_messages(&self) -> (String, Vec<ApiMessage>) {
        let mut messages: Vec<ApiMessage> = self
            .history
            .iter()
            .map(|entry| ApiMessage {
                role: entry.role.clone(),
                content: entry.content.clone(),
            })
            .collect();

        messages.push(ApiMessage {
            role: "user".to_string(),
            content: self.current_message.clone(),
        });

        (self.system_prompt.clone(), messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_api_messages_separates_system() {
        let mut ctx = Context::with_system("Be brief.", "Where is the library?");
        ctx.history.push(ContextEntry {
            role: "assistant".into(),
            content: "Hi!".into(),
        });
        let (system, messages) = ctx.to_api_messages();
        assert_eq!(system, "Be brief.");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "assistant");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "Where is the library?");
    }

    #[test]
    fn test_to_prompt_string_labels_turns() {
        let ctx = Context::new("When does the servery open?");
        assert_eq!(ctx.to_prompt_string(), "[User]\nWhen does the servery open?");

        let ctx = Context::with_system("Answer briefly.", "Hi");
        assert_eq!(ctx.to_prompt_string(), "[System]\nAnswer briefly.\n\n[User]\nHi");
    }
}
