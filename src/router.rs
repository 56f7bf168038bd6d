//! Query routing: pick the handler for a free-text message.

use crate::campus;
use std::fmt;
use tracing::{info, warn};
use unibot_core::{context::Context, traits::Provider};

/// A message handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Location,
    Locker,
    Servery,
    Handbook,
    Faq,
    Qa,
}

impl Tool {
    /// Scan order when parsing a classifier reply.
    pub const ALL: [Tool; 6] = [
        Tool::Location,
        Tool::Locker,
        Tool::Servery,
        Tool::Handbook,
        Tool::Faq,
        Tool::Qa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Location => "location",
            Tool::Locker => "locker",
            Tool::Servery => "servery",
            Tool::Handbook => "handbook",
            Tool::Faq => "faq",
            Tool::Qa => "qa",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tool::Location => {
                "Helps users find places on campus and provides navigation assistance. \
                 Use for questions about where things are located, how to find specific \
                 facilities like printers, food, or study areas."
            }
            Tool::Locker => {
                "Handles queries about locker hours and access in university colleges. \
                 Use for questions about when lockers can be accessed, their locations, \
                 or basement access times."
            }
            Tool::Servery => {
                "Gives servery (dining hall) and Coffee Bar opening hours. \
                 Use for questions about when breakfast, lunch, dinner or late-night food \
                 is served in a college."
            }
            Tool::Handbook => {
                "Provides program handbooks and answers questions about their contents. \
                 Use for questions about a major's curriculum, modules, required courses \
                 or credits, or requests for a handbook PDF."
            }
            Tool::Faq => {
                "Answers frequently asked student questions from a curated list. \
                 Use for practical procedures like enrollment certificates, laundry, \
                 residence permits, address registration, emergency contacts, \
                 the semester ticket or postal codes."
            }
            Tool::Qa => {
                "Answers general questions about university policies, procedures, events, \
                 and information. Use for inquiries about university services, documents, \
                 procedures, events, deadlines, or any other university-related questions \
                 not specific to lockers or navigation."
            }
        }
    }

    /// Whether the handler calls the LLM and deserves a typing indicator.
    pub fn uses_llm(&self) -> bool {
        !matches!(self, Tool::Locker | Tool::Servery)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const EXAMPLES: &str = r#"Examples:
1. "Where is the library?" → location
2. "How do I get my enrollment certificate?" → faq
3. "When are the locker hours for Krupp College?" → locker
4. "What's the address of the university?" → qa
5. "Where can I print documents?" → location
6. "Tell me about the semester ticket" → faq
7. "How to change my address in Bremen?" → faq
8. "What's the student emergency number?" → faq
9. "Where can I get food on campus?" → location
10. "When is lunch at Krupp on Friday?" → servery
11. "What are the mandatory modules in Computer Science?" → handbook"#;

/// The classification prompt for a query.
pub fn classification_prompt(query: &str) -> String {
    let descriptions = Tool::ALL
        .iter()
        .map(|t| format!("Tool: {}\nDescription: {}", t.as_str(), t.description()))
        .collect::<Vec<_>>()
        .join("\n\n");
    let names = Tool::ALL
        .iter()
        .map(Tool::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are a query classifier for a university chatbot. Your task is to classify \
         the user's query into one of the available tools based on its intent.\n\n\
         Available tools:\n{descriptions}\n\n{EXAMPLES}\n\n\
         User query: \"{query}\"\n\n\
         Analyze the query and determine which tool is most appropriate to handle it. \
         Respond with just the tool name and nothing else. The available tools are: {names}.\n"
    )
}

/// First tool name found in a classifier reply, `qa` if none.
pub fn parse_classification(response: &str) -> Tool {
    let response = response.trim().to_lowercase();
    Tool::ALL
        .into_iter()
        .find(|t| response.contains(t.as_str()))
        .unwrap_or(Tool::Qa)
}

/// Keyword routing used when the LLM is off or fails.
pub fn classify_by_rules(query: &str) -> Tool {
    let q = query.to_lowercase();
    let has = |terms: &[&str]| terms.iter().any(|t| q.contains(t));

    if q.contains("locker") {
        return Tool::Locker;
    }
    if has(&[
        "servery",
        "mensa",
        "dining",
        "breakfast",
        "lunch",
        "dinner",
        "opening hours",
    ]) {
        return Tool::Servery;
    }
    if has(&["handbook", "curriculum", "module", "major"]) {
        return Tool::Handbook;
    }
    if has(&["where", "find", "location", "how to get to", "how do i get to"])
        || !campus::extract_feature_keywords(&q).is_empty()
    {
        return Tool::Location;
    }
    Tool::Qa
}

/// Picks a [`Tool`] for each message.
pub struct ToolClassifier {
    use_llm: bool,
}

impl ToolClassifier {
    pub fn new(use_llm: bool) -> Self {
        Self { use_llm }
    }

    /// Ask the provider, falling back to keyword rules when it fails.
    pub async fn classify(&self, provider: &dyn Provider, query: &str) -> Tool {
        if self.use_llm {
            let context = Context::new(&classification_prompt(query));
            match provider.complete(&context).await {
                Ok(response) => {
                    let tool = parse_classification(&response.text);
                    info!("LLM classified query '{query}' as '{tool}'");
                    return tool;
                }
                Err(e) => warn!("LLM classification failed: {e}, falling back to basic rules"),
            }
        }
        classify_by_rules(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;

    #[test]
    fn test_parse_classification() {
        assert_eq!(parse_classification("Location"), Tool::Location);
        assert_eq!(parse_classification("  locker\n"), Tool::Locker);
        assert_eq!(parse_classification("The tool is: servery"), Tool::Servery);
        assert_eq!(parse_classification("faq"), Tool::Faq);
        assert_eq!(parse_classification("no idea"), Tool::Qa);
        // Scan order decides when several names appear.
        assert_eq!(parse_classification("locker or location"), Tool::Location);
    }

    #[test]
    fn test_rules() {
        assert_eq!(classify_by_rules("When can I open my locker?"), Tool::Locker);
        assert_eq!(classify_by_rules("Where is the locker room"), Tool::Locker);
        assert_eq!(classify_by_rules("Is the mensa open?"), Tool::Servery);
        assert_eq!(classify_by_rules("CS handbook please"), Tool::Handbook);
        assert_eq!(classify_by_rules("Where is the IRC?"), Tool::Location);
        assert_eq!(classify_by_rules("I need a printer"), Tool::Location);
        assert_eq!(classify_by_rules("How much is the semester fee?"), Tool::Qa);
    }

    #[test]
    fn test_prompt_lists_every_tool() {
        let prompt = classification_prompt("Where is the library?");
        for tool in Tool::ALL {
            assert!(prompt.contains(&format!("Tool: {tool}\n")));
        }
        assert!(prompt.contains("User query: \"Where is the library?\""));
        assert!(prompt.contains("The available tools are: location, locker, servery, handbook, faq, qa."));
    }

    #[tokio::test]
    async fn test_classify_uses_llm_reply() {
        let provider = ScriptedProvider::new("mistral").reply("faq");
        let tool = ToolClassifier::new(true)
            .classify(&provider, "Where do I get my Immatrikulationsbescheinigung?")
            .await;
        assert_eq!(tool, Tool::Faq);
        assert!(provider.prompts()[0].starts_with("You are a query classifier"));
    }

    #[tokio::test]
    async fn test_classify_falls_back_to_rules_on_error() {
        let provider = ScriptedProvider::new("mistral").fail("mistral request failed: timeout");
        let tool = ToolClassifier::new(true)
            .classify(&provider, "where is krupp")
            .await;
        assert_eq!(tool, Tool::Location);
    }

    #[tokio::test]
    async fn test_classify_without_llm_skips_provider() {
        let provider = ScriptedProvider::new("mistral");
        let tool = ToolClassifier::new(false).classify(&provider, "locker c3").await;
        assert_eq!(tool, Tool::Locker);
        assert!(provider.prompts().is_empty());
    }
}
