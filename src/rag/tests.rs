use super::*;
use crate::testing::{ConstEmbedder, MemoryStore, ScriptedProvider};
use unibot_core::document::Document;

fn faq_doc(question: &str) -> Document {
    Document::new(format!("Question: {question}\nAnswer: yes"))
        .with_meta("type", "faq")
        .with_meta("question", question)
        .with_meta("tool", "qa")
}

fn location_doc(name: &str) -> Document {
    Document::new(format!("Location: {name}"))
        .with_meta("type", "location")
        .with_meta("name", name)
        .with_meta("tool", "location")
}

fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with(vec![
        (faq_doc("Laundry"), 0.9),
        (location_doc("Ocean Lab"), 0.7),
        (location_doc("IRC"), 0.4),
        (
            Document::new("Required courses for First Year in Physics")
                .with_meta("type", "handbook_courses")
                .with_meta("major", "Physics")
                .with_meta("tool", "handbook"),
            0.8,
        ),
    ]))
}

fn chains(store: Arc<MemoryStore>) -> Chains {
    Chains::new(Arc::new(ConstEmbedder), store, &RetrievalConfig::default())
}

#[tokio::test]
async fn test_general_chain_applies_threshold() {
    let chains = chains(store());
    let hits = chains.general.retrieve("anything").await.unwrap();
    let contents: Vec<&str> = hits.iter().map(|h| h.document.content.as_str()).collect();
    // IRC scores 0.4, below the 0.5 default.
    assert_eq!(contents.len(), 3);
    assert!(!contents.contains(&"Location: IRC"));
}

#[tokio::test]
async fn test_scoped_chain_filters_by_tool() {
    let store = store();
    let chains = chains(store.clone());
    let hits = chains.location.retrieve("where").await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.document.meta_str("tool") == Some("location")));
    assert_eq!(
        store.searches.lock().unwrap().last(),
        Some(&DocFilter::tool("location"))
    );
}

#[tokio::test]
async fn test_invoke_stuffs_context_into_prompt() {
    let chains = chains(store());
    let provider = ScriptedProvider::new("mistral").reply("  The Ocean Lab is by the lake.  ");

    let answer = chains
        .location
        .invoke(&provider, "Where is the Ocean Lab?")
        .await
        .unwrap();

    assert_eq!(answer.text, "The Ocean Lab is by the lake.");
    assert_eq!(answer.provider, "mistral");
    let prompt = &provider.prompts()[0];
    assert!(prompt.contains("Context:\nLocation: Ocean Lab\n\nLocation: IRC\n"));
    assert!(prompt.contains("Question: Where is the Ocean Lab?"));
}

#[tokio::test]
async fn test_empty_retrieval_still_calls_provider() {
    let chains = chains(Arc::new(MemoryStore::default()));
    let provider = ScriptedProvider::new("openai").reply("I don't know.");
    let answer = chains.faq.invoke(&provider, "laundry?").await.unwrap();
    assert_eq!(answer.text, "I don't know.");
    assert!(answer.sources.is_empty());
    assert_eq!(provider.prompts().len(), 1);
}

#[tokio::test]
async fn test_provider_error_propagates() {
    let chains = chains(store());
    let provider = ScriptedProvider::new("openai").fail("openai returned 500: boom");
    let err = chains.general.invoke(&provider, "hi").await.unwrap_err();
    assert!(err.to_string().contains("boom"));
}

#[tokio::test]
async fn test_handbook_chain_uses_handbook_template_and_sources() {
    let chains = chains(store());
    let provider = ScriptedProvider::new("mistral").reply("Take Classical Physics.");
    let answer = chains
        .handbook
        .invoke(&provider, "What do physics students take in year one?")
        .await
        .unwrap();
    assert!(provider.prompts()[0].starts_with("You are a knowledgeable assistant"));
    assert_eq!(
        answer.with_handbook_sources(),
        "Take Classical Physics.\n\n*Sources:* Physics"
    );
}

#[test]
fn test_format_sources_sorted_and_deduplicated() {
    let hits: Vec<ScoredDocument> = [
        location_doc("Ocean Lab"),
        faq_doc("Laundry"),
        location_doc("Ocean Lab"),
        Document::new("Locker access").with_meta("type", "locker"),
    ]
    .into_iter()
    .map(|document| ScoredDocument {
        document,
        similarity: 1.0,
    })
    .collect();

    assert_eq!(
        format_sources(&hits).as_deref(),
        Some("\n\n*Sources:*\n- FAQ: Laundry\n- Location: Ocean Lab")
    );
    assert_eq!(format_sources(&hits[3..]), None);
}

#[test]
fn test_answer_with_sources_without_sources() {
    let answer = Answer {
        text: "Hi".into(),
        sources: Vec::new(),
        provider: "mistral".into(),
        elapsed_ms: 1,
    };
    assert_eq!(answer.with_sources(), "Hi");
    assert_eq!(answer.with_handbook_sources(), "Hi");
}
