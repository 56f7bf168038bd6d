use super::*;
use crate::handlers::{HandlerContext, Responder};
use crate::testing::{knowledge, MemoryStore, RecordingChannel, ScriptedProvider, Sent, StaticCatalog};
use std::sync::Arc;
use unibot_core::traits::Provider;

fn choice() -> ProviderChoice {
    ProviderChoice::new(
        Arc::new(ScriptedProvider::new("mistral")),
        vec![
            Arc::new(ScriptedProvider::new("openai")) as Arc<dyn Provider>,
            Arc::new(ScriptedProvider::new("mistral")),
        ],
    )
}

/// Run a command against a recording channel.
async fn run(text: &str, provider: ScriptedProvider) -> (Handled, RecordingChannel) {
    let kb = knowledge(
        Arc::new(MemoryStore::default()),
        Some(Arc::new(StaticCatalog::new(&["Physics"]))),
    );
    let providers = choice();
    let channel = RecordingChannel::default();
    let cmd = Command::parse(text).unwrap();
    let args = args(text);
    let handled = {
        let reply = Responder::new(&channel, Some("42".to_string()));
        let handler = HandlerContext {
            kb: &kb,
            provider: &provider,
            reply: &reply,
        };
        let ctx = CommandContext {
            handler: &handler,
            sender_id: "42",
            first_name: Some("Ada"),
            args: &args,
            providers: &providers,
        };
        handle(cmd, &ctx).await
    };
    (handled, channel)
}

#[test]
fn test_parse_all_commands() {
    assert_eq!(Command::parse("/start"), Some(Command::Start));
    assert_eq!(Command::parse("/help"), Some(Command::Help));
    assert_eq!(Command::parse("/where Ocean Lab"), Some(Command::Where));
    assert_eq!(Command::parse("/find printer"), Some(Command::Find));
    assert_eq!(Command::parse("/handbook physics"), Some(Command::Handbook));
    assert_eq!(Command::parse("/providers"), Some(Command::Providers));
    assert_eq!(Command::parse("/provider openai"), Some(Command::Provider));
}

#[test]
fn test_parse_commands_with_botname_suffix() {
    assert_eq!(Command::parse("/help@unibot"), Some(Command::Help));
    assert_eq!(Command::parse("/where@unibot IRC"), Some(Command::Where));
}

#[test]
fn test_parse_unknown_and_plain_text() {
    assert_eq!(Command::parse("/weather"), None);
    assert_eq!(Command::parse("where is the IRC?"), None);
    assert_eq!(Command::parse(""), None);
}

#[test]
fn test_args_normalises_whitespace() {
    assert_eq!(args("/where   Ocean    Lab "), "Ocean Lab");
    assert_eq!(args("/where"), "");
}

#[tokio::test]
async fn test_start_greets_by_first_name() {
    let (handled, channel) = run("/start", ScriptedProvider::new("mistral")).await;
    assert!(handled.ok);
    assert_eq!(
        channel.texts(),
        vec!["Hi Ada! I'm your University Info Bot. Ask me any question about college schedules, fees, or events!"]
    );
}

#[tokio::test]
async fn test_help_is_markdown() {
    let (_, channel) = run("/help", ScriptedProvider::new("mistral")).await;
    let messages = channel.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].markdown);
    assert!(messages[0].text.contains("/where [location]"));
    assert!(messages[0].text.contains("/find [feature]"));
    assert!(messages[0].text.contains("`/where [location]`: Find places on campus"));
    assert!(!messages[0].text.contains('\u{2014}'));
}

#[tokio::test]
async fn test_where_without_args_shows_usage() {
    let (_, channel) = run("/where", ScriptedProvider::new("mistral")).await;
    assert_eq!(channel.texts(), vec![WHERE_USAGE]);
}

#[tokio::test]
async fn test_where_finds_alias() {
    let (handled, channel) = run("/where is the IRC?", ScriptedProvider::new("mistral")).await;
    assert!(handled.ok);
    let sent = channel.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[0]
        .text()
        .is_some_and(|t| t.starts_with("📍 *Information Resource Center*")));
    assert!(matches!(&sent[1], Sent::Venue(v) if v.title == "Information Resource Center"));
}

#[tokio::test]
async fn test_where_miss() {
    let (_, channel) = run("/where zzz", ScriptedProvider::new("mistral")).await;
    assert_eq!(channel.texts(), vec![WHERE_MISS]);
}

#[tokio::test]
async fn test_find_without_args_shows_usage() {
    let (_, channel) = run("/find", ScriptedProvider::new("mistral")).await;
    assert_eq!(channel.texts(), vec![FIND_USAGE]);
}

#[tokio::test]
async fn test_find_several_places_shows_picker() {
    let (handled, channel) = run("/find printer", ScriptedProvider::new("mistral")).await;
    assert_eq!(
        handled.output,
        "I found 2 places with printer. Which one would you like to see?"
    );
    let messages = channel.messages();
    let buttons: Vec<&str> = messages[0]
        .keyboard
        .iter()
        .map(|row| row[0].callback_data.as_str())
        .collect();
    assert_eq!(buttons, vec!["location:1", "location:3"]);
}

#[tokio::test]
async fn test_find_single_place_shows_card() {
    let (_, channel) = run("/find coffee", ScriptedProvider::new("mistral")).await;
    let sent = channel.sent();
    assert!(sent[0].text().is_some_and(|t| t.starts_with("📍 *Coffee Bar*")));
    assert!(matches!(&sent[1], Sent::Venue(_)));
}

#[tokio::test]
async fn test_find_unknown_feature_falls_back_to_ai() {
    let provider = ScriptedProvider::new("mistral").reply("Ocean Lab");
    let (handled, channel) = run("/find swimming pool", provider).await;

    let texts = channel.texts();
    assert_eq!(texts[0], FIND_MISS);
    assert!(texts[1].starts_with("📍 *Ocean Lab*"));
    assert!(handled.ok);
}

#[tokio::test]
async fn test_handbook_command_delivers_document() {
    let (handled, channel) = run("/handbook physics", ScriptedProvider::new("mistral")).await;
    assert!(handled.ok);
    assert!(channel
        .sent()
        .iter()
        .any(|s| matches!(s, Sent::Document(d) if d.file_name == "physics_handbook.pdf")));
}

#[tokio::test]
async fn test_providers_lists_all_once() {
    let (handled, _) = run("/providers", ScriptedProvider::new("mistral")).await;
    assert_eq!(handled.output.matches("mistral").count(), 1);
    assert!(handled.output.contains("openai"));
    assert!(handled.output.contains("default ✅"));
}

#[tokio::test]
async fn test_provider_switch_and_reset() {
    let providers = choice();
    assert_eq!(providers.for_sender("7").await.name(), "mistral");

    let reply = providers.apply("7", "OpenAI").await;
    assert_eq!(reply, "Switched to openai (test-model).");
    assert_eq!(providers.for_sender("7").await.name(), "openai");
    assert_eq!(providers.for_sender("8").await.name(), "mistral");

    let reply = providers.apply("7", "reset").await;
    assert_eq!(reply, "Switched back to the default provider (mistral).");
    assert_eq!(providers.for_sender("7").await.name(), "mistral");
}

#[tokio::test]
async fn test_provider_unknown_name() {
    let providers = choice();
    assert_eq!(
        providers.apply("7", "llama").await,
        "Unknown provider 'llama'. Available: mistral, openai."
    );
    assert!(providers.apply("7", "").await.starts_with("You're using mistral"));
}
