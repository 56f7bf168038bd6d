//! Tests for the Telegram channel module.

use super::polling::{denied_callback, to_incoming};
use super::send::{callback_answer_body, message_body, BOT_COMMANDS, UNAUTHORIZED_NOTICE};
use super::types::*;
use super::parse_chat_id;
use crate::utils::split_message;
use unibot_core::message::{InlineButton, MessageKind};

fn update(json: &str) -> TgUpdate {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_split_short_message() {
    let chunks = split_message("hello", 4096);
    assert_eq!(chunks, vec!["hello"]);
}

#[test]
fn test_split_long_message() {
    let text = "a\n".repeat(3000);
    let chunks = split_message(&text, 4096);
    assert!(chunks.len() >= 2);
    for chunk in &chunks {
        assert!(chunk.len() <= 4096);
    }
    assert_eq!(chunks.concat(), text);
}

#[test]
fn test_split_respects_char_boundaries() {
    let text = "🍽".repeat(2000);
    let chunks = split_message(&text, 4096);
    assert!(chunks.len() >= 2);
    assert_eq!(chunks.concat(), text);
}

#[test]
fn test_text_update_becomes_text_message() {
    let u = update(
        r#"{"update_id": 10, "message": {"message_id": 5,
            "from": {"id": 42, "first_name": "Ada", "username": "ada"},
            "chat": {"id": 42, "type": "private"}, "text": "/where IRC"}}"#,
    );
    let msg = to_incoming(u, &[]).unwrap();
    assert_eq!(msg.text, "/where IRC");
    assert_eq!(msg.sender_id, "42");
    assert_eq!(msg.sender_name.as_deref(), Some("@ada"));
    assert_eq!(msg.first_name.as_deref(), Some("Ada"));
    assert_eq!(msg.reply_target.as_deref(), Some("42"));
    assert_eq!(msg.kind, MessageKind::Text);
}

#[test]
fn test_callback_update_becomes_callback() {
    let u = update(
        r#"{"update_id": 11, "callback_query": {"id": "cb-1",
            "from": {"id": 42, "first_name": "Ada"},
            "message": {"message_id": 77, "chat": {"id": -100, "type": "group"}},
            "data": "location:3"}}"#,
    );
    let msg = to_incoming(u, &[]).unwrap();
    assert_eq!(msg.text, "location:3");
    assert_eq!(msg.reply_target.as_deref(), Some("-100"));
    assert_eq!(
        msg.kind,
        MessageKind::Callback {
            callback_id: "cb-1".into(),
            message_id: Some(77),
        }
    );
}

#[test]
fn test_non_text_update_skipped() {
    let u = update(
        r#"{"update_id": 12, "message": {"message_id": 6,
            "from": {"id": 42, "first_name": "Ada"},
            "chat": {"id": 42}}}"#,
    );
    assert!(to_incoming(u, &[]).is_none());
    assert!(to_incoming(update(r#"{"update_id": 13}"#), &[]).is_none());
}

#[test]
fn test_allowed_users_filter() {
    let json = r#"{"update_id": 14, "message": {"message_id": 7,
        "from": {"id": 42, "first_name": "Ada", "last_name": "Lovelace"},
        "chat": {"id": 42}, "text": "hi"}}"#;
    assert!(to_incoming(update(json), &[1, 2]).is_none());
    let msg = to_incoming(update(json), &[42]).unwrap();
    assert_eq!(msg.sender_name.as_deref(), Some("Ada Lovelace"));
}

#[test]
fn test_unauthorized_button_press_is_answered() {
    let json = r#"{"update_id": 15, "callback_query": {"id": "cb7",
        "from": {"id": 99, "first_name": "Eve"},
        "message": {"message_id": 3, "chat": {"id": 99}},
        "data": "location:1"}}"#;

    assert_eq!(denied_callback(&update(json), &[42]).as_deref(), Some("cb7"));
    assert!(to_incoming(update(json), &[42]).is_none());

    assert!(denied_callback(&update(json), &[]).is_none());
    assert!(denied_callback(&update(json), &[99]).is_none());

    let body = callback_answer_body("cb7", Some(UNAUTHORIZED_NOTICE));
    assert_eq!(body["callback_query_id"], "cb7");
    assert_eq!(body["text"], UNAUTHORIZED_NOTICE);
    assert!(callback_answer_body("cb7", None).get("text").is_none());
}

#[test]
fn test_non_callback_update_needs_no_answer() {
    let json = r#"{"update_id": 16, "message": {"message_id": 7,
        "from": {"id": 99, "first_name": "Eve"}, "chat": {"id": 99}, "text": "hi"}}"#;
    assert!(denied_callback(&update(json), &[42]).is_none());
}

#[test]
fn test_tg_chat_type_defaults_when_missing() {
    let chat: TgChat = serde_json::from_str(r#"{"id": 123}"#).unwrap();
    assert_eq!(chat.chat_type, "");
}

#[test]
fn test_message_body_markdown_and_keyboard() {
    let keyboard = vec![vec![InlineButton::new("IRC", "location:1")]];
    let body = message_body(42, "Pick one", true, &keyboard, true);
    assert_eq!(body["parse_mode"], "Markdown");
    assert_eq!(
        body["reply_markup"]["inline_keyboard"][0][0]["callback_data"],
        "location:1"
    );

    let plain = message_body(42, "Pick one", false, &keyboard, false);
    assert!(plain.get("parse_mode").is_none());
    assert!(plain.get("reply_markup").is_none());
}

#[test]
fn test_bot_commands_registered() {
    let names: Vec<&str> = BOT_COMMANDS.iter().map(|(c, _)| *c).collect();
    assert_eq!(
        names,
        vec!["start", "help", "where", "find", "handbook", "providers", "provider"]
    );
}

#[test]
fn test_parse_chat_id() {
    assert_eq!(parse_chat_id("-100123").unwrap(), -100123);
    assert!(parse_chat_id("abc").is_err());
}
