//! Ingest listener for bridge push events.
//!
//! The bridge POSTs one JSON event per delivered message, chat update or
//! contact-directory refresh. Runs on its own thread; the store mutex is the
//! only thing shared with the MCP loop.

use std::io::Read;
use std::sync::Arc;

use super::{normalize_timestamp_ms, MessageContent, MessageRecord, MessageStore};

const MAX_EVENT_BYTES: usize = 1 << 20;

pub(crate) enum BridgeEvent {
    Message {
        id: String,
        chat_jid: String,
        chat_name: Option<String>,
        sender: Option<String>,
        content: MessageContent,
        timestamp: i64,
        is_from_me: bool,
    },
    ChatUpdate {
        jid: String,
        name: Option<String>,
    },
    Contacts(Vec<(String, String)>),
    LoggedOut,
}

/// Map a bridge content object to the stored representation. Unknown content
/// types yield `None` and the whole message is dropped rather than stored as
/// an empty row.
pub(crate) fn extract_content(value: &serde_json::Value) -> Option<MessageContent> {
    let kind = value.get("type")?.as_str()?;
    let text = |key: &str| {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    };
    match kind {
        "text" => Some(MessageContent::Text(text("text")?)),
        "image" => Some(MessageContent::Image {
            caption: text("caption"),
        }),
        "video" => Some(MessageContent::Video {
            caption: text("caption"),
        }),
        "audio" => Some(MessageContent::Audio),
        "document" => Some(MessageContent::Document {
            caption: text("caption"),
            file_name: text("file_name"),
        }),
        "sticker" => Some(MessageContent::Sticker),
        "location" => Some(MessageContent::Location {
            latitude: value.get("latitude")?.as_f64()?,
            longitude: value.get("longitude")?.as_f64()?,
        }),
        "contact" => Some(MessageContent::ContactCard {
            display_name: text("display_name"),
        }),
        "poll" => Some(MessageContent::Poll {
            question: text("question"),
        }),
        _ => None,
    }
}

/// Decode a raw event body. `Ok(None)` means a recognized but skippable
/// payload (unknown event kind, unknown message content).
pub(crate) fn parse_event(body: &str) -> Result<Option<BridgeEvent>, String> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| format!("invalid event JSON: {e}"))?;
    let event = value
        .get("event")
        .and_then(|e| e.as_str())
        .ok_or("event missing 'event' field")?;
    let data = value.get("data").cloned().unwrap_or(serde_json::Value::Null);

    match event {
        "message" => {
            let id = data
                .get("id")
                .and_then(|v| v.as_str())
                .ok_or("message event missing 'id'")?
                .to_string();
            let chat_jid = data
                .get("chat_jid")
                .and_then(|v| v.as_str())
                .ok_or("message event missing 'chat_jid'")?
                .to_string();
            let content = match data
                .get("content")
                .and_then(extract_content)
            {
                Some(c) => c,
                None => return Ok(None),
            };
            let raw_ts = data
                .get("timestamp")
                .and_then(|v| v.as_i64())
                .ok_or("message event missing 'timestamp'")?;
            let chat_name = data
                .get("chat_name")
                .or_else(|| data.get("push_name"))
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string());
            Ok(Some(BridgeEvent::Message {
                id,
                chat_jid,
                chat_name,
                sender: data
                    .get("sender")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string()),
                content,
                timestamp: normalize_timestamp_ms(raw_ts),
                is_from_me: data
                    .get("is_from_me")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false),
            }))
        }
        "chat" => {
            let jid = data
                .get("jid")
                .and_then(|v| v.as_str())
                .ok_or("chat event missing 'jid'")?
                .to_string();
            let name = data
                .get("name")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string());
            Ok(Some(BridgeEvent::ChatUpdate { jid, name }))
        }
        "contacts" => {
            let mut entries = Vec::new();
            if let Some(items) = data.as_array() {
                for item in items {
                    let jid = item.get("jid").and_then(|v| v.as_str());
                    let name = item.get("name").and_then(|v| v.as_str());
                    if let (Some(jid), Some(name)) = (jid, name) {
                        entries.push((jid.to_string(), name.to_string()));
                    }
                }
            }
            Ok(Some(BridgeEvent::Contacts(entries)))
        }
        "logged_out" => Ok(Some(BridgeEvent::LoggedOut)),
        other => {
            eprintln!("[events] ignoring unknown event kind '{other}'");
            Ok(None)
        }
    }
}

fn apply_event(store: &MessageStore, event: BridgeEvent) -> Result<(), String> {
    match event {
        BridgeEvent::Message {
            id,
            chat_jid,
            chat_name,
            sender,
            content,
            timestamp,
            is_from_me,
        } => {
            store.upsert_chat(&chat_jid, chat_name.as_deref(), None)?;
            store.insert_message(&MessageRecord {
                id,
                chat_jid,
                sender,
                content: content.render(),
                timestamp,
                is_from_me,
            })
        }
        BridgeEvent::ChatUpdate { jid, name } => store.upsert_chat(&jid, name.as_deref(), None),
        BridgeEvent::Contacts(entries) => {
            for (jid, name) in &entries {
                store.upsert_chat(jid, Some(name), None)?;
            }
            eprintln!("[events] refreshed {} contact names", entries.len());
            Ok(())
        }
        // Handled by the caller; unreachable here in practice.
        BridgeEvent::LoggedOut => Ok(()),
    }
}

/// Accept bridge events on a local HTTP port until the process exits.
pub(crate) fn run_event_listener(bind: &str, port: u16, store: Arc<MessageStore>) {
    let addr = format!("{bind}:{port}");
    let server = match tiny_http::Server::http(&addr) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[events] failed to bind {addr}: {e}");
            return;
        }
    };
    eprintln!("[events] listening on http://{addr}");

    for mut request in server.incoming_requests() {
        if request.method() != &tiny_http::Method::Post {
            let _ = request.respond(tiny_http::Response::from_string("ok"));
            continue;
        }
        let mut body = String::new();
        if let Err(e) = request
            .as_reader()
            .take(MAX_EVENT_BYTES as u64)
            .read_to_string(&mut body)
        {
            eprintln!("[events] failed to read body: {e}");
            let _ = request.respond(tiny_http::Response::from_string("bad request").with_status_code(400));
            continue;
        }
        match parse_event(&body) {
            Ok(Some(BridgeEvent::LoggedOut)) => {
                let _ = request.respond(tiny_http::Response::from_string("ok"));
                eprintln!("[events] bridge session logged out; exiting so the pairing can be redone");
                std::process::exit(1);
            }
            Ok(Some(event)) => {
                if let Err(e) = apply_event(&store, event) {
                    eprintln!("[events] failed to apply event: {e}");
                    let _ = request
                        .respond(tiny_http::Response::from_string("store error").with_status_code(500));
                    continue;
                }
                let _ = request.respond(tiny_http::Response::from_string("ok"));
            }
            Ok(None) => {
                let _ = request.respond(tiny_http::Response::from_string("ignored"));
            }
            Err(e) => {
                eprintln!("[events] rejected event: {e}");
                let _ = request
                    .respond(tiny_http::Response::from_string(e).with_status_code(400));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_event_normalizes_second_timestamps() {
        let body = r#"{"event":"message","data":{
            "id":"m1","chat_jid":"111@s.whatsapp.net","sender":"111@s.whatsapp.net",
            "timestamp":1700000000,"is_from_me":false,"push_name":"Alice",
            "content":{"type":"text","text":"hi"}}}"#;
        match parse_event(body).unwrap() {
            Some(BridgeEvent::Message {
                timestamp,
                chat_name,
                content,
                ..
            }) => {
                assert_eq!(timestamp, 1_700_000_000_000);
                assert_eq!(chat_name.as_deref(), Some("Alice"));
                assert_eq!(content.render(), "hi");
            }
            other => panic!("unexpected parse result: {}", matches_name(&other)),
        }
    }

    #[test]
    fn unknown_content_type_is_dropped_not_errored() {
        let body = r#"{"event":"message","data":{
            "id":"m2","chat_jid":"111@s.whatsapp.net","timestamp":1700000000000,
            "content":{"type":"ephemeral_setting"}}}"#;
        assert!(parse_event(body).unwrap().is_none());
    }

    #[test]
    fn media_content_renders_placeholders() {
        let img = serde_json::json!({"type":"image","caption":"sunset"});
        assert_eq!(extract_content(&img).unwrap().render(), "[image] sunset");
        let doc = serde_json::json!({"type":"document","file_name":"q3.pdf"});
        assert_eq!(extract_content(&doc).unwrap().render(), "[document: q3.pdf]");
        let loc = serde_json::json!({"type":"location","latitude":52.52,"longitude":13.405});
        assert_eq!(
            extract_content(&loc).unwrap().render(),
            "[location] 52.52000,13.40500"
        );
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse_event("{not json").is_err());
        assert!(parse_event(r#"{"data":{}}"#).is_err());
    }

    #[test]
    fn unknown_event_kind_is_skipped() {
        let body = r#"{"event":"presence","data":{}}"#;
        assert!(parse_event(body).unwrap().is_none());
    }

    #[test]
    fn contacts_event_collects_named_entries() {
        let body = r#"{"event":"contacts","data":[
            {"jid":"111@s.whatsapp.net","name":"Alice"},
            {"jid":"222@s.whatsapp.net"}]}"#;
        match parse_event(body).unwrap() {
            Some(BridgeEvent::Contacts(entries)) => {
                assert_eq!(entries, vec![("111@s.whatsapp.net".into(), "Alice".into())]);
            }
            other => panic!("unexpected parse result: {}", matches_name(&other)),
        }
    }

    fn matches_name(ev: &Option<BridgeEvent>) -> &'static str {
        match ev {
            None => "None",
            Some(BridgeEvent::Message { .. }) => "Message",
            Some(BridgeEvent::ChatUpdate { .. }) => "ChatUpdate",
            Some(BridgeEvent::Contacts(_)) => "Contacts",
            Some(BridgeEvent::LoggedOut) => "LoggedOut",
        }
    }
}
