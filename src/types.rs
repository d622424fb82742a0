use serde::{Deserialize, Serialize};

// ── JID shapes ───────────────────────────────────────────────────────────

/// Suffix of a canonical individual address, e.g. `15551234567@s.whatsapp.net`.
pub(crate) const USER_SUFFIX: &str = "@s.whatsapp.net";
/// Suffix of a canonical group address, e.g. `123456789-987654321@g.us`.
pub(crate) const GROUP_SUFFIX: &str = "@g.us";

pub(crate) fn is_group_jid(jid: &str) -> bool {
    jid.ends_with(GROUP_SUFFIX)
}

// ── Chat ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub(crate) struct Chat {
    pub(crate) jid: String,
    pub(crate) name: Option<String>,
    pub(crate) last_message_time: Option<i64>,
    pub(crate) last_message: Option<String>,
    pub(crate) last_sender: Option<String>,
    pub(crate) last_is_from_me: Option<bool>,
}

impl Chat {
    /// Display name with the JID as fallback.
    pub(crate) fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&self.jid)
    }

    pub(crate) fn to_json(&self, include_last_message: bool) -> serde_json::Value {
        let mut value = serde_json::json!({
            "jid": self.jid,
            "name": self.name,
        });
        if include_last_message {
            value["last_message_time"] = serde_json::json!(self.last_message_time);
            value["last_message"] = serde_json::json!(self.last_message);
            value["last_sender"] = serde_json::json!(self.last_sender);
            value["last_is_from_me"] = serde_json::json!(self.last_is_from_me);
        }
        value
    }
}

// ── Message ──────────────────────────────────────────────────────────────

/// A stored message. `(id, chat_jid)` is the uniqueness key; `timestamp` is a
/// millisecond epoch; `sender` is None for own messages in individual chats.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct MessageRecord {
    pub(crate) id: String,
    pub(crate) chat_jid: String,
    pub(crate) sender: Option<String>,
    pub(crate) content: String,
    pub(crate) timestamp: i64,
    pub(crate) is_from_me: bool,
}

/// Context window around a single message, all from the same chat,
/// chronological within each segment.
#[derive(Debug, Serialize)]
pub(crate) struct MessageContext {
    pub(crate) target: MessageRecord,
    pub(crate) before: Vec<MessageRecord>,
    pub(crate) after: Vec<MessageRecord>,
}

// ── Message content (boundary tagged union) ──────────────────────────────

/// Strict content variants extracted from loose bridge payloads before
/// anything reaches the store. Unrecognized payloads never become a variant.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MessageContent {
    Text(String),
    Image { caption: Option<String> },
    Video { caption: Option<String> },
    Audio,
    Document { caption: Option<String>, file_name: Option<String> },
    Sticker,
    Location { latitude: f64, longitude: f64 },
    ContactCard { display_name: Option<String> },
    Poll { question: Option<String> },
}

impl MessageContent {
    /// Normalized text stored in the database: plain text for text messages,
    /// a bracketed-type placeholder plus optional caption for media.
    pub(crate) fn render(&self) -> String {
        fn with_caption(tag: &str, caption: &Option<String>) -> String {
            match caption.as_deref().filter(|c| !c.trim().is_empty()) {
                Some(c) => format!("{tag} {c}"),
                None => tag.to_string(),
            }
        }
        match self {
            Self::Text(text) => text.clone(),
            Self::Image { caption } => with_caption("[image]", caption),
            Self::Video { caption } => with_caption("[video]", caption),
            Self::Audio => "[audio]".to_string(),
            Self::Document { caption, file_name } => {
                let tag = match file_name.as_deref().filter(|f| !f.is_empty()) {
                    Some(f) => format!("[document: {f}]"),
                    None => "[document]".to_string(),
                };
                with_caption(&tag, caption)
            }
            Self::Sticker => "[sticker]".to_string(),
            Self::Location { latitude, longitude } => {
                format!("[location] {latitude:.5},{longitude:.5}")
            }
            Self::ContactCard { display_name } => {
                with_caption("[contact]", display_name)
            }
            Self::Poll { question } => with_caption("[poll]", question),
        }
    }
}

// ── Tool envelope ────────────────────────────────────────────────────────

/// Uniform result of one tool invocation: human-readable text, structured
/// details for the client, and a success flag.
#[derive(Debug)]
pub(crate) struct ToolExecution {
    pub(crate) output: String,
    pub(crate) details: serde_json::Value,
    pub(crate) is_error: bool,
}

// ── Bridge payload types ─────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct GroupMember {
    pub(crate) jid: String,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) is_admin: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DirectoryContact {
    pub(crate) jid: String,
    #[serde(default)]
    pub(crate) name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_jid_shape() {
        assert!(is_group_jid("123456789-987654321@g.us"));
        assert!(!is_group_jid("15551234567@s.whatsapp.net"));
    }

    #[test]
    fn render_text_passthrough() {
        assert_eq!(MessageContent::Text("hi there".into()).render(), "hi there");
    }

    #[test]
    fn render_media_placeholders() {
        assert_eq!(
            MessageContent::Image { caption: Some("sunset".into()) }.render(),
            "[image] sunset"
        );
        assert_eq!(MessageContent::Image { caption: None }.render(), "[image]");
        assert_eq!(MessageContent::Audio.render(), "[audio]");
        assert_eq!(
            MessageContent::Document {
                caption: None,
                file_name: Some("report.pdf".into())
            }
            .render(),
            "[document: report.pdf]"
        );
    }

    #[test]
    fn render_location() {
        let content = MessageContent::Location { latitude: 51.5, longitude: -0.1 };
        assert_eq!(content.render(), "[location] 51.50000,-0.10000");
    }

    #[test]
    fn chat_display_name_falls_back_to_jid() {
        let chat = Chat {
            jid: "15551234567@s.whatsapp.net".into(),
            name: None,
            last_message_time: None,
            last_message: None,
            last_sender: None,
            last_is_from_me: None,
        };
        assert_eq!(chat.display_name(), "15551234567@s.whatsapp.net");
    }
}
