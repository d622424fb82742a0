//! Client for the WhatsApp bridge sidecar.
//!
//! The bridge owns the wire protocol, session crypto, QR pairing and
//! reconnection; this process only needs its localhost REST API. A liveness
//! probe is taken once per tool dispatch and modeled as a sum type so
//! nullability checks do not leak into the tool facade.

use std::thread;
use std::time::Duration;

use super::{is_group_jid, DirectoryContact, GroupMember, MessageRecord};

const CONNECT_TIMEOUT_MS: u64 = 3_000;
const READ_TIMEOUT_MS: u64 = 60_000;
/// Fixed delay before the single retry of a group send rejected with 406
/// ("sessions not yet established").
const GROUP_SESSION_RETRY_DELAY: Duration = Duration::from_secs(2);

// ── Session state ────────────────────────────────────────────────────────

/// Transport availability, checked once per write-tool dispatch.
pub(crate) enum BridgeSession<'a> {
    Disconnected,
    Connected(&'a BridgeClient),
}

// ── BridgeClient ─────────────────────────────────────────────────────────

pub(crate) struct BridgeClient {
    agent: ureq::Agent,
    base_url: String,
}

impl BridgeClient {
    pub(crate) fn new(base_url: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_millis(CONNECT_TIMEOUT_MS))
            .timeout_read(Duration::from_millis(READ_TIMEOUT_MS))
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Probe the bridge for a live, paired session.
    pub(crate) fn is_connected(&self) -> bool {
        let url = format!("{}/api/status", self.base_url);
        match self.agent.get(&url).call() {
            Ok(resp) => resp
                .into_json::<serde_json::Value>()
                .ok()
                .and_then(|v| v.get("connected").and_then(|c| c.as_bool()))
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    fn post(
        &self,
        path: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, (Option<u16>, String)> {
        let url = format!("{}{path}", self.base_url);
        match self
            .agent
            .post(&url)
            .set("content-type", "application/json")
            .send_json(payload.clone())
        {
            Ok(resp) => resp
                .into_json()
                .map_err(|e| (None, format!("bridge response: {e}"))),
            Err(ureq::Error::Status(code, resp)) => {
                let text = resp.into_string().unwrap_or_default();
                Err((Some(code), format!("bridge {code}: {}", text.trim())))
            }
            Err(err) => Err((None, format!("bridge request failed: {err}"))),
        }
    }

    fn get(&self, path: &str) -> Result<serde_json::Value, String> {
        let url = format!("{}{path}", self.base_url);
        match self.agent.get(&url).call() {
            Ok(resp) => resp
                .into_json()
                .map_err(|e| format!("bridge response: {e}")),
            Err(ureq::Error::Status(code, resp)) => {
                let text = resp.into_string().unwrap_or_default();
                Err(format!("bridge {code}: {}", text.trim()))
            }
            Err(err) => Err(format!("bridge request failed: {err}")),
        }
    }

    /// The bridge echoes a success flag alongside HTTP 200.
    fn check_success(value: serde_json::Value) -> Result<(), String> {
        if value.get("success").and_then(|v| v.as_bool()) == Some(false) {
            let msg = value
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("bridge reported failure");
            return Err(msg.to_string());
        }
        Ok(())
    }

    /// Send, retrying a group target once after a fixed delay when the bridge
    /// answers 406, its signal that peer sessions are not yet established.
    fn send(&self, jid: &str, payload: serde_json::Value) -> Result<(), String> {
        match self.post("/api/send", &payload) {
            Ok(value) => Self::check_success(value),
            Err((Some(406), msg)) if is_group_jid(jid) => {
                eprintln!("[bridge] group sessions not ready for {jid}, retrying once: {msg}");
                thread::sleep(GROUP_SESSION_RETRY_DELAY);
                self.post("/api/send", &payload)
                    .map_err(|(_, e)| e)
                    .and_then(Self::check_success)
            }
            Err((_, msg)) => Err(msg),
        }
    }

    pub(crate) fn send_text(&self, jid: &str, message: &str) -> Result<(), String> {
        self.send(
            jid,
            serde_json::json!({ "recipient": jid, "message": message }),
        )
    }

    /// The bridge reads the media file itself; only the path travels here.
    pub(crate) fn send_media(
        &self,
        jid: &str,
        media_type: &str,
        media_path: &str,
        caption: Option<&str>,
        file_name: Option<&str>,
    ) -> Result<(), String> {
        self.send(
            jid,
            serde_json::json!({
                "recipient": jid,
                "media_type": media_type,
                "media_path": media_path,
                "caption": caption,
                "file_name": file_name,
            }),
        )
    }

    /// Quoted reply. The stored target supplies the chat, sender and from-me
    /// flag the bridge needs to build the reference.
    pub(crate) fn reply_text(
        &self,
        target: &MessageRecord,
        reply_text: &str,
    ) -> Result<(), String> {
        self.send(
            &target.chat_jid,
            serde_json::json!({
                "recipient": target.chat_jid,
                "message": reply_text,
                "reply_to": {
                    "id": target.id,
                    "sender": target.sender,
                    "is_from_me": target.is_from_me,
                },
            }),
        )
    }

    pub(crate) fn react(&self, target: &MessageRecord, emoji: &str) -> Result<(), String> {
        self.post(
            "/api/react",
            &serde_json::json!({
                "chat_jid": target.chat_jid,
                "message_id": target.id,
                "sender": target.sender,
                "is_from_me": target.is_from_me,
                "emoji": emoji,
            }),
        )
        .map_err(|(_, e)| e)
        .and_then(Self::check_success)
    }

    pub(crate) fn mark_read(&self, target: &MessageRecord) -> Result<(), String> {
        self.post(
            "/api/read",
            &serde_json::json!({
                "chat_jid": target.chat_jid,
                "message_ids": [target.id],
                "sender": target.sender,
            }),
        )
        .map_err(|(_, e)| e)
        .and_then(Self::check_success)
    }

    pub(crate) fn group_members(&self, group_jid: &str) -> Result<Vec<GroupMember>, String> {
        let path = format!("/api/group/{}/members", urlencoding::encode(group_jid));
        let value = self.get(&path)?;
        let members = value
            .get("members")
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        serde_json::from_value(members).map_err(|e| format!("bridge members payload: {e}"))
    }

    /// Live contact directory, for `sync_contacts`. May legitimately be empty
    /// before the bridge finishes its history sync.
    pub(crate) fn contact_directory(&self) -> Result<Vec<DirectoryContact>, String> {
        let value = self.get("/api/contacts")?;
        let contacts = value
            .get("contacts")
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        serde_json::from_value(contacts).map_err(|e| format!("bridge contacts payload: {e}"))
    }
}
