//! Tool dispatch: argument decoding, recipient resolution, store reads and
//! bridge writes behind the MCP tool names.
//!
//! Error policy: a malformed argument object is a protocol error and bubbles
//! up as `Err` (JSON-RPC error to the caller); everything that can fail for
//! domain reasons (unknown chat, ambiguous recipient, store I/O, bridge
//! refusal) comes back as an `is_error` tool result the model can read and
//! react to.

use super::{
    format_timestamp, is_group_jid, resolve_recipient, BridgeClient, BridgeSession, Chat,
    ChatSort, ContactIndex, MessageRecord, MessageStore, ToolExecution,
};
use super::{
    ToolGetChatArgs, ToolGetGroupMembersArgs, ToolGetMessageContextArgs, ToolListChatsArgs,
    ToolListMessagesArgs, ToolMarkAsReadArgs, ToolReplyToMessageArgs, ToolSearchContactsArgs,
    ToolSearchMessagesArgs, ToolSendMediaArgs, ToolSendMessageArgs, ToolSendReactionArgs,
    ToolSyncContactsArgs,
};

const DEFAULT_MESSAGE_PAGE: usize = 20;
const DEFAULT_SEARCH_LIMIT: usize = 10;
const DEFAULT_CONTEXT_WINDOW: usize = 5;
const DEFAULT_CHAT_LIMIT: usize = 20;
const DEFAULT_CONTACT_LIMIT: usize = 20;

const MEDIA_TYPES: [&str; 4] = ["image", "video", "audio", "document"];

pub(crate) struct ToolContext<'a> {
    pub(crate) store: &'a MessageStore,
    pub(crate) index: &'a ContactIndex,
    pub(crate) bridge: Option<&'a BridgeClient>,
}

fn ok(output: String, details: serde_json::Value) -> ToolExecution {
    ToolExecution {
        output,
        details,
        is_error: false,
    }
}

fn fail(output: String) -> ToolExecution {
    ToolExecution {
        output,
        details: serde_json::Value::Null,
        is_error: true,
    }
}

fn store_err(e: String) -> ToolExecution {
    fail(format!("chat store error: {e}"))
}

fn bridge_session<'a>(ctx: &ToolContext<'a>) -> BridgeSession<'a> {
    match ctx.bridge {
        Some(client) if client.is_connected() => BridgeSession::Connected(client),
        _ => BridgeSession::Disconnected,
    }
}

/// Write tools check the transport before touching anything else, so a dead
/// bridge yields one consistent message instead of a partial failure.
fn require_bridge<'a>(ctx: &ToolContext<'a>) -> Result<&'a BridgeClient, ToolExecution> {
    match bridge_session(ctx) {
        BridgeSession::Connected(client) => Ok(client),
        BridgeSession::Disconnected => Err(fail(
            "WhatsApp transport is not connected. Check that the bridge process is running \
             and paired, then try again."
                .to_string(),
        )),
    }
}

fn message_line(msg: &MessageRecord) -> String {
    let from = if msg.is_from_me {
        "Me"
    } else {
        msg.sender.as_deref().unwrap_or(&msg.chat_jid)
    };
    format!(
        "[{}] {}: {}",
        format_timestamp(msg.timestamp),
        from,
        msg.content
    )
}

fn chat_line(chat: &Chat, include_last_message: bool) -> String {
    let mut line = format!("{} [{}]", chat.display_name(), chat.jid);
    if include_last_message {
        if let (Some(ts), Some(preview)) = (chat.last_message_time, chat.last_message.as_deref()) {
            let from = if chat.last_is_from_me == Some(true) {
                "Me"
            } else {
                chat.last_sender.as_deref().unwrap_or("?")
            };
            line.push_str(&format!(
                "\n  last: [{}] {}: {}",
                format_timestamp(ts),
                from,
                preview
            ));
        }
    }
    line
}

pub(crate) fn execute_tool(
    ctx: &ToolContext,
    name: &str,
    args: serde_json::Value,
) -> Result<ToolExecution, String> {
    match name {
        "search_contacts" => {
            let parsed: ToolSearchContactsArgs =
                serde_json::from_value(args).map_err(|e| format!("args: {e}"))?;
            let chats = match ctx.store.search_contacts(&parsed.query, DEFAULT_CONTACT_LIMIT) {
                Ok(chats) => chats,
                Err(e) => return Ok(store_err(e)),
            };
            if chats.is_empty() {
                return Ok(ok(
                    format!("No contacts or chats matching '{}'.", parsed.query),
                    serde_json::json!([]),
                ));
            }
            let lines: Vec<String> = chats.iter().map(|c| chat_line(c, false)).collect();
            let details: Vec<serde_json::Value> =
                chats.iter().map(|c| c.to_json(false)).collect();
            Ok(ok(lines.join("\n"), serde_json::json!(details)))
        }
        "list_messages" => {
            let parsed: ToolListMessagesArgs =
                serde_json::from_value(args).map_err(|e| format!("args: {e}"))?;
            let limit = parsed.limit.unwrap_or(DEFAULT_MESSAGE_PAGE);
            let page = parsed.page.unwrap_or(0);
            let messages = match ctx.store.list_messages(&parsed.chat_jid, limit, page) {
                Ok(messages) => messages,
                Err(e) => return Ok(store_err(e)),
            };
            if messages.is_empty() {
                // An empty later page means the history ran out, not that the
                // chat is unknown.
                let output = if page == 0 {
                    format!("No messages found in {}.", parsed.chat_jid)
                } else {
                    format!("No more messages in {} (page {page}).", parsed.chat_jid)
                };
                return Ok(ok(output, serde_json::json!([])));
            }
            let lines: Vec<String> = messages.iter().map(message_line).collect();
            let details = serde_json::to_value(&messages).map_err(|e| e.to_string())?;
            Ok(ok(lines.join("\n"), details))
        }
        "list_chats" => {
            let parsed: ToolListChatsArgs =
                serde_json::from_value(args).map_err(|e| format!("args: {e}"))?;
            let sort = match parsed.sort_by.as_deref() {
                None => ChatSort::LastActive,
                Some(s) => match ChatSort::parse(s) {
                    Ok(sort) => sort,
                    Err(e) => return Ok(fail(e)),
                },
            };
            let limit = parsed.limit.unwrap_or(DEFAULT_CHAT_LIMIT);
            let page = parsed.page.unwrap_or(0);
            let include_last = parsed.include_last_message.unwrap_or(true);
            let chats = match ctx
                .store
                .list_chats(limit, page, sort, parsed.query.as_deref())
            {
                Ok(chats) => chats,
                Err(e) => return Ok(store_err(e)),
            };
            if chats.is_empty() {
                let output = if page == 0 {
                    "No chats found.".to_string()
                } else {
                    format!("No more chats (page {page}).")
                };
                return Ok(ok(output, serde_json::json!([])));
            }
            let lines: Vec<String> = chats
                .iter()
                .map(|c| chat_line(c, include_last))
                .collect();
            let details: Vec<serde_json::Value> =
                chats.iter().map(|c| c.to_json(include_last)).collect();
            Ok(ok(lines.join("\n"), serde_json::json!(details)))
        }
        "get_chat" => {
            let parsed: ToolGetChatArgs =
                serde_json::from_value(args).map_err(|e| format!("args: {e}"))?;
            let include_last = parsed.include_last_message.unwrap_or(true);
            match ctx.store.get_chat(&parsed.chat_jid) {
                Ok(Some(chat)) => Ok(ok(
                    chat_line(&chat, include_last),
                    chat.to_json(include_last),
                )),
                Ok(None) => Ok(fail(format!("No chat found with JID {}.", parsed.chat_jid))),
                Err(e) => Ok(store_err(e)),
            }
        }
        "get_message_context" => {
            let parsed: ToolGetMessageContextArgs =
                serde_json::from_value(args).map_err(|e| format!("args: {e}"))?;
            let before = parsed.before.unwrap_or(DEFAULT_CONTEXT_WINDOW);
            let after = parsed.after.unwrap_or(DEFAULT_CONTEXT_WINDOW);
            let context = match ctx
                .store
                .get_messages_around(&parsed.message_id, before, after)
            {
                Ok(Some(context)) => context,
                Ok(None) => {
                    return Ok(fail(format!(
                        "No stored message with id {}.",
                        parsed.message_id
                    )))
                }
                Err(e) => return Ok(store_err(e)),
            };
            let mut lines = Vec::new();
            for msg in &context.before {
                lines.push(message_line(msg));
            }
            lines.push(format!(">>> {}", message_line(&context.target)));
            for msg in &context.after {
                lines.push(message_line(msg));
            }
            let details = serde_json::to_value(&context).map_err(|e| e.to_string())?;
            Ok(ok(lines.join("\n"), details))
        }
        "send_message" => {
            let parsed: ToolSendMessageArgs =
                serde_json::from_value(args).map_err(|e| format!("args: {e}"))?;
            let client = match require_bridge(ctx) {
                Ok(client) => client,
                Err(e) => return Ok(e),
            };
            let jid = match resolve_recipient(ctx.store, ctx.index, &parsed.recipient) {
                Ok(jid) => jid,
                Err(e) => return Ok(fail(e.to_string())),
            };
            match client.send_text(&jid, &parsed.message) {
                Ok(()) => Ok(ok(
                    format!("Message sent to {jid}"),
                    serde_json::json!({ "recipient": jid }),
                )),
                Err(e) => Ok(fail(format!("Failed to send message: {e}"))),
            }
        }
        "search_messages" => {
            let parsed: ToolSearchMessagesArgs =
                serde_json::from_value(args).map_err(|e| format!("args: {e}"))?;
            let limit = parsed.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
            let page = parsed.page.unwrap_or(0);
            let messages = match ctx.store.search_messages(
                &parsed.query,
                parsed.chat_jid.as_deref(),
                limit,
                page,
            ) {
                Ok(messages) => messages,
                Err(e) => return Ok(store_err(e)),
            };
            if messages.is_empty() {
                let output = if page == 0 {
                    format!("No messages matching '{}'.", parsed.query)
                } else {
                    format!("No more matches for '{}' (page {page}).", parsed.query)
                };
                return Ok(ok(output, serde_json::json!([])));
            }
            let lines: Vec<String> = messages
                .iter()
                .map(|m| format!("({}) {}", m.chat_jid, message_line(m)))
                .collect();
            let details = serde_json::to_value(&messages).map_err(|e| e.to_string())?;
            Ok(ok(lines.join("\n"), details))
        }
        "send_media" => {
            let parsed: ToolSendMediaArgs =
                serde_json::from_value(args).map_err(|e| format!("args: {e}"))?;
            let client = match require_bridge(ctx) {
                Ok(client) => client,
                Err(e) => return Ok(e),
            };
            if !MEDIA_TYPES.contains(&parsed.media_type.as_str()) {
                return Ok(fail(format!(
                    "media_type must be one of {}, got '{}'.",
                    MEDIA_TYPES.join(", "),
                    parsed.media_type
                )));
            }
            let jid = match resolve_recipient(ctx.store, ctx.index, &parsed.recipient) {
                Ok(jid) => jid,
                Err(e) => return Ok(fail(e.to_string())),
            };
            match client.send_media(
                &jid,
                &parsed.media_type,
                &parsed.media_path,
                parsed.caption.as_deref(),
                parsed.file_name.as_deref(),
            ) {
                Ok(()) => Ok(ok(
                    format!("Sent {} to {jid}", parsed.media_type),
                    serde_json::json!({ "recipient": jid, "media_type": parsed.media_type }),
                )),
                Err(e) => Ok(fail(format!("Failed to send media: {e}"))),
            }
        }
        "reply_to_message" => {
            let parsed: ToolReplyToMessageArgs =
                serde_json::from_value(args).map_err(|e| format!("args: {e}"))?;
            let client = match require_bridge(ctx) {
                Ok(client) => client,
                Err(e) => return Ok(e),
            };
            let target = match ctx.store.get_messages_around(&parsed.message_id, 0, 0) {
                Ok(Some(context)) => context.target,
                Ok(None) => {
                    return Ok(fail(format!(
                        "No stored message with id {}.",
                        parsed.message_id
                    )))
                }
                Err(e) => return Ok(store_err(e)),
            };
            match client.reply_text(&target, &parsed.reply_text) {
                Ok(()) => Ok(ok(
                    format!("Reply sent to {}", target.chat_jid),
                    serde_json::json!({ "chat_jid": target.chat_jid, "in_reply_to": target.id }),
                )),
                Err(e) => Ok(fail(format!("Failed to send reply: {e}"))),
            }
        }
        "send_reaction" => {
            let parsed: ToolSendReactionArgs =
                serde_json::from_value(args).map_err(|e| format!("args: {e}"))?;
            let client = match require_bridge(ctx) {
                Ok(client) => client,
                Err(e) => return Ok(e),
            };
            let target = match ctx.store.get_messages_around(&parsed.message_id, 0, 0) {
                Ok(Some(context)) => context.target,
                Ok(None) => {
                    return Ok(fail(format!(
                        "No stored message with id {}.",
                        parsed.message_id
                    )))
                }
                Err(e) => return Ok(store_err(e)),
            };
            match client.react(&target, &parsed.emoji) {
                Ok(()) if parsed.emoji.is_empty() => Ok(ok(
                    format!("Reaction removed from message {}", target.id),
                    serde_json::json!({ "message_id": target.id }),
                )),
                Ok(()) => Ok(ok(
                    format!("Reacted to message {} with {}", target.id, parsed.emoji),
                    serde_json::json!({ "message_id": target.id, "emoji": parsed.emoji }),
                )),
                Err(e) => Ok(fail(format!("Failed to send reaction: {e}"))),
            }
        }
        "mark_as_read" => {
            let parsed: ToolMarkAsReadArgs =
                serde_json::from_value(args).map_err(|e| format!("args: {e}"))?;
            let client = match require_bridge(ctx) {
                Ok(client) => client,
                Err(e) => return Ok(e),
            };
            // Receipts go to the newest message we have stored for the chat.
            let newest = match ctx.store.list_messages(&parsed.chat_jid, 1, 0) {
                Ok(messages) => messages.into_iter().next(),
                Err(e) => return Ok(store_err(e)),
            };
            let target = match newest {
                Some(msg) => msg,
                None => {
                    return Ok(fail(format!(
                        "No stored messages in {} to mark as read.",
                        parsed.chat_jid
                    )))
                }
            };
            match client.mark_read(&target) {
                Ok(()) => Ok(ok(
                    format!(
                        "Marked {} as read (through message {}).",
                        parsed.chat_jid, target.id
                    ),
                    serde_json::json!({ "chat_jid": parsed.chat_jid, "message_id": target.id }),
                )),
                Err(e) => Ok(fail(format!("Failed to mark as read: {e}"))),
            }
        }
        "get_group_members" => {
            let parsed: ToolGetGroupMembersArgs =
                serde_json::from_value(args).map_err(|e| format!("args: {e}"))?;
            let client = match require_bridge(ctx) {
                Ok(client) => client,
                Err(e) => return Ok(e),
            };
            if !is_group_jid(&parsed.group_jid) {
                return Ok(fail(format!(
                    "'{}' is not a group JID (expected a @g.us address).",
                    parsed.group_jid
                )));
            }
            let members = match client.group_members(&parsed.group_jid) {
                Ok(members) => members,
                Err(e) => return Ok(fail(format!("Failed to list group members: {e}"))),
            };
            if members.is_empty() {
                return Ok(ok(
                    format!("No members reported for {}.", parsed.group_jid),
                    serde_json::json!([]),
                ));
            }
            let lines: Vec<String> = members
                .iter()
                .map(|m| {
                    let name = m.name.as_deref().unwrap_or(&m.jid);
                    if m.is_admin {
                        format!("{name} [{}] (admin)", m.jid)
                    } else {
                        format!("{name} [{}]", m.jid)
                    }
                })
                .collect();
            let details = serde_json::to_value(&members).map_err(|e| e.to_string())?;
            Ok(ok(lines.join("\n"), details))
        }
        "sync_contacts" => {
            let _parsed: ToolSyncContactsArgs =
                serde_json::from_value(args).map_err(|e| format!("args: {e}"))?;
            let client = match require_bridge(ctx) {
                Ok(client) => client,
                Err(e) => return Ok(e),
            };
            let directory = match client.contact_directory() {
                Ok(directory) => directory,
                Err(e) => return Ok(fail(format!("Failed to fetch contact directory: {e}"))),
            };
            if directory.is_empty() {
                return Ok(ok(
                    "Synced 0 contacts. The bridge contact directory may not be populated \
                     yet; retry after the bridge finishes its history sync."
                        .to_string(),
                    serde_json::json!({ "synced": 0 }),
                ));
            }
            let mut synced = 0usize;
            for contact in &directory {
                if contact.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
                    continue;
                }
                if let Err(e) = ctx
                    .store
                    .upsert_chat(&contact.jid, contact.name.as_deref(), None)
                {
                    return Ok(store_err(e));
                }
                synced += 1;
            }
            Ok(ok(
                format!("Synced {synced} contacts."),
                serde_json::json!({ "synced": synced }),
            ))
        }
        other => Err(format!("unknown tool: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_db_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("wamcp_test");
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(format!("exec_{}_{name}.sqlite", std::process::id()))
    }

    fn open(name: &str) -> MessageStore {
        let path = temp_db_path(name);
        let _ = std::fs::remove_file(&path);
        MessageStore::open_or_create(&path).unwrap()
    }

    fn empty_index() -> ContactIndex {
        ContactIndex::with_entries(Vec::new(), Vec::new())
    }

    fn msg(id: &str, chat: &str, content: &str, ts: i64) -> MessageRecord {
        MessageRecord {
            id: id.to_string(),
            chat_jid: chat.to_string(),
            sender: Some("111@s.whatsapp.net".to_string()),
            content: content.to_string(),
            timestamp: ts,
            is_from_me: false,
        }
    }

    #[test]
    fn write_tools_are_gated_on_transport() {
        let store = open("gated");
        let index = empty_index();
        let ctx = ToolContext {
            store: &store,
            index: &index,
            bridge: None,
        };
        for (name, args) in [
            (
                "send_message",
                serde_json::json!({"recipient": "111@s.whatsapp.net", "message": "hi"}),
            ),
            (
                "send_media",
                serde_json::json!({"recipient": "111@s.whatsapp.net", "media_type": "image", "media_path": "/tmp/a.jpg"}),
            ),
            (
                "reply_to_message",
                serde_json::json!({"message_id": "m1", "reply_text": "ok"}),
            ),
            (
                "send_reaction",
                serde_json::json!({"message_id": "m1", "emoji": "👍"}),
            ),
            ("mark_as_read", serde_json::json!({"chat_jid": "111@s.whatsapp.net"})),
            ("get_group_members", serde_json::json!({"group_jid": "123@g.us"})),
            ("sync_contacts", serde_json::json!({})),
        ] {
            let result = execute_tool(&ctx, name, args).unwrap();
            assert!(result.is_error, "{name} should fail without a bridge");
            assert!(
                result.output.contains("not connected"),
                "{name}: {}",
                result.output
            );
        }
    }

    #[test]
    fn read_tools_work_without_a_bridge() {
        let store = open("reads");
        store.insert_message(&msg("m1", "111@s.whatsapp.net", "hello there", 1000)).unwrap();
        let index = empty_index();
        let ctx = ToolContext {
            store: &store,
            index: &index,
            bridge: None,
        };

        let listed = execute_tool(
            &ctx,
            "list_messages",
            serde_json::json!({"chat_jid": "111@s.whatsapp.net"}),
        )
        .unwrap();
        assert!(!listed.is_error);
        assert!(listed.output.contains("hello there"));

        let found = execute_tool(
            &ctx,
            "search_messages",
            serde_json::json!({"query": "HELLO"}),
        )
        .unwrap();
        assert!(!found.is_error);
        assert!(found.output.contains("hello there"));
    }

    #[test]
    fn search_contacts_ignores_unknown_arguments() {
        let store = open("contact_args");
        store.upsert_chat("15551234567@s.whatsapp.net", Some("Alice"), Some(1000)).unwrap();
        let index = empty_index();
        let ctx = ToolContext {
            store: &store,
            index: &index,
            bridge: None,
        };

        // older clients may still send extra fields such as "limit"
        let found = execute_tool(
            &ctx,
            "search_contacts",
            serde_json::json!({"query": "alice", "limit": 3}),
        )
        .unwrap();
        assert!(!found.is_error);
        assert!(found.output.contains("Alice"));
    }

    #[test]
    fn empty_first_page_and_exhausted_page_read_differently() {
        let store = open("pages");
        store.insert_message(&msg("m1", "111@s.whatsapp.net", "only one", 1000)).unwrap();
        let index = empty_index();
        let ctx = ToolContext {
            store: &store,
            index: &index,
            bridge: None,
        };

        let first = execute_tool(
            &ctx,
            "list_messages",
            serde_json::json!({"chat_jid": "999@s.whatsapp.net"}),
        )
        .unwrap();
        assert!(first.output.starts_with("No messages found"));

        let later = execute_tool(
            &ctx,
            "list_messages",
            serde_json::json!({"chat_jid": "111@s.whatsapp.net", "page": 3}),
        )
        .unwrap();
        assert!(later.output.contains("No more messages"));
        assert!(later.output.contains("page 3"));

        let search_first = execute_tool(
            &ctx,
            "search_messages",
            serde_json::json!({"query": "absent"}),
        )
        .unwrap();
        assert!(search_first.output.starts_with("No messages matching"));

        let search_later = execute_tool(
            &ctx,
            "search_messages",
            serde_json::json!({"query": "only", "page": 2}),
        )
        .unwrap();
        assert!(search_later.output.contains("No more matches"));
        assert!(search_later.output.contains("page 2"));
    }

    #[test]
    fn malformed_args_are_protocol_errors() {
        let store = open("args");
        let index = empty_index();
        let ctx = ToolContext {
            store: &store,
            index: &index,
            bridge: None,
        };
        assert!(execute_tool(&ctx, "send_message", serde_json::json!({})).is_err());
        assert!(execute_tool(&ctx, "list_messages", serde_json::json!({"limit": 5})).is_err());
        assert!(execute_tool(&ctx, "no_such_tool", serde_json::json!({})).is_err());
    }

    #[test]
    fn invalid_sort_by_is_a_tool_error_not_a_protocol_error() {
        let store = open("sort");
        let index = empty_index();
        let ctx = ToolContext {
            store: &store,
            index: &index,
            bridge: None,
        };
        let result = execute_tool(
            &ctx,
            "list_chats",
            serde_json::json!({"sort_by": "recency"}),
        )
        .unwrap();
        assert!(result.is_error);
        assert!(result.output.contains("sort_by"));
    }

    #[test]
    fn get_chat_reports_unknown_jid() {
        let store = open("getchat");
        let index = empty_index();
        let ctx = ToolContext {
            store: &store,
            index: &index,
            bridge: None,
        };
        let result = execute_tool(
            &ctx,
            "get_chat",
            serde_json::json!({"chat_jid": "404@s.whatsapp.net"}),
        )
        .unwrap();
        assert!(result.is_error);
        assert!(result.output.contains("404@s.whatsapp.net"));
    }

    #[test]
    fn message_context_marks_the_target_line() {
        let store = open("context");
        for (id, content, ts) in [("a", "one", 1000), ("b", "two", 2000), ("c", "three", 3000)] {
            store
                .insert_message(&msg(id, "111@s.whatsapp.net", content, ts))
                .unwrap();
        }
        let index = empty_index();
        let ctx = ToolContext {
            store: &store,
            index: &index,
            bridge: None,
        };
        let result = execute_tool(
            &ctx,
            "get_message_context",
            serde_json::json!({"message_id": "b", "before": 1, "after": 1}),
        )
        .unwrap();
        assert!(!result.is_error);
        let lines: Vec<&str> = result.output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("one"));
        assert!(lines[1].starts_with(">>> "));
        assert!(lines[1].contains("two"));
        assert!(lines[2].contains("three"));
    }

    #[test]
    fn resolver_failures_surface_in_the_tool_result() {
        let store = open("resolve");
        let index = empty_index();
        let ctx = ToolContext {
            store: &store,
            index: &index,
            bridge: None,
        };
        // Gate comes first, so use a connected-looking context via a read
        // path instead: resolution errors are covered in resolver tests; here
        // we only pin that the gate precedes resolution.
        let result = execute_tool(
            &ctx,
            "send_message",
            serde_json::json!({"recipient": "definitely nobody", "message": "hi"}),
        )
        .unwrap();
        assert!(result.is_error);
        assert!(result.output.contains("not connected"));
    }
}
