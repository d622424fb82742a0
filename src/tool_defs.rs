use serde_json;

pub(crate) fn tool_definitions_json() -> Vec<serde_json::Value> {
    vec![
        serde_json::json!({
            "name": "search_contacts",
            "description": "Search known contacts and chats by name or phone/JID fragment.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": { "type": "string" }
                },
                "required": ["query"]
            }
        }),
        serde_json::json!({
            "name": "list_messages",
            "description": "List stored messages for a chat, newest first, with pagination.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "chat_jid": { "type": "string" },
                    "limit": { "type": "integer" },
                    "page": { "type": "integer" }
                },
                "required": ["chat_jid"]
            }
        }),
        serde_json::json!({
            "name": "list_chats",
            "description": "List chats, optionally filtered by name/JID fragment.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": { "type": "string" },
                    "limit": { "type": "integer" },
                    "page": { "type": "integer" },
                    "sort_by": { "type": "string", "enum": ["last_active", "name"] },
                    "include_last_message": { "type": "boolean" }
                }
            }
        }),
        serde_json::json!({
            "name": "get_chat",
            "description": "Fetch a single chat by JID.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "chat_jid": { "type": "string" },
                    "include_last_message": { "type": "boolean" }
                },
                "required": ["chat_jid"]
            }
        }),
        serde_json::json!({
            "name": "get_message_context",
            "description": "Fetch a message by id with surrounding messages from the same chat.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "message_id": { "type": "string" },
                    "before": { "type": "integer" },
                    "after": { "type": "integer" }
                },
                "required": ["message_id"]
            }
        }),
        serde_json::json!({
            "name": "send_message",
            "description": "Send a text message. Recipient may be a phone number, a JID, or a contact/group name.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "recipient": { "type": "string" },
                    "message": { "type": "string" }
                },
                "required": ["recipient", "message"]
            }
        }),
        serde_json::json!({
            "name": "search_messages",
            "description": "Full-text search over stored message content, optionally scoped to one chat.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": { "type": "string" },
                    "chat_jid": { "type": "string" },
                    "limit": { "type": "integer" },
                    "page": { "type": "integer" }
                },
                "required": ["query"]
            }
        }),
        serde_json::json!({
            "name": "send_media",
            "description": "Send an image, video, audio or document file from a local path.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "recipient": { "type": "string" },
                    "media_type": { "type": "string", "enum": ["image", "video", "audio", "document"] },
                    "media_path": { "type": "string" },
                    "caption": { "type": "string" },
                    "file_name": { "type": "string" }
                },
                "required": ["recipient", "media_type", "media_path"]
            }
        }),
        serde_json::json!({
            "name": "reply_to_message",
            "description": "Send a quoted reply to a stored message.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "message_id": { "type": "string" },
                    "reply_text": { "type": "string" }
                },
                "required": ["message_id", "reply_text"]
            }
        }),
        serde_json::json!({
            "name": "send_reaction",
            "description": "React to a stored message with an emoji.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "message_id": { "type": "string" },
                    "emoji": { "type": "string" }
                },
                "required": ["message_id", "emoji"]
            }
        }),
        serde_json::json!({
            "name": "mark_as_read",
            "description": "Mark a chat's latest stored message as read.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "chat_jid": { "type": "string" }
                },
                "required": ["chat_jid"]
            }
        }),
        serde_json::json!({
            "name": "get_group_members",
            "description": "List the members of a group chat.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "group_jid": { "type": "string" }
                },
                "required": ["group_jid"]
            }
        }),
        serde_json::json!({
            "name": "sync_contacts",
            "description": "Pull the live contact directory and refresh stored chat names.",
            "inputSchema": {
                "type": "object",
                "properties": {}
            }
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitions_are_complete_and_unique() {
        let defs = tool_definitions_json();
        assert_eq!(defs.len(), 13);
        let mut names: Vec<&str> = defs
            .iter()
            .map(|d| d["name"].as_str().unwrap())
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 13);
        for def in &defs {
            assert_eq!(def["inputSchema"]["type"], "object");
            assert!(def["description"].as_str().unwrap().len() > 10);
        }
    }

    #[test]
    fn search_contacts_takes_only_a_query() {
        let defs = tool_definitions_json();
        let def = defs
            .iter()
            .find(|d| d["name"] == "search_contacts")
            .unwrap();
        let props = def["inputSchema"]["properties"].as_object().unwrap();
        let keys: Vec<&str> = props.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["query"]);
        assert_eq!(def["inputSchema"]["required"], serde_json::json!(["query"]));
    }
}
