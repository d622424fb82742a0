#[allow(unused_imports)]
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ToolSearchContactsArgs {
    pub(crate) query: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolListMessagesArgs {
    pub(crate) chat_jid: String,
    #[serde(default)]
    pub(crate) limit: Option<usize>,
    #[serde(default)]
    pub(crate) page: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolListChatsArgs {
    #[serde(default)]
    pub(crate) query: Option<String>,
    #[serde(default)]
    pub(crate) limit: Option<usize>,
    #[serde(default)]
    pub(crate) page: Option<usize>,
    #[serde(default)]
    pub(crate) sort_by: Option<String>,
    #[serde(default)]
    pub(crate) include_last_message: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolGetChatArgs {
    pub(crate) chat_jid: String,
    #[serde(default)]
    pub(crate) include_last_message: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolGetMessageContextArgs {
    pub(crate) message_id: String,
    #[serde(default)]
    pub(crate) before: Option<usize>,
    #[serde(default)]
    pub(crate) after: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolSendMessageArgs {
    pub(crate) recipient: String,
    pub(crate) message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolSearchMessagesArgs {
    pub(crate) query: String,
    #[serde(default)]
    pub(crate) chat_jid: Option<String>,
    #[serde(default)]
    pub(crate) limit: Option<usize>,
    #[serde(default)]
    pub(crate) page: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolSendMediaArgs {
    pub(crate) recipient: String,
    pub(crate) media_type: String,
    pub(crate) media_path: String,
    #[serde(default)]
    pub(crate) caption: Option<String>,
    #[serde(default)]
    pub(crate) file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolReplyToMessageArgs {
    pub(crate) message_id: String,
    pub(crate) reply_text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolSendReactionArgs {
    pub(crate) message_id: String,
    pub(crate) emoji: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolMarkAsReadArgs {
    pub(crate) chat_jid: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolGetGroupMembersArgs {
    pub(crate) group_jid: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolSyncContactsArgs {}
