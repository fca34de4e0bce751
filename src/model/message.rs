use super::{Attachment, Embed, User};
use serde::{Deserialize, Serialize};

/// A reply/forward pointer, as embedded in an outbound create-message body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageReference {
    #[serde(rename = "type")]
    pub kind: u8,
    pub message_id: String,
    pub channel_id: String,
}

impl MessageReference {
    pub const TYPE_REPLY: u8 = 0;
    pub const TYPE_FORWARD: u8 = 1;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub guild_id: Option<String>,
    pub author: User,
    #[serde(default)]
    pub content: String,
    pub timestamp: String,
    pub edited_timestamp: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: u8,
    #[serde(default)]
    pub tts: bool,
    #[serde(default)]
    pub mention_everyone: bool,
    #[serde(default)]
    pub pinned: bool,
    pub nonce: Option<String>,
    pub webhook_id: Option<String>,
    #[serde(default)]
    pub flags: u64,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
}

impl Message {
    pub fn is_webhook(&self) -> bool {
        self.webhook_id.is_some()
    }

    pub fn into_reply(&self) -> MessageReference {
        MessageReference {
            kind: MessageReference::TYPE_REPLY,
            message_id: self.id.clone(),
            channel_id: self.channel_id.clone(),
        }
    }

    pub fn into_forward(&self) -> MessageReference {
        MessageReference {
            kind: MessageReference::TYPE_FORWARD,
            message_id: self.id.clone(),
            channel_id: self.channel_id.clone(),
        }
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Message {}

impl std::hash::Hash for Message {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
