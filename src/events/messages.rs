use crate::model::{Message, User};

#[derive(Debug, Clone)]
pub struct MessageCreateEvent {
    pub message: Message,
}

impl MessageCreateEvent {
    pub fn channel_id(&self) -> &str {
        &self.message.channel_id
    }

    pub fn guild_id(&self) -> Option<&str> {
        self.message.guild_id.as_deref()
    }

    pub fn author(&self) -> &User {
        &self.message.author
    }

    pub fn content(&self) -> &str {
        &self.message.content
    }

    /// A human, not-webhook author: `!author.bot && !message.is_webhook()`.
    pub fn is_human(&self) -> bool {
        !self.message.author.bot && !self.message.is_webhook()
    }

    pub fn is_bot(&self) -> bool {
        self.message.author.bot
    }
}

#[derive(Debug, Clone)]
pub struct MessageUpdateEvent {
    pub message: Message,
}

impl MessageUpdateEvent {
    pub fn channel_id(&self) -> &str {
        &self.message.channel_id
    }

    pub fn guild_id(&self) -> Option<&str> {
        self.message.guild_id.as_deref()
    }

    pub fn content(&self) -> &str {
        &self.message.content
    }
}

#[derive(Debug, Clone)]
pub struct MessageDeleteEvent {
    pub message_id: String,
    pub channel_id: String,
    pub guild_id: Option<String>,
}
