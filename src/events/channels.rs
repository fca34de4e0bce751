use crate::model::Channel;

#[derive(Debug, Clone)]
pub struct ChannelCreateEvent {
    pub channel: Channel,
}

#[derive(Debug, Clone)]
pub struct ChannelUpdateEvent {
    pub channel: Channel,
}

#[derive(Debug, Clone)]
pub struct ChannelDeleteEvent {
    pub channel: Channel,
}

#[derive(Debug, Clone)]
pub struct TypingStartEvent {
    pub channel_id: String,
    pub guild_id: Option<String>,
    pub user_id: String,
    pub timestamp: i64,
}
