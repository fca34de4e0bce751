use crate::model::{Guild, GuildMember, User};

#[derive(Debug, Clone)]
pub struct GuildCreateEvent {
    pub guild: Guild,
}

impl GuildCreateEvent {
    pub fn guild_id(&self) -> &str {
        &self.guild.id
    }
}

#[derive(Debug, Clone)]
pub struct GuildUpdateEvent {
    pub guild: Guild,
}

#[derive(Debug, Clone)]
pub struct GuildDeleteEvent {
    pub guild_id: String,
    pub unavailable: bool,
}

#[derive(Debug, Clone)]
pub struct GuildMemberAddEvent {
    pub guild_id: String,
    pub member: GuildMember,
}

#[derive(Debug, Clone)]
pub struct GuildMemberRemoveEvent {
    pub guild_id: String,
    pub user: User,
}

#[derive(Debug, Clone)]
pub struct GuildMemberUpdateEvent {
    pub guild_id: String,
    pub user: User,
    pub nick: Option<String>,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GuildBanAddEvent {
    pub guild_id: String,
    pub user: User,
}

#[derive(Debug, Clone)]
pub struct GuildBanRemoveEvent {
    pub guild_id: String,
    pub user: User,
}
