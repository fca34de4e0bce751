//! The process-wide in-memory snapshot mutated by dispatched events.
//!
//! Entries are written before the corresponding typed event is constructed
//! and fanned out to handlers (see `registry::dispatch`), so a handler for
//! `GUILD_CREATE` can immediately look up the guild it was just handed.

use crate::model::{Channel, Guild, GuildMember, User};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct Cache {
    guilds: RwLock<HashMap<String, Guild>>,
    channels: RwLock<HashMap<String, Channel>>,
    users: RwLock<HashMap<String, User>>,
    me: RwLock<Option<User>>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn guild(&self, id: &str) -> Option<Guild> {
        self.guilds.read().await.get(id).cloned()
    }

    pub async fn channel(&self, id: &str) -> Option<Channel> {
        self.channels.read().await.get(id).cloned()
    }

    pub async fn user(&self, id: &str) -> Option<User> {
        self.users.read().await.get(id).cloned()
    }

    pub async fn me(&self) -> Option<User> {
        self.me.read().await.clone()
    }

    async fn put_guild(&self, guild: Guild) {
        self.guilds.write().await.insert(guild.id.clone(), guild);
    }

    async fn remove_guild(&self, id: &str) {
        self.guilds.write().await.remove(id);
    }

    async fn put_channel(&self, channel: Channel) {
        self.channels.write().await.insert(channel.id.clone(), channel);
    }

    async fn remove_channel(&self, id: &str) {
        self.channels.write().await.remove(id);
    }

    async fn put_user(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }

    /// Applies the cache mutation implied by a raw dispatch, before the
    /// typed event is constructed. Decode failures are logged and swallowed:
    /// a bad field in one nested entity must not prevent the sibling
    /// entities in the same payload from being cached.
    pub async fn update(&self, event_name: &str, payload: &Value) {
        if let Err(error) = self.try_update(event_name, payload).await {
            log::warn!("cache update for {event_name} failed: {error}");
        }
    }

    async fn try_update(&self, event_name: &str, payload: &Value) -> Result<(), String> {
        match event_name {
            "READY" => {
                if let Some(user) = payload.get("user") {
                    let user: User = serde_json::from_value(user.clone()).map_err(|e| e.to_string())?;
                    *self.me.write().await = Some(user);
                }
                if let Some(guilds) = payload.get("guilds").and_then(Value::as_array) {
                    for raw in guilds {
                        if raw.get("unavailable").and_then(Value::as_bool).unwrap_or(false) {
                            continue;
                        }
                        if let Ok(guild) = serde_json::from_value::<Guild>(raw.clone()) {
                            self.put_guild(guild).await;
                        }
                    }
                }
                Ok(())
            }
            "GUILD_CREATE" | "GUILD_UPDATE" => {
                let guild: Guild = serde_json::from_value(payload.clone()).map_err(|e| e.to_string())?;
                let guild_id = guild.id.clone();
                self.put_guild(guild).await;
                if let Some(channels) = payload.get("channels").and_then(Value::as_array) {
                    for raw in channels {
                        let mut raw = raw.clone();
                        if let Some(obj) = raw.as_object_mut() {
                            obj.entry("guild_id".to_string())
                                .or_insert_with(|| Value::String(guild_id.clone()));
                        }
                        if let Ok(channel) = serde_json::from_value::<Channel>(raw) {
                            self.put_channel(channel).await;
                        }
                    }
                }
                if let Some(members) = payload.get("members").and_then(Value::as_array) {
                    for raw in members {
                        if let Ok(member) = serde_json::from_value::<GuildMember>(raw.clone()) {
                            self.put_user(member.user).await;
                        }
                    }
                }
                Ok(())
            }
            "GUILD_DELETE" => {
                let id = payload
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| "missing guild id".to_string())?;
                self.remove_guild(id).await;
                Ok(())
            }
            "CHANNEL_CREATE" | "CHANNEL_UPDATE" => {
                let channel: Channel = serde_json::from_value(payload.clone()).map_err(|e| e.to_string())?;
                self.put_channel(channel).await;
                Ok(())
            }
            "CHANNEL_DELETE" => {
                let id = payload
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| "missing channel id".to_string())?;
                self.remove_channel(id).await;
                Ok(())
            }
            "MESSAGE_CREATE" | "MESSAGE_UPDATE" => {
                if let Some(author) = payload.get("author") {
                    let user: User = serde_json::from_value(author.clone()).map_err(|e| e.to_string())?;
                    self.put_user(user).await;
                }
                Ok(())
            }
            "GUILD_MEMBER_ADD" | "GUILD_MEMBER_UPDATE" => {
                let member: GuildMember =
                    serde_json::from_value(payload.clone()).map_err(|e| e.to_string())?;
                self.put_user(member.user).await;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn ready_populates_self_user_and_guilds() {
        let cache = Cache::new();
        cache
            .update(
                "READY",
                &json!({
                    "user": {"id": "1", "username": "a", "discriminator": "0001"},
                    "guilds": [
                        {"id": "10", "name": "g"},
                        {"id": "11", "name": "unavailable", "unavailable": true}
                    ]
                }),
            )
            .await;
        assert_eq!(cache.me().await.unwrap().id, "1");
        assert!(cache.guild("10").await.is_some());
        assert!(cache.guild("11").await.is_none());
    }

    #[tokio::test]
    async fn guild_create_backfills_channel_guild_id() {
        let cache = Cache::new();
        cache
            .update(
                "GUILD_CREATE",
                &json!({
                    "id": "1",
                    "name": "g",
                    "channels": [{"id": "2", "type": 0, "name": "general"}]
                }),
            )
            .await;
        let channel = cache.channel("2").await.unwrap();
        assert_eq!(channel.guild_id.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn guild_delete_removes_entry() {
        let cache = Cache::new();
        cache.update("GUILD_CREATE", &json!({"id": "1", "name": "g"})).await;
        cache.update("GUILD_DELETE", &json!({"id": "1"})).await;
        assert!(cache.guild("1").await.is_none());
    }

    #[tokio::test]
    async fn bad_payload_is_swallowed_not_propagated() {
        let cache = Cache::new();
        // Missing required "id" on the channel: should log and do nothing,
        // not panic or return an error to the caller.
        cache.update("CHANNEL_CREATE", &json!({"type": 0})).await;
        assert!(cache.channel("anything").await.is_none());
    }
}
