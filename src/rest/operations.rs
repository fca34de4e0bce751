//! Convenience REST operations, thin calls into [`super::RestClient`].
//!
//! Grounded in the reference implementation's `endpoint_client.py`: the
//! method names and parameter shapes mirror `get_gateway_url`,
//! `create_message`, `fetch_message(s)`, `edit_message`, `delete_message`,
//! `send_typing`, `add_reaction`/`remove_reaction`, `fetch_channel`,
//! `fetch_guild_channels`, `fetch_guild`, `fetch_guild_member`,
//! `kick_member`, `ban_member`/`unban_member`, `add_member_role`/
//! `remove_member_role`, `fetch_my_user`/`fetch_user`.

use super::multipart::build_multipart_plan;
use super::RestClient;
use crate::error::FluxResult;
use crate::model::{AttachmentUpload, Channel, Guild, GuildMember, Message, MessageReference, Role, User};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};

/// Percent-encodes a reaction emoji for use as a single path segment, the
/// same way `endpoint_client.py`'s `add_reaction`/`remove_reaction` quote it
/// before interpolating it into the URL.
fn encode_emoji(emoji: &str) -> String {
    utf8_percent_encode(emoji, NON_ALPHANUMERIC).to_string()
}

#[derive(Debug, Serialize, Default)]
pub struct CreateMessage {
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_reference: Option<MessageReference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Value>,
}

#[derive(Debug, Serialize, Default)]
pub struct FetchMessagesOptions {
    pub limit: Option<u32>,
    pub before: Option<String>,
    pub after: Option<String>,
    pub around: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct ModifyGuild {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_level: Option<u8>,
}

#[derive(Debug, Serialize, Default)]
pub struct BanMember {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RestClient {
    /// `GET /gateway/bot` — returns the URL the gateway connection engine
    /// should open its websocket against.
    pub async fn get_gateway_url(&self) -> FluxResult<String> {
        let value: Value = self.request(Method::GET, "/gateway/bot", None).await?;
        Ok(value
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    pub async fn create_message(
        &self,
        channel_id: &str,
        body: CreateMessage,
        files: Vec<AttachmentUpload>,
    ) -> FluxResult<Message> {
        let path = format!("/channels/{channel_id}/messages");
        if files.is_empty() {
            let json = Self::to_json(&body)?;
            self.request(Method::POST, &path, Some(&json)).await
        } else {
            let json = Self::to_json(&body)?;
            let plan = build_multipart_plan(json, files);
            self.request_multipart(Method::POST, &path, plan).await
        }
    }

    pub async fn fetch_message(&self, channel_id: &str, message_id: &str) -> FluxResult<Message> {
        let path = format!("/channels/{channel_id}/messages/{message_id}");
        self.request(Method::GET, &path, None).await
    }

    pub async fn fetch_messages(
        &self,
        channel_id: &str,
        options: FetchMessagesOptions,
    ) -> FluxResult<Vec<Message>> {
        let mut path = format!("/channels/{channel_id}/messages?");
        if let Some(limit) = options.limit {
            path.push_str(&format!("limit={limit}&"));
        }
        if let Some(before) = options.before {
            path.push_str(&format!("before={before}&"));
        }
        if let Some(after) = options.after {
            path.push_str(&format!("after={after}&"));
        }
        if let Some(around) = options.around {
            path.push_str(&format!("around={around}&"));
        }
        self.request(Method::GET, &path, None).await
    }

    pub async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        content: &str,
    ) -> FluxResult<Message> {
        let path = format!("/channels/{channel_id}/messages/{message_id}");
        let body = json!({ "content": content });
        self.request(Method::PATCH, &path, Some(&body)).await
    }

    pub async fn delete_message(&self, channel_id: &str, message_id: &str) -> FluxResult<()> {
        let path = format!("/channels/{channel_id}/messages/{message_id}");
        let _: Value = self.request(Method::DELETE, &path, None).await?;
        Ok(())
    }

    pub async fn send_typing(&self, channel_id: &str) -> FluxResult<()> {
        let path = format!("/channels/{channel_id}/typing");
        let _: Value = self.request(Method::POST, &path, None).await?;
        Ok(())
    }

    /// Adds the bot's own reaction. `emoji` is percent-encoded internally,
    /// matching `endpoint_client.py`'s `urllib.parse.quote(emoji, safe="")`.
    pub async fn add_reaction(&self, channel_id: &str, message_id: &str, emoji: &str) -> FluxResult<()> {
        let emoji = encode_emoji(emoji);
        let path = format!("/channels/{channel_id}/messages/{message_id}/reactions/{emoji}/@me");
        let _: Value = self.request(Method::PUT, &path, None).await?;
        Ok(())
    }

    pub async fn remove_reaction(&self, channel_id: &str, message_id: &str, emoji: &str) -> FluxResult<()> {
        let emoji = encode_emoji(emoji);
        let path = format!("/channels/{channel_id}/messages/{message_id}/reactions/{emoji}/@me");
        let _: Value = self.request(Method::DELETE, &path, None).await?;
        Ok(())
    }

    pub async fn fetch_channel(&self, channel_id: &str) -> FluxResult<Channel> {
        let path = format!("/channels/{channel_id}");
        self.request(Method::GET, &path, None).await
    }

    pub async fn fetch_guild_channels(&self, guild_id: &str) -> FluxResult<Vec<Channel>> {
        let path = format!("/guilds/{guild_id}/channels");
        self.request(Method::GET, &path, None).await
    }

    pub async fn fetch_guild(&self, guild_id: &str) -> FluxResult<Guild> {
        let path = format!("/guilds/{guild_id}");
        self.request(Method::GET, &path, None).await
    }

    pub async fn modify_guild(&self, guild_id: &str, body: ModifyGuild) -> FluxResult<Guild> {
        let path = format!("/guilds/{guild_id}");
        let json = Self::to_json(&body)?;
        self.request(Method::PATCH, &path, Some(&json)).await
    }

    pub async fn fetch_guild_member(&self, guild_id: &str, user_id: &str) -> FluxResult<GuildMember> {
        let path = format!("/guilds/{guild_id}/members/{user_id}");
        self.request(Method::GET, &path, None).await
    }

    pub async fn kick_member(&self, guild_id: &str, user_id: &str) -> FluxResult<()> {
        let path = format!("/guilds/{guild_id}/members/{user_id}");
        let _: Value = self.request(Method::DELETE, &path, None).await?;
        Ok(())
    }

    pub async fn ban_member(&self, guild_id: &str, user_id: &str, body: BanMember) -> FluxResult<()> {
        let path = format!("/guilds/{guild_id}/bans/{user_id}");
        let json = Self::to_json(&body)?;
        let _: Value = self.request(Method::PUT, &path, Some(&json)).await?;
        Ok(())
    }

    pub async fn unban_member(&self, guild_id: &str, user_id: &str) -> FluxResult<()> {
        let path = format!("/guilds/{guild_id}/bans/{user_id}");
        let _: Value = self.request(Method::DELETE, &path, None).await?;
        Ok(())
    }

    pub async fn add_member_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> FluxResult<()> {
        let path = format!("/guilds/{guild_id}/members/{user_id}/roles/{role_id}");
        let _: Value = self.request(Method::PUT, &path, None).await?;
        Ok(())
    }

    pub async fn remove_member_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> FluxResult<()> {
        let path = format!("/guilds/{guild_id}/members/{user_id}/roles/{role_id}");
        let _: Value = self.request(Method::DELETE, &path, None).await?;
        Ok(())
    }

    pub async fn fetch_guild_roles(&self, guild_id: &str) -> FluxResult<Vec<Role>> {
        let path = format!("/guilds/{guild_id}/roles");
        self.request(Method::GET, &path, None).await
    }

    pub async fn fetch_my_user(&self) -> FluxResult<User> {
        self.request(Method::GET, "/users/@me", None).await
    }

    pub async fn fetch_user(&self, user_id: &str) -> FluxResult<User> {
        let path = format!("/users/{user_id}");
        self.request(Method::GET, &path, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_unicode_emoji_for_the_reaction_path() {
        assert_eq!(encode_emoji("🔥"), "%F0%9F%94%A5");
    }

    #[test]
    fn encodes_custom_emoji_name_and_id() {
        assert_eq!(encode_emoji("name:123"), "name%3A123");
    }
}
