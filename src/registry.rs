//! Maps raw dispatch names to typed [`Event`]s and fans them out to
//! registered handlers.
//!
//! Mirrors the reference implementation's `bot.py`: a fixed constructor table
//! keyed by dispatch name, a snapshot-then-iterate `dispatch()` that never
//! lets one handler's failure stop the others, and `subscribe`/`unsubscribe`.

use crate::bot::Bot;
use crate::events::{
    ChannelCreateEvent, ChannelDeleteEvent, ChannelUpdateEvent, Event, EventKind,
    GuildBanAddEvent, GuildBanRemoveEvent, GuildCreateEvent, GuildDeleteEvent, GuildMemberAddEvent,
    GuildMemberRemoveEvent, GuildMemberUpdateEvent, GuildUpdateEvent, MessageCreateEvent,
    MessageDeleteEvent, MessageUpdateEvent, ReadyEvent, TypedEvent, TypingStartEvent,
};
use crate::model::{Channel, Guild, GuildMember, Message, User};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Handlers receive the dispatched event plus a shared handle to the owning
/// [`Bot`], so they can call REST without the caller threading a bot
/// reference through every registration site themselves.
type Handler = Arc<dyn Fn(Event, Arc<Bot>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Opaque token returned by [`EventRegistry::subscribe`], used to remove that
/// exact registration later. Rust closures have no useful equality, so this
/// stands in for the reference implementation's "remove this callable".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct EventRegistry {
    handlers: RwLock<HashMap<EventKind, Vec<(SubscriptionId, Handler)>>>,
    next_id: AtomicU64,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` to run whenever an event of `kind` is dispatched.
    pub async fn subscribe<F, Fut>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(Event, Arc<Bot>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let boxed: Handler = Arc::new(move |event, bot| handler(event, bot).boxed());
        self.handlers
            .write()
            .await
            .entry(kind)
            .or_default()
            .push((id, boxed));
        id
    }

    /// Type-inferred sugar over [`subscribe`](Self::subscribe): registers a
    /// handler that receives the already-downcast payload `E` rather than
    /// the whole [`Event`] enum.
    pub async fn listen<E, F, Fut>(&self, handler: F) -> SubscriptionId
    where
        E: TypedEvent + Send + Sync,
        F: Fn(E, Arc<Bot>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        self.subscribe(E::KIND, move |event, bot| {
            let payload = E::from_event(&event).cloned();
            let fut = payload.map(|payload| handler(payload, bot));
            async move {
                if let Some(fut) = fut {
                    fut.await;
                }
            }
        })
        .await
    }

    /// Removes the registration identified by `id` from `kind`'s handler
    /// list, if present.
    pub async fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) {
        if let Some(handlers) = self.handlers.write().await.get_mut(&kind) {
            handlers.retain(|(existing, _)| *existing != id);
        }
    }

    /// Snapshots the handler list for `event`'s kind and awaits each in
    /// registration order. A handler that panics is caught and logged; it
    /// never stops its siblings from running. `bot` is the back-reference
    /// handed to every handler so it can issue REST calls.
    pub async fn dispatch(&self, event: Event, bot: Arc<Bot>) {
        let kind = event.kind();
        let snapshot: Vec<Handler> = {
            let handlers = self.handlers.read().await;
            handlers
                .get(&kind)
                .map(|v| v.iter().map(|(_, h)| h.clone()).collect())
                .unwrap_or_default()
        };
        for handler in snapshot {
            let event = event.clone();
            let bot = bot.clone();
            let result = AssertUnwindSafe(handler(event, bot)).catch_unwind().await;
            if let Err(panic) = result {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "<non-string panic payload>".to_string());
                log::error!("event handler for {:?} panicked: {message}", kind);
            }
        }
    }
}

/// Decodes a raw `DISPATCH` payload into a typed [`Event`], or `None` if the
/// dispatch name is unrecognized or the payload fails to decode. Unknown
/// names and decode failures are both silently ignored by the caller (the
/// read loop), matching the reference implementation's behaviour.
pub fn construct_event(dispatch_name: &str, payload: &Value) -> Option<Event> {
    let kind = EventKind::from_dispatch_name(dispatch_name)?;
    match kind {
        EventKind::Ready => {
            let user: User = serde_json::from_value(payload.get("user")?.clone()).ok()?;
            let session_id = payload.get("session_id")?.as_str()?.to_string();
            let resume_gateway_url = payload
                .get("resume_gateway_url")
                .and_then(Value::as_str)
                .map(str::to_string);
            Some(Event::Ready(ReadyEvent {
                user,
                session_id,
                resume_gateway_url,
            }))
        }
        EventKind::MessageCreate => {
            let message: Message = serde_json::from_value(payload.clone()).ok()?;
            Some(Event::MessageCreate(MessageCreateEvent { message }))
        }
        EventKind::MessageUpdate => {
            let message: Message = serde_json::from_value(payload.clone()).ok()?;
            Some(Event::MessageUpdate(MessageUpdateEvent { message }))
        }
        EventKind::MessageDelete => Some(Event::MessageDelete(MessageDeleteEvent {
            message_id: payload.get("id")?.as_str()?.to_string(),
            channel_id: payload.get("channel_id")?.as_str()?.to_string(),
            guild_id: payload.get("guild_id").and_then(Value::as_str).map(str::to_string),
        })),
        EventKind::GuildCreate => {
            let guild: Guild = serde_json::from_value(payload.clone()).ok()?;
            Some(Event::GuildCreate(GuildCreateEvent { guild }))
        }
        EventKind::GuildUpdate => {
            let guild: Guild = serde_json::from_value(payload.clone()).ok()?;
            Some(Event::GuildUpdate(GuildUpdateEvent { guild }))
        }
        EventKind::GuildDelete => Some(Event::GuildDelete(GuildDeleteEvent {
            guild_id: payload.get("id")?.as_str()?.to_string(),
            unavailable: payload
                .get("unavailable")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })),
        EventKind::GuildMemberAdd => {
            let guild_id = payload.get("guild_id")?.as_str()?.to_string();
            let member: GuildMember = serde_json::from_value(payload.clone()).ok()?;
            Some(Event::GuildMemberAdd(GuildMemberAddEvent { guild_id, member }))
        }
        EventKind::GuildMemberRemove => {
            let guild_id = payload.get("guild_id")?.as_str()?.to_string();
            let user: User = serde_json::from_value(payload.get("user")?.clone()).ok()?;
            Some(Event::GuildMemberRemove(GuildMemberRemoveEvent { guild_id, user }))
        }
        EventKind::GuildMemberUpdate => {
            let guild_id = payload.get("guild_id")?.as_str()?.to_string();
            let user: User = serde_json::from_value(payload.get("user")?.clone()).ok()?;
            let nick = payload.get("nick").and_then(Value::as_str).map(str::to_string);
            let roles = payload
                .get("roles")
                .and_then(Value::as_array)
                .map(|r| {
                    r.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            Some(Event::GuildMemberUpdate(GuildMemberUpdateEvent {
                guild_id,
                user,
                nick,
                roles,
            }))
        }
        EventKind::GuildBanAdd => {
            let guild_id = payload.get("guild_id")?.as_str()?.to_string();
            let user: User = serde_json::from_value(payload.get("user")?.clone()).ok()?;
            Some(Event::GuildBanAdd(GuildBanAddEvent { guild_id, user }))
        }
        EventKind::GuildBanRemove => {
            let guild_id = payload.get("guild_id")?.as_str()?.to_string();
            let user: User = serde_json::from_value(payload.get("user")?.clone()).ok()?;
            Some(Event::GuildBanRemove(GuildBanRemoveEvent { guild_id, user }))
        }
        EventKind::ChannelCreate => {
            let channel: Channel = serde_json::from_value(payload.clone()).ok()?;
            Some(Event::ChannelCreate(ChannelCreateEvent { channel }))
        }
        EventKind::ChannelUpdate => {
            let channel: Channel = serde_json::from_value(payload.clone()).ok()?;
            Some(Event::ChannelUpdate(ChannelUpdateEvent { channel }))
        }
        EventKind::ChannelDelete => {
            let channel: Channel = serde_json::from_value(payload.clone()).ok()?;
            Some(Event::ChannelDelete(ChannelDeleteEvent { channel }))
        }
        EventKind::TypingStart => Some(Event::TypingStart(TypingStartEvent {
            channel_id: payload.get("channel_id")?.as_str()?.to_string(),
            guild_id: payload.get("guild_id").and_then(Value::as_str).map(str::to_string),
            user_id: payload.get("user_id")?.as_str()?.to_string(),
            timestamp: payload.get("timestamp")?.as_i64()?,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn unknown_dispatch_name_is_ignored() {
        assert!(construct_event("SOMETHING_NEW", &json!({})).is_none());
    }

    #[test]
    fn decode_failure_is_ignored() {
        assert!(construct_event("MESSAGE_CREATE", &json!({"not": "a message"})).is_none());
    }

    fn test_bot() -> Arc<Bot> {
        Bot::new("token", "http://localhost:1").expect("building a bot handle needs no network access")
    }

    #[tokio::test]
    async fn dispatch_runs_handlers_in_registration_order() {
        let registry = EventRegistry::new();
        let bot = test_bot();
        let order = Arc::new(RwLock::new(Vec::<u8>::new()));
        for tag in [1u8, 2, 3] {
            let order = order.clone();
            registry
                .subscribe(EventKind::GuildDelete, move |_event, _bot| {
                    let order = order.clone();
                    async move { order.write().await.push(tag) }
                })
                .await;
        }
        registry
            .dispatch(
                Event::GuildDelete(GuildDeleteEvent {
                    guild_id: "1".to_string(),
                    unavailable: false,
                }),
                bot,
            )
            .await;
        assert_eq!(*order.read().await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn a_panicking_handler_does_not_stop_its_siblings() {
        let registry = EventRegistry::new();
        let bot = test_bot();
        let ran = Arc::new(AtomicUsize::new(0));
        registry
            .subscribe(EventKind::GuildDelete, |_event, _bot| async move {
                panic!("boom");
            })
            .await;
        let ran_clone = ran.clone();
        registry
            .subscribe(EventKind::GuildDelete, move |_event, _bot| {
                let ran = ran_clone.clone();
                async move {
                    ran.fetch_add(1, Ordering::SeqCst);
                }
            })
            .await;
        registry
            .dispatch(
                Event::GuildDelete(GuildDeleteEvent {
                    guild_id: "1".to_string(),
                    unavailable: false,
                }),
                bot,
            )
            .await;
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unsubscribe_removes_only_that_registration() {
        let registry = EventRegistry::new();
        let bot = test_bot();
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_clone = ran.clone();
        let id = registry
            .subscribe(EventKind::GuildDelete, move |_event, _bot| {
                let ran = ran_clone.clone();
                async move {
                    ran.fetch_add(1, Ordering::SeqCst);
                }
            })
            .await;
        registry.unsubscribe(EventKind::GuildDelete, id).await;
        registry
            .dispatch(
                Event::GuildDelete(GuildDeleteEvent {
                    guild_id: "1".to_string(),
                    unavailable: false,
                }),
                bot,
            )
            .await;
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }
}
