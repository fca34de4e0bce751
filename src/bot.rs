// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The bot façade: composes the REST client, cache, event registry, and the
//! single active gateway connection behind `start`/`stop`/`run` and the
//! `subscribe`/`listen`/`dispatch` registration surface.

use crate::cache::Cache;
use crate::error::FluxResult;
use crate::events::{Event, EventKind, TypedEvent};
use crate::gateway::{GatewayConnection, GatewayOptions};
use crate::registry::{EventRegistry, SubscriptionId};
use crate::rest::RestClient;
use std::future::Future;
use std::sync::{Arc, Weak};
use tokio::sync::{Notify, RwLock};

/// Default REST base URL, used when [`BotConfig::base_url`] is left unset —
/// mirrors the reference implementation's `_REST_ENDPOINT` default.
pub const DEFAULT_BASE_URL: &str = "https://api.fluxer.app/v1";

/// The façade's programmatic configuration surface: a required token and an
/// optional base URL override for self-hosted instances. No file-based
/// configuration loading is provided — callers construct this directly.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub base_url: Option<String>,
}

impl BotConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Owns the token, REST client, cache, handler table, and the cancellation
/// handle for the currently running connection. Cloning a handler-visible
/// reference to a `Bot` is always via `Arc<Bot>` — see [`Event`]'s
/// back-reference in `registry::dispatch`.
pub struct Bot {
    weak_self: Weak<Bot>,
    token: String,
    /// The REST envelope. Public so handlers holding an `Arc<Bot>` can call
    /// it directly, e.g. `bot.rest.create_message(...)`.
    pub rest: RestClient,
    /// The in-memory cache, already populated by the read loop before the
    /// handler that observes it runs.
    pub cache: Arc<Cache>,
    registry: Arc<EventRegistry>,
    connection: RwLock<Option<Arc<GatewayConnection>>>,
    stop_notify: Notify,
}

impl Bot {
    /// Builds a new façade. Does not connect to anything; call
    /// [`start`](Self::start) (or [`run`](Self::run)) to open the gateway.
    pub fn new(token: impl Into<String>, base_url: impl Into<String>) -> FluxResult<Arc<Self>> {
        let token = token.into();
        let rest = RestClient::new(base_url, Some(token.clone()))?;
        Ok(Arc::new_cyclic(|weak_self| Bot {
            weak_self: weak_self.clone(),
            token,
            rest,
            cache: Arc::new(Cache::new()),
            registry: Arc::new(EventRegistry::new()),
            connection: RwLock::new(None),
            stop_notify: Notify::new(),
        }))
    }

    /// Builds a new façade from a [`BotConfig`], falling back to
    /// [`DEFAULT_BASE_URL`] when [`BotConfig::base_url`] is unset — the
    /// programmatic configuration surface described by the crate's
    /// Configuration interface.
    pub fn with_config(config: BotConfig) -> FluxResult<Arc<Self>> {
        let base_url = config.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(config.token, base_url)
    }

    fn handle(&self) -> Arc<Bot> {
        self.weak_self
            .upgrade()
            .expect("Bot handle dropped while its own method is still running")
    }

    /// Registers `handler` to run, in registration order alongside any
    /// other handler for `kind`, whenever an event of that kind is
    /// dispatched.
    pub async fn subscribe<F, Fut>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(Event, Arc<Bot>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.registry.subscribe(kind, handler).await
    }

    /// Type-inferred sugar over [`subscribe`](Self::subscribe): `E::KIND` is
    /// resolved from the handler's own payload type, so callers never name
    /// the [`EventKind`] explicitly.
    pub async fn listen<E, F, Fut>(&self, handler: F) -> SubscriptionId
    where
        E: TypedEvent + Send + Sync,
        F: Fn(E, Arc<Bot>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.registry.listen(handler).await
    }

    /// Removes a registration made with [`subscribe`](Self::subscribe) or
    /// [`listen`](Self::listen).
    pub async fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) {
        self.registry.unsubscribe(kind, id).await;
    }

    /// Fans `event` out to every handler registered for its kind. Exposed
    /// directly so tests and embedders can drive the handler table without
    /// a live gateway connection.
    pub async fn dispatch(&self, event: Event) {
        self.registry.dispatch(event, self.handle()).await;
    }

    /// Fetches the gateway URL, opens the connection, and runs its
    /// heartbeat/read loops until a fatal protocol error surfaces or
    /// [`stop`](Self::stop) is called.
    pub async fn start(self: &Arc<Self>) -> FluxResult<()> {
        let url = self.rest.get_gateway_url().await?;
        let options = GatewayOptions {
            url,
            token: self.token.clone(),
        };
        let connection = Arc::new(GatewayConnection::new(
            options,
            self.cache.clone(),
            self.registry.clone(),
            Arc::downgrade(self),
        ));
        *self.connection.write().await = Some(connection.clone());
        let result = tokio::select! {
            result = connection.run() => result,
            _ = self.stop_notify.notified() => {
                connection.request_stop();
                Ok(())
            }
        };
        *self.connection.write().await = None;
        Ok(result?)
    }

    /// Cancels the running connection's task group cooperatively; both the
    /// heartbeat and read loops unwind at their next suspension point.
    pub fn stop(&self) {
        self.stop_notify.notify_waiters();
    }

    /// Blocking convenience over [`start`](Self::start) that treats Ctrl-C
    /// as a clean shutdown instead of an error.
    pub async fn run(self: &Arc<Self>) -> FluxResult<()> {
        tokio::select! {
            result = self.start() => result,
            _ = tokio::signal::ctrl_c() => {
                self.stop();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::GuildDeleteEvent;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn dispatch_hands_handlers_a_working_bot_back_reference() {
        let bot = Bot::new("token", "http://localhost:1").unwrap();
        let saw_same_bot = Arc::new(AtomicBool::new(false));
        let flag = saw_same_bot.clone();
        let expected_ptr = Arc::as_ptr(&bot) as usize;
        bot.subscribe(EventKind::GuildDelete, move |_event, handle| {
            let flag = flag.clone();
            async move {
                flag.store(Arc::as_ptr(&handle) as usize == expected_ptr, Ordering::SeqCst);
            }
        })
        .await;
        bot.dispatch(Event::GuildDelete(GuildDeleteEvent {
            guild_id: "1".to_string(),
            unavailable: false,
        }))
        .await;
        assert!(saw_same_bot.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn stop_before_start_returns_cleanly() {
        // stop() on a Bot that never started must not panic; it simply has
        // no running connection to cancel.
        let bot = Bot::new("token", "http://localhost:1").unwrap();
        bot.stop();
    }

    #[test]
    fn with_config_falls_back_to_default_base_url() {
        let bot = Bot::with_config(BotConfig::new("token")).unwrap();
        assert_eq!(bot.rest.base_url_for_test(), DEFAULT_BASE_URL);
    }
}
