// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! `fluxcrystal`: a client library for Fluxer, a Discord-like chat
//! platform — the gateway connection engine (a persistent, authenticated,
//! bidirectional WebSocket session that stays alive across transient
//! network failures) together with the in-memory cache and typed event
//! dispatch fabric built on top of it, and the REST request envelope
//! (retry-on-429, multipart uploads, typed error mapping) used to act on
//! what the gateway reports.
//!
//! The [`Bot`] façade composes all of it: `Bot::new` builds a handle, then
//! `subscribe`/`listen` register handlers and `start`/`run` open the
//! gateway connection.

pub mod bot;
pub mod cache;
pub mod error;
pub mod events;
pub mod gateway;
pub mod model;
pub mod registry;
pub mod rest;

pub use bot::{Bot, BotConfig};
pub use error::{EmbedError, FluxError, FluxResult, GatewayError};
pub use events::{Event, EventKind};
pub use registry::SubscriptionId;
