//! The tagged-union event type fanned out to handlers, and the sugar that
//! lets a handler register for one concrete variant instead of matching the
//! whole enum.
//!
//! This replaces the teacher's per-field `Observer<T>`/`GatewayEvent<T>`
//! machinery with a single `Event` enum plus `EventKind` tags: registration
//! is `subscribe(EventKind::MessageCreate, handler)`, with a generic
//! `listen::<MessageCreateEvent>(handler)` wrapper for callers who'd rather
//! not match on the enum themselves.

mod channels;
mod guilds;
mod messages;
mod ready;

pub use channels::{ChannelCreateEvent, ChannelDeleteEvent, ChannelUpdateEvent, TypingStartEvent};
pub use guilds::{
    GuildBanAddEvent, GuildBanRemoveEvent, GuildCreateEvent, GuildDeleteEvent, GuildMemberAddEvent,
    GuildMemberRemoveEvent, GuildMemberUpdateEvent, GuildUpdateEvent,
};
pub use messages::{MessageCreateEvent, MessageDeleteEvent, MessageUpdateEvent};
pub use ready::ReadyEvent;

/// Stable tag identifying an event variant, independent of its payload.
/// Doubles as the registry key and the dispatch-name lookup target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Ready,
    MessageCreate,
    MessageUpdate,
    MessageDelete,
    GuildCreate,
    GuildUpdate,
    GuildDelete,
    GuildMemberAdd,
    GuildMemberRemove,
    GuildMemberUpdate,
    GuildBanAdd,
    GuildBanRemove,
    ChannelCreate,
    ChannelUpdate,
    ChannelDelete,
    TypingStart,
}

impl EventKind {
    pub fn dispatch_name(self) -> &'static str {
        match self {
            EventKind::Ready => "READY",
            EventKind::MessageCreate => "MESSAGE_CREATE",
            EventKind::MessageUpdate => "MESSAGE_UPDATE",
            EventKind::MessageDelete => "MESSAGE_DELETE",
            EventKind::GuildCreate => "GUILD_CREATE",
            EventKind::GuildUpdate => "GUILD_UPDATE",
            EventKind::GuildDelete => "GUILD_DELETE",
            EventKind::GuildMemberAdd => "GUILD_MEMBER_ADD",
            EventKind::GuildMemberRemove => "GUILD_MEMBER_REMOVE",
            EventKind::GuildMemberUpdate => "GUILD_MEMBER_UPDATE",
            EventKind::GuildBanAdd => "GUILD_BAN_ADD",
            EventKind::GuildBanRemove => "GUILD_BAN_REMOVE",
            EventKind::ChannelCreate => "CHANNEL_CREATE",
            EventKind::ChannelUpdate => "CHANNEL_UPDATE",
            EventKind::ChannelDelete => "CHANNEL_DELETE",
            EventKind::TypingStart => "TYPING_START",
        }
    }

    pub fn from_dispatch_name(name: &str) -> Option<Self> {
        Some(match name {
            "READY" => EventKind::Ready,
            "MESSAGE_CREATE" => EventKind::MessageCreate,
            "MESSAGE_UPDATE" => EventKind::MessageUpdate,
            "MESSAGE_DELETE" => EventKind::MessageDelete,
            "GUILD_CREATE" => EventKind::GuildCreate,
            "GUILD_UPDATE" => EventKind::GuildUpdate,
            "GUILD_DELETE" => EventKind::GuildDelete,
            "GUILD_MEMBER_ADD" => EventKind::GuildMemberAdd,
            "GUILD_MEMBER_REMOVE" => EventKind::GuildMemberRemove,
            "GUILD_MEMBER_UPDATE" => EventKind::GuildMemberUpdate,
            "GUILD_BAN_ADD" => EventKind::GuildBanAdd,
            "GUILD_BAN_REMOVE" => EventKind::GuildBanRemove,
            "CHANNEL_CREATE" => EventKind::ChannelCreate,
            "CHANNEL_UPDATE" => EventKind::ChannelUpdate,
            "CHANNEL_DELETE" => EventKind::ChannelDelete,
            "TYPING_START" => EventKind::TypingStart,
            _ => return None,
        })
    }
}

/// The tagged union dispatched to handlers.
#[derive(Debug, Clone)]
pub enum Event {
    Ready(ReadyEvent),
    MessageCreate(MessageCreateEvent),
    MessageUpdate(MessageUpdateEvent),
    MessageDelete(MessageDeleteEvent),
    GuildCreate(GuildCreateEvent),
    GuildUpdate(GuildUpdateEvent),
    GuildDelete(GuildDeleteEvent),
    GuildMemberAdd(GuildMemberAddEvent),
    GuildMemberRemove(GuildMemberRemoveEvent),
    GuildMemberUpdate(GuildMemberUpdateEvent),
    GuildBanAdd(GuildBanAddEvent),
    GuildBanRemove(GuildBanRemoveEvent),
    ChannelCreate(ChannelCreateEvent),
    ChannelUpdate(ChannelUpdateEvent),
    ChannelDelete(ChannelDeleteEvent),
    TypingStart(TypingStartEvent),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Ready(_) => EventKind::Ready,
            Event::MessageCreate(_) => EventKind::MessageCreate,
            Event::MessageUpdate(_) => EventKind::MessageUpdate,
            Event::MessageDelete(_) => EventKind::MessageDelete,
            Event::GuildCreate(_) => EventKind::GuildCreate,
            Event::GuildUpdate(_) => EventKind::GuildUpdate,
            Event::GuildDelete(_) => EventKind::GuildDelete,
            Event::GuildMemberAdd(_) => EventKind::GuildMemberAdd,
            Event::GuildMemberRemove(_) => EventKind::GuildMemberRemove,
            Event::GuildMemberUpdate(_) => EventKind::GuildMemberUpdate,
            Event::GuildBanAdd(_) => EventKind::GuildBanAdd,
            Event::GuildBanRemove(_) => EventKind::GuildBanRemove,
            Event::ChannelCreate(_) => EventKind::ChannelCreate,
            Event::ChannelUpdate(_) => EventKind::ChannelUpdate,
            Event::ChannelDelete(_) => EventKind::ChannelDelete,
            Event::TypingStart(_) => EventKind::TypingStart,
        }
    }
}

/// Implemented by each concrete event payload so `listen::<E>` can recover it
/// out of the tagged union without the caller writing the match arm.
pub trait TypedEvent: Sized + Clone + 'static {
    const KIND: EventKind;

    fn from_event(event: &Event) -> Option<&Self>;
}

macro_rules! typed_event {
    ($ty:ty, $kind:expr, $variant:ident) => {
        impl TypedEvent for $ty {
            const KIND: EventKind = $kind;

            fn from_event(event: &Event) -> Option<&Self> {
                match event {
                    Event::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

typed_event!(ReadyEvent, EventKind::Ready, Ready);
typed_event!(MessageCreateEvent, EventKind::MessageCreate, MessageCreate);
typed_event!(MessageUpdateEvent, EventKind::MessageUpdate, MessageUpdate);
typed_event!(MessageDeleteEvent, EventKind::MessageDelete, MessageDelete);
typed_event!(GuildCreateEvent, EventKind::GuildCreate, GuildCreate);
typed_event!(GuildUpdateEvent, EventKind::GuildUpdate, GuildUpdate);
typed_event!(GuildDeleteEvent, EventKind::GuildDelete, GuildDelete);
typed_event!(GuildMemberAddEvent, EventKind::GuildMemberAdd, GuildMemberAdd);
typed_event!(
    GuildMemberRemoveEvent,
    EventKind::GuildMemberRemove,
    GuildMemberRemove
);
typed_event!(
    GuildMemberUpdateEvent,
    EventKind::GuildMemberUpdate,
    GuildMemberUpdate
);
typed_event!(GuildBanAddEvent, EventKind::GuildBanAdd, GuildBanAdd);
typed_event!(GuildBanRemoveEvent, EventKind::GuildBanRemove, GuildBanRemove);
typed_event!(ChannelCreateEvent, EventKind::ChannelCreate, ChannelCreate);
typed_event!(ChannelUpdateEvent, EventKind::ChannelUpdate, ChannelUpdate);
typed_event!(ChannelDeleteEvent, EventKind::ChannelDelete, ChannelDelete);
typed_event!(TypingStartEvent, EventKind::TypingStart, TypingStart);
