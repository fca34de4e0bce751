//! Domain models: the subset of the Fluxer object graph the cache and event
//! dispatch fabric need to hold and hand to user handlers.

mod channel;
mod embed;
mod guild;
mod message;
mod upload;
mod user;

pub use channel::Channel;
pub use embed::{Embed, EmbedAuthor, EmbedField, EmbedFooter, EmbedImage, EmbedProvider, RichEmbed};
pub use guild::{Guild, GuildMember, Role};
pub use message::{Message, MessageReference};
pub use upload::{Attachment, AttachmentUpload};
pub use user::User;
