use crate::error::EmbedError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedProvider {
    pub name: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: Option<String>,
    pub icon_url: Option<String>,
}

const MAX_FIELDS: usize = 25;

/// An embed as it appears on the wire and in a decoded [`crate::model::Message`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub timestamp: Option<String>,
    pub color: Option<u32>,
    pub footer: Option<EmbedFooter>,
    pub image: Option<EmbedImage>,
    pub thumbnail: Option<EmbedImage>,
    pub video: Option<EmbedImage>,
    pub provider: Option<EmbedProvider>,
    pub author: Option<EmbedAuthor>,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
}

/// An immutable builder over [`Embed`]: every `with_*`/`clear_*` call consumes
/// `self` and returns a new value with the mutation applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichEmbed(Embed);

impl RichEmbed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_embed(embed: Embed) -> Self {
        Self(embed)
    }

    pub fn build(self) -> Embed {
        self.0
    }

    fn copy_state(&self) -> Embed {
        self.0.clone()
    }

    pub fn with_title(&self, title: impl Into<String>) -> Self {
        let mut state = self.copy_state();
        state.title = Some(title.into());
        Self(state)
    }

    pub fn with_description(&self, description: impl Into<String>) -> Self {
        let mut state = self.copy_state();
        state.description = Some(description.into());
        Self(state)
    }

    pub fn with_url(&self, url: impl Into<String>) -> Self {
        let mut state = self.copy_state();
        state.url = Some(url.into());
        Self(state)
    }

    pub fn with_timestamp(&self, timestamp: impl Into<String>) -> Self {
        let mut state = self.copy_state();
        state.timestamp = Some(timestamp.into());
        Self(state)
    }

    pub fn with_color(&self, color: u32) -> Self {
        let mut state = self.copy_state();
        state.color = Some(color);
        Self(state)
    }

    pub fn with_footer(&self, text: impl Into<String>, icon_url: Option<String>) -> Self {
        let mut state = self.copy_state();
        state.footer = Some(EmbedFooter {
            text: text.into(),
            icon_url,
        });
        Self(state)
    }

    pub fn with_image(&self, url: impl Into<String>, height: Option<u32>, width: Option<u32>) -> Self {
        let mut state = self.copy_state();
        state.image = Some(EmbedImage {
            url: url.into(),
            height,
            width,
        });
        Self(state)
    }

    pub fn with_thumbnail(&self, url: impl Into<String>, height: Option<u32>, width: Option<u32>) -> Self {
        let mut state = self.copy_state();
        state.thumbnail = Some(EmbedImage {
            url: url.into(),
            height,
            width,
        });
        Self(state)
    }

    pub fn with_video(&self, url: impl Into<String>, height: Option<u32>, width: Option<u32>) -> Self {
        let mut state = self.copy_state();
        state.video = Some(EmbedImage {
            url: url.into(),
            height,
            width,
        });
        Self(state)
    }

    pub fn with_provider(&self, name: Option<String>, url: Option<String>) -> Self {
        let mut state = self.copy_state();
        state.provider = Some(EmbedProvider { name, url });
        Self(state)
    }

    pub fn with_author(
        &self,
        name: impl Into<String>,
        url: Option<String>,
        icon_url: Option<String>,
    ) -> Self {
        let mut state = self.copy_state();
        state.author = Some(EmbedAuthor {
            name: name.into(),
            url,
            icon_url,
        });
        Self(state)
    }

    pub fn with_field(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
        inline: bool,
    ) -> Result<Self, EmbedError> {
        let name = name.into();
        let value = value.into();
        if name.is_empty() {
            return Err(EmbedError::EmptyFieldName);
        }
        if value.is_empty() {
            return Err(EmbedError::EmptyFieldValue);
        }
        let mut state = self.copy_state();
        if state.fields.len() >= MAX_FIELDS {
            return Err(EmbedError::TooManyFields);
        }
        state.fields.push(EmbedField { name, value, inline });
        Ok(Self(state))
    }

    pub fn with_fields(&self, fields: Vec<EmbedField>) -> Result<Self, EmbedError> {
        if fields.len() > MAX_FIELDS {
            return Err(EmbedError::TooManyFields);
        }
        let mut state = self.copy_state();
        state.fields = fields;
        Ok(Self(state))
    }

    pub fn clear_fields(&self) -> Self {
        let mut state = self.copy_state();
        state.fields.clear();
        Self(state)
    }

    pub fn clear_author(&self) -> Self {
        let mut state = self.copy_state();
        state.author = None;
        Self(state)
    }

    pub fn clear_footer(&self) -> Self {
        let mut state = self.copy_state();
        state.footer = None;
        Self(state)
    }

    pub fn clear_image(&self) -> Self {
        let mut state = self.copy_state();
        state.image = None;
        Self(state)
    }

    pub fn clear_thumbnail(&self) -> Self {
        let mut state = self.copy_state();
        state.thumbnail = None;
        Self(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_is_immutable_and_round_trips() {
        let base = RichEmbed::new().with_title("hello");
        let with_color = base.with_color(0xff0000);
        assert_eq!(base.copy_state().color, None);
        assert_eq!(with_color.copy_state().color, Some(0xff0000));

        let embed = with_color.build();
        let json = serde_json::to_string(&embed).unwrap();
        let decoded: Embed = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, embed);
    }

    #[test]
    fn rejects_empty_field_name() {
        let err = RichEmbed::new().with_field("", "value", false).unwrap_err();
        assert_eq!(err, EmbedError::EmptyFieldName);
    }

    #[test]
    fn rejects_too_many_fields() {
        let mut embed = RichEmbed::new();
        for i in 0..MAX_FIELDS {
            embed = embed.with_field(format!("n{i}"), "v", false).unwrap();
        }
        let err = embed.with_field("n25", "v", false).unwrap_err();
        assert_eq!(err, EmbedError::TooManyFields);
    }
}
