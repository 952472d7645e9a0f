//! Story records kept in the story store.

use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A generated story and its media.
///
/// Serialized in camelCase; optional fields are omitted when unset so that
/// stored collections stay compatible with records written before the field
/// existed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Story {
    pub id: String,
    pub theme: String,
    pub character_name: String,
    pub character_traits: String,
    pub title: String,
    pub content: String,
    /// RFC3339, UTC
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_generated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

/// Fields supplied by the caller when adding a story; the store assigns
/// `id` and `createdAt`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStory {
    pub theme: String,
    pub character_name: String,
    pub character_traits: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewStory {
    pub(crate) fn into_story(self, id: String, created_at: String) -> Story {
        Story {
            id,
            theme: self.theme,
            character_name: self.character_name,
            character_traits: self.character_traits,
            title: self.title,
            content: self.content,
            created_at,
            image_url: self.image_url,
            is_favorite: None,
            extension_count: None,
            speech_generated: None,
            audio_url: None,
        }
    }
}

/// Partial update merged into an existing story. `id` and `createdAt` are
/// not part of the patch and can never change.
///
/// Text fields, when present, must not be blank.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StoryPatch {
    #[validate(custom(function = "crate::models::not_blank"))]
    pub theme: Option<String>,
    #[validate(custom(function = "crate::models::not_blank"))]
    pub character_name: Option<String>,
    #[validate(custom(function = "crate::models::not_blank"))]
    pub character_traits: Option<String>,
    #[validate(custom(function = "crate::models::not_blank"))]
    pub title: Option<String>,
    #[validate(custom(function = "crate::models::not_blank"))]
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub is_favorite: Option<bool>,
    pub extension_count: Option<u32>,
    pub speech_generated: Option<bool>,
    pub audio_url: Option<String>,
}

impl StoryPatch {
    /// Overwrite only the fields present in the patch.
    pub fn apply(self, story: &mut Story) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }
        fn set_opt<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        set(&mut story.theme, self.theme);
        set(&mut story.character_name, self.character_name);
        set(&mut story.character_traits, self.character_traits);
        set(&mut story.title, self.title);
        set(&mut story.content, self.content);
        set_opt(&mut story.image_url, self.image_url);
        set_opt(&mut story.is_favorite, self.is_favorite);
        set_opt(&mut story.extension_count, self.extension_count);
        set_opt(&mut story.speech_generated, self.speech_generated);
        set_opt(&mut story.audio_url, self.audio_url);
    }
}
