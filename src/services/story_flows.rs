// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Story generation flows.
//!
//! Each flow validates its input, sends one prompt to the model and
//! validates what comes back:
//! - generate: theme + character → title and story text
//! - extend: story so far + guidance → next section
//! - illustrate: title + theme → image data URL
//! - narrate: story text → WAV data URL

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::not_blank;
use crate::services::audio::{pcm_to_wav, sample_rate_from_mime};
use crate::services::gemini::{GenerateContentRequest, GenerationConfig, GenerativeModel};
use crate::services::prompts;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::Validate;

const STORY_FAILED: &str = "No se pudo generar el cuento. Inténtalo de nuevo.";
const CONTINUATION_FAILED: &str = "No se pudo continuar el cuento. Inténtalo de nuevo.";
const IMAGE_FAILED: &str = "No se pudo generar la imagen del cuento.";
const AUDIO_FAILED: &str = "No se pudo generar el audio del cuento.";

/// Model identifiers used by the flows.
#[derive(Debug, Clone)]
pub struct ModelNames {
    pub text: String,
    pub image: String,
    pub speech: String,
    /// Default narration voice
    pub voice: String,
}

impl ModelNames {
    pub fn from_config(config: &Config) -> Self {
        Self {
            text: config.text_model.clone(),
            image: config.image_model.clone(),
            speech: config.speech_model.clone(),
            voice: config.voice.clone(),
        }
    }
}

// ─── Contracts ───────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateStoryInput {
    #[validate(custom(function = "not_blank"))]
    pub theme: String,
    #[validate(custom(function = "not_blank"))]
    pub character_name: String,
    #[validate(custom(function = "not_blank"))]
    pub character_traits: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GeneratedStory {
    #[validate(custom(function = "not_blank"))]
    pub title: String,
    #[validate(custom(function = "not_blank"))]
    pub story: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExtendStoryInput {
    #[validate(custom(function = "not_blank"))]
    pub existing_story: String,
    #[validate(custom(function = "not_blank"))]
    pub continuation_prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StoryContinuation {
    #[validate(custom(function = "not_blank"))]
    pub continuation: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IllustrateStoryInput {
    #[validate(custom(function = "not_blank"))]
    pub title: String,
    #[validate(custom(function = "not_blank"))]
    pub theme: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Illustration {
    /// `data:<mime>;base64,...`
    pub image_url: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NarrateStoryInput {
    #[validate(custom(function = "not_blank"))]
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Narration {
    /// `data:audio/wav;base64,...`
    pub audio_url: String,
}

// ─── Flows ───────────────────────────────────────────────────

/// The four flows over one model client.
pub struct StoryFlows<M> {
    model: M,
    models: ModelNames,
}

impl<M: GenerativeModel> StoryFlows<M> {
    pub fn new(model: M, models: ModelNames) -> Self {
        Self { model, models }
    }

    /// Write a new story about a character.
    pub async fn generate_story(&self, input: GenerateStoryInput) -> Result<GeneratedStory> {
        input.validate()?;
        tracing::info!(theme = %input.theme, character = %input.character_name, "Generating story");

        let request = GenerateContentRequest::from_prompt(prompts::generate_story(
            &input.theme,
            &input.character_name,
            &input.character_traits,
        ))
        .with_config(GenerationConfig::json(prompts::story_schema()));

        self.structured(&request, STORY_FAILED).await
    }

    /// Write the next section of a story.
    ///
    /// Consistency with the earlier text is asked for in the prompt only.
    pub async fn extend_story(&self, input: ExtendStoryInput) -> Result<StoryContinuation> {
        input.validate()?;
        tracing::info!(
            story_chars = input.existing_story.chars().count(),
            "Extending story"
        );

        let request = GenerateContentRequest::from_prompt(prompts::extend_story(
            &input.existing_story,
            &input.continuation_prompt,
        ))
        .with_config(GenerationConfig::json(prompts::continuation_schema()));

        self.structured(&request, CONTINUATION_FAILED).await
    }

    /// Draw a cover image for a story.
    pub async fn illustrate_story(&self, input: IllustrateStoryInput) -> Result<Illustration> {
        input.validate()?;
        tracing::info!(title = %input.title, "Illustrating story");

        let request =
            GenerateContentRequest::from_prompt(prompts::illustrate_story(&input.title, &input.theme))
                .with_config(GenerationConfig::modalities(&["TEXT", "IMAGE"]));

        let response = self
            .model
            .generate_content(&self.models.image, &request)
            .await?;

        let image = response.inline_data("image/").ok_or_else(|| {
            tracing::warn!(finish_reason = ?response.finish_reason(), "No image in model response");
            AppError::Generation(IMAGE_FAILED.to_string())
        })?;

        Ok(Illustration {
            image_url: format!("data:{};base64,{}", image.mime_type, image.data),
        })
    }

    /// Read a story aloud.
    pub async fn narrate_story(&self, input: NarrateStoryInput) -> Result<Narration> {
        input.validate()?;
        let voice = input
            .voice
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.models.voice);
        tracing::info!(voice, "Narrating story");

        let request = GenerateContentRequest::from_prompt(prompts::narrate_story(&input.text))
            .with_config(GenerationConfig::modalities(&["AUDIO"]).with_voice(voice));

        let response = self
            .model
            .generate_content(&self.models.speech, &request)
            .await?;

        let audio = response.inline_data("audio/").ok_or_else(|| {
            tracing::warn!(finish_reason = ?response.finish_reason(), "No audio in model response");
            AppError::Generation(AUDIO_FAILED.to_string())
        })?;

        let pcm = BASE64.decode(&audio.data).map_err(|e| {
            tracing::warn!(error = %e, "Audio payload is not valid base64");
            AppError::Generation(AUDIO_FAILED.to_string())
        })?;
        let wav = pcm_to_wav(&pcm, sample_rate_from_mime(&audio.mime_type)).map_err(|e| {
            tracing::warn!(error = %e, "Failed to package narration audio");
            AppError::Generation(AUDIO_FAILED.to_string())
        })?;

        Ok(Narration {
            audio_url: format!("data:audio/wav;base64,{}", BASE64.encode(wav)),
        })
    }

    /// Run a JSON-mode request on the text model and validate the result.
    async fn structured<T>(&self, request: &GenerateContentRequest, failure: &str) -> Result<T>
    where
        T: DeserializeOwned + Validate,
    {
        let response = self
            .model
            .generate_content(&self.models.text, request)
            .await?;

        let Some(text) = response.text() else {
            tracing::warn!(finish_reason = ?response.finish_reason(), "Empty model response");
            return Err(AppError::Generation(failure.to_string()));
        };

        let output: T = serde_json::from_str(strip_code_fence(&text)).map_err(|e| {
            tracing::warn!(error = %e, "Model output does not match the expected shape");
            AppError::Generation(failure.to_string())
        })?;

        output.validate().map_err(|e| {
            tracing::warn!(error = %e, "Model output failed validation");
            AppError::Generation(failure.to_string())
        })?;

        Ok(output)
    }
}

/// Remove a surrounding Markdown code fence, which some models add even in
/// JSON mode.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence(" {\"a\":1} "), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
    }

    #[test]
    fn test_blank_fields_fail_validation() {
        let input = GenerateStoryInput {
            theme: "aventura".into(),
            character_name: "   ".into(),
            character_traits: "valiente".into(),
        };
        let err = AppError::from(input.validate().unwrap_err());
        match err {
            AppError::BadRequest(msg) => assert_eq!(msg, "character_name is required"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
