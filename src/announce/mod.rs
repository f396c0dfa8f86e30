//! Announcement generation against the AI completion gateway.
//!
//! One feature in, four channel-specific text variants out. Each channel is
//! an independent chat-completion request with its own system instruction and
//! prompt; the four requests run concurrently and are joined before
//! responding. A failure on any channel fails the whole request — there is no
//! partial result and no retry.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::AiConfig;
use crate::error::ApiError;
use crate::storage::FeatureType;

// ─── Request / response types ────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AnnouncementRequest {
    pub title: String,
    pub description: String,
    pub feature_type: FeatureType,
}

/// The four generated variants, one per channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementSet {
    pub twitter: String,
    pub linkedin: String,
    pub changelog: String,
    pub popup: String,
}

// ─── Channels ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Twitter,
    LinkedIn,
    Changelog,
    Popup,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Twitter,
        Channel::LinkedIn,
        Channel::Changelog,
        Channel::Popup,
    ];

    fn system_instruction(&self) -> &'static str {
        match self {
            Channel::Twitter => {
                "You are a social media expert who creates engaging, concise announcements."
            }
            Channel::LinkedIn => {
                "You are a professional content writer who creates engaging LinkedIn posts."
            }
            Channel::Changelog => "You are a technical writer who creates clear changelog entries.",
            Channel::Popup => {
                "You are a UX copywriter who creates concise, exciting in-app notifications."
            }
        }
    }

    /// Per-channel prompt. Length and tone constraints are instructions to
    /// the model only — nothing downstream enforces them.
    fn user_prompt(&self, req: &AnnouncementRequest) -> String {
        let kind = req.feature_type.as_str();
        let title = &req.title;
        let description = &req.description;
        match self {
            Channel::Twitter => format!(
                "Create a short, engaging tweet to announce this {kind}: \"{title}\". \
                 Description: {description}. Make it punchy, use relevant emojis, and keep it \
                 under 280 characters."
            ),
            Channel::LinkedIn => format!(
                "Create a professional LinkedIn post to announce this {kind}: \"{title}\". \
                 Description: {description}. Make it story-driven, engaging, and around 150-200 \
                 words. Include relevant emojis."
            ),
            Channel::Changelog => format!(
                "Create a clear, structured changelog entry for this {kind}: \"{title}\". \
                 Description: {description}. Format it professionally with bullet points if \
                 needed."
            ),
            Channel::Popup => format!(
                "Create a brief, exciting in-app popup message for this {kind}: \"{title}\". \
                 Description: {description}. Keep it under 100 characters, make it exciting and \
                 clear."
            ),
        }
    }

    fn failure_message(&self) -> &'static str {
        match self {
            Channel::Twitter => "Failed to generate Twitter post",
            Channel::LinkedIn => "Failed to generate LinkedIn post",
            Channel::Changelog => "Failed to generate changelog",
            Channel::Popup => "Failed to generate popup text",
        }
    }
}

// ─── Completion API wire types ───────────────────────────────────────────────

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

// ─── Generator ───────────────────────────────────────────────────────────────

pub struct Generator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl Generator {
    /// Fails when no API key is configured — checked at request time so the
    /// daemon can run without one until the endpoint is actually hit.
    pub fn from_config(config: &AiConfig) -> Result<Self, ApiError> {
        let api_key = match &config.api_key {
            Some(key) if !key.is_empty() => key.clone(),
            _ => return Err(ApiError::Config("AI API key is not configured".to_string())),
        };
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Generation(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }

    /// Generate all four variants. The channel requests run concurrently;
    /// the first failure aborts the whole set.
    pub async fn generate(&self, req: &AnnouncementRequest) -> Result<AnnouncementSet, ApiError> {
        info!(title = %req.title, "generating announcements");
        let (twitter, linkedin, changelog, popup) = tokio::try_join!(
            self.channel(Channel::Twitter, req),
            self.channel(Channel::LinkedIn, req),
            self.channel(Channel::Changelog, req),
            self.channel(Channel::Popup, req),
        )?;
        info!("successfully generated all announcements");
        Ok(AnnouncementSet {
            twitter,
            linkedin,
            changelog,
            popup,
        })
    }

    async fn channel(&self, channel: Channel, req: &AnnouncementRequest) -> Result<String, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let prompt = channel.user_prompt(req);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: channel.system_instruction(),
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
        };

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(channel = ?channel, "completion request failed: {e}");
                ApiError::Generation(channel.failure_message().to_string())
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            error!(channel = ?channel, %status, "completion error: {text}");
            return Err(ApiError::Generation(channel.failure_message().to_string()));
        }

        let parsed: ChatResponse = resp.json().await.map_err(|e| {
            error!(channel = ?channel, "malformed completion response: {e}");
            ApiError::Generation(channel.failure_message().to_string())
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ApiError::Generation(channel.failure_message().to_string()))
    }
}
