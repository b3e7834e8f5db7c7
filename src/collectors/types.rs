use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Telegram,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Youtube => write!(f, "YouTube"),
            Platform::Telegram => write!(f, "Telegram"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoutubeChannelStats {
    pub channel_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default = "not_available")]
    pub country: String,
    pub subscribers: u64,
    pub views: u64,
    pub videos: u64,
    #[serde(default)]
    pub uploads_playlist: String,
    #[serde(default)]
    pub handle: String,
    pub timestamp: DateTime<Utc>,
}

impl YoutubeChannelStats {
    pub fn average_views(&self) -> u64 {
        if self.videos > 0 {
            self.views / self.videos
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoStats {
    pub video_id: String,
    pub title: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub duration: String,
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub channel_title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoutubeSnapshot {
    pub generated_at: DateTime<Utc>,
    pub channels: Vec<YoutubeChannelStats>,
    #[serde(default)]
    pub recent_videos: Vec<VideoStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscussionChat {
    pub chat_exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_members: Option<u64>,
}

impl DiscussionChat {
    pub fn missing() -> Self {
        Self {
            chat_exists: false,
            chat_title: None,
            chat_type: None,
            chat_members: None,
        }
    }
}

/// One Telegram channel as seen by the bot. `error` is set when the bot
/// could not read the channel at all; the other fields are then empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelegramChannelStats {
    pub timestamp: DateTime<Utc>,
    pub username: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub chat_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_link: Option<String>,
    #[serde(default)]
    pub has_visible_history: bool,
    #[serde(default)]
    pub subscribers: Option<u64>,
    #[serde(default)]
    pub bot_is_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_data: Option<DiscussionChat>,
}

impl TelegramChannelStats {
    pub fn inaccessible(timestamp: DateTime<Utc>, username: &str, name: &str, reason: &str) -> Self {
        Self {
            timestamp,
            username: username.to_string(),
            name: name.to_string(),
            error: Some(reason.to_string()),
            channel_id: None,
            title: None,
            chat_type: None,
            description: None,
            invite_link: None,
            has_visible_history: false,
            subscribers: None,
            bot_is_admin: false,
            bot_status: None,
            chat_data: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelegramSnapshot {
    pub generated_at: DateTime<Utc>,
    pub channels: Vec<TelegramChannelStats>,
    #[serde(default)]
    pub bot_api_version: bool,
    #[serde(default)]
    pub limitations: Vec<String>,
}

impl TelegramSnapshot {
    pub fn accessible(&self) -> impl Iterator<Item = &TelegramChannelStats> {
        self.channels.iter().filter(|c| c.is_ok())
    }
}

fn not_available() -> String {
    "N/A".to_string()
}
