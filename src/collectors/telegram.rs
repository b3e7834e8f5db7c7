use super::fetcher::Fetcher;
use super::types::{DiscussionChat, TelegramChannelStats, TelegramSnapshot};
use crate::config::{TelegramChannel, TelegramConfig};
use crate::error::{Error, Result};
use chrono::Utc;
use serde_json::Value;

const PLATFORM: &str = "Telegram";
const INACCESSIBLE: &str = "Bot cannot access channel";

#[derive(Debug, Clone, PartialEq)]
pub struct BotMembership {
    pub status: String,
    pub is_admin: bool,
}

/// Telegram Bot API client. The Bot API exposes chat metadata and, where the
/// bot is an administrator, member counts; post views and message history
/// are out of reach.
pub struct TelegramCollector {
    token: String,
    base_url: String,
    channels: Vec<TelegramChannel>,
    fetcher: Box<dyn Fetcher>,
}

impl TelegramCollector {
    pub fn new(config: &TelegramConfig, fetcher: Box<dyn Fetcher>) -> Result<Self> {
        let token = config.bot_token.clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Config(format!(
                "Telegram bot token missing (set telegram.bot_token or {})",
                crate::config::TELEGRAM_BOT_TOKEN_ENV
            )))?;

        Ok(Self {
            token,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            channels: config.channels.clone(),
            fetcher,
        })
    }

    /// The numeric prefix of the token is the bot's own user id.
    pub fn bot_id(&self) -> &str {
        self.token.split(':').next().unwrap_or_default()
    }

    fn call(&self, method: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}/bot{}/{}", self.base_url, self.token, method);
        let data = self.fetcher.get_json(&url, params)?;

        if data.get("ok").and_then(Value::as_bool) == Some(true) {
            Ok(data.get("result").cloned().unwrap_or(Value::Null))
        } else {
            let description = data.get("description")
                .and_then(Value::as_str)
                .unwrap_or("request failed");
            Err(Error::api(PLATFORM, format!("{}: {}", method, description)))
        }
    }

    pub fn get_chat(&self, chat_id: &str) -> Result<Value> {
        self.call("getChat", &[("chat_id", chat_id)])
    }

    pub fn member_count(&self, chat_id: &str) -> Result<u64> {
        let result = self.call("getChatMemberCount", &[("chat_id", chat_id)])?;
        result.as_u64()
            .ok_or_else(|| Error::Parse(format!("member count for {} is not a number", chat_id)))
    }

    pub fn bot_membership(&self, chat_id: &str) -> Result<BotMembership> {
        let member = self.call("getChatMember", &[("chat_id", chat_id), ("user_id", self.bot_id())])?;
        let status = member.get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        Ok(BotMembership {
            is_admin: status == "administrator" || status == "creator",
            status,
        })
    }

    /// Metadata for a linked discussion group.
    pub fn discussion_chat(&self, chat_id: &str) -> DiscussionChat {
        match self.get_chat(chat_id) {
            Ok(chat) => DiscussionChat {
                chat_exists: true,
                chat_title: chat.get("title").and_then(Value::as_str).map(str::to_string),
                chat_type: chat.get("type").and_then(Value::as_str).map(str::to_string),
                chat_members: self.member_count(chat_id).ok(),
            },
            Err(e) => {
                log::debug!("Discussion chat {} unavailable: {}", chat_id, e);
                DiscussionChat::missing()
            }
        }
    }

    /// Collects every configured channel. Channels the bot cannot read are
    /// recorded with an error; the run only fails when the API was
    /// unreachable for every channel.
    pub fn collect(&self) -> Result<TelegramSnapshot> {
        log::info!("Starting Telegram collection for {} channel(s)", self.channels.len());

        let mut channels = Vec::new();
        let mut failures = 0;
        let mut last_error = None;

        for tracked in &self.channels {
            match self.get_chat(&tracked.username) {
                Ok(chat) => {
                    let stats = self.channel_stats(tracked, &chat);
                    log::info!("{}: subscribers {}, bot admin: {}",
                        tracked.username,
                        stats.subscribers.map(|s| s.to_string()).unwrap_or_else(|| "N/A".to_string()),
                        stats.bot_is_admin);
                    channels.push(stats);
                }
                Err(e) => {
                    log::warn!("Could not access {}: {}", tracked.username, e);
                    failures += 1;
                    last_error = Some(e);
                    channels.push(TelegramChannelStats::inaccessible(
                        Utc::now(), &tracked.username, &tracked.name, INACCESSIBLE,
                    ));
                }
            }
        }

        // A snapshot with no accessible channel must not replace the stored one.
        if failures > 0 && failures == self.channels.len() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        let snapshot = TelegramSnapshot {
            generated_at: Utc::now(),
            channels,
            bot_api_version: true,
            limitations: Vec::new(),
        };

        let accessible = snapshot.accessible().count();
        let with_subscribers = snapshot.accessible().filter(|c| c.subscribers.is_some()).count();
        log::info!("Telegram collection complete: {}/{} accessible, {} with subscriber count",
            accessible, snapshot.channels.len(), with_subscribers);

        Ok(snapshot)
    }

    fn channel_stats(&self, tracked: &TelegramChannel, chat: &Value) -> TelegramChannelStats {
        let text = |key: &str| chat.get(key).and_then(Value::as_str).map(str::to_string);

        let subscribers = self.member_count(&tracked.username).ok();
        let membership = self.bot_membership(&tracked.username).ok();
        let chat_data = tracked.chat.as_deref().map(|chat_id| self.discussion_chat(chat_id));

        TelegramChannelStats {
            timestamp: Utc::now(),
            username: tracked.username.clone(),
            name: tracked.name.clone(),
            error: None,
            channel_id: chat.get("id").and_then(Value::as_i64),
            title: text("title"),
            chat_type: text("type"),
            description: Some(text("description").unwrap_or_default()),
            invite_link: text("invite_link"),
            has_visible_history: chat.get("has_visible_history").and_then(Value::as_bool).unwrap_or(false),
            subscribers,
            bot_is_admin: membership.as_ref().map(|m| m.is_admin).unwrap_or(false),
            bot_status: Some(membership.map(|m| m.status).unwrap_or_else(|| "unknown".to_string())),
            chat_data,
        }
    }
}
