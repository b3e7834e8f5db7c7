use super::fetcher::Fetcher;
use super::types::{VideoStats, YoutubeChannelStats, YoutubeSnapshot};
use crate::config::{YoutubeChannel, YoutubeConfig};
use crate::error::{Error, Result};
use chrono::Utc;
use serde_json::Value;

const PLATFORM: &str = "YouTube";
const DESCRIPTION_CHARS: usize = 200;

/// YouTube Data API v3 client. Each configured channel costs roughly three
/// quota units per run (search, channels, playlist/videos).
pub struct YoutubeCollector {
    api_key: String,
    base_url: String,
    recent_videos: usize,
    channels: Vec<YoutubeChannel>,
    fetcher: Box<dyn Fetcher>,
}

impl YoutubeCollector {
    pub fn new(config: &YoutubeConfig, fetcher: Box<dyn Fetcher>) -> Result<Self> {
        let api_key = config.api_key.clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config(format!(
                "YouTube API key missing (set youtube.api_key or {})",
                crate::config::YOUTUBE_API_KEY_ENV
            )))?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            recent_videos: config.recent_videos,
            channels: config.channels.clone(),
            fetcher,
        })
    }

    fn call(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("key", self.api_key.as_str()));

        let data = self.fetcher.get_json(&url, &query)?;
        if let Some(error) = data.get("error") {
            let message = error.get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(Error::api(PLATFORM, message));
        }

        Ok(data)
    }

    /// Resolves a handle to a channel id. Prefers a result whose title
    /// contains the handle or the configured display name.
    pub fn search_channel(&self, handle: &str, name: &str) -> Result<Option<String>> {
        let data = self.call("search", &[
            ("part", "snippet"),
            ("q", handle),
            ("type", "channel"),
            ("maxResults", "3"),
        ])?;

        let results = items(&data);
        let handle_lc = handle.trim_start_matches('@').to_lowercase();
        let name_lc = name.to_lowercase();

        let best = results.iter()
            .find(|item| {
                let title = str_at(item, &["snippet", "title"]).to_lowercase();
                title.contains(&handle_lc) || (!name_lc.is_empty() && title.contains(&name_lc))
            })
            .or_else(|| results.first());

        Ok(best
            .map(|item| str_at(item, &["snippet", "channelId"]).to_string())
            .filter(|id| !id.is_empty()))
    }

    pub fn channel_stats(&self, channel_id: &str) -> Result<Option<YoutubeChannelStats>> {
        let data = self.call("channels", &[
            ("part", "statistics,snippet,contentDetails"),
            ("id", channel_id),
        ])?;

        let Some(channel) = items(&data).first() else {
            return Ok(None);
        };

        let country = str_at(channel, &["snippet", "country"]);

        Ok(Some(YoutubeChannelStats {
            channel_id: channel_id.to_string(),
            title: str_at(channel, &["snippet", "title"]).to_string(),
            description: str_at(channel, &["snippet", "description"])
                .chars()
                .take(DESCRIPTION_CHARS)
                .collect(),
            published_at: str_at(channel, &["snippet", "publishedAt"]).to_string(),
            country: if country.is_empty() { "N/A".to_string() } else { country.to_string() },
            subscribers: count_at(channel, &["statistics", "subscriberCount"]),
            views: count_at(channel, &["statistics", "viewCount"]),
            videos: count_at(channel, &["statistics", "videoCount"]),
            uploads_playlist: str_at(channel, &["contentDetails", "relatedPlaylists", "uploads"]).to_string(),
            handle: String::new(),
            timestamp: Utc::now(),
        }))
    }

    pub fn recent_videos(&self, playlist_id: &str, max_results: usize) -> Result<Vec<VideoStats>> {
        if playlist_id.is_empty() || max_results == 0 {
            return Ok(Vec::new());
        }

        let max = max_results.to_string();
        let playlist = self.call("playlistItems", &[
            ("part", "contentDetails,snippet"),
            ("playlistId", playlist_id),
            ("maxResults", max.as_str()),
        ])?;

        let video_ids: Vec<&str> = items(&playlist).iter()
            .map(|item| str_at(item, &["contentDetails", "videoId"]))
            .filter(|id| !id.is_empty())
            .collect();
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = video_ids.join(",");
        let videos = self.call("videos", &[
            ("part", "statistics,snippet,contentDetails"),
            ("id", ids.as_str()),
        ])?;

        Ok(items(&videos).iter()
            .map(|video| VideoStats {
                video_id: str_at(video, &["id"]).to_string(),
                title: str_at(video, &["snippet", "title"]).to_string(),
                published_at: str_at(video, &["snippet", "publishedAt"]).to_string(),
                duration: str_at(video, &["contentDetails", "duration"]).to_string(),
                views: count_at(video, &["statistics", "viewCount"]),
                likes: count_at(video, &["statistics", "likeCount"]),
                comments: count_at(video, &["statistics", "commentCount"]),
                channel_id: String::new(),
                channel_title: String::new(),
            })
            .collect())
    }

    /// Collects every configured channel. A channel that cannot be resolved is
    /// skipped; the run only fails when every channel hit a network error.
    pub fn collect(&self) -> Result<YoutubeSnapshot> {
        log::info!("Starting YouTube collection for {} channel(s)", self.channels.len());

        let mut channels = Vec::new();
        let mut recent_videos = Vec::new();
        let mut last_error = None;

        for tracked in &self.channels {
            match self.collect_channel(tracked) {
                Ok(Some((stats, videos))) => {
                    log::info!("{}: {} subscribers, {} views", stats.title, stats.subscribers, stats.views);
                    channels.push(stats);
                    recent_videos.extend(videos);
                }
                Ok(None) => log::warn!("YouTube channel not found: {}", tracked.handle),
                Err(e) => {
                    log::error!("Failed to collect YouTube channel {}: {}", tracked.handle, e);
                    last_error = Some(e);
                }
            }
        }

        // An empty snapshot caused by errors must not replace the stored one.
        if channels.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        log::info!("YouTube collection complete: {} channel(s), {} video(s), ~{} quota units",
            channels.len(), recent_videos.len(), self.channels.len() * 3);

        Ok(YoutubeSnapshot {
            generated_at: Utc::now(),
            channels,
            recent_videos,
        })
    }

    fn collect_channel(&self, tracked: &YoutubeChannel) -> Result<Option<(YoutubeChannelStats, Vec<VideoStats>)>> {
        let Some(channel_id) = self.search_channel(&tracked.handle, &tracked.name)? else {
            return Ok(None);
        };
        let Some(mut stats) = self.channel_stats(&channel_id)? else {
            return Ok(None);
        };
        stats.handle = tracked.handle.clone();

        let videos = match self.recent_videos(&stats.uploads_playlist, self.recent_videos) {
            Ok(videos) => videos,
            Err(e) => {
                log::warn!("Could not fetch recent videos for {}: {}", stats.title, e);
                Vec::new()
            }
        };

        let videos = videos.into_iter()
            .map(|mut v| {
                v.channel_id = stats.channel_id.clone();
                v.channel_title = stats.title.clone();
                v
            })
            .collect();

        Ok(Some((stats, videos)))
    }
}

fn items(data: &Value) -> &[Value] {
    data.get("items")
        .and_then(Value::as_array)
        .map(|a| a.as_slice())
        .unwrap_or(&[])
}

fn value_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.get(*key))
}

fn str_at<'a>(value: &'a Value, path: &[&str]) -> &'a str {
    value_at(value, path).and_then(Value::as_str).unwrap_or("")
}

/// Statistics arrive as decimal strings; hidden counts are absent.
fn count_at(value: &Value, path: &[&str]) -> u64 {
    match value_at(value, path) {
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        _ => 0,
    }
}
