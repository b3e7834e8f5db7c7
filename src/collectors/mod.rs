pub mod fetcher;
pub mod telegram;
pub mod types;
pub mod youtube;

pub use fetcher::{Fetcher, HttpFetcher};
pub use telegram::{BotMembership, TelegramCollector};
pub use types::{
    DiscussionChat, Platform, TelegramChannelStats, TelegramSnapshot, VideoStats,
    YoutubeChannelStats, YoutubeSnapshot,
};
pub use youtube::YoutubeCollector;
