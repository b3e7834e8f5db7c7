pub mod builder;
pub mod recommendations;
pub mod roi;
pub mod types;

pub use builder::{engagement_rate, DashboardBuilder, DashboardInputs};
pub use recommendations::recommend;
pub use types::{
    ChannelAlert, Dashboard, MetricAnomaly, Predictions, Priority, Recommendation, RoiEstimate,
    RoiStatus, Summary, TelegramChannelRecord, TelegramSection, YoutubeChannelRecord,
    YoutubeSection,
};
