pub mod console;
pub mod format;
pub mod markdown;
pub mod quick;

pub use console::{alert_lines, channel_table, dashboard_recap, quick_summary};
pub use markdown::{combined_report, daily_summary, dashboard_markdown, ReportInputs};
pub use quick::QuickData;

pub const DASHBOARD_MD: &str = "dashboard.md";
pub const REPORT_MD: &str = "report.md";
pub const DAILY_SUMMARY_MD: &str = "daily_summary.md";
