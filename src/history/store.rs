use super::channels::{Metric, MetricsHistory};
use crate::collectors::{TelegramSnapshot, YoutubeSnapshot};
use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const YOUTUBE_LATEST: &str = "latest.json";
pub const YOUTUBE_CSV: &str = "youtube_stats.csv";
pub const TELEGRAM_LATEST: &str = "telegram_latest.json";
pub const TELEGRAM_CSV: &str = "telegram_stats.csv";
pub const DASHBOARD_JSON: &str = "dashboard.json";

const YOUTUBE_HEADER: &[&str] = &["timestamp", "channel_id", "title", "subscribers", "views", "videos"];
const TELEGRAM_HEADER: &[&str] = &["timestamp", "username", "title", "subscribers", "bot_is_admin", "bot_status"];

const TELEGRAM_LIMITATIONS: &[&str] = &[
    "Cannot get post views/reactions",
    "Member count may not work for all channels",
    "Cannot read message history",
    "Need to be admin for private channels",
];

/// Flat-file snapshot store: latest JSON per platform, timestamped JSON
/// backups and an append-only CSV history.
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn save_youtube(&self, snapshot: &YoutubeSnapshot) -> Result<()> {
        fs::create_dir_all(&self.root)?;

        self.write_json(YOUTUBE_LATEST, snapshot)?;
        let backup = format!("youtube_{}.json", backup_stamp(snapshot.generated_at));
        self.write_json(&backup, snapshot)?;

        // One timestamp per run so per-run totals line up across channels.
        let run_stamp = snapshot.generated_at.to_rfc3339();
        let rows: Vec<Vec<String>> = snapshot.channels.iter()
            .map(|c| vec![
                run_stamp.clone(),
                c.channel_id.clone(),
                c.title.clone(),
                c.subscribers.to_string(),
                c.views.to_string(),
                c.videos.to_string(),
            ])
            .collect();
        self.append_csv(YOUTUBE_CSV, YOUTUBE_HEADER, &rows)?;

        log::info!("Saved YouTube snapshot ({} channels, {} videos)",
            snapshot.channels.len(), snapshot.recent_videos.len());
        Ok(())
    }

    pub fn save_telegram(&self, snapshot: &TelegramSnapshot) -> Result<()> {
        fs::create_dir_all(&self.root)?;

        let mut latest = snapshot.clone();
        latest.bot_api_version = true;
        latest.limitations = TELEGRAM_LIMITATIONS.iter().map(|s| s.to_string()).collect();
        self.write_json(TELEGRAM_LATEST, &latest)?;

        let backup = format!("telegram_{}.json", backup_stamp(snapshot.generated_at));
        self.write_json(&backup, snapshot)?;

        let run_stamp = snapshot.generated_at.to_rfc3339();
        let rows: Vec<Vec<String>> = snapshot.accessible()
            .map(|c| vec![
                run_stamp.clone(),
                c.username.clone(),
                c.title.clone().unwrap_or_default(),
                c.subscribers.map(|s| s.to_string()).unwrap_or_default(),
                c.bot_is_admin.to_string(),
                c.bot_status.clone().unwrap_or_else(|| "unknown".to_string()),
            ])
            .collect();
        self.append_csv(TELEGRAM_CSV, TELEGRAM_HEADER, &rows)?;

        log::info!("Saved Telegram snapshot ({} channels, {} accessible)",
            snapshot.channels.len(), rows.len());
        Ok(())
    }

    pub fn load_youtube_latest(&self) -> Result<Option<YoutubeSnapshot>> {
        self.read_json(YOUTUBE_LATEST)
    }

    pub fn load_telegram_latest(&self) -> Result<Option<TelegramSnapshot>> {
        self.read_json(TELEGRAM_LATEST)
    }

    pub fn load_youtube_history(&self) -> Result<MetricsHistory> {
        let mut history = MetricsHistory::new();
        for record in self.read_csv(YOUTUBE_CSV)? {
            let Some(timestamp) = record.get("timestamp").and_then(parse_timestamp) else {
                log::warn!("Skipping YouTube history row without a valid timestamp");
                continue;
            };
            let key = record.get("channel_id").unwrap_or_default();
            let title = record.get("title").unwrap_or_default();
            for metric in [Metric::Subscribers, Metric::Views, Metric::Videos] {
                if let Some(value) = record.number(&metric.to_string()) {
                    history.record(key, title, timestamp, metric, value);
                }
            }
        }
        Ok(history)
    }

    /// Telegram rows without a member count (bot not admin) carry no sample.
    pub fn load_telegram_history(&self) -> Result<MetricsHistory> {
        let mut history = MetricsHistory::new();
        for record in self.read_csv(TELEGRAM_CSV)? {
            let Some(timestamp) = record.get("timestamp").and_then(parse_timestamp) else {
                log::warn!("Skipping Telegram history row without a valid timestamp");
                continue;
            };
            if let Some(subscribers) = record.number("subscribers") {
                history.record(
                    record.get("username").unwrap_or_default(),
                    record.get("title").unwrap_or_default(),
                    timestamp,
                    Metric::Subscribers,
                    subscribers,
                );
            }
        }
        Ok(history)
    }

    pub fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let json = serde_json::to_string_pretty(value)?;
        fs::write(self.path(name), json)?;
        Ok(())
    }

    pub fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.path(name);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let value = serde_json::from_str(&content)
            .map_err(|e| Error::Parse(format!("{}: {}", path.display(), e)))?;
        Ok(Some(value))
    }

    fn append_csv(&self, name: &str, header: &[&str], rows: &[Vec<String>]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let path = self.path(name);
        let is_new = !path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

        if is_new {
            writeln!(file, "{}", header.join(","))?;
        }
        for row in rows {
            let line: Vec<String> = row.iter().map(|f| quote_field(f)).collect();
            writeln!(file, "{}", line.join(","))?;
        }

        Ok(())
    }

    fn read_csv(&self, name: &str) -> Result<Vec<CsvRecord>> {
        let path = self.path(name);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)?;
        let mut rows = split_records(&content).into_iter();
        let Some(header) = rows.next() else {
            return Ok(Vec::new());
        };

        let mut records = Vec::new();
        for (i, fields) in rows.enumerate() {
            if fields.len() != header.len() {
                log::warn!("{}: skipping malformed row {} ({} fields, expected {})",
                    path.display(), i + 2, fields.len(), header.len());
                continue;
            }
            records.push(CsvRecord { header: header.clone(), fields });
        }

        Ok(records)
    }
}

struct CsvRecord {
    header: Vec<String>,
    fields: Vec<String>,
}

impl CsvRecord {
    fn get(&self, column: &str) -> Option<&str> {
        self.header.iter()
            .position(|h| h == column)
            .and_then(|i| self.fields.get(i))
            .map(|s| s.as_str())
    }

    fn number(&self, column: &str) -> Option<f64> {
        self.get(column)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }
}

fn backup_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// Accepts RFC 3339 and naive ISO-8601 timestamps; naive ones are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Splits CSV text into records. Quoted fields may span lines; blank lines
/// between records are skipped.
fn split_records(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
                if !(fields.len() == 1 && fields[0].trim().is_empty()) {
                    records.push(std::mem::take(&mut fields));
                }
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() || !fields.is_empty() {
        fields.push(current);
        records.push(fields);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::{TelegramChannelStats, YoutubeChannelStats};
    use chrono::{Duration, TimeZone};

    fn at(hour: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
    }

    fn yt_channel(id: &str, title: &str, subscribers: u64, ts: DateTime<Utc>) -> YoutubeChannelStats {
        YoutubeChannelStats {
            channel_id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            published_at: "2020-01-01T00:00:00Z".to_string(),
            country: "N/A".to_string(),
            subscribers,
            views: subscribers * 10,
            videos: 4,
            uploads_playlist: format!("UU{}", id),
            handle: id.to_string(),
            timestamp: ts,
        }
    }

    #[test]
    fn test_split_records_handles_quotes() {
        let records = split_records("a,\"b, c\",\"say \"\"hi\"\"\",d\r\n\nx,,y");
        assert_eq!(records, vec![
            vec!["a", "b, c", "say \"hi\"", "d"],
            vec!["x", "", "y"],
        ]);
    }

    #[test]
    fn test_split_records_quoted_newline() {
        let records = split_records("id,title\n1,\"two\nlines\"\n2,plain\n");
        assert_eq!(records.len(), 3);
        assert_eq!(records[1], vec!["1", "two\nlines"]);
        assert_eq!(records[2], vec!["2", "plain"]);
    }

    #[test]
    fn test_quote_field() {
        assert_eq!(quote_field("plain"), "plain");
        assert_eq!(quote_field("a,b"), "\"a,b\"");
        assert_eq!(quote_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_multiline_title_survives_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());

        for (hour, subs) in [(0, 100), (1, 120)] {
            let snapshot = YoutubeSnapshot {
                generated_at: at(hour),
                channels: vec![yt_channel("UC1", "Engine\nNoise, \"live\"", subs, at(hour))],
                recent_videos: Vec::new(),
            };
            store.save_youtube(&snapshot).unwrap();
        }

        let history = store.load_youtube_history().unwrap();
        let entity = history.entity("UC1").unwrap();
        assert_eq!(entity.title, "Engine\nNoise, \"live\"");
        assert_eq!(entity.series(Metric::Subscribers).unwrap().values(), vec![100.0, 120.0]);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T12:30:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 12:30:00.000"), Some(expected));
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_youtube_history_accumulates_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());

        for (hour, subs) in [(0, 100), (1, 110)] {
            let snapshot = YoutubeSnapshot {
                generated_at: at(hour),
                channels: vec![yt_channel("UC1", "Engine, Noise", subs, at(hour))],
                recent_videos: Vec::new(),
            };
            store.save_youtube(&snapshot).unwrap();
        }

        let csv = fs::read_to_string(store.path(YOUTUBE_CSV)).unwrap();
        assert_eq!(csv.lines().filter(|l| l.starts_with("timestamp")).count(), 1);
        assert!(store.path("youtube_20240301_010000.json").exists());

        let history = store.load_youtube_history().unwrap();
        let entity = history.entity("UC1").unwrap();
        assert_eq!(entity.title, "Engine, Noise");
        assert_eq!(entity.series(Metric::Subscribers).unwrap().values(), vec![100.0, 110.0]);
        assert_eq!(entity.series(Metric::Views).unwrap().values(), vec![1000.0, 1100.0]);

        let latest = store.load_youtube_latest().unwrap().unwrap();
        assert_eq!(latest.channels[0].subscribers, 110);
    }

    #[test]
    fn test_telegram_errors_not_in_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());

        let mut ok = TelegramChannelStats::inaccessible(at(0), "@news", "News", "x");
        ok.error = None;
        ok.title = Some("News".to_string());
        ok.subscribers = Some(420);
        ok.bot_is_admin = true;
        ok.bot_status = Some("administrator".to_string());

        let mut hidden = ok.clone();
        hidden.username = "@hidden".to_string();
        hidden.subscribers = None;

        let failed = TelegramChannelStats::inaccessible(at(0), "@gone", "Gone", "Bot cannot access channel");

        let snapshot = TelegramSnapshot {
            generated_at: at(0),
            channels: vec![ok, hidden, failed],
            bot_api_version: false,
            limitations: Vec::new(),
        };
        store.save_telegram(&snapshot).unwrap();

        let csv = fs::read_to_string(store.path(TELEGRAM_CSV)).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(!csv.contains("@gone"));

        let history = store.load_telegram_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.series("@news", Metric::Subscribers).unwrap().values(), vec![420.0]);

        let latest = store.load_telegram_latest().unwrap().unwrap();
        assert!(latest.bot_api_version);
        assert_eq!(latest.limitations.len(), 4);
        assert_eq!(latest.channels.len(), 3);
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        fs::write(
            store.path(YOUTUBE_CSV),
            "timestamp,channel_id,title,subscribers,views,videos\n\
             2024-03-01T00:00:00,UC1,A,10,100,1\n\
             not-a-date,UC1,A,11,110,1\n\
             2024-03-01T02:00:00,UC1,A,12\n\
             2024-03-01T03:00:00,UC1,A,13,130,1\n",
        )
        .unwrap();

        let history = store.load_youtube_history().unwrap();
        assert_eq!(history.series("UC1", Metric::Subscribers).unwrap().values(), vec![10.0, 13.0]);
    }

    #[test]
    fn test_missing_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path().join("fresh"));
        assert!(store.load_youtube_latest().unwrap().is_none());
        assert!(store.load_youtube_history().unwrap().is_empty());
        assert!(store.load_telegram_history().unwrap().is_empty());
    }
}
