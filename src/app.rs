use crate::alerts::{Alert, AlertDetector};
use crate::collectors::{Fetcher, HttpFetcher, TelegramCollector, YoutubeCollector};
use crate::config::Config;
use crate::dashboard::{Dashboard, DashboardBuilder, DashboardInputs};
use crate::error::{Error, Result};
use crate::history::store::DASHBOARD_JSON;
use crate::history::DataStore;
use crate::report::{self, QuickData, ReportInputs};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of one collection pass. `None` means the platform was skipped
/// or failed; the reason has been logged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollectSummary {
    pub youtube_channels: Option<usize>,
    pub telegram_channels: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub collected: CollectSummary,
    pub dashboard: Dashboard,
    pub alerts: Vec<Alert>,
}

pub struct App {
    pub config: Config,
    store: DataStore,
    fetcher: Arc<dyn Fetcher>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.refresh.http_timeout_secs)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        let store = DataStore::new(&config.storage.data_dir);
        Self { config, store, fetcher }
    }

    fn report_path(&self, name: &str) -> PathBuf {
        self.config.storage.reports_dir.join(name)
    }

    fn write_report(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.report_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        log::info!("Wrote {}", path.display());
        Ok(path)
    }

    /// Polls every configured platform and stores the snapshots. One
    /// platform failing does not stop the other; the call only fails when
    /// nothing could be collected.
    pub fn collect(&self) -> Result<CollectSummary> {
        let mut summary = CollectSummary::default();
        let mut last_error = None;

        if self.config.youtube.channels.is_empty() {
            log::info!("No YouTube channels configured, skipping");
        } else {
            match self.collect_youtube() {
                Ok(n) => summary.youtube_channels = Some(n),
                Err(e) => {
                    log_collect_failure("YouTube", &e);
                    last_error = Some(e);
                }
            }
        }

        if self.config.telegram.channels.is_empty() {
            log::info!("No Telegram channels configured, skipping");
        } else {
            match self.collect_telegram() {
                Ok(n) => summary.telegram_channels = Some(n),
                Err(e) => {
                    log_collect_failure("Telegram", &e);
                    last_error = Some(e);
                }
            }
        }

        if summary.youtube_channels.is_none() && summary.telegram_channels.is_none() {
            return Err(last_error.unwrap_or_else(|| {
                Error::Config("No channels configured for either platform".to_string())
            }));
        }

        Ok(summary)
    }

    fn collect_youtube(&self) -> Result<usize> {
        let collector = YoutubeCollector::new(&self.config.youtube, Box::new(self.fetcher.clone()))?;
        let snapshot = collector.collect()?;
        self.store.save_youtube(&snapshot)?;
        Ok(snapshot.channels.len())
    }

    fn collect_telegram(&self) -> Result<usize> {
        let collector = TelegramCollector::new(&self.config.telegram, Box::new(self.fetcher.clone()))?;
        let snapshot = collector.collect()?;
        self.store.save_telegram(&snapshot)?;
        Ok(snapshot.accessible().count())
    }

    /// Builds the dashboard from stored data and writes `dashboard.json`
    /// and `dashboard.md`.
    pub fn build_dashboard(&self, now: DateTime<Utc>) -> Result<Dashboard> {
        let inputs = DashboardInputs::load(&self.store)?;
        if inputs.is_empty() {
            return Err(self.no_data());
        }

        let dashboard = DashboardBuilder::new(&self.config)?.build(&inputs, now);
        self.store.write_json(DASHBOARD_JSON, &dashboard)?;
        self.write_report(report::DASHBOARD_MD, &report::dashboard_markdown(&dashboard))?;
        Ok(dashboard)
    }

    pub fn generate_report(&self, now: DateTime<Utc>) -> Result<PathBuf> {
        let inputs = DashboardInputs::load(&self.store)?;
        let data_dir = self.config.storage.data_dir.to_string_lossy();

        let content = report::combined_report(&ReportInputs {
            youtube: inputs.youtube.as_ref(),
            telegram: inputs.telegram.as_ref(),
            youtube_history: &inputs.youtube_history,
            telegram_history: &inputs.telegram_history,
            data_dir: &data_dir,
            generated_at: now,
        });
        self.write_report(report::REPORT_MD, &content)
    }

    /// Checks the stored dashboard for critical conditions and refreshes the
    /// daily summary.
    pub fn check_alerts(&self) -> Result<Vec<Alert>> {
        let dashboard = self.store.read_json::<Dashboard>(DASHBOARD_JSON)?
            .ok_or_else(|| self.no_data())?;
        self.alerts_for(&dashboard)
    }

    fn alerts_for(&self, dashboard: &Dashboard) -> Result<Vec<Alert>> {
        let alerts = AlertDetector::new(self.config.alerts.clone()).check_alerts(dashboard);
        self.write_report(report::DAILY_SUMMARY_MD, &report::daily_summary(dashboard))?;
        Ok(alerts)
    }

    /// Collect, dashboard, report, alerts. A failed collection is logged and
    /// the rest of the batch runs on whatever data is already stored.
    pub fn run_batch(&self) -> Result<BatchOutcome> {
        let collected = match self.collect() {
            Ok(summary) => summary,
            Err(e) => {
                log::warn!("Collection failed, continuing with stored data: {}", e);
                CollectSummary::default()
            }
        };

        // Taken after collection so the fresh samples fall inside the growth window.
        let now = Utc::now();

        let dashboard = self.build_dashboard(now)?;
        self.generate_report(now)?;
        let alerts = self.alerts_for(&dashboard)?;

        log::info!("Batch complete: reach {}, {} alert(s)", dashboard.summary.total_reach, alerts.len());
        Ok(BatchOutcome { collected, dashboard, alerts })
    }

    pub fn quick(&self, remote: Option<&str>) -> Result<QuickData> {
        match remote {
            Some(base_url) => report::quick::load_remote(self.fetcher.as_ref(), base_url),
            None => report::quick::load_local(&self.store),
        }
    }

    fn no_data(&self) -> Error {
        no_data_error(self.store.root())
    }
}

/// Transport failures are expected to clear up by the next run; anything
/// else needs attention.
fn log_collect_failure(platform: &str, e: &Error) {
    if e.is_network() {
        log::warn!("{} unreachable, keeping the stored snapshot: {}", platform, e);
    } else {
        log::error!("{} collection failed: {}", platform, e);
    }
}

fn no_data_error(dir: &Path) -> Error {
    Error::Config(format!("No metrics found in {}; run `pulse collect` first", dir.display()))
}
