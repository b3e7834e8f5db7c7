use crate::collectors::{Fetcher, TelegramSnapshot, YoutubeSnapshot};
use crate::dashboard::Dashboard;
use crate::error::{Error, Result};
use crate::history::store::{DASHBOARD_JSON, TELEGRAM_LATEST, YOUTUBE_LATEST};
use crate::history::DataStore;
use serde::de::DeserializeOwned;

/// What `quick` has to show: a full dashboard when one was built, otherwise
/// the raw latest snapshots.
#[derive(Debug, Clone)]
pub enum QuickData {
    Dashboard(Box<Dashboard>),
    Snapshots {
        youtube: Option<YoutubeSnapshot>,
        telegram: Option<TelegramSnapshot>,
    },
}

impl QuickData {
    pub fn dashboard(&self) -> Option<&Dashboard> {
        match self {
            QuickData::Dashboard(d) => Some(d),
            QuickData::Snapshots { .. } => None,
        }
    }
}

pub fn load_local(store: &DataStore) -> Result<QuickData> {
    if let Some(dashboard) = store.read_json::<Dashboard>(DASHBOARD_JSON)? {
        return Ok(QuickData::Dashboard(Box::new(dashboard)));
    }

    log::info!("No {} in {}, using latest snapshots", DASHBOARD_JSON, store.root().display());
    let youtube = store.load_youtube_latest()?;
    let telegram = store.load_telegram_latest()?;
    if youtube.is_none() && telegram.is_none() {
        return Err(Error::Config(format!(
            "No metrics found in {}; run `pulse collect` first",
            store.root().display()
        )));
    }

    Ok(QuickData::Snapshots { youtube, telegram })
}

/// Reads the published data directory at `base_url` (the URL under which
/// `dashboard.json`, `latest.json` and `telegram_latest.json` live).
pub fn load_remote(fetcher: &dyn Fetcher, base_url: &str) -> Result<QuickData> {
    let base = base_url.trim_end_matches('/');

    match fetch::<Dashboard>(fetcher, base, DASHBOARD_JSON) {
        Ok(dashboard) => return Ok(QuickData::Dashboard(Box::new(dashboard))),
        Err(e) => log::warn!("Remote dashboard unavailable ({}), falling back to snapshots", e),
    }

    let youtube = fetch::<YoutubeSnapshot>(fetcher, base, YOUTUBE_LATEST)
        .map_err(|e| log::warn!("Remote {} unavailable: {}", YOUTUBE_LATEST, e))
        .ok();
    let telegram = fetch::<TelegramSnapshot>(fetcher, base, TELEGRAM_LATEST)
        .map_err(|e| log::warn!("Remote {} unavailable: {}", TELEGRAM_LATEST, e))
        .ok();

    if youtube.is_none() && telegram.is_none() {
        return Err(Error::Network(format!("No metrics could be fetched from {}", base)));
    }

    Ok(QuickData::Snapshots { youtube, telegram })
}

fn fetch<T: DeserializeOwned>(fetcher: &dyn Fetcher, base: &str, name: &str) -> Result<T> {
    let value = fetcher.get_json(&format!("{}/{}", base, name), &[])?;
    Ok(serde_json::from_value(value)?)
}
