//! Persisted user settings.

use std::sync::Arc;

use tokio::sync::Mutex;

use vorleser_storage::KeyValueStore;
use vorleser_types::{DownloadLimits, NarrationSettings, Settings};

use crate::doc;
use crate::error::Result;

const SETTINGS_KEY: &str = "vorleser.settings";

/// Runtime user settings: narration voice parameters and download ceilings.
/// The download section is what feeds `OfflineStore::set_limits`.
pub struct SettingsStore {
    kv: Arc<dyn KeyValueStore>,
    state: Mutex<Settings>,
}

impl SettingsStore {
    pub async fn open(kv: Arc<dyn KeyValueStore>) -> Result<Self> {
        let settings = doc::load_or_default(kv.as_ref(), SETTINGS_KEY).await?;
        Ok(Self {
            kv,
            state: Mutex::new(settings),
        })
    }

    pub async fn settings(&self) -> Settings {
        self.state.lock().await.clone()
    }

    pub async fn update_narration(&self, narration: NarrationSettings) -> Result<()> {
        let mut state = self.state.lock().await;
        state.narration = narration;
        self.persist(&state).await
    }

    pub async fn update_downloads(&self, downloads: DownloadLimits) -> Result<()> {
        let mut state = self.state.lock().await;
        state.downloads = downloads;
        self.persist(&state).await
    }

    async fn persist(&self, settings: &Settings) -> Result<()> {
        doc::persist(self.kv.as_ref(), SETTINGS_KEY, settings).await?;
        Ok(())
    }
}
