use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::timer::policy::DEFAULT_CEILING_MINUTES;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    pub auto_pause_ceiling_minutes: u64,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            auto_pause_ceiling_minutes: DEFAULT_CEILING_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserSettings {
    timer: TimerSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn timer(&self) -> TimerSettings {
        self.data.read().unwrap().timer.clone()
    }

    pub fn update_timer(&self, settings: TimerSettings) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            guard.timer = settings;
            self.persist(&guard)?;
        }
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: UserSettings = serde_json::from_str(&contents)?;
        let mut guard = self.data.write().unwrap();
        *guard = data;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SettingsStore::new(dir.path().join("settings.json")).expect("open store");
        assert_eq!(
            store.timer().auto_pause_ceiling_minutes,
            DEFAULT_CEILING_MINUTES
        );
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").expect("write");

        let store = SettingsStore::new(path).expect("open store");
        assert_eq!(
            store.timer().auto_pause_ceiling_minutes,
            DEFAULT_CEILING_MINUTES
        );
    }

    #[test]
    fn updates_persist_across_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");

        let store = SettingsStore::new(path.clone()).expect("open store");
        store
            .update_timer(TimerSettings {
                auto_pause_ceiling_minutes: 90,
            })
            .expect("update");

        let reopened = SettingsStore::new(path).expect("reopen store");
        assert_eq!(reopened.timer().auto_pause_ceiling_minutes, 90);

        store.reload().expect("reload");
        assert_eq!(store.timer().auto_pause_ceiling_minutes, 90);
    }
}
