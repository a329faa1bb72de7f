//! Read-only settings access for the narration engine.

use std::sync::{Arc, RwLock};

use crate::settings::Settings;

/// Supplies the current settings. Called once per resolve/play.
pub trait SettingsSource: Send + Sync {
    fn snapshot(&self) -> Settings;
}

impl SettingsSource for Settings {
    fn snapshot(&self) -> Settings {
        self.clone()
    }
}

/// Settings shared with whatever layer edits them.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<Settings>>,
}

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Apply an edit. Readers see it on their next snapshot.
    pub fn update(&self, edit: impl FnOnce(&mut Settings)) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        edit(&mut guard);
    }
}

impl SettingsSource for SharedSettings {
    fn snapshot(&self) -> Settings {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProviderId;

    #[test]
    fn shared_settings_updates_are_visible() {
        let shared = SharedSettings::new(Settings::default());
        let reader: &dyn SettingsSource = &shared;
        assert_eq!(reader.snapshot().provider, ProviderId::Cloud);

        shared.update(|s| s.provider = ProviderId::System);
        assert_eq!(reader.snapshot().provider, ProviderId::System);
    }
}
