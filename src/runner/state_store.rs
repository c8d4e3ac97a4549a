//! Strategy state persistence

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Error, Result};
use crate::market::CurrencyPair;
use crate::strategy::StrategyState;

/// Strategy state as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredState {
    /// Currency pair the strategy traded
    pub pair: String,
    /// Strategy name
    pub strategy: String,
    /// Session that wrote the file
    pub session_id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub state: StrategyState,
}

/// Saves and loads the state of one strategy on one pair
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
    pair: String,
    strategy: String,
    session_id: Uuid,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>, pair: &CurrencyPair, strategy: &str) -> Self {
        Self {
            path: path.into(),
            pair: pair.to_string(),
            strategy: strategy.to_string(),
            session_id: Uuid::new_v4(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Id of this session, written into every save
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Save state to file atomically (write to temp, then rename)
    pub fn save(&self, state: &StrategyState) -> Result<()> {
        let stored = StoredState {
            pair: self.pair.clone(),
            strategy: self.strategy.clone(),
            session_id: self.session_id,
            saved_at: Utc::now(),
            state: state.clone(),
        };

        let temp_path = self.path.with_extension("tmp");
        let content = serde_json::to_string_pretty(&stored)?;
        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, &self.path)?;

        debug!("Strategy state saved to {:?}", self.path);
        Ok(())
    }

    /// Load the stored state, `None` when nothing was saved yet
    ///
    /// Fails with [`Error::StateMismatch`] when the file belongs to another
    /// pair or strategy.
    pub fn load(&self) -> Result<Option<StoredState>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)?;
        let stored: StoredState = serde_json::from_str(&content)?;

        if stored.pair != self.pair {
            return Err(Error::StateMismatch(format!(
                "state file {:?} is for pair {}, expected {}",
                self.path, stored.pair, self.pair
            )));
        }
        if stored.strategy != self.strategy {
            return Err(Error::StateMismatch(format!(
                "state file {:?} is for strategy '{}', expected '{}'",
                self.path, stored.strategy, self.strategy
            )));
        }

        info!(
            "Loaded strategy state from {:?} (session {}, saved {})",
            self.path, stored.session_id, stored.saved_at
        );
        Ok(Some(stored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> CurrencyPair {
        "BTC_EUR".parse().unwrap()
    }

    fn sample_state() -> StrategyState {
        [("position".to_string(), "0.5".to_string())].into_iter().collect()
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = StateStore::new(&path, &pair(), "threshold");

        assert!(store.load().unwrap().is_none());

        store.save(&sample_state()).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());

        let stored = store.load().unwrap().unwrap();
        assert_eq!(stored.state, sample_state());
        assert_eq!(stored.session_id, store.session_id());
        assert_eq!(stored.pair, "BTC_EUR");

        // a new session reads the previous one's state
        let next = StateStore::new(&path, &pair(), "threshold");
        assert_ne!(next.session_id(), store.session_id());
        assert_eq!(next.load().unwrap().unwrap().session_id, store.session_id());
    }

    #[test]
    fn test_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        StateStore::new(&path, &pair(), "threshold")
            .save(&sample_state())
            .unwrap();

        let other_pair = StateStore::new(&path, &"ETH_EUR".parse().unwrap(), "threshold");
        assert!(matches!(other_pair.load(), Err(Error::StateMismatch(_))));

        let other_strategy = StateStore::new(&path, &pair(), "noop");
        assert!(matches!(other_strategy.load(), Err(Error::StateMismatch(_))));
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = StateStore::new(&path, &pair(), "threshold");
        assert!(matches!(store.load(), Err(Error::Json(_))));
    }
}
