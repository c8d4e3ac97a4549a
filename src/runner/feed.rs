//! Market data sources for the runner

use std::path::PathBuf;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::errors::{Error, Result};
use crate::market::MarketEvent;

/// Source of market events - can be mocked for testing
#[async_trait]
pub trait MarketFeed: Send {
    /// Start delivering events; the feed has ended once the channel closes
    async fn subscribe(&mut self) -> Result<UnboundedReceiver<MarketEvent>>;
}

/// Feed driven by hand through an [`UnboundedSender`]
pub struct ChannelFeed {
    receiver: Option<UnboundedReceiver<MarketEvent>>,
}

impl ChannelFeed {
    /// Create the feed and the sender that pushes events into it
    pub fn new() -> (UnboundedSender<MarketEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { receiver: Some(rx) })
    }
}

#[async_trait]
impl MarketFeed for ChannelFeed {
    async fn subscribe(&mut self) -> Result<UnboundedReceiver<MarketEvent>> {
        self.receiver
            .take()
            .ok_or_else(|| Error::Feed("channel feed already subscribed".into()))
    }
}

/// Replays market events from a JSON-lines file
///
/// Each line holds one externally tagged [`MarketEvent`]. Blank lines are
/// skipped; lines that fail to parse are logged and skipped.
pub struct ReplayFeed {
    path: PathBuf,
}

impl ReplayFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MarketFeed for ReplayFeed {
    async fn subscribe(&mut self) -> Result<UnboundedReceiver<MarketEvent>> {
        let file = tokio::fs::File::open(&self.path).await?;
        let path = self.path.clone();
        let (tx, rx) = mpsc::unbounded_channel();
        info!("Replaying market events from {:?}", path);

        tokio::spawn(async move {
            let mut lines = BufReader::new(file).lines();
            let mut line_number = 0usize;
            let mut sent = 0usize;

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        line_number += 1;
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<MarketEvent>(line) {
                            Ok(event) => {
                                if tx.send(event).is_err() {
                                    debug!("Replay receiver dropped, stopping at line {}", line_number);
                                    break;
                                }
                                sent += 1;
                            }
                            Err(e) => warn!("Skipping line {} of {:?}: {}", line_number, path, e),
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        error!("Failed to read {:?}: {}", path, e);
                        break;
                    }
                }
            }

            info!("Replay finished: {} events from {} lines", sent, line_number);
        });

        Ok(rx)
    }
}
