//! Strategy runner - drives one strategy against one host
//!
//! The runner owns the strategy and a [`PaperHost`]. Market events update the
//! host's buffers first, then the strategy callbacks are dispatched according
//! to its [`StrategyConfig`]. After each callback, queued order actions are
//! executed and their results fed back to the strategy.

mod feed;
mod state_store;

use std::fmt;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::time::interval;

use crate::errors::{Error, Result};
use crate::host::{HostEvent, PaperHost};
use crate::market::{MarketEvent, OrderBook};
use crate::strategy::{DataSubscriptionType, ExitReason, Strategy, StrategyConfig, StrategyContext};

pub use feed::{ChannelFeed, MarketFeed, ReplayFeed};
pub use state_store::{StateStore, StoredState};

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Actions executed per drain before the rest is deferred
    pub max_actions_per_event: usize,
    pub save_interval_secs: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_actions_per_event: 64,
            save_interval_secs: 30,
        }
    }
}

/// Lifecycle state of a [`StrategyRunner`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerState {
    Created,
    Initialized,
    Running,
    Suspended,
    Stopped,
    /// The strategy ended itself through `exit`
    Exited {
        reason: ExitReason,
        message: String,
    },
}

impl RunnerState {
    /// Stopped or exited; no further events are accepted
    pub fn is_finished(&self) -> bool {
        matches!(self, RunnerState::Stopped | RunnerState::Exited { .. })
    }
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerState::Created => write!(f, "created"),
            RunnerState::Initialized => write!(f, "initialized"),
            RunnerState::Running => write!(f, "running"),
            RunnerState::Suspended => write!(f, "suspended"),
            RunnerState::Stopped => write!(f, "stopped"),
            RunnerState::Exited { reason, message } => write!(f, "exited ({}: {})", reason, message),
        }
    }
}

/// Drives a strategy through its lifecycle against a [`PaperHost`]
pub struct StrategyRunner<S: Strategy> {
    strategy: S,
    host: PaperHost,
    config: RunnerConfig,
    strategy_config: StrategyConfig,
    state_store: Option<StateStore>,
    state: RunnerState,
}

impl<S: Strategy> StrategyRunner<S> {
    pub fn new(strategy: S, host: PaperHost, config: RunnerConfig) -> Self {
        Self {
            strategy,
            host,
            config,
            strategy_config: StrategyConfig::new(),
            state_store: None,
            state: RunnerState::Created,
        }
    }

    /// Builder: persist and restore strategy state through `store`
    pub fn with_state_store(mut self, store: StateStore) -> Self {
        self.state_store = Some(store);
        self
    }

    pub fn state(&self) -> &RunnerState {
        &self.state
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn strategy_mut(&mut self) -> &mut S {
        &mut self.strategy
    }

    pub fn host(&self) -> &PaperHost {
        &self.host
    }

    /// Configuration read from the strategy during `initialize`
    pub fn strategy_config(&self) -> &StrategyConfig {
        &self.strategy_config
    }

    /// Call `init`, read the strategy config and restore persisted state
    pub fn initialize(&mut self) -> Result<()> {
        self.require(&[RunnerState::Created], "initialize")?;

        self.strategy.init(&mut self.host);
        self.strategy_config = self.strategy.get_strategy_config();
        info!(
            "Strategy '{}' initialized on {} with subscriptions {:?}",
            self.strategy.name(),
            self.host.pair(),
            self.strategy_config.required_data_updates
        );

        if let Some(store) = &self.state_store {
            match store.load() {
                Ok(Some(stored)) => {
                    self.strategy.restore_strategy_state(&mut self.host, &stored.state);
                }
                Ok(None) => debug!("No stored state at {:?}", store.path()),
                Err(e @ Error::StateMismatch(_)) => return Err(e),
                Err(e) => warn!("Failed to load state: {}, starting fresh", e),
            }
        }

        self.state = RunnerState::Initialized;
        self.settle()
    }

    /// Call `start`; data updates are dispatched afterwards
    pub fn start(&mut self) -> Result<()> {
        self.require(&[RunnerState::Initialized], "start")?;

        info!("Starting strategy '{}'", self.strategy.name());
        self.state = RunnerState::Running;
        self.strategy.start(&mut self.host);
        self.settle()
    }

    /// Call `stop`, execute its remaining actions and persist the state
    ///
    /// An `exit` requested by the `stop` hook ends in `Exited` with its reason.
    pub fn stop(&mut self) -> Result<()> {
        self.require(
            &[RunnerState::Initialized, RunnerState::Running, RunnerState::Suspended],
            "stop",
        )?;

        info!("Stopping strategy '{}'", self.strategy.name());
        self.state = RunnerState::Stopped;
        self.strategy.stop(&mut self.host);
        if let Some((reason, message)) = self.host.take_exit_request() {
            info!("Strategy '{}' exited while stopping", self.strategy.name());
            self.state = RunnerState::Exited { reason, message };
        }
        self.drain();
        self.persist()
    }

    /// Call `suspend` and persist the state; callbacks pause until `unsuspend`
    ///
    /// A strategy calling `exit` from its `suspend` hook exits instead.
    pub fn suspend(&mut self) -> Result<()> {
        self.require(&[RunnerState::Running], "suspend")?;

        info!("Suspending strategy '{}'", self.strategy.name());
        self.strategy.suspend(&mut self.host);
        if let Some((reason, message)) = self.host.take_exit_request() {
            return self.exit(reason, message);
        }
        self.state = RunnerState::Suspended;
        self.drain();
        self.persist()
    }

    /// Call `unsuspend` and resume dispatching
    pub fn unsuspend(&mut self) -> Result<()> {
        self.require(&[RunnerState::Suspended], "unsuspend")?;

        info!("Resuming strategy '{}'", self.strategy.name());
        self.state = RunnerState::Running;
        self.strategy.unsuspend(&mut self.host);
        self.settle()
    }

    /// Apply a market event to the host and dispatch the resulting callbacks
    pub fn handle_event(&mut self, event: MarketEvent) -> Result<()> {
        if self.state.is_finished() {
            return Err(self.invalid_state("handle market event"));
        }
        debug!("Market event: {}", event.kind());

        match event {
            MarketEvent::OrderBook(order_book) => {
                // strategies and the host buffer see the same ordering
                let order_book = if order_book.is_sorted() {
                    order_book
                } else {
                    OrderBook::new(order_book.asks, order_book.bids)
                };
                let events = self.host.apply_order_book(order_book.clone());
                self.dispatch_all(events)?;
                if self.wants(DataSubscriptionType::OrderBook) {
                    self.strategy.on_new_order_book(&mut self.host, &order_book);
                    self.settle()?;
                }
            }
            MarketEvent::PublicTrades(trades) => {
                let events = self.host.apply_public_trades(&trades);
                self.dispatch_all(events)?;
                if self.wants(DataSubscriptionType::PublicTradeHistory) {
                    self.strategy.on_new_public_trades(&mut self.host, &trades);
                    self.settle()?;
                }
            }
            MarketEvent::Ticker(ticker) => {
                self.host.apply_ticker(ticker.clone());
                if self.wants(DataSubscriptionType::Ticker) {
                    self.strategy.on_new_ticker(&mut self.host, &ticker);
                    self.settle()?;
                }
            }
        }

        Ok(())
    }

    /// Persist the current strategy state if a store is configured
    pub fn save_state(&self) -> Result<()> {
        self.persist()
    }

    /// Run the strategy against a feed until the feed ends or the strategy exits
    ///
    /// Initializes and starts the strategy if needed. The state is saved every
    /// `save_interval_secs` and the strategy is stopped when the feed ends.
    pub async fn run<F: MarketFeed>(&mut self, feed: &mut F) -> Result<()> {
        if self.state == RunnerState::Created {
            self.initialize()?;
        }
        if self.state == RunnerState::Initialized {
            self.start()?;
        }

        let mut events = feed.subscribe().await?;
        let mut save_timer = interval(Duration::from_secs(self.config.save_interval_secs.max(1)));
        // first tick completes immediately
        save_timer.tick().await;

        while !self.state.is_finished() {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        if let Err(e) = self.handle_event(event) {
                            error!("Error handling market event: {}", e);
                        }
                    }
                    None => {
                        info!("Market feed ended");
                        break;
                    }
                },
                _ = save_timer.tick() => {
                    if let Err(e) = self.save_state() {
                        warn!("Failed to save state: {}", e);
                    }
                }
            }
        }

        if !self.state.is_finished() {
            self.stop()?;
        }
        info!("Strategy '{}' {}", self.strategy.name(), self.state);
        Ok(())
    }

    fn wants(&self, subscription: DataSubscriptionType) -> bool {
        self.state == RunnerState::Running && self.strategy_config.is_subscribed(subscription)
    }

    /// Callbacks are delivered while initialized or running
    fn dispatching(&self) -> bool {
        matches!(self.state, RunnerState::Initialized | RunnerState::Running)
    }

    fn require(&self, allowed: &[RunnerState], operation: &str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(self.invalid_state(operation))
        }
    }

    fn invalid_state(&self, operation: &str) -> Error {
        Error::InvalidState {
            operation: operation.to_string(),
            state: self.state.to_string(),
        }
    }

    fn persist(&self) -> Result<()> {
        if let Some(store) = &self.state_store {
            store.save(&self.strategy.save_strategy_state())?;
        }
        Ok(())
    }

    /// Drain queued actions, then handle a requested exit
    fn settle(&mut self) -> Result<()> {
        self.drain();
        match self.host.take_exit_request() {
            Some((reason, message)) if !self.state.is_finished() => self.exit(reason, message),
            _ => Ok(()),
        }
    }

    fn exit(&mut self, reason: ExitReason, message: String) -> Result<()> {
        match reason {
            ExitReason::FinishedSuccessfully => {
                info!("Strategy '{}' finished: {}", self.strategy.name(), message)
            }
            ExitReason::Abort => warn!("Strategy '{}' aborted: {}", self.strategy.name(), message),
            ExitReason::Error => error!("Strategy '{}' failed: {}", self.strategy.name(), message),
        }

        self.state = RunnerState::Exited { reason, message };
        self.strategy.stop(&mut self.host);
        // the first exit wins
        self.host.take_exit_request();
        self.drain();
        self.persist()
    }

    /// Execute queued host actions, at most `max_actions_per_event`
    fn drain(&mut self) -> usize {
        let mut executed = 0;

        while executed < self.config.max_actions_per_event && !self.host.exit_requested() {
            let Some(events) = self.host.process_next_action() else {
                break;
            };
            executed += 1;

            for event in &events {
                if self.dispatching() {
                    self.dispatch(event);
                }
            }
        }

        if self.host.has_pending_actions() && !self.host.exit_requested() {
            warn!(
                "Executed {} actions, deferring {} to the next event",
                executed,
                self.host.pending_action_count()
            );
        }
        executed
    }

    fn dispatch_all(&mut self, events: Vec<HostEvent>) -> Result<()> {
        for event in &events {
            if !self.dispatching() {
                break;
            }
            self.dispatch(event);
            self.settle()?;
        }
        Ok(())
    }

    fn dispatch(&mut self, event: &HostEvent) {
        debug!("Host event: {}", event.kind());
        let ctx: &mut dyn StrategyContext = &mut self.host;

        match event {
            HostEvent::PlaceSucceeded {
                order_placing_id,
                order,
            } => self.strategy.on_place_order_success(ctx, *order_placing_id, order),
            HostEvent::PlaceFailed {
                order_placing_id,
                error_message,
            } => self
                .strategy
                .on_place_order_error_string(ctx, *order_placing_id, error_message),
            HostEvent::CancelSucceeded { order_id, order } => {
                self.strategy.on_cancel_order_success(ctx, *order_id, order)
            }
            HostEvent::CancelFailed {
                order_id,
                error_message,
            } => self
                .strategy
                .on_cancel_order_error_string(ctx, *order_id, error_message),
            HostEvent::OrderUpdated(update) => self.strategy.on_order_update(ctx, update),
            HostEvent::FundsChanged => {
                if self.strategy_config.is_subscribed(DataSubscriptionType::Funds) {
                    let funds = ctx.get_buffered_funds();
                    self.strategy.on_new_funds(ctx, &funds);
                }
            }
        }
    }
}
