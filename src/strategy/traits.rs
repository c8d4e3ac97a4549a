//! Strategy and host-context trait definitions

use std::collections::HashMap;

use crate::account::{Funds, Order, OrderId, OrderPlacingId, OrderUpdate, PrivateTrade};
use crate::capability::TradingCapabilityManager;
use crate::logging::{self, LogLevel};
use crate::market::{Candle, OrderBook, PublicTrade, Ticker};

use super::config::StrategyConfig;

/// Everything a strategy wants persisted between runs
pub type StrategyState = HashMap<String, String>;

platform_enum! {
    /// Reason for ending a strategy through [`StrategyContext::exit`]
    pub enum ExitReason {
        /// The strategy has to be aborted due to unexpected circumstances
        Abort = 0 => "ABORT",
        /// The strategy has to be stopped because of an error
        Error = 1 => "ERROR",
        /// The strategy finished successfully
        FinishedSuccessfully = 2 => "FINISHED_SUCCESSFULLY",
    }
}

/// Operations the host offers to a running strategy
///
/// Every strategy callback receives the context, so a strategy can read the
/// host's buffered data and act on it. Order placement and cancellation are
/// asynchronous: their results arrive through the matching `on_*` callbacks of
/// [`Strategy`].
pub trait StrategyContext {
    /// Place a limit order and return its placing id
    ///
    /// Either [`Strategy::on_place_order_success`] or
    /// [`Strategy::on_place_order_error_string`] is called with this id once
    /// the placing is done.
    fn place_limit_order(&mut self, buy: bool, amount: f64, price: f64) -> OrderPlacingId;

    /// Cancel an open order
    ///
    /// Takes the id of an actually open order, not the placing id returned by
    /// [`StrategyContext::place_limit_order`].
    fn cancel_order(&mut self, order_id: OrderId);

    /// End the strategy, after success, an abort or an error
    fn exit(&mut self, reason: ExitReason, message: &str);

    /// Completed trades of this strategy
    fn get_buffered_completed_trades(&self) -> Vec<PrivateTrade>;

    /// Funds per currency
    fn get_buffered_funds(&self) -> Funds;

    /// Open orders of this strategy
    fn get_buffered_open_orders(&self) -> Vec<Order>;

    /// Last available order book
    fn get_buffered_order_book(&self) -> Option<OrderBook>;

    /// Most recent candles of the given size, oldest first
    fn get_buffered_recent_candles(
        &self,
        candle_size_in_minutes: u32,
        number_of_candles: usize,
    ) -> Vec<Candle>;

    /// Most recent public trades
    fn get_buffered_recent_trades(&self) -> Vec<PublicTrade>;

    /// Last ticker values
    fn get_buffered_ticker(&self) -> Option<Ticker>;

    /// Active currency pair
    fn get_currency_pair(&self) -> String;

    /// Base currency
    fn get_first_currency(&self) -> String;

    /// Quote currency
    fn get_second_currency(&self) -> String;

    /// Rounding, limits and validation for the active currency pair
    fn get_trading_capability_manager(&self) -> &dyn TradingCapabilityManager;

    /// Set the status line displayed for the strategy
    fn set_status(&mut self, status: &str);

    /// Write to the bot log
    fn write_log(&self, level: LogLevel, message: &str) {
        logging::write_log(level, message);
    }
}

/// User strategy driven by the host
///
/// The host calls [`Strategy::init`] first, then reads
/// [`Strategy::get_strategy_config`] to learn which data the strategy needs,
/// then [`Strategy::start`]. Afterwards the strategy receives data updates
/// and order events until it is stopped, suspended or exits.
///
/// Only `get_strategy_config` is required; every other hook defaults to doing
/// nothing.
///
/// # Example
///
/// ```rust
/// use margin_strategy_sdk::market::Ticker;
/// use margin_strategy_sdk::strategy::{
///     DataSubscriptionType, Strategy, StrategyConfig, StrategyContext,
/// };
///
/// struct PrintTicker;
///
/// impl Strategy for PrintTicker {
///     fn get_strategy_config(&self) -> StrategyConfig {
///         StrategyConfig::new().with_subscription(DataSubscriptionType::Ticker)
///     }
///
///     fn on_new_ticker(&mut self, ctx: &mut dyn StrategyContext, ticker: &Ticker) {
///         ctx.set_status(&format!("last price {}", ticker.last_price));
///     }
/// }
/// ```
pub trait Strategy {
    /// Requirements of the strategy, read after `init`
    fn get_strategy_config(&self) -> StrategyConfig;

    /// Initialize before the configuration is read and before starting
    fn init(&mut self, _ctx: &mut dyn StrategyContext) {}

    /// Start; data updates follow afterwards
    fn start(&mut self, _ctx: &mut dyn StrategyContext) {}

    /// Stop; everything must be cleaned up before returning
    fn stop(&mut self, _ctx: &mut dyn StrategyContext) {}

    /// Suspend; the state is saved afterwards and the strategy stays inactive
    fn suspend(&mut self, _ctx: &mut dyn StrategyContext) {}

    /// Pick up work again after a suspend, network outage or restart
    fn unsuspend(&mut self, _ctx: &mut dyn StrategyContext) {}

    /// Everything needed to restore the strategy later; called regularly
    fn save_strategy_state(&self) -> StrategyState {
        StrategyState::new()
    }

    /// Restore a state produced by `save_strategy_state`
    fn restore_strategy_state(&mut self, _ctx: &mut dyn StrategyContext, _state: &StrategyState) {
    }

    /// Funds have changed
    fn on_new_funds(&mut self, _ctx: &mut dyn StrategyContext, _funds: &Funds) {}

    /// A new order book is available
    fn on_new_order_book(&mut self, _ctx: &mut dyn StrategyContext, _order_book: &OrderBook) {}

    /// New public trades are available
    fn on_new_public_trades(&mut self, _ctx: &mut dyn StrategyContext, _trades: &[PublicTrade]) {}

    /// A new ticker is available
    fn on_new_ticker(&mut self, _ctx: &mut dyn StrategyContext, _ticker: &Ticker) {}

    /// An order of this strategy has changed
    fn on_order_update(&mut self, _ctx: &mut dyn StrategyContext, _update: &OrderUpdate) {}

    /// An order was placed successfully
    fn on_place_order_success(
        &mut self,
        _ctx: &mut dyn StrategyContext,
        _order_placing_id: OrderPlacingId,
        _order: &Order,
    ) {
    }

    /// An order could not be placed
    fn on_place_order_error_string(
        &mut self,
        _ctx: &mut dyn StrategyContext,
        _order_placing_id: OrderPlacingId,
        _error_message: &str,
    ) {
    }

    /// An order was canceled successfully
    fn on_cancel_order_success(
        &mut self,
        _ctx: &mut dyn StrategyContext,
        _order_id: OrderId,
        _canceled_order: &Order,
    ) {
    }

    /// An order could not be canceled
    fn on_cancel_order_error_string(
        &mut self,
        _ctx: &mut dyn StrategyContext,
        _order_id: OrderId,
        _error_message: &str,
    ) {
    }

    /// Strategy name, used for logging and state files
    fn name(&self) -> &str {
        "unnamed_strategy"
    }
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn get_strategy_config(&self) -> StrategyConfig {
        (**self).get_strategy_config()
    }

    fn init(&mut self, ctx: &mut dyn StrategyContext) {
        (**self).init(ctx)
    }

    fn start(&mut self, ctx: &mut dyn StrategyContext) {
        (**self).start(ctx)
    }

    fn stop(&mut self, ctx: &mut dyn StrategyContext) {
        (**self).stop(ctx)
    }

    fn suspend(&mut self, ctx: &mut dyn StrategyContext) {
        (**self).suspend(ctx)
    }

    fn unsuspend(&mut self, ctx: &mut dyn StrategyContext) {
        (**self).unsuspend(ctx)
    }

    fn save_strategy_state(&self) -> StrategyState {
        (**self).save_strategy_state()
    }

    fn restore_strategy_state(&mut self, ctx: &mut dyn StrategyContext, state: &StrategyState) {
        (**self).restore_strategy_state(ctx, state)
    }

    fn on_new_funds(&mut self, ctx: &mut dyn StrategyContext, funds: &Funds) {
        (**self).on_new_funds(ctx, funds)
    }

    fn on_new_order_book(&mut self, ctx: &mut dyn StrategyContext, order_book: &OrderBook) {
        (**self).on_new_order_book(ctx, order_book)
    }

    fn on_new_public_trades(&mut self, ctx: &mut dyn StrategyContext, trades: &[PublicTrade]) {
        (**self).on_new_public_trades(ctx, trades)
    }

    fn on_new_ticker(&mut self, ctx: &mut dyn StrategyContext, ticker: &Ticker) {
        (**self).on_new_ticker(ctx, ticker)
    }

    fn on_order_update(&mut self, ctx: &mut dyn StrategyContext, update: &OrderUpdate) {
        (**self).on_order_update(ctx, update)
    }

    fn on_place_order_success(
        &mut self,
        ctx: &mut dyn StrategyContext,
        order_placing_id: OrderPlacingId,
        order: &Order,
    ) {
        (**self).on_place_order_success(ctx, order_placing_id, order)
    }

    fn on_place_order_error_string(
        &mut self,
        ctx: &mut dyn StrategyContext,
        order_placing_id: OrderPlacingId,
        error_message: &str,
    ) {
        (**self).on_place_order_error_string(ctx, order_placing_id, error_message)
    }

    fn on_cancel_order_success(
        &mut self,
        ctx: &mut dyn StrategyContext,
        order_id: OrderId,
        canceled_order: &Order,
    ) {
        (**self).on_cancel_order_success(ctx, order_id, canceled_order)
    }

    fn on_cancel_order_error_string(
        &mut self,
        ctx: &mut dyn StrategyContext,
        order_id: OrderId,
        error_message: &str,
    ) {
        (**self).on_cancel_order_error_string(ctx, order_id, error_message)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// A strategy that subscribes to nothing and never trades
///
/// Useful for exercising a host without strategy logic.
#[derive(Debug, Default)]
pub struct NoOpStrategy;

impl Strategy for NoOpStrategy {
    fn get_strategy_config(&self) -> StrategyConfig {
        StrategyConfig::new()
    }

    fn name(&self) -> &str {
        "noop"
    }
}
