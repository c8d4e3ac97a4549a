//! Threshold Strategy
//!
//! Buys when the last price drops to `buy_below` and sells the acquired
//! position once the price reaches `sell_above`. At most one order is in
//! flight at a time.

use std::collections::{HashMap, HashSet};

use log::{debug, info};
use serde_json::Value;

use super::config::{DataSubscriptionType, StrategyConfig};
use super::traits::{Strategy, StrategyContext, StrategyState};
use crate::account::{Funds, Order, OrderId, OrderPlacingId, OrderUpdate, TradeId};
use crate::capability::RoundingType;
use crate::errors::{Error, Result};
use crate::logging::LogLevel;
use crate::market::Ticker;

const POSITION_KEY: &str = "position";
const TRADES_KEY: &str = "trades";

/// Parameters of [`ThresholdStrategy`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdConfig {
    /// Buy when the last price is at or below this
    pub buy_below: f64,
    /// Sell when the last price is at or above this
    pub sell_above: f64,
    /// Maximum quote spent per buy order, fees included
    pub order_total: f64,
}

impl ThresholdConfig {
    pub fn new(buy_below: f64, sell_above: f64, order_total: f64) -> Self {
        Self {
            buy_below,
            sell_above,
            order_total,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.buy_below > 0.0) {
            return Err(Error::Parse("buy_below must be positive".into()));
        }
        if self.sell_above <= self.buy_below {
            return Err(Error::Parse(
                "sell_above must be greater than buy_below".into(),
            ));
        }
        if !(self.order_total > 0.0) {
            return Err(Error::Parse("order_total must be positive".into()));
        }
        Ok(())
    }
}

/// Order the strategy is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InFlight {
    Placing(OrderPlacingId),
    Open(OrderId),
}

/// Buy-low/sell-high strategy driven by ticker updates
#[derive(Debug)]
pub struct ThresholdStrategy {
    config: ThresholdConfig,
    /// Base currency bought and not yet sold
    position: f64,
    /// Number of fills seen
    trades: u64,
    in_flight: Option<InFlight>,
    /// Fills of the order in flight already added to `position`
    counted: HashSet<TradeId>,
}

impl ThresholdStrategy {
    pub fn new(config: ThresholdConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            position: 0.0,
            trades: 0,
            in_flight: None,
            counted: HashSet::new(),
        })
    }

    /// Build from JSON parameters `buy_below`, `sell_above` and `order_total`
    pub fn from_params(params: HashMap<String, Value>) -> Result<Self> {
        let number = |key: &str| {
            params
                .get(key)
                .and_then(|v| v.as_f64())
                .ok_or_else(|| Error::Parse(format!("threshold parameter '{}' missing or not a number", key)))
        };

        Self::new(ThresholdConfig::new(
            number("buy_below")?,
            number("sell_above")?,
            number("order_total")?,
        ))
    }

    pub fn config(&self) -> &ThresholdConfig {
        &self.config
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn trades(&self) -> u64 {
        self.trades
    }

    pub fn has_order_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    fn record_fill(&mut self, ctx: &mut dyn StrategyContext, order_id: OrderId, buy: bool, amount: f64) {
        if buy {
            self.position += amount;
        } else {
            self.position = (self.position - amount).max(0.0);
        }
        self.trades += 1;
        ctx.write_log(
            LogLevel::Important,
            &format!(
                "{} {} (order {}), position now {}",
                if buy { "Bought" } else { "Sold" },
                amount,
                order_id,
                self.position
            ),
        );
    }

    fn finish_in_flight(&mut self) {
        self.in_flight = None;
        self.counted.clear();
    }

    /// Count fills of the order in flight that no update was received for
    fn reconcile(&mut self, ctx: &mut dyn StrategyContext) {
        let Some(InFlight::Open(order_id)) = self.in_flight else {
            return;
        };

        let missed: Vec<_> = ctx
            .get_buffered_completed_trades()
            .into_iter()
            .filter(|t| t.order_id == order_id && !self.counted.contains(&t.id))
            .collect();
        for trade in missed {
            self.counted.insert(trade.id);
            self.record_fill(ctx, order_id, trade.buy, trade.amount);
        }

        if !ctx.get_buffered_open_orders().iter().any(|o| o.id == order_id) {
            debug!("Order {} completed while suspended", order_id);
            self.finish_in_flight();
        }
    }

    fn try_buy(&mut self, ctx: &mut dyn StrategyContext, last_price: f64) {
        let quote = ctx.get_second_currency();
        let available = ctx
            .get_buffered_funds()
            .get(&quote)
            .map(|f| f.available)
            .unwrap_or(0.0);

        let caps = ctx.get_trading_capability_manager();
        let price = caps.round_price(last_price, RoundingType::Floor);
        let unit_cost = caps.get_due_buy_total(1.0, price);
        if !(unit_cost > 0.0) {
            return;
        }
        let budget = self.config.order_total.min(available);
        let amount = caps
            .round_amount(budget / unit_cost, RoundingType::Floor)
            .min(caps.get_max_buy_amount(price));

        if !caps.is_order_valid(true, amount, price) {
            ctx.set_status(&format!("Cannot buy at {}: {} {} available", price, available, quote));
            return;
        }

        let placing_id = ctx.place_limit_order(true, amount, price);
        self.in_flight = Some(InFlight::Placing(placing_id));
        ctx.write_log(
            LogLevel::Info,
            &format!("Buying {} @ {} (placing id {})", amount, price, placing_id),
        );
    }

    fn try_sell(&mut self, ctx: &mut dyn StrategyContext, last_price: f64) {
        let base = ctx.get_first_currency();
        let available = ctx
            .get_buffered_funds()
            .get(&base)
            .map(|f| f.available)
            .unwrap_or(0.0);

        let caps = ctx.get_trading_capability_manager();
        let price = caps.round_price(last_price, RoundingType::Ceil);
        let amount = caps
            .round_amount(self.position.min(available), RoundingType::Floor)
            .min(caps.get_max_sell_amount(price));

        if !caps.is_order_valid(false, amount, price) {
            ctx.set_status(&format!("Position {} {} too small to sell", self.position, base));
            return;
        }

        let placing_id = ctx.place_limit_order(false, amount, price);
        self.in_flight = Some(InFlight::Placing(placing_id));
        ctx.write_log(
            LogLevel::Info,
            &format!("Selling {} @ {} (placing id {})", amount, price, placing_id),
        );
    }
}

impl Strategy for ThresholdStrategy {
    fn get_strategy_config(&self) -> StrategyConfig {
        StrategyConfig::new()
            .with_subscription(DataSubscriptionType::Ticker)
            .with_subscription(DataSubscriptionType::Funds)
    }

    fn start(&mut self, ctx: &mut dyn StrategyContext) {
        ctx.set_status(&format!(
            "Waiting: buy <= {}, sell >= {}",
            self.config.buy_below, self.config.sell_above
        ));
    }

    fn stop(&mut self, ctx: &mut dyn StrategyContext) {
        if let Some(InFlight::Open(order_id)) = self.in_flight {
            ctx.cancel_order(order_id);
        }
        ctx.set_status("Stopped");
    }

    fn unsuspend(&mut self, ctx: &mut dyn StrategyContext) {
        // no order updates are delivered while suspended
        self.reconcile(ctx);
    }

    fn save_strategy_state(&self) -> StrategyState {
        [
            (POSITION_KEY.to_string(), self.position.to_string()),
            (TRADES_KEY.to_string(), self.trades.to_string()),
        ]
        .into_iter()
        .collect()
    }

    fn restore_strategy_state(&mut self, ctx: &mut dyn StrategyContext, state: &StrategyState) {
        if let Some(position) = state.get(POSITION_KEY) {
            match position.parse::<f64>() {
                Ok(p) => self.position = p,
                Err(e) => ctx.write_log(
                    LogLevel::Warning,
                    &format!("Ignoring stored position '{}': {}", position, e),
                ),
            }
        }
        if let Some(trades) = state.get(TRADES_KEY) {
            match trades.parse::<u64>() {
                Ok(t) => self.trades = t,
                Err(e) => ctx.write_log(
                    LogLevel::Warning,
                    &format!("Ignoring stored trade count '{}': {}", trades, e),
                ),
            }
        }
        info!(
            "Threshold strategy restored: position {}, trades {}",
            self.position, self.trades
        );
    }

    fn on_new_funds(&mut self, ctx: &mut dyn StrategyContext, funds: &Funds) {
        let base = ctx.get_first_currency();
        let quote = ctx.get_second_currency();
        let available = |currency: &str| funds.get(currency).map(|f| f.available).unwrap_or(0.0);
        ctx.set_status(&format!(
            "Position {} {} | available {} {}, {} {}",
            self.position,
            base,
            available(&base),
            base,
            available(&quote),
            quote
        ));
    }

    fn on_new_ticker(&mut self, ctx: &mut dyn StrategyContext, ticker: &Ticker) {
        if self.in_flight.is_some() {
            return;
        }

        let price = ticker.last_price;
        if price <= self.config.buy_below {
            self.try_buy(ctx, price);
        } else if price >= self.config.sell_above && self.position > 0.0 {
            self.try_sell(ctx, price);
        }
    }

    fn on_order_update(&mut self, ctx: &mut dyn StrategyContext, update: &OrderUpdate) {
        let Some(order_id) = update.order_id() else {
            return;
        };

        if update.status.is_fill() {
            let buy = update.updated_order.as_ref().map(|o| o.buy).unwrap_or(true);
            self.record_fill(ctx, order_id, buy, update.filled_delta());
        }

        if self.in_flight == Some(InFlight::Open(order_id)) {
            self.counted.extend(update.resulting_trades.iter().map(|t| t.id));
            if update.status.is_terminal() {
                debug!("Order {} done with status {}", order_id, update.status);
                self.finish_in_flight();
            }
        }
    }

    fn on_place_order_success(
        &mut self,
        _ctx: &mut dyn StrategyContext,
        order_placing_id: OrderPlacingId,
        order: &Order,
    ) {
        if self.in_flight == Some(InFlight::Placing(order_placing_id)) {
            self.in_flight = Some(InFlight::Open(order.id));
        }
    }

    fn on_place_order_error_string(
        &mut self,
        ctx: &mut dyn StrategyContext,
        order_placing_id: OrderPlacingId,
        error_message: &str,
    ) {
        if self.in_flight == Some(InFlight::Placing(order_placing_id)) {
            self.finish_in_flight();
        }
        ctx.write_log(
            LogLevel::Warning,
            &format!("Placing {} failed: {}", order_placing_id, error_message),
        );
    }

    fn on_cancel_order_success(
        &mut self,
        _ctx: &mut dyn StrategyContext,
        order_id: OrderId,
        _canceled_order: &Order,
    ) {
        if self.in_flight == Some(InFlight::Open(order_id)) {
            self.finish_in_flight();
        }
    }

    fn name(&self) -> &str {
        "threshold"
    }
}
