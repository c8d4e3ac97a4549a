//! Paper Trading Host
//!
//! Simulates the platform side of the strategy contract for one currency
//! pair: funds with reservations, open orders, own trades and buffered market
//! data. Orders are matched locally against incoming order books and public
//! trades.

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use super::action::{HostAction, HostEvent};
use crate::account::{
    Funds, FundsEntry, Order, OrderId, OrderPlacingId, OrderUpdate, OrderUpdateStatus,
    PrivateTrade, TradeId,
};
use crate::capability::TradingCapabilityManager;
use crate::errors::{Error, Result};
use crate::market::{
    aggregate_candles, Candle, CurrencyPair, OrderBook, OrderBookEntry, PublicTrade, Ticker,
};
use crate::strategy::{ExitReason, StrategyContext};

/// Funds shortfall tolerated when reserving, absorbs float error
const FUNDS_TOLERANCE: f64 = 1e-9;

/// Input configuration for creating a [`PaperHost`]
#[derive(Debug, Clone)]
pub struct PaperHostInput {
    /// Traded currency pair
    pub pair: CurrencyPair,
    /// Initially available amount per currency
    pub funds: HashMap<String, f64>,
    /// Number of public trades kept for `get_buffered_recent_trades` and candles
    pub max_recent_trades: usize,
}

impl PaperHostInput {
    pub fn new(pair: CurrencyPair) -> Self {
        Self {
            pair,
            funds: HashMap::new(),
            max_recent_trades: default_max_recent_trades(),
        }
    }

    /// Builder: set the initially available amount of a currency
    pub fn with_funds(mut self, currency: &str, amount: f64) -> Self {
        self.funds.insert(currency.to_ascii_uppercase(), amount);
        self
    }

    /// Builder: set the size of the public trade buffer
    pub fn with_max_recent_trades(mut self, max_recent_trades: usize) -> Self {
        self.max_recent_trades = max_recent_trades;
        self
    }
}

pub(crate) fn default_max_recent_trades() -> usize {
    1000
}

/// Open order with its fills and the funds still reserved for it
#[derive(Debug, Clone)]
struct PaperOrder {
    order: Order,
    trades: Vec<PrivateTrade>,
    reserved: f64,
}

impl PaperOrder {
    /// Whether a trade at `price` reaches this order's limit
    fn crosses(&self, price: f64) -> bool {
        if self.order.buy {
            price <= self.order.price
        } else {
            price >= self.order.price
        }
    }
}

/// Local simulation of the platform for one currency pair
///
/// Implements [`StrategyContext`]. Order placements and cancellations are
/// queued and executed by [`PaperHost::process_next_action`]; the resulting
/// [`HostEvent`]s are dispatched to the strategy by the runner.
///
/// # Matching
/// Fills always execute at the order's limit price.
/// - A new order book fills crossing orders, limited by the amount of each
///   book entry. Fills consume the buffered book's liquidity.
/// - New public trades fill crossing orders limited by the trade amount,
///   regardless of the trade's side.
/// - A freshly placed order is matched immediately against the buffered book.
pub struct PaperHost {
    pair: CurrencyPair,
    capabilities: Box<dyn TradingCapabilityManager>,
    funds: Funds,
    open_orders: BTreeMap<OrderId, PaperOrder>,
    completed_trades: Vec<PrivateTrade>,
    order_book: Option<OrderBook>,
    ticker: Option<Ticker>,
    recent_trades: VecDeque<PublicTrade>,
    max_recent_trades: usize,
    pending: VecDeque<HostAction>,
    status: String,
    exit_request: Option<(ExitReason, String)>,
    next_placing_id: OrderPlacingId,
    next_order_id: OrderId,
    next_trade_id: TradeId,
}

impl PaperHost {
    /// Create a host with the given funds and capability manager
    pub fn new(input: PaperHostInput, capabilities: impl TradingCapabilityManager + 'static) -> Self {
        let mut funds: Funds = input
            .funds
            .iter()
            .map(|(currency, amount)| (currency.clone(), FundsEntry::available(*amount)))
            .collect();
        funds.entry(input.pair.first().to_string()).or_default();
        funds.entry(input.pair.second().to_string()).or_default();

        info!(
            "PaperHost created for {} with funds: {:?}",
            input.pair, input.funds
        );

        Self {
            pair: input.pair,
            capabilities: Box::new(capabilities),
            funds,
            open_orders: BTreeMap::new(),
            completed_trades: Vec::new(),
            order_book: None,
            ticker: None,
            recent_trades: VecDeque::new(),
            max_recent_trades: input.max_recent_trades,
            pending: VecDeque::new(),
            status: String::new(),
            exit_request: None,
            next_placing_id: 1,
            next_order_id: 1,
            next_trade_id: 1,
        }
    }

    /// Currency pair simulated by this host
    pub fn pair(&self) -> &CurrencyPair {
        &self.pair
    }

    /// Last status set by the strategy
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Funds entry of one currency
    pub fn funds_of(&self, currency: &str) -> FundsEntry {
        self.funds.get(currency).copied().unwrap_or_default()
    }

    pub fn open_order_count(&self) -> usize {
        self.open_orders.len()
    }

    pub fn has_pending_actions(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_action_count(&self) -> usize {
        self.pending.len()
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_request.is_some()
    }

    /// Take the exit requested by the strategy, if any
    pub fn take_exit_request(&mut self) -> Option<(ExitReason, String)> {
        self.exit_request.take()
    }

    /// Buffer a new ticker
    pub fn apply_ticker(&mut self, ticker: Ticker) {
        self.ticker = Some(ticker);
    }

    /// Buffer a new order book and match open orders against it
    pub fn apply_order_book(&mut self, order_book: OrderBook) -> Vec<HostEvent> {
        let order_book = if order_book.is_sorted() {
            order_book
        } else {
            OrderBook::new(order_book.asks, order_book.bids)
        };
        self.order_book = Some(order_book);
        let updates = self.match_order_book(None);
        Self::fill_events(updates)
    }

    /// Buffer new public trades and match open orders against them
    pub fn apply_public_trades(&mut self, trades: &[PublicTrade]) -> Vec<HostEvent> {
        for trade in trades {
            self.recent_trades.push_back(trade.clone());
        }
        while self.recent_trades.len() > self.max_recent_trades {
            self.recent_trades.pop_front();
        }

        let updates = self.match_public_trades(trades);
        Self::fill_events(updates)
    }

    /// Execute the oldest queued action, `None` when the queue is empty
    pub fn process_next_action(&mut self) -> Option<Vec<HostEvent>> {
        let action = self.pending.pop_front()?;
        let mut events = Vec::new();

        match action {
            HostAction::Place {
                order_placing_id,
                buy,
                amount,
                price,
            } => match self.execute_placement(buy, amount, price) {
                Ok(order) => {
                    info!(
                        "Paper order {} placed (placing id {}): {} {} @ {}",
                        order.id,
                        order_placing_id,
                        if buy { "buy" } else { "sell" },
                        amount,
                        price
                    );
                    let order_id = order.id;
                    events.push(HostEvent::PlaceSucceeded {
                        order_placing_id,
                        order,
                    });
                    let updates = self.match_order_book(Some(order_id));
                    events.extend(updates.into_iter().map(HostEvent::OrderUpdated));
                    events.push(HostEvent::FundsChanged);
                }
                Err(e) => {
                    warn!("Paper order placing {} failed: {}", order_placing_id, e);
                    events.push(HostEvent::PlaceFailed {
                        order_placing_id,
                        error_message: e.to_string(),
                    });
                }
            },
            HostAction::Cancel { order_id } => match self.execute_cancel(order_id) {
                Ok((order, update)) => {
                    info!("Paper order {} canceled", order_id);
                    events.push(HostEvent::CancelSucceeded { order_id, order });
                    events.push(HostEvent::OrderUpdated(update));
                    events.push(HostEvent::FundsChanged);
                }
                Err(e) => {
                    warn!("Paper order {} cancel failed: {}", order_id, e);
                    events.push(HostEvent::CancelFailed {
                        order_id,
                        error_message: e.to_string(),
                    });
                }
            },
        }

        Some(events)
    }

    fn fill_events(updates: Vec<OrderUpdate>) -> Vec<HostEvent> {
        if updates.is_empty() {
            return Vec::new();
        }
        let mut events: Vec<HostEvent> = updates.into_iter().map(HostEvent::OrderUpdated).collect();
        events.push(HostEvent::FundsChanged);
        events
    }

    /// Remaining amounts at or below this count as filled
    fn dust(&self) -> f64 {
        self.capabilities.get_minimal_amount_change(0.0) * 1e-6
    }

    fn execute_placement(&mut self, buy: bool, amount: f64, price: f64) -> Result<Order> {
        if !self.capabilities.is_order_valid(buy, amount, price) {
            return Err(Error::InvalidOrder(format!(
                "{} {} @ {} violates the trading rules of {}",
                if buy { "buy" } else { "sell" },
                amount,
                price,
                self.pair
            )));
        }

        let (currency, required) = if buy {
            (
                self.pair.second().to_string(),
                self.capabilities.get_due_buy_total(amount, price),
            )
        } else {
            (self.pair.first().to_string(), amount)
        };

        let entry = self.funds.entry(currency.clone()).or_default();
        if required - entry.available > FUNDS_TOLERANCE {
            return Err(Error::InsufficientFunds {
                currency,
                required,
                available: entry.available,
            });
        }
        entry.reserve(required);

        let order = Order::new(self.next_order_id, buy, amount, price, Utc::now());
        self.next_order_id += 1;
        self.open_orders.insert(
            order.id,
            PaperOrder {
                order: order.clone(),
                trades: Vec::new(),
                reserved: required,
            },
        );
        Ok(order)
    }

    /// Remove an open order; the update has no `updated_order` since the order is gone
    fn execute_cancel(&mut self, order_id: OrderId) -> Result<(Order, OrderUpdate)> {
        let paper = self
            .open_orders
            .remove(&order_id)
            .ok_or(Error::OrderNotFound(order_id))?;

        let currency = if paper.order.buy {
            self.pair.second()
        } else {
            self.pair.first()
        };
        if paper.reserved > 0.0 {
            self.funds
                .entry(currency.to_string())
                .or_default()
                .release(paper.reserved);
        }

        let update = OrderUpdate {
            original_order: Some(paper.order.clone()),
            resulting_trades: paper.trades,
            status: OrderUpdateStatus::Canceled,
            timestamp: Utc::now(),
            updated_order: None,
        };
        Ok((paper.order, update))
    }

    /// Match open orders against the buffered book, consuming its liquidity
    fn match_order_book(&mut self, only: Option<OrderId>) -> Vec<OrderUpdate> {
        let Some(book) = self.order_book.as_ref() else {
            return Vec::new();
        };
        let mut asks = book.asks.clone();
        let mut bids = book.bids.clone();

        let order_ids: Vec<OrderId> = match only {
            Some(id) => vec![id],
            None => self.open_orders.keys().copied().collect(),
        };

        let dust = self.dust();
        let timestamp = Utc::now();
        let mut updates = Vec::new();

        for order_id in order_ids {
            let Some(paper) = self.open_orders.get(&order_id) else {
                continue;
            };
            let buy = paper.order.buy;
            let price = paper.order.price;
            let mut remaining = paper.order.remaining_amount;
            let mut fills = Vec::new();

            let levels = if buy { &mut asks } else { &mut bids };
            for level in levels.iter_mut() {
                if remaining <= dust || !paper.crosses(level.price) {
                    break;
                }
                let amount = remaining.min(level.amount);
                if amount <= dust {
                    continue;
                }
                level.amount -= amount;
                remaining -= amount;
                fills.push(amount);
            }

            for amount in fills {
                if let Some(update) = self.fill_order(order_id, amount, price, timestamp) {
                    updates.push(update);
                }
            }
        }

        let keep = |entry: &OrderBookEntry| entry.amount > dust;
        if let Some(book) = self.order_book.as_mut() {
            book.asks = asks.into_iter().filter(keep).collect();
            book.bids = bids.into_iter().filter(keep).collect();
        }

        updates
    }

    fn match_public_trades(&mut self, trades: &[PublicTrade]) -> Vec<OrderUpdate> {
        let dust = self.dust();
        let mut updates = Vec::new();

        for trade in trades {
            let mut liquidity = trade.amount;
            let order_ids: Vec<OrderId> = self.open_orders.keys().copied().collect();

            for order_id in order_ids {
                if liquidity <= dust {
                    break;
                }
                let Some(paper) = self.open_orders.get(&order_id) else {
                    continue;
                };
                if !paper.crosses(trade.price) {
                    continue;
                }
                let amount = paper.order.remaining_amount.min(liquidity);
                let price = paper.order.price;
                liquidity -= amount;

                if let Some(update) = self.fill_order(order_id, amount, price, trade.timestamp) {
                    updates.push(update);
                }
            }
        }

        updates
    }

    /// Apply one fill to an open order, its funds and the trade history
    fn fill_order(
        &mut self,
        order_id: OrderId,
        amount: f64,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Option<OrderUpdate> {
        let dust = self.dust();
        let base = self.pair.first().to_string();
        let quote = self.pair.second().to_string();

        let paper = self.open_orders.get_mut(&order_id)?;
        let buy = paper.order.buy;
        let original = paper.order.clone();

        let trade = PrivateTrade {
            amount,
            buy,
            id: self.next_trade_id,
            order_id,
            price,
            timestamp,
        };
        self.next_trade_id += 1;

        paper.order.received_amount += amount;
        paper.order.remaining_amount = paper.order.amount - paper.order.received_amount;
        if paper.order.remaining_amount <= dust {
            paper.order.remaining_amount = 0.0;
        }
        paper.trades.push(trade.clone());

        let (spent_currency, spent, credit_currency, credited) = if buy {
            (
                quote,
                self.capabilities.get_due_buy_total(amount, price),
                base,
                amount,
            )
        } else {
            (
                base,
                amount,
                quote,
                self.capabilities.get_sell_total_to_receive(amount, price),
            )
        };
        paper.reserved -= spent;

        let updated = paper.order.clone();
        let resulting_trades = paper.trades.clone();
        let leftover = paper.reserved;
        let finished = updated.is_filled();

        let spent_entry = self.funds.entry(spent_currency).or_default();
        spent_entry.spend_reserved(spent);
        if finished {
            self.open_orders.remove(&order_id);
            if leftover > 0.0 {
                spent_entry.release(leftover);
            }
        }
        self.funds.entry(credit_currency).or_default().credit(credited);
        self.completed_trades.push(trade);

        let status = if finished {
            OrderUpdateStatus::Filled
        } else {
            OrderUpdateStatus::PartiallyFilled
        };
        debug!(
            "Paper fill: order {} {} {} @ {} ({:?})",
            order_id,
            if buy { "bought" } else { "sold" },
            amount,
            price,
            status
        );

        Some(OrderUpdate {
            original_order: Some(original),
            resulting_trades,
            status,
            timestamp,
            updated_order: Some(updated),
        })
    }
}

impl StrategyContext for PaperHost {
    fn place_limit_order(&mut self, buy: bool, amount: f64, price: f64) -> OrderPlacingId {
        let order_placing_id = self.next_placing_id;
        self.next_placing_id += 1;
        self.pending.push_back(HostAction::Place {
            order_placing_id,
            buy,
            amount,
            price,
        });
        debug!(
            "Queued order placing {}: {} {} @ {}",
            order_placing_id,
            if buy { "buy" } else { "sell" },
            amount,
            price
        );
        order_placing_id
    }

    fn cancel_order(&mut self, order_id: OrderId) {
        self.pending.push_back(HostAction::Cancel { order_id });
        debug!("Queued cancel of order {}", order_id);
    }

    fn exit(&mut self, reason: ExitReason, message: &str) {
        info!("Strategy requested exit ({}): {}", reason, message);
        if self.exit_request.is_none() {
            self.exit_request = Some((reason, message.to_string()));
        }
    }

    fn get_buffered_completed_trades(&self) -> Vec<PrivateTrade> {
        self.completed_trades.clone()
    }

    fn get_buffered_funds(&self) -> Funds {
        self.funds.clone()
    }

    fn get_buffered_open_orders(&self) -> Vec<Order> {
        self.open_orders.values().map(|p| p.order.clone()).collect()
    }

    fn get_buffered_order_book(&self) -> Option<OrderBook> {
        self.order_book.clone()
    }

    fn get_buffered_recent_candles(
        &self,
        candle_size_in_minutes: u32,
        number_of_candles: usize,
    ) -> Vec<Candle> {
        let trades: Vec<PublicTrade> = self.recent_trades.iter().cloned().collect();
        aggregate_candles(&trades, candle_size_in_minutes, number_of_candles)
    }

    fn get_buffered_recent_trades(&self) -> Vec<PublicTrade> {
        self.recent_trades.iter().cloned().collect()
    }

    fn get_buffered_ticker(&self) -> Option<Ticker> {
        self.ticker.clone()
    }

    fn get_currency_pair(&self) -> String {
        self.pair.to_string()
    }

    fn get_first_currency(&self) -> String {
        self.pair.first().to_string()
    }

    fn get_second_currency(&self) -> String {
        self.pair.second().to_string()
    }

    fn get_trading_capability_manager(&self) -> &dyn TradingCapabilityManager {
        self.capabilities.as_ref()
    }

    fn set_status(&mut self, status: &str) {
        if self.status != status {
            info!("Strategy status: {}", status);
            self.status = status.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{RuleBasedCapabilityManager, TradingRules};
    use crate::market::DEFAULT_NUMBER_OF_CANDLES;
    use chrono::{Duration, TimeZone};

    const EPS: f64 = 1e-9;

    fn host_with(eur: f64, btc: f64) -> PaperHost {
        let rules = TradingRules::fixed(0.01, 0.001)
            .with_total_range(1.0, None)
            .with_fee_rate(0.001);
        let input = PaperHostInput::new("BTC/EUR".parse().unwrap())
            .with_funds("EUR", eur)
            .with_funds("BTC", btc);
        PaperHost::new(input, RuleBasedCapabilityManager::new(rules).unwrap())
    }

    fn drain(host: &mut PaperHost) -> Vec<HostEvent> {
        let mut events = Vec::new();
        while let Some(batch) = host.process_next_action() {
            events.extend(batch);
        }
        events
    }

    fn trade(id: u64, price: f64, amount: f64) -> PublicTrade {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap() + Duration::seconds(id as i64);
        PublicTrade::new(id, false, price, amount, at)
    }

    #[test]
    fn test_placement_reserves_funds() {
        let mut host = host_with(1000.0, 0.0);

        let placing_id = host.place_limit_order(true, 1.0, 100.0);
        assert_eq!(placing_id, 1);
        assert!(host.has_pending_actions());

        let events = drain(&mut host);
        assert_eq!(events.len(), 2);
        match &events[0] {
            HostEvent::PlaceSucceeded {
                order_placing_id,
                order,
            } => {
                assert_eq!(*order_placing_id, 1);
                assert!(order.buy);
                assert_eq!(order.remaining_amount, 1.0);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(events[1], HostEvent::FundsChanged);

        let eur = host.funds_of("EUR");
        assert!((eur.available - 899.9).abs() < EPS);
        assert!((eur.reserved - 100.1).abs() < EPS);
        assert_eq!(host.get_buffered_open_orders().len(), 1);
    }

    #[test]
    fn test_invalid_and_unfunded_orders_fail() {
        let mut host = host_with(50.0, 0.0);

        // off the amount grid
        let first = host.place_limit_order(true, 0.0005, 100.0);
        // costs more than available
        let second = host.place_limit_order(true, 1.0, 100.0);

        let events = drain(&mut host);
        assert_eq!(events.len(), 2);
        match &events[0] {
            HostEvent::PlaceFailed {
                order_placing_id,
                error_message,
            } => {
                assert_eq!(*order_placing_id, first);
                assert!(error_message.contains("Invalid order"));
            }
            other => panic!("unexpected event {:?}", other),
        }
        match &events[1] {
            HostEvent::PlaceFailed {
                order_placing_id,
                error_message,
            } => {
                assert_eq!(*order_placing_id, second);
                assert!(error_message.contains("Insufficient EUR"));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(host.open_order_count(), 0);
        assert_eq!(host.funds_of("EUR").available, 50.0);
    }

    #[test]
    fn test_cancel_releases_reservation() {
        let mut host = host_with(0.0, 2.0);
        host.place_limit_order(false, 1.5, 100.0);
        drain(&mut host);
        assert_eq!(host.funds_of("BTC").reserved, 1.5);

        let order_id = host.get_buffered_open_orders()[0].id;
        host.cancel_order(order_id);
        host.cancel_order(999);
        let events = drain(&mut host);

        assert!(matches!(events[0], HostEvent::CancelSucceeded { order_id: id, .. } if id == order_id));
        match &events[1] {
            HostEvent::OrderUpdated(update) => {
                assert_eq!(update.status, OrderUpdateStatus::Canceled);
                assert_eq!(update.order_id(), Some(order_id));
                assert!(update.updated_order.is_none());
                assert_eq!(update.original_order.as_ref().map(|o| o.remaining_amount), Some(1.5));
                assert_eq!(update.filled_delta(), 0.0);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(events[2], HostEvent::FundsChanged);
        assert!(matches!(
            &events[3],
            HostEvent::CancelFailed { order_id: 999, error_message } if error_message.contains("not found")
        ));

        let btc = host.funds_of("BTC");
        assert_eq!(btc.available, 2.0);
        assert_eq!(btc.reserved, 0.0);
        assert_eq!(host.open_order_count(), 0);
    }

    #[test]
    fn test_order_book_fills_resting_sell() {
        let mut host = host_with(0.0, 2.0);
        host.place_limit_order(false, 1.0, 100.0);
        drain(&mut host);

        let book = OrderBook::new(
            vec![OrderBookEntry::new(101.0, 3.0)],
            vec![OrderBookEntry::new(100.5, 0.4), OrderBookEntry::new(99.0, 5.0)],
        );
        let events = host.apply_order_book(book);
        assert_eq!(events.len(), 2);
        match &events[0] {
            HostEvent::OrderUpdated(update) => {
                assert_eq!(update.status, OrderUpdateStatus::PartiallyFilled);
                assert!((update.filled_delta() - 0.4).abs() < EPS);
                assert_eq!(update.resulting_trades.len(), 1);
                assert_eq!(update.resulting_trades[0].price, 100.0);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(events[1], HostEvent::FundsChanged);

        let eur = host.funds_of("EUR");
        assert!((eur.available - 0.4 * 100.0 * 0.999).abs() < EPS);
        let btc = host.funds_of("BTC");
        assert!((btc.reserved - 0.6).abs() < EPS);
        assert!((btc.total_for_currency - 1.6).abs() < EPS);

        // consumed liquidity is gone from the buffered book
        let buffered = host.get_buffered_order_book().unwrap();
        assert_eq!(buffered.best_bid().map(|e| e.price), Some(99.0));

        let book = OrderBook::new(vec![], vec![OrderBookEntry::new(100.0, 1.0)]);
        let events = host.apply_order_book(book);
        match &events[0] {
            HostEvent::OrderUpdated(update) => {
                assert_eq!(update.status, OrderUpdateStatus::Filled);
                assert_eq!(update.resulting_trades.len(), 2);
                assert!(update.updated_order.as_ref().unwrap().is_filled());
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(host.open_order_count(), 0);
        assert_eq!(host.get_buffered_completed_trades().len(), 2);
        assert!(host.funds_of("BTC").reserved.abs() < EPS);
    }

    #[test]
    fn test_new_order_matches_buffered_book() {
        let mut host = host_with(1000.0, 0.0);
        host.apply_order_book(OrderBook::new(vec![OrderBookEntry::new(99.5, 2.0)], vec![]));

        host.place_limit_order(true, 1.0, 100.0);
        let events = drain(&mut host);

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], HostEvent::PlaceSucceeded { .. }));
        match &events[1] {
            HostEvent::OrderUpdated(update) => {
                assert_eq!(update.status, OrderUpdateStatus::Filled);
                assert_eq!(update.resulting_trades[0].price, 100.0);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(events[2], HostEvent::FundsChanged);

        let eur = host.funds_of("EUR");
        assert!(eur.reserved.abs() < EPS);
        assert!((eur.available - 899.9).abs() < EPS);
        assert_eq!(
            host.get_buffered_order_book().unwrap().best_ask().map(|e| e.amount),
            Some(1.0)
        );
        assert!((host.funds_of("BTC").available - 1.0).abs() < EPS);
    }

    #[test]
    fn test_public_trades_fill_at_limit_price() {
        let mut host = host_with(1000.0, 0.0);
        host.place_limit_order(true, 1.0, 100.0);
        drain(&mut host);

        let events = host.apply_public_trades(&[
            trade(1, 101.0, 1.0),
            trade(2, 100.0, 0.3),
            trade(3, 99.0, 5.0),
        ]);

        let statuses: Vec<OrderUpdateStatus> = events
            .iter()
            .filter_map(|e| match e {
                HostEvent::OrderUpdated(update) => Some(update.status),
                _ => None,
            })
            .collect();
        assert_eq!(
            statuses,
            vec![OrderUpdateStatus::PartiallyFilled, OrderUpdateStatus::Filled]
        );
        assert_eq!(events.last(), Some(&HostEvent::FundsChanged));

        let trades = host.get_buffered_completed_trades();
        assert_eq!(trades.len(), 2);
        assert!(trades.iter().all(|t| t.price == 100.0));
        assert!((trades[1].amount - 0.7).abs() < EPS);
        assert_eq!(host.get_buffered_recent_trades().len(), 3);
    }

    #[test]
    fn test_recent_trades_are_bounded() {
        let rules = TradingRules::fixed(0.01, 0.001);
        let input = PaperHostInput::new("ETH_BTC".parse().unwrap()).with_max_recent_trades(2);
        let mut host = PaperHost::new(input, RuleBasedCapabilityManager::new(rules).unwrap());

        let events = host.apply_public_trades(&[trade(1, 1.0, 1.0), trade(2, 2.0, 1.0), trade(3, 3.0, 1.0)]);
        assert!(events.is_empty());

        let recent = host.get_buffered_recent_trades();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, 2);

        let candles = host.get_buffered_recent_candles(1, DEFAULT_NUMBER_OF_CANDLES);
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].trade_number, 2);
    }

    #[test]
    fn test_context_accessors() {
        let mut host = host_with(10.0, 1.0);
        assert_eq!(host.get_currency_pair(), "BTC_EUR");
        assert_eq!(host.get_first_currency(), "BTC");
        assert_eq!(host.get_second_currency(), "EUR");
        assert!(host.get_buffered_ticker().is_none());
        assert!(host.get_buffered_order_book().is_none());

        host.apply_ticker(Ticker::new(100.0, 95.0, Utc::now()));
        assert_eq!(host.get_buffered_ticker().map(|t| t.last_price), Some(100.0));

        host.set_status("waiting");
        assert_eq!(host.status(), "waiting");

        let manager = host.get_trading_capability_manager();
        assert_eq!(manager.get_minimal_price_change(100.0), 0.01);
    }

    #[test]
    fn test_exit_request_keeps_first() {
        let mut host = host_with(0.0, 0.0);
        host.exit(ExitReason::Error, "boom");
        host.exit(ExitReason::Abort, "later");

        assert_eq!(
            host.take_exit_request(),
            Some((ExitReason::Error, "boom".to_string()))
        );
        assert!(host.take_exit_request().is_none());
    }
}
