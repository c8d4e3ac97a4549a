//! Trading capabilities derived from static exchange rules

use serde::{Deserialize, Serialize};

use super::traits::{RoundingType, TradingCapabilityManager};
use crate::errors::{Error, Result};

/// Relative slack, in steps, absorbed when snapping to a step grid
const STEP_TOLERANCE: f64 = 1e-9;

/// Largest number of decimals a step may have
const MAX_STEP_DECIMALS: i32 = 12;

/// How the exchange constrains order prices
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PriceIncrement {
    /// Prices are multiples of a fixed tick
    Fixed { tick: f64 },
    /// Prices carry at most `figures` significant figures and `max_decimals` decimals
    SignificantFigures { figures: u32, max_decimals: u32 },
}

impl Default for PriceIncrement {
    fn default() -> Self {
        Self::Fixed { tick: 0.01 }
    }
}

impl PriceIncrement {
    /// Price step around the reference price
    pub fn step_at(&self, reference_price: f64) -> f64 {
        match *self {
            PriceIncrement::Fixed { tick } => tick,
            PriceIncrement::SignificantFigures {
                figures,
                max_decimals,
            } => {
                let finest = 10f64.powi(-(max_decimals as i32));
                if !(reference_price.is_finite() && reference_price > 0.0) {
                    return finest;
                }
                let exponent = (reference_price.log10() + STEP_TOLERANCE).floor() as i32;
                let step = 10f64.powi(exponent - figures as i32 + 1);
                step.max(finest)
            }
        }
    }
}

/// Static order rules of one currency pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingRules {
    /// Price precision
    #[serde(default)]
    pub price_increment: PriceIncrement,

    /// Amount precision (base currency)
    #[serde(default = "default_amount_step")]
    pub amount_step: f64,

    /// Smallest order amount
    #[serde(default)]
    pub min_amount: f64,

    /// Largest order amount, unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<f64>,

    /// Smallest order value in quote currency
    #[serde(default)]
    pub min_total: f64,

    /// Largest order value in quote currency, unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_total: Option<f64>,

    /// Fee charged on the order value, for both sides (0.001 = 0.1%)
    #[serde(default)]
    pub fee_rate: f64,
}

fn default_amount_step() -> f64 {
    1e-8
}

impl Default for TradingRules {
    fn default() -> Self {
        Self {
            price_increment: PriceIncrement::default(),
            amount_step: default_amount_step(),
            min_amount: 0.0,
            max_amount: None,
            min_total: 0.0,
            max_total: None,
            fee_rate: 0.0,
        }
    }
}

impl TradingRules {
    /// Rules with a fixed price tick and amount step
    pub fn fixed(tick: f64, amount_step: f64) -> Self {
        Self {
            price_increment: PriceIncrement::Fixed { tick },
            amount_step,
            ..Self::default()
        }
    }

    /// Rules with significant-figure prices and a fixed amount step
    pub fn significant_figures(figures: u32, max_decimals: u32, amount_step: f64) -> Self {
        Self {
            price_increment: PriceIncrement::SignificantFigures {
                figures,
                max_decimals,
            },
            amount_step,
            ..Self::default()
        }
    }

    /// Builder: set the amount range
    pub fn with_amount_range(mut self, min_amount: f64, max_amount: Option<f64>) -> Self {
        self.min_amount = min_amount;
        self.max_amount = max_amount;
        self
    }

    /// Builder: set the order value range
    pub fn with_total_range(mut self, min_total: f64, max_total: Option<f64>) -> Self {
        self.min_total = min_total;
        self.max_total = max_total;
        self
    }

    /// Builder: set the fee rate
    pub fn with_fee_rate(mut self, fee_rate: f64) -> Self {
        self.fee_rate = fee_rate;
        self
    }

    /// Validate the rules
    pub fn validate(&self) -> Result<()> {
        match self.price_increment {
            PriceIncrement::Fixed { tick } if !(tick.is_finite() && tick > 0.0) => {
                return Err(Error::InvalidRules("price tick must be positive".into()));
            }
            PriceIncrement::SignificantFigures { figures: 0, .. } => {
                return Err(Error::InvalidRules(
                    "significant figures must be at least 1".into(),
                ));
            }
            _ => {}
        }

        if !(self.amount_step.is_finite() && self.amount_step > 0.0) {
            return Err(Error::InvalidRules("amount_step must be positive".into()));
        }

        if self.min_amount < 0.0 || self.min_total < 0.0 {
            return Err(Error::InvalidRules(
                "minimum amount and total cannot be negative".into(),
            ));
        }

        if let Some(max_amount) = self.max_amount {
            if max_amount < self.min_amount {
                return Err(Error::InvalidRules(
                    "max_amount must not be below min_amount".into(),
                ));
            }
        }

        if let Some(max_total) = self.max_total {
            if max_total < self.min_total {
                return Err(Error::InvalidRules(
                    "max_total must not be below min_total".into(),
                ));
            }
        }

        if !(0.0..1.0).contains(&self.fee_rate) {
            return Err(Error::InvalidRules("fee_rate must be in [0, 1)".into()));
        }

        Ok(())
    }
}

/// Number of decimals needed to write `step` exactly
fn step_decimals(step: f64) -> i32 {
    (0..=MAX_STEP_DECIMALS)
        .find(|&decimals| {
            let scaled = step * 10f64.powi(decimals);
            (scaled - scaled.round()).abs() < STEP_TOLERANCE * scaled.abs().max(1.0)
        })
        .unwrap_or(MAX_STEP_DECIMALS)
}

/// Snap `value` onto the grid of multiples of `step`
fn round_to_step(value: f64, step: f64, rounding: RoundingType) -> f64 {
    if !value.is_finite() || !(step.is_finite() && step > 0.0) {
        return value;
    }

    let units = value / step;
    let units = match rounding {
        RoundingType::Ceil => (units - STEP_TOLERANCE).ceil(),
        RoundingType::Floor => (units + STEP_TOLERANCE).floor(),
        RoundingType::Round => units.round(),
    };

    let factor = 10f64.powi(step_decimals(step));
    (units * step * factor).round() / factor
}

fn is_on_step(value: f64, step: f64) -> bool {
    (round_to_step(value, step, RoundingType::Round) - value).abs() <= step * 1e-6
}

fn is_positive_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// [`TradingCapabilityManager`] backed by [`TradingRules`]
///
/// # Example
///
/// ```rust
/// use margin_strategy_sdk::capability::{
///     RoundingType, RuleBasedCapabilityManager, TradingCapabilityManager, TradingRules,
/// };
///
/// let rules = TradingRules::fixed(0.01, 0.001).with_total_range(10.0, None);
/// let manager = RuleBasedCapabilityManager::new(rules).unwrap();
///
/// assert_eq!(manager.round_price(101.237, RoundingType::Floor), 101.23);
/// assert_eq!(manager.get_min_buy_amount(100.0), 0.1);
/// assert!(manager.is_order_valid(true, 0.1, 100.0));
/// ```
#[derive(Debug, Clone)]
pub struct RuleBasedCapabilityManager {
    rules: TradingRules,
}

impl RuleBasedCapabilityManager {
    /// Create a manager after validating the rules
    pub fn new(rules: TradingRules) -> Result<Self> {
        rules.validate()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &TradingRules {
        &self.rules
    }

    fn min_amount(&self, price: f64) -> f64 {
        if !is_positive_price(price) {
            return 0.0;
        }
        let raw = self.rules.min_amount.max(self.rules.min_total / price);
        self.round_amount(raw, RoundingType::Ceil)
    }

    fn max_amount(&self, price: f64) -> f64 {
        if !is_positive_price(price) {
            return 0.0;
        }
        let mut raw = self.rules.max_amount.unwrap_or(f64::INFINITY);
        if let Some(max_total) = self.rules.max_total {
            raw = raw.min(max_total / price);
        }
        self.round_amount(raw, RoundingType::Floor)
    }
}

impl TradingCapabilityManager for RuleBasedCapabilityManager {
    fn get_due_buy_total(&self, amount: f64, price: f64) -> f64 {
        amount * price * (1.0 + self.rules.fee_rate)
    }

    fn get_max_buy_amount(&self, price: f64) -> f64 {
        self.max_amount(price)
    }

    fn get_max_sell_amount(&self, price: f64) -> f64 {
        self.max_amount(price)
    }

    fn get_min_buy_amount(&self, price: f64) -> f64 {
        self.min_amount(price)
    }

    fn get_min_sell_amount(&self, price: f64) -> f64 {
        self.min_amount(price)
    }

    fn get_minimal_amount_change(&self, _reference_amount: f64) -> f64 {
        self.rules.amount_step
    }

    fn get_minimal_price_change(&self, reference_price: f64) -> f64 {
        self.rules.price_increment.step_at(reference_price)
    }

    fn get_sell_amount_to_receive_total(
        &self,
        target_total: f64,
        price: f64,
        rounding_type: RoundingType,
    ) -> f64 {
        if !is_positive_price(price) {
            return 0.0;
        }
        let raw = target_total / (price * (1.0 - self.rules.fee_rate));
        self.round_amount(raw, rounding_type)
    }

    fn get_sell_total_to_receive(&self, amount: f64, price: f64) -> f64 {
        amount * price * (1.0 - self.rules.fee_rate)
    }

    fn is_order_valid(&self, buy: bool, amount: f64, price: f64) -> bool {
        if !is_positive_price(price) || !(amount.is_finite() && amount > 0.0) {
            return false;
        }

        let price_step = self.get_minimal_price_change(price);
        if !is_on_step(price, price_step) || !is_on_step(amount, self.rules.amount_step) {
            return false;
        }

        let (min, max) = if buy {
            (self.get_min_buy_amount(price), self.get_max_buy_amount(price))
        } else {
            (self.get_min_sell_amount(price), self.get_max_sell_amount(price))
        };
        let slack = self.rules.amount_step * 1e-6;
        amount >= min - slack && amount <= max + slack
    }

    fn round_amount(&self, unrounded_amount: f64, rounding_type: RoundingType) -> f64 {
        round_to_step(unrounded_amount, self.rules.amount_step, rounding_type)
    }

    fn round_price(&self, unrounded_price: f64, rounding_type: RoundingType) -> f64 {
        let step = self.get_minimal_price_change(unrounded_price);
        round_to_step(unrounded_price, step, rounding_type)
    }
}
