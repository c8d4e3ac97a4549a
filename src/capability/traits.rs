//! Trading capability accessor trait

platform_enum! {
    /// Rounding operation applied to prices and amounts
    pub enum RoundingType {
        /// Rounds the value up
        Ceil = 0 => "CEIL",
        /// Rounds the value down
        Floor = 1 => "FLOOR",
        /// Rounds the value to the closest rounded value
        Round = 2 => "ROUND",
    }
}

/// Accessor for trading capability information
///
/// Used to get minimum and maximum amounts for order placing, round amounts
/// and prices to what the exchange accepts, and validate orders before
/// placing them.
///
/// All prices are quote currency per base currency unit, all amounts are in
/// base currency and all totals in quote currency.
pub trait TradingCapabilityManager: Send + Sync {
    /// Total extracted from the funds when placing a buy order at the given amount and price
    fn get_due_buy_total(&self, amount: f64, price: f64) -> f64;

    /// Largest buy amount that can be placed at the given price
    fn get_max_buy_amount(&self, price: f64) -> f64;

    /// Largest sell amount that can be placed at the given price
    fn get_max_sell_amount(&self, price: f64) -> f64;

    /// Smallest buy amount that can be placed at the given price
    fn get_min_buy_amount(&self, price: f64) -> f64;

    /// Smallest sell amount that can be placed at the given price
    fn get_min_sell_amount(&self, price: f64) -> f64;

    /// Smallest amount change usable on the exchange around the reference amount
    fn get_minimal_amount_change(&self, reference_amount: f64) -> f64;

    /// Smallest price change usable on the exchange around the reference price
    fn get_minimal_price_change(&self, reference_price: f64) -> f64;

    /// Amount to place in a sell order at the given price to receive the target total
    fn get_sell_amount_to_receive_total(
        &self,
        target_total: f64,
        price: f64,
        rounding_type: RoundingType,
    ) -> f64;

    /// Total added to the funds when a sell order at the given amount and price goes through
    fn get_sell_total_to_receive(&self, amount: f64, price: f64) -> f64;

    /// Whether an order with this side, amount and price could be placed as it is
    ///
    /// When this returns `false`, adapt the rounding of amount or price, or
    /// bring the amount into the min/max range of the selected side.
    fn is_order_valid(&self, buy: bool, amount: f64, price: f64) -> bool;

    /// Round an amount of an order, trade etc. to the exchange's precision
    fn round_amount(&self, unrounded_amount: f64, rounding_type: RoundingType) -> f64;

    /// Round a price of an order, trade etc. to the exchange's precision
    fn round_price(&self, unrounded_price: f64, rounding_type: RoundingType) -> f64;
}
