//! Candle aggregation from public trades

use chrono::{DateTime, TimeZone, Utc};

use super::types::{Candle, PublicTrade};

/// Number of candles returned when the caller does not ask for a count
pub const DEFAULT_NUMBER_OF_CANDLES: usize = 50;

/// Running totals for the candle currently being built
struct CandleBuilder {
    window_start: DateTime<Utc>,
    candle: Candle,
    notional: f64,
}

impl CandleBuilder {
    fn open(window_start: DateTime<Utc>, trade: &PublicTrade) -> Self {
        Self {
            window_start,
            candle: Candle {
                in_value: trade.price,
                max: trade.price,
                max_time: trade.timestamp,
                min: trade.price,
                min_time: window_start,
                out_value: trade.price,
                trade_number: 1,
                volume: trade.amount,
                vwap: trade.price,
            },
            notional: trade.value(),
        }
    }

    fn push(&mut self, trade: &PublicTrade) {
        let candle = &mut self.candle;
        candle.max = candle.max.max(trade.price);
        candle.min = candle.min.min(trade.price);
        candle.out_value = trade.price;
        candle.max_time = trade.timestamp;
        candle.trade_number += 1;
        candle.volume += trade.amount;
        self.notional += trade.value();
    }

    fn finish(mut self) -> Candle {
        if self.candle.volume > 0.0 {
            self.candle.vwap = self.notional / self.candle.volume;
        }
        self.candle
    }
}

/// Group trades into candles of `candle_size_in_minutes`
///
/// Windows are aligned to multiples of the candle size since the Unix epoch.
/// Windows without trades produce no candle. The most recent
/// `number_of_candles` candles are returned, oldest first.
pub fn aggregate_candles(
    trades: &[PublicTrade],
    candle_size_in_minutes: u32,
    number_of_candles: usize,
) -> Vec<Candle> {
    if candle_size_in_minutes == 0 || number_of_candles == 0 || trades.is_empty() {
        return Vec::new();
    }

    let window_millis = i64::from(candle_size_in_minutes) * 60_000;
    let mut ordered: Vec<&PublicTrade> = trades.iter().collect();
    ordered.sort_by_key(|t| t.timestamp);

    let mut candles = Vec::new();
    let mut current: Option<CandleBuilder> = None;

    for trade in ordered {
        let millis = trade.timestamp.timestamp_millis();
        let start_millis = millis.div_euclid(window_millis) * window_millis;
        let Some(window_start) = Utc.timestamp_millis_opt(start_millis).single() else {
            continue;
        };

        match current.as_mut() {
            Some(builder) if builder.window_start == window_start => builder.push(trade),
            _ => {
                if let Some(done) = current.take() {
                    candles.push(done.finish());
                }
                current = Some(CandleBuilder::open(window_start, trade));
            }
        }
    }

    if let Some(done) = current {
        candles.push(done.finish());
    }

    let skip = candles.len().saturating_sub(number_of_candles);
    candles.split_off(skip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    fn trade(id: u64, offset_secs: i64, price: f64, amount: f64) -> PublicTrade {
        PublicTrade::new(id, true, price, amount, base_time() + Duration::seconds(offset_secs))
    }

    #[test]
    fn test_single_window() {
        let trades = vec![
            trade(1, 5, 100.0, 1.0),
            trade(2, 20, 104.0, 1.0),
            trade(3, 50, 98.0, 2.0),
        ];

        let candles = aggregate_candles(&trades, 1, DEFAULT_NUMBER_OF_CANDLES);
        assert_eq!(candles.len(), 1);

        let candle = &candles[0];
        assert_eq!(candle.in_value, 100.0);
        assert_eq!(candle.out_value, 98.0);
        assert_eq!(candle.max, 104.0);
        assert_eq!(candle.min, 98.0);
        assert_eq!(candle.trade_number, 3);
        assert_eq!(candle.volume, 4.0);
        assert!((candle.vwap - 100.0).abs() < 1e-9);
        assert_eq!(candle.min_time, base_time());
        assert_eq!(candle.max_time, base_time() + Duration::seconds(50));
    }

    #[test]
    fn test_windows_are_aligned_and_gaps_skipped() {
        let trades = vec![
            trade(1, 30, 100.0, 1.0),
            trade(2, 330, 101.0, 1.0),
            trade(3, 650, 102.0, 1.0),
        ];

        // 5 minute candles: 10:00, 10:05, 10:10
        let candles = aggregate_candles(&trades, 5, 10);
        assert_eq!(candles.len(), 3);
        assert_eq!(candles[1].min_time, base_time() + Duration::minutes(5));
        assert_eq!(candles[2].min_time, base_time() + Duration::minutes(10));

        // 2 minute candles leave empty windows out
        let candles = aggregate_candles(&trades, 2, 10);
        assert_eq!(candles.len(), 3);
        assert_eq!(candles[1].min_time, base_time() + Duration::minutes(4));
    }

    #[test]
    fn test_unordered_trades_and_limit() {
        let trades = vec![
            trade(3, 130, 103.0, 1.0),
            trade(1, 10, 101.0, 1.0),
            trade(2, 70, 102.0, 1.0),
        ];

        let candles = aggregate_candles(&trades, 1, 2);
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].in_value, 102.0);
        assert_eq!(candles[1].in_value, 103.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        let trades = vec![trade(1, 0, 100.0, 1.0)];
        assert!(aggregate_candles(&trades, 0, 10).is_empty());
        assert!(aggregate_candles(&trades, 1, 0).is_empty());
        assert!(aggregate_candles(&[], 1, 10).is_empty());
    }
}
