use std::collections::HashMap;

use log::info;
use serde_json::Value;

use super::threshold::ThresholdStrategy;
use super::traits::NoOpStrategy;
use super::Strategy;
use crate::errors::{Error, Result};
use crate::market::CurrencyPair;

/// Boxed strategy as produced by a [`StrategyFactory`]
pub type BoxedStrategy = Box<dyn Strategy + Send>;

/// Factory trait for creating strategies
pub trait StrategyFactory: Send + Sync {
    /// Create a new strategy instance for the pair with the given parameters
    fn create(&self, pair: &CurrencyPair, params: HashMap<String, Value>) -> Result<BoxedStrategy>;
}

/// Registry for strategy factories
pub struct StrategyRegistry {
    factories: HashMap<String, Box<dyn StrategyFactory>>,
}

impl StrategyRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the built-in strategies: `noop` and `threshold`
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("noop", NoOpStrategyFactory);
        registry.register("threshold", ThresholdStrategyFactory);
        registry
    }

    /// Register a strategy factory
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: StrategyFactory + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    /// Registered type names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Create a strategy by type name
    pub fn create_strategy(
        &self,
        name: &str,
        pair: &CurrencyPair,
        params: HashMap<String, Value>,
    ) -> Result<BoxedStrategy> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::UnknownStrategy(name.to_string()))?;
        let strategy = factory.create(pair, params)?;
        info!("Created strategy '{}' for {}", name, pair);
        Ok(strategy)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

/// Creates [`NoOpStrategy`], ignoring all parameters
pub struct NoOpStrategyFactory;

impl StrategyFactory for NoOpStrategyFactory {
    fn create(&self, _pair: &CurrencyPair, _params: HashMap<String, Value>) -> Result<BoxedStrategy> {
        Ok(Box::new(NoOpStrategy))
    }
}

/// Creates [`ThresholdStrategy`] from `buy_below`, `sell_above` and `order_total`
pub struct ThresholdStrategyFactory;

impl StrategyFactory for ThresholdStrategyFactory {
    fn create(&self, _pair: &CurrencyPair, params: HashMap<String, Value>) -> Result<BoxedStrategy> {
        Ok(Box::new(ThresholdStrategy::from_params(params)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pair() -> CurrencyPair {
        "BTC_EUR".parse().unwrap()
    }

    #[test]
    fn test_builtin_names() {
        let registry = StrategyRegistry::default();
        assert_eq!(registry.names(), vec!["noop", "threshold"]);
    }

    #[test]
    fn test_create_known_strategies() {
        let registry = StrategyRegistry::with_builtin();

        let noop = registry.create_strategy("noop", &pair(), HashMap::new()).unwrap();
        assert_eq!(noop.name(), "noop");

        let params: HashMap<String, Value> = [
            ("buy_below".to_string(), json!(100.0)),
            ("sell_above".to_string(), json!(110.0)),
            ("order_total".to_string(), json!(50.0)),
        ]
        .into_iter()
        .collect();
        let threshold = registry.create_strategy("threshold", &pair(), params).unwrap();
        assert_eq!(threshold.name(), "threshold");
    }

    #[test]
    fn test_unknown_strategy() {
        let registry = StrategyRegistry::new();
        let err = registry
            .create_strategy("grid", &pair(), HashMap::new())
            .err()
            .unwrap();
        assert!(matches!(err, Error::UnknownStrategy(ref name) if name == "grid"));
    }

    #[test]
    fn test_factory_errors_propagate() {
        let registry = StrategyRegistry::with_builtin();
        let result = registry.create_strategy("threshold", &pair(), HashMap::new());
        assert!(matches!(result, Err(Error::Parse(_))));
    }
}
