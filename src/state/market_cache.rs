use crate::market_data::types::MarketSummary;
use crate::state::market::Quote;
use std::collections::HashMap;

/// Latest markets poll, in feed order, with a ticker index for quote lookups.
/// Replaced wholesale on every successful poll.
#[derive(Clone, Debug, Default)]
pub struct MarketCache {
    markets: Vec<MarketSummary>,
    index: HashMap<String, usize>,
}

impl MarketCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_all(&mut self, markets: Vec<MarketSummary>) {
        // first occurrence wins if the feed repeats a ticker
        let mut index = HashMap::with_capacity(markets.len());
        for (pos, market) in markets.iter().enumerate() {
            index.entry(market.ticker.clone()).or_insert(pos);
        }
        self.markets = markets;
        self.index = index;
    }

    pub fn markets(&self) -> &[MarketSummary] {
        &self.markets
    }

    pub fn get(&self, ticker: &str) -> Option<&MarketSummary> {
        self.index.get(ticker).and_then(|pos| self.markets.get(*pos))
    }

    pub fn quote(&self, ticker: &str) -> Option<Quote> {
        self.get(ticker).map(Quote::from)
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}
