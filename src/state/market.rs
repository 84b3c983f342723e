use crate::market_data::types::MarketSummary;

/// Live top-of-book for one ticker, taken from the latest markets poll.
/// Stores only the pricing fields the ladder needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quote {
    pub yes_bid: f64,
    pub yes_ask: f64,
}

impl From<&MarketSummary> for Quote {
    fn from(market: &MarketSummary) -> Self {
        Self {
            yes_bid: market.yes_bid,
            yes_ask: market.yes_ask,
        }
    }
}
