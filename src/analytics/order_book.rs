use crate::market_data::types::FeatureSnapshot;
use crate::state::market::Quote;

/// Number of synthetic levels on each side.
pub const LADDER_DEPTH: usize = 5;

const MIN_STEP: f64 = 0.5;

/// One synthetic ladder rung. Level 0 is the tightest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookLevel {
    pub level: usize,
    pub bid: f64,
    pub ask: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderBook {
    /// No feature snapshot to derive a spread from.
    NoSpread,
    /// Levels ordered outermost first (4, 3, 2, 1, 0).
    Ladder(Vec<BookLevel>),
}

impl OrderBook {
    pub fn levels(&self) -> &[BookLevel] {
        match self {
            OrderBook::Ladder(levels) => levels,
            OrderBook::NoSpread => &[],
        }
    }
}

/// Derives a symmetric ladder around the latest snapshot.
///
/// Base bid/ask start at mid ∓ spread/2; a strictly positive live quote side
/// replaces its base value.
pub fn synthesize(latest: Option<&FeatureSnapshot>, quote: Option<&Quote>) -> OrderBook {
    let Some(snapshot) = latest else {
        return OrderBook::NoSpread;
    };

    let mut base_bid = snapshot.mid - snapshot.spread / 2.0;
    let mut base_ask = snapshot.mid + snapshot.spread / 2.0;
    if let Some(quote) = quote {
        if quote.yes_bid > 0.0 {
            base_bid = quote.yes_bid;
        }
        if quote.yes_ask > 0.0 {
            base_ask = quote.yes_ask;
        }
    }

    let computed_spread = base_ask - base_bid;
    let step = if computed_spread > 0.0 {
        MIN_STEP.max(computed_spread / 2.0)
    } else {
        1.0
    };

    let levels = (0..LADDER_DEPTH)
        .rev()
        .map(|i| BookLevel {
            level: i,
            bid: base_bid - i as f64 * step,
            ask: base_ask + i as f64 * step,
        })
        .collect();

    OrderBook::Ladder(levels)
}
