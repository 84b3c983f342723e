pub mod epoch;
pub mod market;
pub mod market_cache;
pub mod session;
