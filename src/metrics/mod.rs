mod prometheus;

pub use prometheus::*;
