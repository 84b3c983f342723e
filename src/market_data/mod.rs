pub mod adapters;
pub mod traits;
pub mod types;
