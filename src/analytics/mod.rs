pub mod chart;
pub mod correlation;
pub mod numeric;
pub mod order_book;
pub mod timeline;
