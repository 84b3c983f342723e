pub mod http;

pub use http::HttpFeedBackend;
