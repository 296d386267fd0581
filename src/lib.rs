pub mod api;
pub mod concurrent_fetcher;
pub mod data_collector;
pub mod input;
pub mod models;
pub mod writer;
