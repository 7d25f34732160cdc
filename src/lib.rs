pub mod analyzers;
pub mod collector;
pub mod config;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod normalize;
pub mod observation;
pub mod output;
pub mod parser;
pub mod stats;
pub mod store;
