pub mod config;
pub mod db;
pub mod models;
pub mod utils;
pub mod storage;
pub mod search;

pub use search::{CategorySearch, SearchError};
