//! Screen time tracker. A daemon samples the focused application and, for browsers, the website
//! it shows, attributing time to both. The cli summarizes tracked usage per period.
//!

pub mod cli;
pub mod daemon;
pub mod fs;
pub mod query;
pub mod store;
pub mod utils;
pub mod window_api;
