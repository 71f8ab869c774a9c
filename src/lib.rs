pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod project;
pub mod report;
pub mod sessions;
pub mod wizard;

pub use error::{CxLabError, Result};
