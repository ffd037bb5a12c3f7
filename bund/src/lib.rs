pub mod app;
pub mod centreline;
pub mod config;
pub mod design;
pub mod output;
pub mod util;

mod error;

pub use error::BundError;
