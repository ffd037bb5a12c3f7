mod bund_app;
pub mod design;

pub use bund_app::{BundApp, BundOperation};
