mod bund_config;
mod design_mode;
mod design_parameters;

pub use bund_config::{BundConfig, Capabilities, DesignConfig, OutputToggles, SmoothingConfig};
pub use design_mode::DesignMode;
pub use design_parameters::DesignParameters;
