use std::path::Path;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::{config::BundConfig, BundError};

/// Command line tool for designing engineered bund (embankment) surfaces along
/// centrelines over a terrain model and estimating their fill volumes
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct BundApp {
    #[command(subcommand)]
    pub op: BundOperation,
}

#[derive(Debug, Clone, Serialize, Deserialize, Subcommand)]
pub enum BundOperation {
    /// synthesize the design surface of every centreline, merge them and write
    /// surfaces, footprints and volume tables
    Design {
        /// TOML configuration file describing inputs, design parameters and outputs
        #[arg(short, long)]
        configuration_file: String,

        /// location on disk to write output files. overrides the configuration.
        #[arg(short, long)]
        output_directory: Option<String>,

        /// GeoJSON centreline collection. overrides the configuration.
        #[arg(long)]
        centrelines: Option<String>,

        /// ESRI ASCII grid terrain model. overrides the configuration.
        #[arg(short, long)]
        terrain: Option<String>,
    },
}

impl BundOperation {
    pub fn run(&self) -> Result<(), BundError> {
        match self {
            BundOperation::Design {
                configuration_file,
                output_directory,
                centrelines,
                terrain,
            } => {
                let mut config = BundConfig::from_file(Path::new(configuration_file))?;
                if let Some(out) = output_directory {
                    config.output_directory = out.clone();
                }
                if let Some(lines) = centrelines {
                    config.centrelines = lines.clone();
                }
                if let Some(dem) = terrain {
                    config.terrain = dem.clone();
                }
                let summary = crate::app::design::run(&config)?;
                log::info!(
                    "processed {} of {} centrelines, total fill {:.3} m3",
                    summary.stats.features_processed,
                    summary.stats.features_read,
                    summary.stats.total_fill_volume_m3
                );
                Ok(())
            }
        }
    }
}
