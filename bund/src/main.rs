use bund::{app::BundApp, BundError};
use clap::Parser;

fn main() -> Result<(), BundError> {
    env_logger::init();
    let args = BundApp::parse();
    args.op.run()
}
