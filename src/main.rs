use clap::Parser;
use dpsolve::cli::{self, Options};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let opts = Options::parse();
    let report = cli::run(&opts)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
