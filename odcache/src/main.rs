use clap::Parser;
use odcache::app::{OdcCliError, OdcOperation};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct OdcAppArguments {
    #[command(subcommand)]
    op: OdcOperation,
}

pub fn run(op: &OdcOperation) -> Result<(), OdcCliError> {
    env_logger::init();
    op.run()
}

fn main() {
    let args = OdcAppArguments::parse();
    if let Err(e) = run(&args.op) {
        log::error!("odcache failed: {e}");
        eprintln!("{e}");
        std::process::exit(1);
    }
}
