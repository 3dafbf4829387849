// src/main.rs

use gow::errors::GowError;
use gow::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(()) => {}
        Err(GowError::MissingTarget) => {
            eprint!("{}", cli::usage());
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("[ERR ] gow error: {err}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> gow::errors::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level, args.verbose)?;
    run(args).await
}
