// src/main.rs

use runxfer::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("runxfer error: {err:?}");
        std::process::exit(2);
    }

    match run(args).await {
        Ok(result) => {
            println!("{result}");
            if !result.success() {
                std::process::exit(1);
            }
        }
        Err(err) => {
            eprintln!("runxfer error: {err}");
            std::process::exit(2);
        }
    }
}
