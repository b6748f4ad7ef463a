use clap::Parser;
use groundplane::cli::{run, Args};
use log::LevelFilter;
use std::process::ExitCode;

#[cfg(feature = "tracing")]
use tracing_log::LogTracer;

fn init_logging(level: LevelFilter) {
    // Ignore errors if a logger/subscriber was already installed.
    #[cfg(feature = "tracing")]
    {
        let _ = LogTracer::init();
        groundplane::core::init_tracing(false, &level.as_str().to_ascii_lowercase());
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = groundplane::core::init_with_level(level);
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level());

    let stdout = std::io::stdout();
    match run(&args, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
