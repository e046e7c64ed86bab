#![forbid(unsafe_code)]

use mailpick_demo::app;
use mailpick_demo::cli::{self, Command, Opts};
use mailpick_demo::logging;

fn main() {
    let opts = match Opts::parse() {
        Ok(Command::Run(opts)) => opts,
        Ok(Command::Help) => {
            println!("{}", cli::HELP_TEXT);
            return;
        }
        Ok(Command::Version) => {
            println!("mailpick-demo {}", cli::VERSION);
            return;
        }
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Run with --help for usage information.");
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::install(opts.log_filter.as_deref(), &opts.log_file) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    if let Err(e) = app::run(&opts) {
        tracing::error!(error = %e, "demo terminated with an error");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
