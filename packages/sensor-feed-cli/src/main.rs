use clap::Parser;

mod cli;
mod commands;
mod exit_codes;
mod feed_params;
mod output;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let exit_code = match cli.command {
        cli::Command::Inspect(args) => commands::inspect::execute(args),
        cli::Command::Stream(args) => commands::stream::execute(args),
        cli::Command::Pool(args) => commands::pool::execute(args),
        cli::Command::Batch(args) => commands::batch::execute(args),
    };

    std::process::exit(exit_code);
}
