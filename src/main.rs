use clap::Parser;
use stubsmith::cli::{run_cli, Cli};
use stubsmith::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::from_env()
    };
    init_logging(&log_config)?;

    let report = run_cli(&cli)?;
    print!("{report}");
    Ok(())
}
