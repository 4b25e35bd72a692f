use clap::{Parser, Subcommand};
use eyre::Result;
use tracing::{info, warn};

use trajview::{logging::initiate_logging, read_config_toml, run_config};
use trajview_types::TrajviewConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play back trajectories using a TOML file as configuration.
    ///
    /// Transport commands are read from stdin, one per line: `toggle` (or
    /// `p`), `play`, `pause`, `reset` (or `r`) and `quit` (or `q`).
    ConfigToml {
        /// Input configuration TOML file
        #[arg(short, long, value_name = "CONFIG_TOML")]
        config_toml: std::path::PathBuf,
    },

    /// Print an example configuration TOML.
    PrintExampleConfigToml,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        // Only the main thread exists at this point.
        unsafe { std::env::set_var("RUST_LOG", "info") };
    }

    let cli = Cli::parse();

    let cfg = match &cli.command {
        Some(Commands::ConfigToml { config_toml }) => read_config_toml(config_toml)?,
        Some(Commands::PrintExampleConfigToml) => {
            let default_buf = toml::to_string_pretty(&TrajviewConfig::default())?;
            println!("{default_buf}");
            return Ok(());
        }
        None => {
            initiate_logging::<&str>(None)?;
            warn!("Nothing to do: no subcommand given.");
            return Ok(());
        }
    };

    initiate_logging(cfg.valid().output.log_file.as_ref())?;

    let cfg_as_string = toml::to_string_pretty(cfg.valid())?;
    info!(
        "Playing back using the following configuration:\n\n```\n{}```\n",
        cfg_as_string
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let summary = run_config(&cfg, stdin).await?;
    if !summary.all_ready {
        warn!("Not every stream became ready. Playback never started.");
    }
    info!("Done, {} montages written.", summary.montages_written);
    Ok(())
}
