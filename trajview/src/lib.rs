//! Host for trajectory playback: loads the streams of a configuration, drives
//! the engine from a refresh timer and saves the displayed frames as montages.

use std::{path::Path, str::FromStr};

use eyre::WrapErr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use trajview_engine::Session;
use trajview_types::{TrajviewConfig, Valid};

pub mod logging;
mod montage;

pub use montage::MontageWriter;
pub use trajview_types::Validate;

/// A transport command, one per input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Toggle,
    Play,
    Pause,
    Reset,
    Quit,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown command \"{0}\" (expected toggle, play, pause, reset or quit)")]
pub struct UnknownCommand(String);

impl FromStr for Command {
    type Err = UnknownCommand;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "toggle" | "p" => Ok(Self::Toggle),
            "play" => Ok(Self::Play),
            "pause" => Ok(Self::Pause),
            "reset" | "r" => Ok(Self::Reset),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

/// What a finished run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub montages_written: usize,
    pub all_ready: bool,
}

/// Parse and validate a TOML configuration file.
///
/// Relative paths in the file are resolved against its directory.
pub fn read_config_toml(config_toml: &Path) -> eyre::Result<Valid<TrajviewConfig>> {
    let abs_cfg_path = config_toml
        .canonicalize()
        .wrap_err_with(|| format!("Locating config file \"{}\"", config_toml.display()))?;
    let cfg_dir = abs_cfg_path.parent();

    let cfg_str = std::fs::read_to_string(&abs_cfg_path)
        .wrap_err_with(|| format!("Reading config file \"{}\"", config_toml.display()))?;
    let cfg: TrajviewConfig = toml::from_str(&cfg_str).wrap_err_with(|| {
        format!(
            "Parse error reading config toml file at \"{}\"",
            config_toml.display()
        )
    })?;
    cfg.validate(cfg_dir).wrap_err_with(|| {
        format!(
            "Validation error with config toml file at \"{}\"",
            config_toml.display()
        )
    })
}

/// Play the configured streams until `max_output_frames` montages are saved
/// or a quit command arrives on `commands`.
///
/// Must run on a single-threaded runtime. Frame precomputation, the refresh
/// timer and the command input share the one task, precomputation running
/// one chunk at a time whenever nothing else is due.
pub async fn run_config<R>(cfg: &Valid<TrajviewConfig>, commands: R) -> eyre::Result<RunSummary>
where
    R: AsyncBufRead + Unpin,
{
    let cfg = cfg.valid();
    let out_dir = Path::new(&cfg.output.dir);
    std::fs::create_dir_all(out_dir)
        .wrap_err_with(|| format!("Creating output directory \"{}\"", out_dir.display()))?;

    let montage = MontageWriter::new(out_dir, &cfg.streams, cfg.output.composite_margin_pixels);
    info!(
        "writing {}x{} montages to \"{}\"",
        montage.width(),
        montage.height(),
        out_dir.display()
    );
    let mut session = Session::new(&cfg.playback, &cfg.streams, montage)?;
    session.load_all();

    let max_output_frames = cfg.output.max_output_frames;
    let mut interval = tokio::time::interval(cfg.playback.refresh_interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut lines = commands.lines();
    let mut commands_open = true;

    loop {
        tokio::select! {
            biased;
            now = interval.tick() => {
                session.on_wake(now.into_std());
            }
            line = lines.next_line(), if commands_open => {
                match line.wrap_err("Reading commands")? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => match line.parse::<Command>() {
                        Ok(Command::Quit) => {
                            info!("quit requested");
                            break;
                        }
                        Ok(command) => apply(&mut session, command),
                        Err(e) => warn!("{e}"),
                    },
                    None => commands_open = false,
                }
            }
            _ = tokio::task::yield_now(), if session.has_pending_precompute() => {
                session.step_precompute();
            }
        }

        let montage = session.display_mut();
        montage.flush().wrap_err("Saving montage")?;
        if max_output_frames.is_some_and(|max| montage.written() >= max) {
            info!("saved {} montages, stopping", montage.written());
            break;
        }
    }

    Ok(RunSummary {
        montages_written: session.display().written(),
        all_ready: session.all_ready(),
    })
}

fn apply<D: trajview_engine::Display>(session: &mut Session<D>, command: Command) {
    match command {
        Command::Toggle => {
            session.toggle_play_pause();
        }
        Command::Play => {
            session.set_playing(true);
        }
        Command::Pause => {
            session.set_playing(false);
        }
        Command::Reset => session.reset(),
        Command::Quit => {}
    }
}
