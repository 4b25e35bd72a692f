use std::{fs::File, path::Path, sync::Mutex};

use eyre::WrapErr;
use time::{UtcOffset, format_description::well_known::Iso8601};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, time::OffsetTime},
    layer::SubscriberExt,
};

type LocalTimer = OffsetTime<Iso8601>;

/// ISO-8601 timestamps at the fixed offset of the local timezone at startup.
fn local_timer() -> eyre::Result<LocalTimer> {
    let offset = UtcOffset::from_whole_seconds(chrono::Local::now().offset().local_minus_utc())
        .wrap_err("Determining local timezone offset")?;
    Ok(OffsetTime::new(offset, Iso8601::DEFAULT))
}

/// Create the log file named in `[output]`, including missing parent directories.
fn open_log_file(path: &Path) -> eyre::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Creating log directory \"{}\"", parent.display()))?;
    }
    File::create(path).wrap_err_with(|| format!("Creating log file \"{}\"", path.display()))
}

/// Install the process-wide subscriber: the console, plus `log_file` when the
/// configuration names one.
///
/// The filter comes from `RUST_LOG`. Panics, including those inside the run
/// loop, are logged before unwinding. Call once, before anything is logged.
pub fn initiate_logging<P: AsRef<Path>>(log_file: Option<P>) -> eyre::Result<()> {
    let timer = local_timer()?;
    let log_file: Option<&Path> = log_file.as_ref().map(|p| p.as_ref());

    let file_layer = match log_file {
        Some(path) => Some(
            fmt::layer()
                .with_timer(timer.clone())
                .with_writer(Mutex::new(open_log_file(path)?))
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true),
        ),
        None => None,
    };

    let console_layer = fmt::layer()
        .with_timer(timer)
        .with_ansi(!cfg!(windows))
        .with_target(false);

    let collector = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .with(EnvFilter::from_default_env());
    tracing::subscriber::set_global_default(collector)
        .wrap_err("Installing the tracing subscriber")?;

    std::panic::set_hook(Box::new(tracing_panic::panic_hook));

    match log_file {
        Some(path) => tracing::debug!("Also logging to \"{}\".", path.display()),
        None => tracing::debug!("Logging to console only."),
    }
    Ok(())
}
