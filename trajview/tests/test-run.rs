use std::path::Path;

use test_log::test;

use trajview::{Validate, read_config_toml, run_config};
use trajview_types::{OutputConfig, PlaybackConfig, StreamConfig, TrajviewConfig, Valid};

fn write_csv(path: &Path, n_ticks: usize) {
    let mut buf = String::from("time,trajectory_id,x,y,vx,vy,speed,extra\n");
    for tick in 0..n_ticks {
        let t = tick as f64 * 0.02;
        buf.push_str(&format!(
            "{t},7,{},{},0.1,0.0,0.3,ignored\n",
            -0.5 + 0.01 * tick as f64,
            0.25
        ));
    }
    std::fs::write(path, buf).unwrap();
}

fn small_stream(id: &str, csv: &str) -> StreamConfig {
    StreamConfig {
        width: 32,
        height: 32,
        ..StreamConfig::new(id, csv)
    }
}

fn config(dir: &Path, max_output_frames: usize) -> Valid<TrajviewConfig> {
    TrajviewConfig {
        playback: PlaybackConfig {
            refresh_hz: 500.0,
            frame_rate: 250.0,
            ..Default::default()
        },
        streams: vec![small_stream("left", "left.csv"), small_stream("right", "right.csv")],
        output: OutputConfig {
            dir: "out".into(),
            composite_margin_pixels: 3,
            max_output_frames: Some(max_output_frames),
            log_file: None,
        },
    }
    .validate(Some(dir))
    .unwrap()
}

#[test(tokio::test)]
async fn run_writes_bounded_montages() -> eyre::Result<()> {
    let tmp = tempfile::tempdir()?;
    write_csv(&tmp.path().join("left.csv"), 30);
    write_csv(&tmp.path().join("right.csv"), 12);

    let cfg = config(tmp.path(), 40);
    let summary = run_config(&cfg, &b""[..]).await?;
    assert_eq!(summary.montages_written, 40);
    assert!(summary.all_ready);

    let out = tmp.path().join("out");
    let last = image::open(out.join("frame00039.png"))?.to_rgba8();
    assert_eq!(last.dimensions(), (32 * 2 + 2 * 2 * 3, 32 + 2 * 3));
    assert!(!out.join("frame00040.png").exists());
    Ok(())
}

#[test(tokio::test)]
async fn quit_stops_the_run() -> eyre::Result<()> {
    let tmp = tempfile::tempdir()?;
    write_csv(&tmp.path().join("left.csv"), 30);
    write_csv(&tmp.path().join("right.csv"), 30);

    let cfg = config(tmp.path(), 100_000);
    let summary = run_config(&cfg, &b"bogus\npause\nquit\n"[..]).await?;
    assert!(summary.montages_written < 100_000);
    Ok(())
}

#[test(tokio::test)]
async fn missing_input_never_starts_playback() -> eyre::Result<()> {
    let tmp = tempfile::tempdir()?;
    write_csv(&tmp.path().join("left.csv"), 10);

    // One montage with the error card and the first progress card, one with
    // the first frame of the loaded stream. Nothing changes after that.
    let cfg = config(tmp.path(), 2);
    let summary = run_config(&cfg, &b""[..]).await?;
    assert!(!summary.all_ready);
    assert_eq!(summary.montages_written, 2);
    Ok(())
}

#[test]
fn example_config_round_trips_through_file() -> eyre::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("trajview.toml");
    std::fs::write(&path, toml::to_string_pretty(&TrajviewConfig::default())?)?;

    let cfg = read_config_toml(&path)?;
    let cfg = cfg.valid();
    assert_eq!(cfg.streams.len(), 4);
    assert!(Path::new(&cfg.streams[0].csv).is_absolute());
    assert!(Path::new(&cfg.output.dir).starts_with(tmp.path().canonicalize()?));
    Ok(())
}

#[test]
fn unknown_config_keys_are_rejected() -> eyre::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("bad.toml");
    std::fs::write(&path, "[playback]\nframe_rat = 30\n")?;
    assert!(read_config_toml(&path).is_err());
    Ok(())
}
