use std::path::Path;

use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use trajview_types::{Sample, TrajectoryId};

use crate::{Error, Result};

/// Grid tolerance, in units of the time step.
const GRID_TOLERANCE: f64 = 1e-6;

const REQUIRED_COLUMNS: [&str; 7] = ["time", "trajectory_id", "x", "y", "vx", "vy", "speed"];

/// One CSV row as written by the simulation. Unparseable or missing numbers
/// become NaN.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default = "nan", deserialize_with = "lenient_f64")]
    time: f64,
    #[serde(default = "nan", deserialize_with = "lenient_f64")]
    trajectory_id: f64,
    #[serde(default = "nan", deserialize_with = "lenient_f64")]
    x: f64,
    #[serde(default = "nan", deserialize_with = "lenient_f64")]
    y: f64,
    #[serde(default = "nan", deserialize_with = "lenient_f64")]
    vx: f64,
    #[serde(default = "nan", deserialize_with = "lenient_f64")]
    vy: f64,
    #[serde(default = "nan", deserialize_with = "lenient_f64")]
    speed: f64,
}

fn nan() -> f64 {
    f64::NAN
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(s.trim().parse().unwrap_or(f64::NAN))
}

/// The grid point nearest to `time`, if `time` is within tolerance of it.
fn snap_to_grid(time: f64, step: f64) -> Option<f64> {
    let k = (time / step).round();
    ((time / step - k).abs() <= GRID_TOLERANCE).then_some(k * step)
}

/// Read samples from CSV with a header row.
///
/// Rows need not be sorted and extra columns are ignored. Fields missing from
/// a short row count as unparseable. A row whose `time` or `trajectory_id` is
/// not a finite number cannot be placed on the timeline and is dropped. If
/// `time_step` is given, rows off that grid are dropped and the remaining
/// times are snapped onto it.
pub fn read_samples<R: std::io::Read>(
    rdr: R,
    time_step: Option<f64>,
) -> std::result::Result<Vec<Sample>, csv::Error> {
    let mut csv_rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(rdr);

    let headers = csv_rdr.headers()?.clone();
    if let Some(column) = REQUIRED_COLUMNS
        .iter()
        .find(|name| !headers.iter().any(|h| h == **name))
    {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("missing column \"{column}\""),
        )
        .into());
    }

    let mut samples = Vec::new();
    let mut n_short = 0usize;
    let mut n_unkeyed = 0usize;
    let mut n_off_grid = 0usize;
    for record in csv_rdr.records() {
        let record = record?;
        if record.len() < headers.len() {
            n_short += 1;
        }
        let row: CsvRow = record.deserialize(Some(&headers))?;
        if !(row.time.is_finite() && row.trajectory_id.is_finite()) {
            n_unkeyed += 1;
            continue;
        }
        let time = match time_step {
            Some(step) => match snap_to_grid(row.time, step) {
                Some(time) => time,
                None => {
                    n_off_grid += 1;
                    continue;
                }
            },
            None => row.time,
        };
        samples.push(Sample {
            time,
            trajectory_id: TrajectoryId(row.trajectory_id.round() as i64),
            x: row.x,
            y: row.y,
            vx: row.vx,
            vy: row.vy,
            speed: row.speed,
        });
    }

    if n_short > 0 {
        warn!("{n_short} rows have fewer fields than the header");
    }
    if n_unkeyed > 0 {
        warn!("dropped {n_unkeyed} rows without a usable time or trajectory_id");
    }
    if n_off_grid > 0 {
        debug!("dropped {n_off_grid} rows not on the time grid");
    }
    Ok(samples)
}

/// Read all samples of one stream from a CSV file.
pub fn load_samples<P: AsRef<Path>>(path: P, time_step: Option<f64>) -> Result<Vec<Sample>> {
    let path = path.as_ref();
    let fd = std::fs::File::open(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_samples(std::io::BufReader::new(fd), time_step).map_err(|source| Error::Csv {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    const HEADER: &str = "time,trajectory_id,x,y,vx,vy,speed\n";

    #[test]
    fn unsorted_rows_and_extra_columns() {
        let buf = "trajectory_id,time,x,y,vx,vy,speed,note\n\
                   2,0.04,0.1,0.2,1,0,1,a\n\
                   1,0.00,-0.5,0.5,0,1,1,b\n";
        let samples = read_samples(buf.as_bytes(), None).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].trajectory_id, TrajectoryId(2));
        assert_eq!(samples[0].time, 0.04);
        assert_eq!(samples[1].x, -0.5);
    }

    #[test]
    fn bad_numbers_become_nan() {
        let buf = format!("{HEADER}0.02,7,abc,0.1,,0.0,1.5\n");
        let samples = read_samples(buf.as_bytes(), None).unwrap();
        assert_eq!(samples.len(), 1);
        assert!(samples[0].x.is_nan());
        assert!(samples[0].vx.is_nan());
        assert_eq!(samples[0].speed, 1.5);
    }

    #[test]
    fn rows_without_key_are_dropped() {
        let buf = format!("{HEADER}nope,1,0,0,0,0,0\n0.02,?,0,0,0,0,0\n0.02,3,0,0,0,0,0\n");
        let samples = read_samples(buf.as_bytes(), None).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].trajectory_id, TrajectoryId(3));
    }

    #[test]
    fn off_grid_rows_are_dropped() {
        let buf = format!("{HEADER}0.02,1,0,0,0,0,0\n0.03,1,0,0,0,0,0\n0.06,1,0,0,0,0,0\n");
        let samples = read_samples(buf.as_bytes(), Some(0.02)).unwrap();
        let times: Vec<f64> = samples.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![0.02, 0.06]);
    }

    #[test]
    fn near_grid_times_share_a_tick() {
        let buf = format!("{HEADER}0.06,1,0,0,0,0,0\n0.06000000000000001,2,0,0,0,0,0\n");
        let samples = read_samples(buf.as_bytes(), Some(0.02)).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].time, samples[1].time);
        let timeline = crate::Timeline::from_samples(&samples);
        assert_eq!(timeline.times(), &[0.06]);
    }

    #[test]
    fn short_rows_keep_the_stream_loading() {
        let buf = format!(
            "{HEADER}0.00,1,0.1,0.2,0,0,1\n0.02,1,0.1,0.2,0,0,1\n0.04,1,0.1,0.2\n0.06\n"
        );
        let samples = read_samples(buf.as_bytes(), None).unwrap();
        // The last row has no trajectory_id and is dropped.
        assert_eq!(samples.len(), 3);
        let truncated = samples[2];
        assert_eq!(truncated.time, 0.04);
        assert_eq!(truncated.y, 0.2);
        assert!(truncated.vx.is_nan());
        assert!(truncated.speed.is_nan());
    }

    #[test]
    fn missing_column_is_an_error() {
        let buf = "time,trajectory_id,x,y\n0,1,0,0\n";
        assert!(read_samples(buf.as_bytes(), None).is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_samples(dir.path().join("absent.csv"), None);
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
