use std::time::{Duration, Instant};

use test_log::test;

use trajview_engine::{
    ClockState, Display, Frame, PrecomputeStep, Session, StreamPhase, Transition, WakeOutcome,
};
use trajview_types::{PlaybackConfig, Sample, StreamConfig, TrajectoryId};

#[derive(Default)]
struct Recorder {
    presented: Vec<(usize, Frame)>,
}

impl Display for Recorder {
    fn present(&mut self, stream: usize, frame: &Frame) {
        self.presented.push((stream, frame.clone()));
    }
}

/// Two insects circling for `n_ticks` ticks on a 0.02 s grid.
fn circling(n_ticks: usize) -> Vec<Sample> {
    let mut samples = Vec::new();
    for tick in 0..n_ticks {
        for id in 0..2 {
            let phase = tick as f64 * 0.05 + id as f64 * 3.0;
            samples.push(Sample {
                time: tick as f64 * 0.02,
                trajectory_id: TrajectoryId(id),
                x: 0.7 * phase.cos(),
                y: 0.7 * phase.sin(),
                vx: -phase.sin(),
                vy: phase.cos(),
                speed: 0.5,
            });
        }
    }
    samples
}

fn stream_config(id: &str) -> StreamConfig {
    StreamConfig {
        width: 24,
        height: 24,
        ..StreamConfig::new(id, &format!("{id}.csv"))
    }
}

fn session(lengths: &[usize]) -> Session<Recorder> {
    let cfgs: Vec<StreamConfig> = (0..lengths.len())
        .map(|i| stream_config(&format!("s{i}")))
        .collect();
    let mut session = Session::new(&PlaybackConfig::default(), &cfgs, Recorder::default()).unwrap();
    for (idx, n) in lengths.iter().enumerate() {
        session.load_stream(idx, Ok(circling(*n)));
    }
    session
}

/// Run precomputation to the end, returning every report.
fn precompute_all<D: Display>(session: &mut Session<D>) -> Vec<trajview_engine::PrecomputeReport> {
    let mut reports = Vec::new();
    while let Some(report) = session.step_precompute() {
        reports.push(report);
    }
    reports
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn four_streams_autoplay_only_when_all_ready_and_wrap_independently() {
    let lengths = [100, 100, 50, 100];
    let mut session = session(&lengths);
    assert_eq!(session.clock_state(), ClockState::Waiting);

    let t0 = Instant::now();
    let mut reports = Vec::new();
    let mut wake_time = t0;
    while let Some(report) = session.step_precompute() {
        reports.push(report);
        if !session.all_ready() {
            // Interleaved refreshes never advance anything while waiting.
            wake_time += ms(20);
            assert_eq!(session.on_wake(wake_time), WakeOutcome::Waiting);
            assert!(!session.playback().is_playing);
            assert!(session.streams().iter().all(|s| s.tick() == 0));
        }
    }

    // The short stream finishes first, but only the last completion starts playback.
    let completions: Vec<usize> = reports
        .iter()
        .filter(|r| r.step == PrecomputeStep::Complete)
        .map(|r| r.stream)
        .collect();
    assert_eq!(completions.len(), 4);
    assert_eq!(completions[0], 2);
    let autoplays: Vec<usize> = reports
        .iter()
        .enumerate()
        .filter(|(_, r)| r.transition == Some(Transition::AutoPlay))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(autoplays, vec![reports.len() - 1]);
    assert_eq!(session.clock_state(), ClockState::ReadyPlaying);

    for (stream, n) in session.streams().iter().zip(lengths) {
        assert!(stream.is_ready());
        assert_eq!(stream.precompute_progress(), 100);
        assert_eq!(stream.frames().len(), n);
    }

    let mut now = wake_time + ms(20);
    assert_eq!(session.on_wake(now), WakeOutcome::Held);
    for k in 1..=160 {
        now += ms(20);
        assert_eq!(session.on_wake(now), WakeOutcome::Advanced);
        for (stream, n) in session.streams().iter().zip(lengths) {
            assert_eq!(stream.tick(), k % n);
        }
    }
}

#[test]
fn wraps_to_zero_after_n_advances() {
    let n = 37;
    let mut session = session(&[n]);
    precompute_all(&mut session);

    let mut now = Instant::now();
    session.on_wake(now);
    for _ in 0..n {
        now += ms(20);
        assert_eq!(session.on_wake(now), WakeOutcome::Advanced);
    }
    assert_eq!(session.streams()[0].tick(), 0);
}

#[test]
fn drift_is_carried_forward() {
    let mut session = session(&[10]);
    precompute_all(&mut session);
    assert_eq!(session.frame_interval(), ms(20));

    let t0 = Instant::now();
    assert_eq!(session.on_wake(t0), WakeOutcome::Held);

    // Elapsed since the last advance reference: 25, 15, 22 ms.
    assert_eq!(session.on_wake(t0 + ms(25)), WakeOutcome::Advanced);
    assert_eq!(session.playback().last_frame_time, Some(t0 + ms(20)));
    assert_eq!(session.on_wake(t0 + ms(35)), WakeOutcome::Held);
    assert_eq!(session.on_wake(t0 + ms(42)), WakeOutcome::Advanced);
    assert_eq!(session.playback().last_frame_time, Some(t0 + ms(40)));
    assert_eq!(session.streams()[0].tick(), 2);

    // Only 18 ms after the last wake, but 20 ms after the carried reference.
    assert_eq!(session.on_wake(t0 + ms(60)), WakeOutcome::Advanced);
}

#[test]
fn one_advance_per_wake_even_when_late() {
    let mut session = session(&[10]);
    precompute_all(&mut session);
    let t0 = Instant::now();
    session.on_wake(t0);
    assert_eq!(session.on_wake(t0 + ms(75)), WakeOutcome::Advanced);
    assert_eq!(session.streams()[0].tick(), 1);
    assert_eq!(session.playback().last_frame_time, Some(t0 + ms(60)));
}

#[test]
fn reset_while_paused_redraws_immediately() {
    let mut session = session(&[30, 20]);
    precompute_all(&mut session);

    let mut now = Instant::now();
    session.on_wake(now);
    for _ in 0..7 {
        now += ms(20);
        session.on_wake(now);
    }
    assert_eq!(session.toggle_play_pause(), Transition::Pause);
    assert_eq!(session.clock_state(), ClockState::ReadyPaused);

    let before = session.display().presented.len();
    session.reset();
    let presented = &session.display().presented[before..];
    assert_eq!(presented.len(), 2);
    for (idx, frame) in presented {
        let stream = &session.streams()[*idx];
        assert_eq!(stream.tick(), 0);
        assert_eq!(Some(frame), stream.frames().get(0));
    }

    // Paused: later wakes hold tick 0.
    now += ms(100);
    assert_eq!(session.on_wake(now), WakeOutcome::Held);
    assert!(session.streams().iter().all(|s| s.tick() == 0));
}

#[test]
fn toggles_while_waiting_are_recorded_then_overridden() {
    let mut session = session(&[20]);
    assert_eq!(session.toggle_play_pause(), Transition::Play);
    assert!(session.playback().is_playing);
    assert_eq!(session.clock_state(), ClockState::Waiting);
    assert_eq!(session.toggle_play_pause(), Transition::Pause);
    assert_eq!(session.set_playing(false), None);

    precompute_all(&mut session);
    assert!(session.playback().is_playing);
    assert_eq!(session.clock_state(), ClockState::ReadyPlaying);
}

#[test]
fn completion_shows_first_frame() {
    let mut session = session(&[5]);
    let reports = precompute_all(&mut session);
    assert_eq!(reports.len(), 1);
    let (idx, frame) = session.display().presented.last().unwrap();
    assert_eq!(*idx, 0);
    assert_eq!(Some(frame), session.streams()[0].frames().get(0));
}

#[test]
fn progress_is_presented_once_per_change() {
    let mut session = session(&[40]);
    let t0 = Instant::now();
    assert_eq!(session.on_wake(t0), WakeOutcome::Waiting);
    assert_eq!(session.on_wake(t0 + ms(16)), WakeOutcome::Waiting);
    assert_eq!(session.display().presented.len(), 1);

    session.step_precompute();
    assert_eq!(session.streams()[0].precompute_progress(), 25);
    session.on_wake(t0 + ms(32));
    assert_eq!(session.display().presented.len(), 2);
}

#[test]
fn load_failure_is_shown_and_blocks_playback() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.csv");
    let mut buf = String::from("time,trajectory_id,x,y,vx,vy,speed\n");
    for s in circling(15) {
        buf.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            s.time, s.trajectory_id, s.x, s.y, s.vx, s.vy, s.speed
        ));
    }
    std::fs::write(&good, buf).unwrap();

    let cfgs = vec![
        StreamConfig {
            csv: good.display().to_string(),
            ..stream_config("good")
        },
        StreamConfig {
            csv: dir.path().join("missing.csv").display().to_string(),
            ..stream_config("missing")
        },
    ];
    let mut session = Session::new(&PlaybackConfig::default(), &cfgs, Recorder::default()).unwrap();
    session.load_all();

    assert!(matches!(session.streams()[1].phase(), StreamPhase::Failed(_)));
    assert_eq!(session.display().presented.len(), 1);
    assert_eq!(session.display().presented[0].0, 1);

    precompute_all(&mut session);
    assert!(session.streams()[0].is_ready());
    assert_eq!(session.streams()[0].frames().len(), 15);
    assert!(!session.all_ready());
    assert_eq!(session.clock_state(), ClockState::Waiting);
    assert_eq!(session.on_wake(Instant::now()), WakeOutcome::Waiting);
}

#[test]
fn empty_stream_never_becomes_ready() {
    let mut session = session(&[10, 0]);
    assert_eq!(*session.streams()[1].phase(), StreamPhase::Empty);
    precompute_all(&mut session);
    assert!(session.streams()[0].is_ready());
    assert!(!session.streams()[1].is_ready());
    assert!(!session.playback().is_playing);
    assert_eq!(session.clock_state(), ClockState::Waiting);
}

#[test]
fn resume_after_pause_restarts_pacing() {
    let mut session = session(&[50]);
    precompute_all(&mut session);

    let t0 = Instant::now();
    session.on_wake(t0);
    for k in 1..=3 {
        assert_eq!(session.on_wake(t0 + ms(20 * k)), WakeOutcome::Advanced);
    }
    assert_eq!(session.toggle_play_pause(), Transition::Pause);

    // Paused for ten intervals.
    for k in 4..=13 {
        assert_eq!(session.on_wake(t0 + ms(20 * k)), WakeOutcome::Held);
    }
    assert_eq!(session.streams()[0].tick(), 3);

    assert_eq!(session.toggle_play_pause(), Transition::Play);
    assert_eq!(session.clock_state(), ClockState::ReadyPlaying);
    let resumed = t0 + ms(275);
    // The first wake after resuming only takes the reference time.
    assert_eq!(session.on_wake(resumed), WakeOutcome::Held);
    assert_eq!(session.streams()[0].tick(), 3);
    assert_eq!(session.on_wake(resumed + ms(10)), WakeOutcome::Held);
    assert_eq!(session.on_wake(resumed + ms(21)), WakeOutcome::Advanced);
    assert_eq!(session.streams()[0].tick(), 4);

    // Regular cadence from the carried reference.
    assert_eq!(session.on_wake(resumed + ms(35)), WakeOutcome::Held);
    assert_eq!(session.on_wake(resumed + ms(40)), WakeOutcome::Advanced);
    assert_eq!(session.on_wake(resumed + ms(60)), WakeOutcome::Advanced);
    assert_eq!(session.streams()[0].tick(), 6);
}
