//! Playback scheduling
//!
//! Owns replay position and the timing loop that advances through the
//! frame array in step with wall-clock time, publishing changed keys to
//! the sink. Control operations and the loop share one small mutex-guarded
//! state struct; the frame array is immutable once loaded and published to
//! the loop by atomic `Arc` swap, so catch-up runs without holding the
//! lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::{Frame, ReplayConfig};
use crate::sink::Sink;

/// Point-in-time snapshot of playback state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    /// Next frame the loop will emit
    pub frame_index: usize,
    /// Total frames in the loaded log
    pub frame_count: usize,
    /// Playback position in seconds (`frame_index * period`)
    pub position: f64,
    /// Whether the position is advancing
    pub playing: bool,
    /// Whether advancing writes to the sink
    pub publishing: bool,
}

/// Fields guarded by the playback lock. Everything the control side and
/// the timing loop both touch lives here and nowhere else.
struct PlaybackState {
    frames: Arc<[Frame]>,
    idx: usize,
    playing: bool,
    publishing: bool,
    /// Seconds on the scheduler's clock line at which playback position
    /// would be zero; `position = now - origin` while playing.
    origin: f64,
    /// Bumped by every `load`; a loop pass whose snapshot is stale must
    /// not write its position back.
    load_seq: u64,
}

struct Shared {
    state: Mutex<PlaybackState>,
    sink: Mutex<Option<Box<dyn Sink>>>,
    stop: AtomicBool,
    /// Fixed reference instant; all `origin`/`now` seconds count from here
    base: Instant,
    period: Duration,
    period_s: f64,
    max_timestamp: f64,
}

impl Shared {
    fn new(config: ReplayConfig) -> Self {
        Self {
            state: Mutex::new(PlaybackState {
                frames: Arc::from(Vec::new()),
                idx: 0,
                playing: false,
                publishing: false,
                origin: 0.0,
                load_seq: 0,
            }),
            sink: Mutex::new(None),
            stop: AtomicBool::new(false),
            base: Instant::now(),
            period: config.period,
            period_s: config.period.as_secs_f64(),
            max_timestamp: config.max_timestamp,
        }
    }

    /// Seconds elapsed on the scheduler clock
    fn now_s(&self) -> f64 {
        self.base.elapsed().as_secs_f64()
    }

    /// One pass of the timing loop: catch the position up to where the
    /// clock says it should be, emitting frame diffs along the way.
    fn advance(&self, now_s: f64, prev_frame: &mut Frame) {
        let (frames, start_idx, origin, publishing, load_seq) = {
            let state = self.state.lock().unwrap();
            if !state.playing || state.frames.is_empty() {
                return;
            }
            (
                Arc::clone(&state.frames),
                state.idx,
                state.origin,
                state.publishing,
                state.load_seq,
            )
        };

        let elapsed = now_s - origin;
        let target = (elapsed / self.period_s).floor();
        if target < 0.0 {
            return;
        }
        let target = (target as usize).min(frames.len() - 1);

        let mut idx = start_idx;
        while idx <= target {
            if publishing {
                self.publish_diff(&frames[idx], prev_frame);
                *prev_frame = frames[idx].clone();
            }
            idx += 1;
        }
        if idx == start_idx {
            return;
        }

        let mut state = self.state.lock().unwrap();
        // A load may have swapped the frame array while we were emitting;
        // the position we computed belongs to the old array.
        if state.load_seq == load_seq {
            state.idx = idx;
            if idx >= frames.len() {
                state.playing = false;
                tracing::debug!(frames = frames.len(), "end of log, playback paused");
            }
        }
    }

    /// Emit every key whose value differs from the previously emitted
    /// frame. Keys absent from the current frame are not retracted; the
    /// sink keeps their last value.
    fn publish_diff(&self, frame: &Frame, prev_frame: &Frame) {
        let mut guard = self.sink.lock().unwrap();
        let Some(sink) = guard.as_mut() else {
            return;
        };
        for (key, value) in frame {
            if prev_frame.get(key) != Some(value) {
                if let Err(e) = sink.put(key, value.value_type, &value.value, &value.metadata) {
                    tracing::warn!(key = key.as_str(), error = %e, "sink put failed");
                }
            }
        }
        if let Err(e) = sink.flush() {
            tracing::warn!(error = %e, "sink flush failed");
        }
    }
}

/// The playback state machine and its timing loop.
///
/// Spawning starts a dedicated loop thread immediately; it idles until a
/// log is loaded and `play` is called. Dropping the scheduler stops the
/// thread.
pub struct PlaybackScheduler {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl PlaybackScheduler {
    /// Start the timing loop thread
    pub fn spawn(config: ReplayConfig) -> Self {
        let shared = Arc::new(Shared::new(config));
        let loop_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("relog-playback".into())
            .spawn(move || run_loop(loop_shared))
            .expect("failed to spawn playback thread");
        Self {
            shared,
            handle: Some(handle),
        }
    }

    /// Replace the loaded frame array, resetting to stopped at frame 0
    pub fn load(&self, frames: Vec<Frame>) {
        let now = self.shared.now_s();
        let mut state = self.shared.state.lock().unwrap();
        state.frames = Arc::from(frames);
        state.idx = 0;
        state.playing = false;
        state.origin = now;
        state.load_seq += 1;
    }

    /// Jump to a position in seconds, clamped to `[0, max_timestamp]`.
    ///
    /// Legal in any state and does not change whether playback is
    /// running. The publish diff baseline is intentionally not cleared:
    /// after a backward seek a key is only re-published once its value
    /// differs from the last one emitted.
    pub fn seek(&self, seconds: f64) {
        let t = seconds.clamp(0.0, self.shared.max_timestamp);
        let now = self.shared.now_s();
        let mut state = self.shared.state.lock().unwrap();
        state.idx = (t / self.shared.period_s) as usize;
        state.origin = now - t;
    }

    /// Begin (or resume) advancing from the current position
    pub fn play(&self) {
        let now = self.shared.now_s();
        let mut state = self.shared.state.lock().unwrap();
        if !state.playing {
            state.origin = now - state.idx as f64 * self.shared.period_s;
            state.playing = true;
        }
    }

    /// Freeze the position
    pub fn pause(&self) {
        self.shared.state.lock().unwrap().playing = false;
    }

    /// Halt and rewind to frame 0
    pub fn stop(&self) {
        let now = self.shared.now_s();
        let mut state = self.shared.state.lock().unwrap();
        state.playing = false;
        state.idx = 0;
        state.origin = now;
    }

    /// Gate whether advancing writes to the sink. Position keeps
    /// advancing either way so replay stays synchronized.
    pub fn set_publishing(&self, on: bool) {
        self.shared.state.lock().unwrap().publishing = on;
    }

    /// Replace the sink the loop publishes to
    pub fn set_sink(&self, sink: Box<dyn Sink>) {
        *self.shared.sink.lock().unwrap() = Some(sink);
    }

    /// Snapshot the current playback state
    pub fn status(&self) -> PlaybackStatus {
        let state = self.shared.state.lock().unwrap();
        PlaybackStatus {
            frame_index: state.idx,
            frame_count: state.frames.len(),
            position: state.idx as f64 * self.shared.period_s,
            playing: state.playing,
            publishing: state.publishing,
        }
    }
}

impl Drop for PlaybackScheduler {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Deadline-driven loop: sleep to the next tick, catch up, advance the
/// deadline. When the loop falls behind by more than one period it snaps
/// the deadline forward by the whole periods missed instead of replaying
/// every tick.
fn run_loop(shared: Arc<Shared>) {
    let mut next_wake = Instant::now();
    let mut prev_frame = Frame::new();

    while !shared.stop.load(Ordering::Relaxed) {
        let now = Instant::now();
        if next_wake > now {
            thread::sleep(next_wake - now);
        }

        shared.advance(shared.now_s(), &mut prev_frame);

        next_wake += shared.period;
        let now = Instant::now();
        if now > next_wake {
            let behind = now - next_wake;
            if behind > shared.period {
                let missed = (behind.as_secs_f64() / shared.period_s) as u32;
                next_wake += shared.period * missed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::FrameValue;
    use crate::sink::RecordingSink;
    use crate::wpilog::ValueType;

    const PERIOD_S: f64 = 0.02;

    fn config() -> ReplayConfig {
        ReplayConfig::default()
    }

    fn frame(entries: &[(&str, &str)]) -> Frame {
        entries
            .iter()
            .map(|(k, v)| {
                (
                    k.to_string(),
                    FrameValue {
                        value_type: ValueType::String,
                        value: v.to_string(),
                        metadata: String::new(),
                    },
                )
            })
            .collect()
    }

    /// Shared state primed with frames, playing from t=0, with a
    /// recording sink attached.
    fn playing_shared(frames: Vec<Frame>, publishing: bool) -> (Shared, RecordingSink) {
        let shared = Shared::new(config());
        let sink = RecordingSink::new();
        *shared.sink.lock().unwrap() = Some(Box::new(sink.clone()));
        {
            let mut state = shared.state.lock().unwrap();
            state.frames = Arc::from(frames);
            state.playing = true;
            state.publishing = publishing;
            state.origin = 0.0;
        }
        (shared, sink)
    }

    #[test]
    fn test_advance_emits_diffs_only() {
        let frames = vec![
            frame(&[("a", "1"), ("b", "1")]),
            frame(&[("a", "1"), ("b", "2")]),
            frame(&[("a", "1"), ("b", "2")]),
        ];
        let (shared, sink) = playing_shared(frames, true);
        let mut prev = Frame::new();

        shared.advance(2.5 * PERIOD_S, &mut prev);

        let puts = sink.records();
        // Frame 0 emits both keys, frame 1 only the changed "b",
        // frame 2 nothing.
        assert_eq!(puts.len(), 3);
        assert_eq!(
            puts.iter().filter(|p| p.key == "a").count(),
            1,
            "unchanged key must not be re-emitted"
        );
        assert_eq!(shared.state.lock().unwrap().idx, 3);
    }

    #[test]
    fn test_bounded_catch_up_in_one_pass() {
        let frames = vec![frame(&[("k", "1")]); 10];
        let (shared, _sink) = playing_shared(frames, true);
        let mut prev = Frame::new();

        // Loop stalled for five periods: one pass catches up completely
        shared.advance(5.0 * PERIOD_S, &mut prev);
        assert_eq!(shared.state.lock().unwrap().idx, 6);
    }

    #[test]
    fn test_position_monotonic_while_playing() {
        let frames = vec![frame(&[("k", "1")]); 50];
        let (shared, _sink) = playing_shared(frames, false);
        let mut prev = Frame::new();

        let mut last_idx = 0;
        for step in 1..20 {
            shared.advance(step as f64 * PERIOD_S * 0.7, &mut prev);
            let idx = shared.state.lock().unwrap().idx;
            assert!(idx >= last_idx);
            last_idx = idx;
        }
    }

    #[test]
    fn test_advancing_without_publishing_skips_sink() {
        let frames = vec![frame(&[("k", "1")]); 4];
        let (shared, sink) = playing_shared(frames, false);
        let mut prev = Frame::new();

        shared.advance(3.0 * PERIOD_S, &mut prev);
        assert!(sink.records().is_empty());
        assert_eq!(shared.state.lock().unwrap().idx, 4);
    }

    #[test]
    fn test_end_of_log_pauses() {
        let frames = vec![frame(&[("k", "1")]); 3];
        let (shared, _sink) = playing_shared(frames, false);
        let mut prev = Frame::new();

        shared.advance(100.0, &mut prev);
        let state = shared.state.lock().unwrap();
        assert_eq!(state.idx, 3);
        assert!(!state.playing);
    }

    #[test]
    fn test_paused_state_ignores_clock() {
        let frames = vec![frame(&[("k", "1")]); 3];
        let (shared, sink) = playing_shared(frames, true);
        shared.state.lock().unwrap().playing = false;
        let mut prev = Frame::new();

        shared.advance(1.0, &mut prev);
        assert_eq!(shared.state.lock().unwrap().idx, 0);
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_removed_key_not_retracted() {
        let frames = vec![
            frame(&[("gone", "1"), ("kept", "1")]),
            frame(&[("kept", "1")]),
        ];
        let (shared, sink) = playing_shared(frames, true);
        let mut prev = Frame::new();

        shared.advance(1.5 * PERIOD_S, &mut prev);
        // No publish of any kind for the disappeared key beyond its
        // original emission.
        let gone_puts: Vec<_> = sink
            .records()
            .into_iter()
            .filter(|p| p.key == "gone")
            .collect();
        assert_eq!(gone_puts.len(), 1);
    }

    #[test]
    fn test_load_resets_to_stopped() {
        let scheduler = PlaybackScheduler::spawn(config());
        scheduler.load(vec![frame(&[("k", "1")]); 100]);
        scheduler.seek(1.5);
        scheduler.play();

        scheduler.load(vec![frame(&[("k", "2")]); 10]);
        let status = scheduler.status();
        assert_eq!(status.frame_index, 0);
        assert_eq!(status.frame_count, 10);
        assert!(!status.playing);
    }

    #[test]
    fn test_scheduler_operations() {
        let scheduler = PlaybackScheduler::spawn(config());
        scheduler.load(vec![frame(&[("k", "1")]); 100]);

        let status = scheduler.status();
        assert_eq!(status.frame_index, 0);
        assert_eq!(status.frame_count, 100);
        assert!(!status.playing);

        scheduler.seek(1.0);
        assert_eq!(scheduler.status().frame_index, 50);

        // Seeks clamp to the configured window
        scheduler.seek(5000.0);
        assert_eq!(
            scheduler.status().position,
            config().max_timestamp
        );
        scheduler.seek(-3.0);
        assert_eq!(scheduler.status().frame_index, 0);

        scheduler.set_publishing(true);
        assert!(scheduler.status().publishing);

        scheduler.stop();
        let status = scheduler.status();
        assert_eq!(status.frame_index, 0);
        assert!(!status.playing);
    }

    #[test]
    fn test_real_time_playback_to_end() {
        let config = ReplayConfig {
            period: Duration::from_millis(2),
            max_timestamp: 1000.0,
        };
        let scheduler = PlaybackScheduler::spawn(config);
        let sink = RecordingSink::new();
        scheduler.set_sink(Box::new(sink.clone()));

        scheduler.load(vec![
            frame(&[("k", "1")]),
            frame(&[("k", "2")]),
            frame(&[("k", "3")]),
        ]);
        scheduler.set_publishing(true);
        scheduler.play();

        // 3 frames at 2 ms; leave generous slack for CI schedulers
        thread::sleep(Duration::from_millis(200));

        let status = scheduler.status();
        assert_eq!(status.frame_index, 3);
        assert!(!status.playing, "must auto-pause at end of log");

        let values: Vec<String> = sink.records().into_iter().map(|p| p.value).collect();
        assert_eq!(values, vec!["1", "2", "3"]);
    }
}
