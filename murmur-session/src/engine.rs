//! Crossfade engine
//!
//! The central state machine of the session. It owns at most two live audio
//! sinks (outgoing, incoming) and ramps their volumes on a fixed-size tick
//! timer so every track change is a perceptually smooth crossfade.
//!
//! States: `Idle` (one sink live at its logical level, no fade in flight) →
//! `Fading` (two sinks live, ramp in progress) → `Idle` (incoming sink is the
//! sole live one; outgoing stopped and released).
//!
//! Supersession: a new crossfade while one is in flight discards (stops) the
//! prior incoming sink, inherits the prior outgoing sink with its current
//! computed volume as the new starting volume, and cancels the prior tick
//! task before scheduling its own — ticks from two fades never interleave,
//! and no sink is ever orphaned. There is no cancel-without-replacement:
//! skips and vibe changes both route through `start_crossfade`.
//!
//! Mute: applied volumes are forced to 0 while muted, but the computed ramp
//! values keep advancing, so unmuting mid-fade resumes the correct curve
//! rather than restarting it.

use crate::audio::{AudioBackend, AudioSink};
use murmur_common::events::{EventBus, SessionEvent};
use murmur_common::TrackId;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Completion signal for a crossfade.
///
/// Resolves exactly once, after the final volume application of the fade
/// that finished. A superseded fade's receiver is dropped without firing.
pub type FadeDone = oneshot::Receiver<TrackId>;

/// In-flight fade bookkeeping
struct FadeState<S: AudioSink> {
    /// Sink ramping down; None when the fade started from silence
    outgoing: Option<S>,
    /// Sink ramping up toward the ceiling
    incoming: S,
    incoming_track: TrackId,
    start_out: f32,
    start_in: f32,
    tick: u32,
    ticks: u32,
    /// Computed (unmuted) ramp values; what the state machine tracks even
    /// while mute forces the applied volumes to 0
    out_level: f32,
    in_level: f32,
    done: Option<oneshot::Sender<TrackId>>,
}

/// Engine state shared with the tick task
struct EngineInner<S: AudioSink> {
    /// Sole live sink while Idle; None while Fading
    current: Option<S>,
    current_track: Option<TrackId>,
    /// Logical volume of `current` while Idle (survives mute)
    level: f32,
    fade: Option<FadeState<S>>,
    muted: bool,
    /// Ambient-mix ceiling for incoming tracks, deliberately below full scale
    ceiling: f32,
}

/// Outcome of one fade tick
enum TickOutcome {
    /// Ramp still in progress
    InFlight,
    /// Final tick applied; the named track is now the sole live sink
    Completed(TrackId),
    /// No fade in flight (stale tick task)
    Idle,
}

impl<S: AudioSink> EngineInner<S> {
    /// Re-apply volumes from the tracked logical values and the mute flag.
    ///
    /// Never touches tick counters or computed ramp values.
    fn apply_volumes(&mut self) {
        let muted = self.muted;
        if let Some(fade) = self.fade.as_mut() {
            if let Some(out) = fade.outgoing.as_mut() {
                out.set_volume(if muted { 0.0 } else { fade.out_level });
            }
            fade.incoming
                .set_volume(if muted { 0.0 } else { fade.in_level });
        } else if let Some(current) = self.current.as_mut() {
            let level = self.level;
            current.set_volume(if muted { 0.0 } else { level });
        }
    }

    /// Advance the in-flight fade by one tick and apply the ramp volumes.
    ///
    /// At tick i of N: outgoing = max(0, start_out * (1 - i/N)),
    /// incoming = min(ceiling, start_in + (ceiling - start_in) * i/N).
    fn advance_tick(&mut self) -> TickOutcome {
        let muted = self.muted;
        let ceiling = self.ceiling;

        let Some(fade) = self.fade.as_mut() else {
            return TickOutcome::Idle;
        };

        fade.tick += 1;
        let progress = fade.tick as f32 / fade.ticks as f32;
        fade.out_level = (fade.start_out * (1.0 - progress)).max(0.0);
        fade.in_level = (fade.start_in + (ceiling - fade.start_in) * progress).min(ceiling);

        if let Some(out) = fade.outgoing.as_mut() {
            out.set_volume(if muted { 0.0 } else { fade.out_level });
        }
        fade.incoming
            .set_volume(if muted { 0.0 } else { fade.in_level });

        if fade.tick < fade.ticks {
            return TickOutcome::InFlight;
        }

        // Terminal tick: outgoing is released, incoming becomes the sole
        // live sink, and the completion signal fires after the final volume
        // application above.
        let Some(mut fade) = self.fade.take() else {
            return TickOutcome::Idle;
        };
        if let Some(mut out) = fade.outgoing.take() {
            out.stop();
        }
        self.level = fade.in_level;
        self.current = Some(fade.incoming);
        self.current_track = Some(fade.incoming_track.clone());
        if let Some(done) = fade.done.take() {
            // Receiver may have been dropped; that's fine
            let _ = done.send(fade.incoming_track.clone());
        }
        TickOutcome::Completed(fade.incoming_track)
    }
}

/// Timed linear crossfade between looping ambient sinks
pub struct CrossfadeEngine<B: AudioBackend> {
    backend: B,
    inner: Arc<Mutex<EngineInner<B::Sink>>>,
    events: EventBus,
    tick: Duration,
    /// Tick task of the in-flight fade; aborted on supersession
    ticker: Option<JoinHandle<()>>,
}

impl<B: AudioBackend> CrossfadeEngine<B> {
    pub fn new(backend: B, events: EventBus, tick: Duration, ceiling: f32) -> Self {
        Self {
            backend,
            inner: Arc::new(Mutex::new(EngineInner {
                current: None,
                current_track: None,
                level: 0.0,
                fade: None,
                muted: false,
                ceiling,
            })),
            events,
            tick,
            ticker: None,
        }
    }

    /// Start the ambient bed with no fade (used once, at session startup).
    pub fn begin(&mut self, track: TrackId, level: f32) {
        let mut sink = self.backend.open_loop(&track);
        let mut inner = self.inner.lock().unwrap();
        sink.set_volume(if inner.muted { 0.0 } else { level });
        if let Err(e) = sink.play() {
            warn!("Ambient bed unavailable, continuing silent: {}", e);
        }
        inner.level = level;
        inner.current = Some(sink);
        inner.current_track = Some(track);
    }

    /// Start (or supersede) a crossfade to `track` over `duration`.
    ///
    /// The returned signal resolves exactly once when this fade reaches its
    /// terminal tick; it never fires if this fade is itself superseded.
    pub fn start_crossfade(&mut self, track: TrackId, duration: Duration) -> FadeDone {
        // Cancel the prior fade's tick timer before scheduling our own, so
        // ticks from two fades never interleave. Abort lands at an await
        // point; it cannot interrupt a tick mid-lock.
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }

        let (done_tx, done_rx) = oneshot::channel();
        let mut incoming = self.backend.open_loop(&track);

        let tick_ms = self.tick.as_millis().max(1);
        let ticks = ((duration.as_millis() / tick_ms) as u32).max(1);

        {
            let mut inner = self.inner.lock().unwrap();

            let (outgoing, start_out) = match inner.fade.take() {
                // Supersession: the prior incoming sink becomes waste and is
                // stopped; the prior outgoing sink is inherited, still
                // playing, at its current computed volume.
                Some(mut prev) => {
                    debug!(
                        "Superseding in-flight fade to {} at tick {}/{}",
                        prev.incoming_track, prev.tick, prev.ticks
                    );
                    prev.incoming.stop();
                    prev.done.take(); // superseded completion never fires
                    (prev.outgoing, prev.out_level)
                }
                None => {
                    let start = inner.level;
                    (inner.current.take(), start)
                }
            };
            inner.current_track = None;

            incoming.set_volume(0.0);
            if let Err(e) = incoming.play() {
                warn!("Playback unavailable, fading silently: {}", e);
            }

            inner.fade = Some(FadeState {
                outgoing,
                incoming,
                incoming_track: track.clone(),
                start_out,
                start_in: 0.0,
                tick: 0,
                ticks,
                out_level: start_out,
                in_level: 0.0,
                done: Some(done_tx),
            });
        }

        self.events.emit_lossy(SessionEvent::CrossfadeStarted {
            track,
            duration_ms: duration.as_millis() as u64,
            timestamp: chrono::Utc::now(),
        });

        let inner = Arc::clone(&self.inner);
        let events = self.events.clone();
        let tick = self.tick;
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            interval.tick().await; // completes immediately
            loop {
                interval.tick().await;
                let outcome = inner.lock().unwrap().advance_tick();
                match outcome {
                    TickOutcome::InFlight => {}
                    TickOutcome::Completed(track) => {
                        debug!("Crossfade to {} complete", track);
                        events.emit_lossy(SessionEvent::CrossfadeCompleted {
                            track,
                            timestamp: chrono::Utc::now(),
                        });
                        break;
                    }
                    TickOutcome::Idle => break,
                }
            }
        }));

        done_rx
    }

    /// Flip the global mute flag and re-apply volumes.
    ///
    /// Ramp bookkeeping is untouched: unmuting mid-fade resumes the curve.
    pub fn set_muted(&mut self, muted: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.muted = muted;
        inner.apply_volumes();
    }

    pub fn is_muted(&self) -> bool {
        self.inner.lock().unwrap().muted
    }

    /// True while a fade is in flight
    pub fn is_fading(&self) -> bool {
        self.inner.lock().unwrap().fade.is_some()
    }

    /// Track of the sole live sink, None while fading
    pub fn current_track(&self) -> Option<TrackId> {
        self.inner.lock().unwrap().current_track.clone()
    }
}

impl<B: AudioBackend> Drop for CrossfadeEngine<B> {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_common::Error;
    use murmur_common::Result;

    /// Shared view into a fake sink's state, surviving moves into the engine
    #[derive(Clone, Default)]
    struct Probe(Arc<Mutex<ProbeState>>);

    #[derive(Default)]
    struct ProbeState {
        gain: f32,
        playing: bool,
        stopped: bool,
    }

    impl Probe {
        fn gain(&self) -> f32 {
            self.0.lock().unwrap().gain
        }
        fn playing(&self) -> bool {
            self.0.lock().unwrap().playing
        }
        fn stopped(&self) -> bool {
            self.0.lock().unwrap().stopped
        }
    }

    struct FakeSink {
        probe: Probe,
        deaf: bool,
    }

    impl AudioSink for FakeSink {
        fn play(&mut self) -> Result<()> {
            if self.deaf {
                return Err(Error::PlaybackUnavailable("deaf backend".to_string()));
            }
            self.probe.0.lock().unwrap().playing = true;
            Ok(())
        }
        fn set_volume(&mut self, gain: f32) {
            self.probe.0.lock().unwrap().gain = gain.clamp(0.0, 1.0);
        }
        fn volume(&self) -> f32 {
            self.probe.gain()
        }
        fn stop(&mut self) {
            let mut state = self.probe.0.lock().unwrap();
            state.playing = false;
            state.stopped = true;
        }
    }

    /// Records a probe per opened track
    #[derive(Clone, Default)]
    struct FakeBackend {
        opened: Arc<Mutex<Vec<(TrackId, Probe)>>>,
        deaf: bool,
    }

    impl AudioBackend for FakeBackend {
        type Sink = FakeSink;

        fn open_loop(&self, track: &TrackId) -> FakeSink {
            let probe = Probe::default();
            self.opened
                .lock()
                .unwrap()
                .push((track.clone(), probe.clone()));
            FakeSink {
                probe,
                deaf: self.deaf,
            }
        }
    }

    impl FakeBackend {
        fn probe(&self, index: usize) -> Probe {
            self.opened.lock().unwrap()[index].1.clone()
        }
        fn opened_count(&self) -> usize {
            self.opened.lock().unwrap().len()
        }
    }

    fn engine(backend: FakeBackend) -> CrossfadeEngine<FakeBackend> {
        CrossfadeEngine::new(backend, EventBus::new(16), Duration::from_millis(50), 0.8)
    }

    fn track(name: &str) -> TrackId {
        TrackId::new(name)
    }

    /// Drive the in-flight fade synchronously, without the timer
    fn run_ticks(engine: &CrossfadeEngine<FakeBackend>, n: u32) {
        let mut inner = engine.inner.lock().unwrap();
        for _ in 0..n {
            inner.advance_tick();
        }
    }

    #[tokio::test]
    async fn begin_starts_ambient_bed_at_level() {
        let backend = FakeBackend::default();
        let mut engine = engine(backend.clone());

        engine.begin(track("sounds/calm_1.wav"), 0.12);

        let bed = backend.probe(0);
        assert!(bed.playing());
        assert!((bed.gain() - 0.12).abs() < 1e-6);
        assert_eq!(engine.current_track(), Some(track("sounds/calm_1.wav")));
    }

    #[tokio::test]
    async fn fade_converges_to_ceiling_and_releases_outgoing() {
        let backend = FakeBackend::default();
        let mut engine = engine(backend.clone());
        engine.begin(track("a"), 0.12);

        // 4 ticks at 50ms
        let _done = engine.start_crossfade(track("b"), Duration::from_millis(200));
        run_ticks(&engine, 4);

        let outgoing = backend.probe(0);
        let incoming = backend.probe(1);
        assert_eq!(outgoing.gain(), 0.0);
        assert!(outgoing.stopped());
        assert!((incoming.gain() - 0.8).abs() < 1e-6);
        assert!(!engine.is_fading());
        assert_eq!(engine.current_track(), Some(track("b")));
    }

    #[tokio::test]
    async fn ramp_is_linear_per_tick() {
        let backend = FakeBackend::default();
        let mut engine = engine(backend.clone());
        engine.begin(track("a"), 0.4);

        let _done = engine.start_crossfade(track("b"), Duration::from_millis(200));
        run_ticks(&engine, 1);

        // Tick 1 of 4: outgoing 0.4 * 0.75, incoming 0.8 * 0.25
        let outgoing = backend.probe(0);
        let incoming = backend.probe(1);
        assert!((outgoing.gain() - 0.3).abs() < 1e-6);
        assert!((incoming.gain() - 0.2).abs() < 1e-6);
    }

    #[tokio::test]
    async fn zero_duration_fade_still_takes_one_tick() {
        let backend = FakeBackend::default();
        let mut engine = engine(backend.clone());
        engine.begin(track("a"), 0.5);

        let _done = engine.start_crossfade(track("b"), Duration::from_millis(0));
        run_ticks(&engine, 1);

        assert!(!engine.is_fading());
        assert!((backend.probe(1).gain() - 0.8).abs() < 1e-6);
    }

    #[tokio::test]
    async fn supersession_discards_prior_incoming_and_inherits_outgoing() {
        let backend = FakeBackend::default();
        let mut engine = engine(backend.clone());
        engine.begin(track("a"), 0.8);

        // Fade A: a → b, 8 ticks; run 2 (outgoing at 0.8 * 6/8 = 0.6)
        let done_a = engine.start_crossfade(track("b"), Duration::from_millis(400));
        run_ticks(&engine, 2);

        // Fade B supersedes: a → c
        let _done_b = engine.start_crossfade(track("c"), Duration::from_millis(400));

        let a = backend.probe(0);
        let b = backend.probe(1);
        let c = backend.probe(2);

        // b (prior incoming) was stopped, never left live
        assert!(b.stopped());
        // a is still playing, re-targeted as fade B's outgoing
        assert!(a.playing());
        assert!(!a.stopped());

        // Fade A's completion never fires
        assert!(done_a.await.is_err());

        // Fade B starts from a's inherited volume: tick 1 of 8 from 0.6
        run_ticks(&engine, 1);
        assert!((a.gain() - 0.6 * 7.0 / 8.0).abs() < 1e-5);

        run_ticks(&engine, 7);
        assert!(a.stopped());
        assert!((c.gain() - 0.8).abs() < 1e-6);
        assert_eq!(engine.current_track(), Some(track("c")));
        assert_eq!(backend.opened_count(), 3);
    }

    #[tokio::test]
    async fn mute_forces_applied_zero_but_keeps_curve() {
        let backend = FakeBackend::default();
        let mut engine = engine(backend.clone());
        engine.begin(track("a"), 0.8);

        let _done = engine.start_crossfade(track("b"), Duration::from_millis(400));
        run_ticks(&engine, 2);

        engine.set_muted(true);
        let a = backend.probe(0);
        let b = backend.probe(1);
        assert_eq!(a.gain(), 0.0);
        assert_eq!(b.gain(), 0.0);

        // Ramp keeps advancing while muted, applied volumes stay 0
        run_ticks(&engine, 2);
        assert_eq!(b.gain(), 0.0);

        // Unmute resumes the computed curve: tick 4 of 8 → incoming 0.4
        engine.set_muted(false);
        assert!((b.gain() - 0.4).abs() < 1e-6);
        assert!((a.gain() - 0.8 * 4.0 / 8.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn mute_while_idle_restores_logical_level() {
        let backend = FakeBackend::default();
        let mut engine = engine(backend.clone());
        engine.begin(track("a"), 0.12);

        engine.set_muted(true);
        assert_eq!(backend.probe(0).gain(), 0.0);

        engine.set_muted(false);
        assert!((backend.probe(0).gain() - 0.12).abs() < 1e-6);
    }

    #[tokio::test]
    async fn deaf_backend_degrades_to_silent_fade() {
        let backend = FakeBackend {
            deaf: true,
            ..FakeBackend::default()
        };
        let mut engine = engine(backend.clone());
        engine.begin(track("a"), 0.12);

        let _done = engine.start_crossfade(track("b"), Duration::from_millis(100));
        run_ticks(&engine, 2);

        // State machine completed normally despite playback being refused
        assert!(!engine.is_fading());
        assert_eq!(engine.current_track(), Some(track("b")));
        assert!(!backend.probe(1).playing());
        assert!((backend.probe(1).gain() - 0.8).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_driven_fade_completes_and_emits_events() {
        let backend = FakeBackend::default();
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let mut engine =
            CrossfadeEngine::new(backend.clone(), bus, Duration::from_millis(50), 0.8);
        engine.begin(track("a"), 0.12);

        let done = engine.start_crossfade(track("b"), Duration::from_millis(200));
        tokio::time::advance(Duration::from_millis(250)).await;

        let finished = done.await.unwrap();
        assert_eq!(finished, track("b"));
        assert!(!engine.is_fading());
        assert!(backend.probe(0).stopped());

        match rx.recv().await.unwrap() {
            SessionEvent::CrossfadeStarted { track: t, duration_ms, .. } => {
                assert_eq!(t, track("b"));
                assert_eq!(duration_ms, 200);
            }
            other => panic!("Unexpected event: {:?}", other),
        }
        match rx.recv().await.unwrap() {
            SessionEvent::CrossfadeCompleted { track: t, .. } => assert_eq!(t, track("b")),
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_double_skip_ends_with_one_live_sink() {
        let backend = FakeBackend::default();
        let mut engine = engine(backend.clone());
        engine.begin(track("a"), 0.8);

        let _first = engine.start_crossfade(track("b"), Duration::from_millis(200));
        tokio::time::advance(Duration::from_millis(60)).await;
        let second = engine.start_crossfade(track("c"), Duration::from_millis(200));

        tokio::time::advance(Duration::from_millis(300)).await;
        assert_eq!(second.await.unwrap(), track("c"));

        // Exactly one sink live and audible at the end
        let live: Vec<usize> = (0..backend.opened_count())
            .filter(|i| {
                let p = backend.probe(*i);
                p.playing() && !p.stopped()
            })
            .collect();
        assert_eq!(live, vec![2]);
        assert_eq!(engine.current_track(), Some(track("c")));
    }
}
