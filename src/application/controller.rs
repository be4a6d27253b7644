//! Cycle controller - decides when to capture and schedules the next one.
//!
//! ## Phases
//!
//! | From | To | Trigger |
//! |------|----|---------|
//! | Idle | Capturing | user capture/upload, auto kick, switch to auto |
//! | Capturing | CountingDown | success in auto mode with green > 0 |
//! | Capturing | Idle | failure, manual mode, or green <= 0 |
//! | CountingDown | Capturing | countdown reaches zero, or a user capture |
//! | CountingDown | Idle | switch to manual |
//! | Idle | CountingDown | published detection in auto mode |
//!
//! ## Single flight
//!
//! The in-flight slot is claimed and released under the state lock. Every
//! path that ends a request, including a panic or a dropped future, goes
//! through [`InFlight`], which releases the slot and restores the idle
//! display state.
//!
//! `shutdown` leaves a request that is still in flight holding the slot.
//! Each claim records the epoch it was made in; shutdown starts a new epoch,
//! and a request from an earlier one releases the slot on completion
//! without rendering or scheduling anything.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::timer::{ticker, Timer};
use crate::domain::{
    CaptureId, CycleMode, CycleSnapshot, CycleState, DensityLevel, DetectionError,
    DetectionParams, DetectionResult, ImageSource, StateMachine,
};
use crate::ports::{DetectionClient, DisplayAdapter};

/// Tunables for the cycle controller.
#[derive(Debug, Clone)]
pub struct CycleSettings {
    /// Mode at start and after a reset.
    pub mode: CycleMode,
    /// Initial slider values.
    pub params: DetectionParams,
    /// Whether `start` begins polling the last-detection side channel.
    pub polling_enabled: bool,
    pub poll_interval: Duration,
    /// Length of one countdown step (one green second).
    pub countdown_tick: Duration,
    /// How often the elapsed time of an in-flight request is refreshed.
    pub elapsed_tick: Duration,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            mode: CycleMode::Manual,
            params: DetectionParams::default(),
            polling_enabled: true,
            poll_interval: Duration::from_secs(2),
            countdown_tick: Duration::from_secs(1),
            elapsed_tick: Duration::from_millis(200),
        }
    }
}

impl CycleSettings {
    pub fn with_mode(mut self, mode: CycleMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_params(mut self, params: DetectionParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_polling(mut self, enabled: bool) -> Self {
        self.polling_enabled = enabled;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// How a capture or upload request ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// Another request was already in flight; nothing was sent.
    Skipped,
    Completed(DetectionResult),
    Failed(DetectionError),
}

/// How one poll of the side channel ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollOutcome {
    /// A newer detection was rendered.
    Applied { timestamp: f64 },
    /// The published timestamp was not newer than the last one applied.
    Stale,
    /// Nothing published yet.
    Empty,
    /// The side channel could not be read; ignored until the next poll.
    Unavailable,
}

#[derive(Debug)]
enum DetectionRequest {
    Camera,
    Upload(ImageSource),
}

/// A taken in-flight slot: the params to send and the epoch it belongs to.
#[derive(Debug, Clone, Copy)]
struct Claim {
    params: DetectionParams,
    epoch: u64,
}

struct Inner {
    state: CycleState,
    epoch: u64,
    params: DetectionParams,
    countdown: Timer,
    countdown_generation: u64,
    elapsed: Timer,
    poller: Timer,
    last_seen_timestamp: f64,
}

/// Owns the cycle state and drives the detection backend.
pub struct CycleController {
    client: Arc<dyn DetectionClient>,
    display: Arc<dyn DisplayAdapter>,
    settings: CycleSettings,
    inner: Mutex<Inner>,
    me: Weak<CycleController>,
}

impl CycleController {
    pub fn new(
        client: Arc<dyn DetectionClient>,
        display: Arc<dyn DisplayAdapter>,
        settings: CycleSettings,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            client,
            display,
            inner: Mutex::new(Inner {
                state: CycleState::new(settings.mode),
                epoch: 0,
                params: settings.params,
                countdown: Timer::new("countdown"),
                countdown_generation: 0,
                elapsed: Timer::new("elapsed"),
                poller: Timer::new("poller"),
                last_seen_timestamp: 0.0,
            }),
            settings,
            me: me.clone(),
        })
    }

    /// Page-load equivalent: shows the live stream, starts polling if
    /// enabled and kicks the first capture in auto mode.
    pub fn start(&self) {
        self.display.show_camera_stream(&self.client.camera_stream_url());

        if self.settings.polling_enabled {
            self.start_polling();
        }

        let claimed = self.with_state(|inner| {
            if inner.state.mode().is_auto() {
                Self::claim(inner)
            } else {
                None
            }
        });
        if let Some(claim) = claimed {
            self.spawn_claimed(claim, "initial auto capture");
        }
    }

    /// Captures one camera frame. No-op if a request is already in flight.
    pub async fn capture(&self) -> CaptureOutcome {
        self.run(DetectionRequest::Camera).await
    }

    /// Sends an image for detection under the same single-flight guard.
    pub async fn upload(&self, source: ImageSource) -> CaptureOutcome {
        self.run(DetectionRequest::Upload(source)).await
    }

    pub fn mode(&self) -> CycleMode {
        self.lock().state.mode()
    }

    /// Switches mode. Manual cancels a pending countdown; auto kicks a
    /// capture when nothing is in flight or counting down. During a
    /// capture only the flag flips and the completion reads it.
    pub fn set_mode(&self, mode: CycleMode) {
        let (claimed, cancelled) = self.with_state(|inner| {
            let previous = inner.state.mode();
            inner.state.set_mode(mode);

            match mode {
                CycleMode::Manual => {
                    let cancelled = inner.state.is_counting_down();
                    Self::disarm_countdown(inner);
                    (None, cancelled)
                }
                CycleMode::Auto => {
                    let idle = previous == CycleMode::Manual && !inner.state.is_counting_down();
                    (if idle { Self::claim(inner) } else { None }, false)
                }
            }
        });

        info!(mode = %mode, "cycle mode changed");

        if cancelled {
            self.display.show_countdown(0);
        }
        if let Some(claim) = claimed {
            self.spawn_claimed(claim, "auto mode enabled");
        }
    }

    /// Flips between auto and manual, returning the new mode.
    pub fn toggle_mode(&self) -> CycleMode {
        let mode = self.mode().toggled();
        self.set_mode(mode);
        mode
    }

    pub fn params(&self) -> DetectionParams {
        self.lock().params
    }

    /// Updates the slider values used by the next request.
    pub fn set_params(&self, params: DetectionParams) {
        self.lock().params = params;
        debug!(confidence = params.confidence, iou = params.iou, "detection params updated");
    }

    pub fn snapshot(&self) -> CycleSnapshot {
        self.lock().state.snapshot()
    }

    /// Reads the side channel once and applies a strictly newer detection.
    pub async fn poll_once(&self) -> PollOutcome {
        let published = match self.client.last_detection().await {
            Ok(Some(published)) => published,
            Ok(None) => return PollOutcome::Empty,
            Err(e) => {
                debug!(error = %e, "last detection unavailable");
                return PollOutcome::Unavailable;
            }
        };

        let fresh = self.with_state(|inner| {
            if published.timestamp > inner.last_seen_timestamp {
                inner.last_seen_timestamp = published.timestamp;
                true
            } else {
                false
            }
        });
        if !fresh {
            return PollOutcome::Stale;
        }

        info!(
            timestamp = published.timestamp,
            total = published.detection.total_vehicles(),
            "applying published detection"
        );
        self.render(&published.detection);
        let armed = self.with_state(|inner| self.schedule_next(inner, &published.detection));
        if let Some(seconds) = armed {
            self.display.show_countdown(seconds);
        }

        PollOutcome::Applied {
            timestamp: published.timestamp,
        }
    }

    /// Starts the periodic side-channel poll. The first poll runs right
    /// away; calling this while already polling does nothing.
    pub fn start_polling(&self) {
        let me = self.me.clone();
        let period = self.settings.poll_interval;
        self.with_state(|inner| {
            if inner.poller.is_armed() {
                return;
            }
            debug!(interval_ms = period.as_millis() as u64, "polling last detection");
            inner.poller.arm(run_poller(me, period));
        });
    }

    pub fn stop_polling(&self) {
        self.with_state(|inner| {
            inner.poller.cancel();
        });
    }

    pub fn is_polling(&self) -> bool {
        self.lock().poller.is_armed()
    }

    /// Cancels every timer and resets the state to its initial value.
    ///
    /// A request still in flight keeps the slot until it completes, so no
    /// new capture can overlap it; its result is discarded.
    pub fn shutdown(&self) {
        self.with_state(|inner| {
            inner.countdown.cancel();
            inner.countdown_generation += 1;
            inner.elapsed.cancel();
            inner.poller.cancel();
            inner.epoch += 1;

            let in_flight = inner.state.is_capturing();
            inner.state = CycleState::new(self.settings.mode);
            if in_flight {
                inner.state.begin_capture();
            }
            inner.params = self.settings.params;
            inner.last_seen_timestamp = 0.0;
        });
        info!("cycle controller shut down");
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` under the state lock and logs the resulting phase change.
    fn with_state<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut inner = self.lock();
        let before = inner.state.phase();
        let result = f(&mut inner);
        let after = inner.state.phase();

        if before != after {
            match before.transition_to(after) {
                Ok(_) => debug!(from = ?before, to = ?after, "cycle transition"),
                Err(e) => warn!("{}", e),
            }
        }
        result
    }

    /// Takes the in-flight slot, returning the params to send with.
    fn claim(inner: &mut Inner) -> Option<Claim> {
        inner.state.begin_capture().then_some(Claim {
            params: inner.params,
            epoch: inner.epoch,
        })
    }

    fn disarm_countdown(inner: &mut Inner) {
        inner.countdown.cancel();
        inner.countdown_generation += 1;
        inner.state.disarm_countdown();
    }

    async fn run(&self, request: DetectionRequest) -> CaptureOutcome {
        match self.with_state(Self::claim) {
            Some(claim) => self.execute(claim, request).await,
            None => {
                debug!("request already in flight; skipping");
                CaptureOutcome::Skipped
            }
        }
    }

    /// Performs a request whose slot has already been claimed.
    async fn execute(&self, claim: Claim, request: DetectionRequest) -> CaptureOutcome {
        let flight = InFlight::begin(self, claim.epoch);
        let capture_id = CaptureId::new();
        let params = claim.params;

        let result = match request {
            DetectionRequest::Camera => {
                debug!(%capture_id, confidence = params.confidence, iou = params.iou, "capturing frame");
                self.client.capture(params).await
            }
            DetectionRequest::Upload(source) => {
                debug!(%capture_id, source = %source.describe(), "uploading image");
                self.client.upload(source, params).await
            }
        };

        match result {
            Ok(detection) => {
                info!(
                    %capture_id,
                    total = detection.total_vehicles(),
                    green = detection.timings.green,
                    "detection received"
                );
                if !flight.is_current() {
                    debug!(%capture_id, "controller was shut down; discarding detection");
                    flight.settle(|_| ());
                    return CaptureOutcome::Completed(detection);
                }
                self.render(&detection);
                let armed = flight
                    .settle(|inner| self.schedule_next(inner, &detection))
                    .flatten();
                if let Some(seconds) = armed {
                    self.display.show_countdown(seconds);
                }
                CaptureOutcome::Completed(detection)
            }
            Err(error) => {
                warn!(%capture_id, error = %error, "detection request failed");
                if flight.is_current() {
                    self.display.show_error(&error.display_message());
                }
                flight.settle(|_| ());
                CaptureOutcome::Failed(error)
            }
        }
    }

    /// Runs a claimed request on its own task.
    fn spawn_claimed(&self, claim: Claim, reason: &'static str) {
        match self.me.upgrade() {
            Some(controller) => {
                debug!(reason, "scheduling capture");
                tokio::spawn(async move {
                    controller.execute(claim, DetectionRequest::Camera).await;
                });
            }
            None => self.with_state(|inner| inner.state.end_capture()),
        }
    }

    /// Pushes one detection to the display.
    fn render(&self, detection: &DetectionResult) {
        let (total, level) = DensityLevel::from_counts(&detection.counts);
        self.display.show_counts(&detection.counts);
        self.display.show_density(total, level);

        if let Some(url) = detection.input_image_url.as_deref() {
            self.display.show_input_image(url);
        }
        if !detection.processed_image_url.is_empty() {
            self.display.show_processed_image(&detection.processed_image_url);
        }

        self.display.show_light_times(detection.timings);
        self.display.show_error("");
    }

    /// Turns a detection into the next scheduled capture. In auto mode the
    /// latest detection always replaces the countdown; a non-positive green
    /// time leaves none armed.
    fn schedule_next(&self, inner: &mut Inner, detection: &DetectionResult) -> Option<u32> {
        if !inner.state.mode().is_auto() {
            return None;
        }

        let seconds = detection.timings.countdown_seconds();
        if seconds == 0 {
            Self::disarm_countdown(inner);
            return None;
        }

        inner.countdown_generation += 1;
        let generation = inner.countdown_generation;
        inner.state.arm_countdown(seconds);
        inner
            .countdown
            .arm(run_countdown(self.me.clone(), generation, self.settings.countdown_tick));
        debug!(seconds, "green countdown armed");
        Some(seconds)
    }

    /// One countdown step. Returns false once this countdown is over.
    fn countdown_tick(self: &Arc<Self>, generation: u64) -> bool {
        let step = self.with_state(|inner| {
            if inner.countdown_generation != generation {
                return None;
            }
            let remaining = inner.state.tick();
            if remaining > 0 {
                return Some((remaining, None, false));
            }
            inner.countdown.cancel();
            let busy = inner.state.is_capturing();
            Some((0, Self::claim(inner), busy))
        });

        let Some((remaining, claimed, busy)) = step else {
            return false;
        };
        self.display.show_countdown(remaining);
        if remaining > 0 {
            return true;
        }

        match claimed {
            Some(claim) => {
                let controller = Arc::clone(self);
                tokio::spawn(async move {
                    controller.execute(claim, DetectionRequest::Camera).await;
                });
            }
            None if busy => debug!("countdown elapsed during an in-flight request; not capturing"),
            None => {}
        }
        false
    }

    fn begin_ui(&self) {
        self.display.set_busy(true);
        self.display.show_error("");

        let display = Arc::clone(&self.display);
        let period = self.settings.elapsed_tick;
        self.with_state(|inner| {
            inner.elapsed.arm(async move {
                let started = Instant::now();
                let mut ticks = ticker(period);
                loop {
                    ticks.tick().await;
                    display.show_elapsed(started.elapsed());
                }
            })
        });
    }

    fn end_ui(&self) {
        self.display.show_elapsed(Duration::ZERO);
        self.display.set_busy(false);
    }
}

/// Holds the in-flight slot for one request.
///
/// `settle` releases it together with any follow-up state change in one
/// lock; dropping an unsettled guard releases it on its own. The follow-up
/// only runs if the controller has not been shut down since the claim.
struct InFlight<'a> {
    controller: &'a CycleController,
    epoch: u64,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn begin(controller: &'a CycleController, epoch: u64) -> Self {
        controller.begin_ui();
        Self {
            controller,
            epoch,
            settled: false,
        }
    }

    fn is_current(&self) -> bool {
        self.controller.lock().epoch == self.epoch
    }

    fn settle<R>(mut self, f: impl FnOnce(&mut Inner) -> R) -> Option<R> {
        let epoch = self.epoch;
        let result = self.controller.with_state(|inner| {
            inner.state.end_capture();
            inner.elapsed.cancel();
            (inner.epoch == epoch).then(|| f(inner))
        });
        self.settled = true;
        self.controller.end_ui();
        result
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        warn!("detection request abandoned; releasing in-flight slot");
        self.controller.with_state(|inner| {
            inner.state.end_capture();
            inner.elapsed.cancel();
        });
        self.controller.end_ui();
    }
}

async fn run_countdown(me: Weak<CycleController>, generation: u64, period: Duration) {
    let mut ticks = ticker(period);
    loop {
        ticks.tick().await;
        let Some(controller) = me.upgrade() else {
            return;
        };
        if !controller.countdown_tick(generation) {
            return;
        }
    }
}

async fn run_poller(me: Weak<CycleController>, period: Duration) {
    let mut ticks = time::interval(period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticks.tick().await;
        let Some(controller) = me.upgrade() else {
            return;
        };
        controller.poll_once().await;
    }
}
