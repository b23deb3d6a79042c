//! Live capture pipeline
//!
//! [`GestureRecognizer`] is the owned context object behind the live view. It
//! runs one `gesture-capture` thread that reads frames, evaluates gestures,
//! updates the session and publishes the latest `(frame, snapshot)` pair.
//! Everything else reads that pair, the session, or the lifecycle state
//! concurrently.
//!
//! Shared state is a single slot per resource. A reader copies out under the
//! lock; the writer replaces the whole slot. Landmark extraction, overlay
//! drawing and JPEG encoding never run while a lock is held.

use image::{imageops, RgbImage};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn};

use crate::capture::{FrameSource, FrameSourceFactory};
use crate::config::RecognizerConfig;
use crate::encoding::{encode_jpeg, multipart_chunk};
use crate::engine::GestureEngine;
use crate::error::RecognitionError;
use crate::landmarks::LandmarkSource;
use crate::overlay::draw_overlay;
use crate::report::{ReportEncoder, SessionReport};
use crate::session::Session;
use crate::types::{
    FrameSize, GestureSnapshot, PipelineState, RecentActivity, RecognizerStatus, SessionStats,
};

/// Consecutive failures (reads or panicking cycles) between repeated logs
const FAILURE_LOG_EVERY: u64 = 30;
/// Frames between debug heartbeats
const HEARTBEAT_EVERY: u64 = 30;

/// One completed cycle, as seen by readers
#[derive(Debug, Clone)]
pub struct PublishedFrame {
    /// JPEG bytes with the overlay applied
    pub jpeg: Arc<[u8]>,
    pub snapshot: GestureSnapshot,
    /// 1-based, increasing within a session
    pub frame_number: u64,
    pub recent: RecentActivity,
}

struct Shared {
    running: AtomicBool,
    state: Mutex<PipelineState>,
    published: Mutex<Option<PublishedFrame>>,
    session: Mutex<Session>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn set_state(&self, state: PipelineState) {
        *lock(&self.state) = state;
    }

    fn latest(&self) -> Option<PublishedFrame> {
        lock(&self.published).clone()
    }
}

/// Camera-driven gesture recognizer with an explicit start/stop lifecycle
pub struct GestureRecognizer {
    config: RecognizerConfig,
    factory: Arc<dyn FrameSourceFactory>,
    landmarks: Arc<dyn LandmarkSource>,
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    encoder: ReportEncoder,
}

impl GestureRecognizer {
    pub fn new(
        config: RecognizerConfig,
        factory: Arc<dyn FrameSourceFactory>,
        landmarks: Arc<dyn LandmarkSource>,
    ) -> Self {
        Self {
            config,
            factory,
            landmarks,
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                state: Mutex::new(PipelineState::Stopped),
                published: Mutex::new(None),
                session: Mutex::new(Session::start()),
            }),
            worker: Mutex::new(None),
            encoder: ReportEncoder::new(),
        }
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    /// Open the camera and launch the capture thread.
    ///
    /// Returns once the device is open. A fresh session (zeroed counters)
    /// begins only when the open succeeds.
    pub fn start(&self, camera_index: u32) -> Result<(), RecognitionError> {
        let mut worker = lock(&self.worker);
        if worker.is_some() && !self.shared.running.load(Ordering::SeqCst) {
            // the previous capture thread exited on its own; reap it
            if let Some(handle) = worker.take() {
                let _ = handle.join();
            }
        }
        if worker.is_some() {
            return Err(RecognitionError::AlreadyRunning);
        }

        self.shared.set_state(PipelineState::Starting);
        self.shared.running.store(true, Ordering::SeqCst);

        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let shared = Arc::clone(&self.shared);
        let factory = Arc::clone(&self.factory);
        let landmarks = Arc::clone(&self.landmarks);
        let config = self.config.clone();

        let spawned = thread::Builder::new()
            .name("gesture-capture".to_string())
            .spawn(move || {
                let source = match factory.open(camera_index) {
                    Ok(source) => source,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                *lock(&shared.session) = Session::start();
                *lock(&shared.published) = None;
                shared.set_state(PipelineState::Running);
                let _ = ready_tx.send(Ok(source.name()));

                let _guard = WorkerExitGuard {
                    shared: Arc::clone(&shared),
                };
                run_capture(&shared, source, landmarks.as_ref(), &config);
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.abort_start();
                return Err(e.into());
            }
        };

        match ready_rx.recv() {
            Ok(Ok(source_name)) => {
                info!(camera_index, source = %source_name, "recognizer started");
                *worker = Some(handle);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                self.abort_start();
                warn!(camera_index, error = %e, "recognizer failed to start");
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                self.abort_start();
                Err(RecognitionError::DeviceUnavailable {
                    index: camera_index,
                    reason: "capture thread exited before the device opened".to_string(),
                })
            }
        }
    }

    fn abort_start(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.set_state(PipelineState::Stopped);
    }

    /// Stop the capture thread and release the camera.
    ///
    /// The in-flight cycle completes first. Calling this while stopped does
    /// nothing. Session counters stay readable until the next `start`.
    pub fn stop(&self) {
        let mut worker = lock(&self.worker);
        let Some(handle) = worker.take() else {
            return;
        };

        self.shared.set_state(PipelineState::Stopping);
        self.shared.running.store(false, Ordering::SeqCst);
        if handle.join().is_err() {
            error!("capture thread panicked");
        }

        let stats = {
            let mut session = lock(&self.shared.session);
            session.finish();
            session.stats()
        };
        *lock(&self.shared.published) = None;
        self.shared.set_state(PipelineState::Stopped);
        info!(
            total_frames = stats.total_frames,
            duration_seconds = stats.duration_seconds,
            "recognizer stopped"
        );
    }

    pub fn state(&self) -> PipelineState {
        *lock(&self.shared.state)
    }

    pub fn is_running(&self) -> bool {
        self.state() == PipelineState::Running
    }

    /// Verdicts of the latest completed cycle; `None` until one completes
    pub fn current_snapshot(&self) -> Option<GestureSnapshot> {
        lock(&self.shared.published).as_ref().map(|p| p.snapshot)
    }

    /// JPEG bytes of the latest completed cycle
    pub fn latest_frame(&self) -> Option<Arc<[u8]>> {
        lock(&self.shared.published)
            .as_ref()
            .map(|p| Arc::clone(&p.jpeg))
    }

    /// The latest frame and its snapshot, read together
    pub fn latest(&self) -> Option<PublishedFrame> {
        self.shared.latest()
    }

    pub fn session_stats(&self) -> SessionStats {
        lock(&self.shared.session).stats()
    }

    pub fn status(&self) -> RecognizerStatus {
        let latest = self.latest();
        RecognizerStatus {
            running: self.is_running(),
            state: self.state(),
            current_gestures: latest.as_ref().map(|p| p.snapshot),
            recent: latest.map(|p| p.recent).unwrap_or_default(),
            stats: self.session_stats(),
        }
    }

    /// Write the current session report, replacing `path`
    pub fn persist_session_stats(&self, path: &Path) -> Result<SessionReport, RecognitionError> {
        let report = {
            let session = lock(&self.shared.session);
            self.encoder.encode(&session)
        };
        report.write_to(path)?;
        info!(path = %path.display(), "session stats saved");
        Ok(report)
    }

    /// Multipart MJPEG chunks at the configured stream interval
    pub fn frame_stream(&self) -> FrameStream {
        FrameStream {
            shared: Arc::clone(&self.shared),
            interval: self.config.stream_interval(),
            primed: false,
        }
    }
}

impl Drop for GestureRecognizer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Blocking iterator over the live view.
///
/// Each tick yields the latest published frame, so a slow consumer skips
/// frames rather than queueing them. Ends once the recognizer stops.
pub struct FrameStream {
    shared: Arc<Shared>,
    interval: Duration,
    primed: bool,
}

impl Iterator for FrameStream {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.primed {
            thread::sleep(self.interval);
        }
        self.primed = true;

        loop {
            if !self.shared.running.load(Ordering::SeqCst) {
                return None;
            }
            if let Some(frame) = self.shared.latest() {
                return Some(multipart_chunk(&frame.jpeg, frame.frame_number));
            }
            thread::sleep(self.interval);
        }
    }
}

fn run_capture(
    shared: &Shared,
    mut source: Box<dyn FrameSource>,
    landmarks: &dyn LandmarkSource,
    config: &RecognizerConfig,
) {
    let span = info_span!(
        "gesture.capture",
        source = %source.name(),
        landmarks = %landmarks.name()
    );
    let _enter = span.enter();

    let pause = config.cycle_pause();
    let mut engine = GestureEngine::new(config.thresholds.clone(), &config.buffers);
    let mut frame_number: u64 = 0;
    let mut read_failures: u64 = 0;
    let mut panics: u64 = 0;

    while shared.running.load(Ordering::SeqCst) {
        let frame = match source.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                read_failures += 1;
                if read_failures == 1 || read_failures % FAILURE_LOG_EVERY == 0 {
                    warn!(
                        error = %e,
                        consecutive = read_failures,
                        "frame read failed, skipping cycle"
                    );
                }
                thread::sleep(pause);
                continue;
            }
        };
        if read_failures > 0 {
            debug!(after = read_failures, "frame reads recovered");
            read_failures = 0;
        }

        let cycle = panic::catch_unwind(AssertUnwindSafe(|| {
            run_cycle(shared, frame, landmarks, &mut engine, config, frame_number + 1)
        }));
        match cycle {
            Ok(Ok(published)) => {
                frame_number = published.frame_number;
                *lock(&shared.published) = Some(published);
                if frame_number % HEARTBEAT_EVERY == 0 {
                    debug!(frame_number, "capture heartbeat");
                }
            }
            Ok(Err(e)) => {
                frame_number += 1;
                error!(error = %e, frame_number, "frame encoding failed");
            }
            Err(payload) => {
                panics += 1;
                if panics == 1 || panics % FAILURE_LOG_EVERY == 0 {
                    error!(
                        panic = panic_message(payload.as_ref()),
                        count = panics,
                        "capture cycle panicked, skipping cycle"
                    );
                }
            }
        }

        thread::sleep(pause);
    }

    drop(source);
    debug!(frames = frame_number, "capture loop exited, device released");
}

/// One detection cycle: mirror, evaluate, count, annotate, encode.
///
/// The session is updated before encoding, so a frame that fails to encode
/// still counts.
fn run_cycle(
    shared: &Shared,
    mut frame: RgbImage,
    landmarks: &dyn LandmarkSource,
    engine: &mut GestureEngine,
    config: &RecognizerConfig,
    frame_number: u64,
) -> Result<PublishedFrame, RecognitionError> {
    if config.capture.mirror {
        imageops::flip_horizontal_in_place(&mut frame);
    }
    let size = FrameSize::new(frame.width(), frame.height());
    let detected = landmarks.extract(&frame);
    let snapshot = engine.evaluate(&detected, size);

    let fps = {
        let mut session = lock(&shared.session);
        session.record(&snapshot);
        session.stats().fps
    };

    draw_overlay(&mut frame, &snapshot, Some(fps), &config.overlay);
    let jpeg = encode_jpeg(&frame, config.jpeg_quality)?;
    Ok(PublishedFrame {
        jpeg: Arc::from(jpeg),
        snapshot,
        frame_number,
        recent: engine.recent_activity(),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Marks the pipeline stopped if the capture thread exits without `stop()`
struct WorkerExitGuard {
    shared: Arc<Shared>,
}

impl Drop for WorkerExitGuard {
    fn drop(&mut self) {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        error!("capture thread exited unexpectedly, pipeline stopped");
        lock(&self.shared.session).finish();
        *lock(&self.shared.published) = None;
        self.shared.set_state(PipelineState::Stopped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::BlankSourceFactory;
    use crate::landmarks::NoLandmarks;

    fn recognizer() -> GestureRecognizer {
        let config = RecognizerConfig {
            cycle_pause_ms: 1,
            stream_interval_ms: 1,
            ..Default::default()
        };
        GestureRecognizer::new(
            config,
            Arc::new(BlankSourceFactory {
                width: 64,
                height: 48,
            }),
            Arc::new(NoLandmarks),
        )
    }

    fn wait_for_frame(recognizer: &GestureRecognizer) -> PublishedFrame {
        for _ in 0..500 {
            if let Some(frame) = recognizer.latest() {
                return frame;
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("no frame published");
    }

    #[test]
    fn test_no_data_before_start() {
        let recognizer = recognizer();
        assert_eq!(recognizer.state(), PipelineState::Stopped);
        assert!(recognizer.current_snapshot().is_none());
        assert!(recognizer.latest_frame().is_none());
        assert_eq!(recognizer.session_stats().total_frames, 0);
    }

    #[test]
    fn test_start_publishes_frames() {
        let recognizer = recognizer();
        recognizer.start(0).unwrap();
        assert!(recognizer.is_running());

        let frame = wait_for_frame(&recognizer);
        assert!(frame.frame_number >= 1);
        assert_eq!(&frame.jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!(frame.snapshot, GestureSnapshot::default());

        recognizer.stop();
        assert_eq!(recognizer.state(), PipelineState::Stopped);
        assert!(recognizer.current_snapshot().is_none());
        assert!(recognizer.session_stats().total_frames >= 1);
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let recognizer = recognizer();
        recognizer.start(0).unwrap();
        assert!(matches!(
            recognizer.start(0),
            Err(RecognitionError::AlreadyRunning)
        ));
        recognizer.stop();
    }

    #[test]
    fn test_frame_stream_chunks_and_ends() {
        let recognizer = recognizer();
        recognizer.start(0).unwrap();
        wait_for_frame(&recognizer);

        let mut stream = recognizer.frame_stream();
        let chunk = stream.next().unwrap();
        assert!(chunk.starts_with(b"--frame\r\nX-Sequence: "));

        recognizer.stop();
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_status_shape() {
        let recognizer = recognizer();
        let status = recognizer.status();
        assert!(!status.running);
        assert_eq!(status.state, PipelineState::Stopped);
        assert!(status.current_gestures.is_none());
        assert_eq!(status.recent.window_frames, 0);
    }
}
