use crate::config::CaptureConfig;
use crate::sample::Sample;
use crate::utils::unix_millis;
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// One grabbed image, before it becomes a [`Sample`].
#[derive(Debug, Clone)]
pub struct Frame {
    pub timestamp: u64,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Anything that can hand out the current picture of a video feed.
pub trait FrameSource: Send + 'static {
    /// `Ok(None)` means no frame is ready yet; the tick is skipped.
    fn grab(&mut self) -> anyhow::Result<Option<Frame>>;
}

/// Synthetic RGBA source: a moving gradient with a little noise.
pub struct MockFrameSource {
    width: u32,
    height: u32,
    mime_type: String,
    tick: u32,
}

impl MockFrameSource {
    pub fn new(cfg: &CaptureConfig) -> Self {
        MockFrameSource {
            width: cfg.width,
            height: cfg.height,
            mime_type: cfg.mime_type.clone(),
            tick: 0,
        }
    }
}

impl FrameSource for MockFrameSource {
    fn grab(&mut self) -> anyhow::Result<Option<Frame>> {
        let mut rng = rand::thread_rng();
        let mut data = Vec::with_capacity(rgba_len(self.width, self.height));
        for y in 0..self.height {
            for x in 0..self.width {
                data.push(x.wrapping_add(self.tick) as u8);
                data.push(y as u8);
                data.push(rng.gen::<u8>() >> 4);
                data.push(0xFF);
            }
        }
        self.tick = self.tick.wrapping_add(1);

        Ok(Some(Frame {
            timestamp: unix_millis(),
            width: self.width,
            height: self.height,
            mime_type: self.mime_type.clone(),
            data,
        }))
    }
}

fn rgba_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

/// Recorder state shared with the capture task
pub struct RecorderState {
    pub frames_captured: AtomicU64,
    pub is_active: AtomicBool,
}

impl RecorderState {
    pub fn new() -> Self {
        RecorderState {
            frames_captured: AtomicU64::new(0),
            is_active: AtomicBool::new(false),
        }
    }

    pub fn increment_frames(&self) {
        self.frames_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_frames(&self) -> u64 {
        self.frames_captured.load(Ordering::Acquire)
    }
}

impl Default for RecorderState {
    fn default() -> Self {
        Self::new()
    }
}

/// Samples a [`FrameSource`] at a fixed interval while recording is on.
pub struct SampleRecorder {
    interval: Duration,
    state: Arc<RecorderState>,
    samples: Arc<Mutex<Vec<Sample>>>,
    handle: Option<JoinHandle<()>>,
}

impl SampleRecorder {
    pub fn new(cfg: &CaptureConfig) -> Self {
        SampleRecorder {
            interval: Duration::from_millis(cfg.interval_ms.max(1)),
            state: Arc::new(RecorderState::new()),
            samples: Arc::new(Mutex::new(Vec::new())),
            handle: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.state.is_active.load(Ordering::Acquire)
    }

    pub fn state(&self) -> Arc<RecorderState> {
        self.state.clone()
    }

    pub fn start<S: FrameSource>(&mut self, mut source: S) {
        if self.is_recording() {
            tracing::warn!("recorder already running");
            return;
        }
        self.state.is_active.store(true, Ordering::Release);

        let state = self.state.clone();
        let samples = self.samples.clone();
        let interval = self.interval;
        tracing::info!("recording started (interval {:?})", interval);

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            while state.is_active.load(Ordering::Acquire) {
                ticker.tick().await;
                match source.grab() {
                    Ok(Some(frame)) => {
                        let sample =
                            Sample::from_image(frame.timestamp, frame.width, frame.height, &frame.mime_type, &frame.data);
                        samples.lock().await.push(sample);
                        state.increment_frames();
                    }
                    Ok(None) => tracing::debug!("no frame ready"),
                    Err(e) => tracing::warn!("frame capture failed: {:#}", e),
                }
            }
        }));
    }

    pub async fn stop(&mut self) {
        self.state.is_active.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
        tracing::info!("recording stopped after {} frames", self.state.total_frames());
    }

    pub async fn sample_count(&self) -> usize {
        self.samples.lock().await.len()
    }

    /// Move every captured sample out, in capture order, leaving the buffer empty.
    pub async fn take_samples(&self) -> Vec<Sample> {
        std::mem::take(&mut *self.samples.lock().await)
    }
}

impl Drop for SampleRecorder {
    fn drop(&mut self) {
        self.state.is_active.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
