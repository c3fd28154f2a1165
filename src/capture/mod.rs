//! Capture task: acquire + decode as one cancellable operation
//!
//! Wraps the codec in the session plumbing the rest of the system calls into:
//! a capture session owns its byte source for the duration of one capture,
//! runs the blocking decode on a dedicated blocking task, checks a
//! cooperative cancellation flag between words, and returns the immutable
//! [`Trace`] or the first error encountered. The byte source is dropped on
//! every exit path, including cancellation.

use std::io::Read;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::codec::{ChannelLayout, CodecError, RleDecoder, Trace};
use crate::config::CaptureConfig;

/// Capture error type
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Capture task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CaptureError {
    /// True when the capture ended through user cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Codec(e) if e.is_cancelled())
    }
}

/// Per-capture counters for monitoring
#[derive(Debug, Default)]
pub struct CaptureMetrics {
    /// Total bytes consumed from the byte source
    pub bytes_read: AtomicU64,
    /// Transition records in the finished trace
    pub transitions: AtomicU64,
}

/// Handle for cancelling a running capture
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Request cooperative cancellation; observed between words
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Byte source wrapper that counts consumed bytes into the session metrics
struct CountingReader<R> {
    inner: R,
    metrics: Arc<CaptureMetrics>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.metrics.bytes_read.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

/// One acquire + decode operation
///
/// The channel layout and sample budget are resolved once at construction
/// and fixed for the session. Sessions share no state: concurrent captures
/// each hold their own layout, cancellation flag and metrics.
#[derive(Debug)]
pub struct CaptureSession {
    layout: ChannelLayout,
    sample_budget: Option<u64>,
    cancel: Arc<AtomicBool>,
    metrics: Arc<CaptureMetrics>,
}

impl CaptureSession {
    /// Create a session from capture settings
    ///
    /// Fails before any decode attempt if the settings cannot be decoded:
    /// empty channel mask, non-RLE capture, or double-rate sampling.
    pub fn new(config: &CaptureConfig) -> Result<Self, CaptureError> {
        config
            .validate()
            .map_err(|e| CaptureError::Config(e.to_string()))?;
        let layout = config.channel_layout()?;

        Ok(Self {
            layout,
            sample_budget: config.sample_budget,
            cancel: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(CaptureMetrics::default()),
        })
    }

    /// Handle for cancelling this session from another task
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.cancel.clone())
    }

    /// Session metrics; live while the capture runs
    pub fn metrics(&self) -> Arc<CaptureMetrics> {
        self.metrics.clone()
    }

    /// Resolved channel layout for this session
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Decode the byte source on the calling thread
    ///
    /// The source is owned by the call and dropped on every exit path.
    pub fn run_blocking<R: Read>(&self, source: R) -> Result<Trace, CaptureError> {
        info!(
            mask = %format_args!("0x{:08x}", self.layout.mask()),
            width = self.layout.sample_width(),
            budget = self.sample_budget,
            "capture decode starting"
        );

        let mut decoder = RleDecoder::new(self.layout);
        if let Some(budget) = self.sample_budget {
            decoder = decoder.with_sample_budget(budget);
        }

        let counting = CountingReader {
            inner: source,
            metrics: self.metrics.clone(),
        };

        let result = decoder.decode(counting, &self.cancel);
        let bytes_read = self.metrics.bytes_read.load(Ordering::Relaxed);

        match result {
            Ok(trace) => {
                self.metrics
                    .transitions
                    .store(trace.len() as u64, Ordering::Relaxed);
                info!(
                    transitions = trace.len(),
                    bytes = bytes_read,
                    "capture decode complete"
                );
                Ok(trace)
            }
            Err(e) if e.is_cancelled() => {
                warn!(bytes = bytes_read, "capture cancelled");
                Err(e.into())
            }
            Err(e) => {
                warn!(error = %e, "capture failed");
                Err(e.into())
            }
        }
    }

    /// Run the capture on a blocking task
    ///
    /// The decode performs blocking reads, so it runs under
    /// `spawn_blocking`; the async caller only awaits completion.
    pub async fn run<R>(self, source: R) -> Result<Trace, CaptureError>
    where
        R: Read + Send + 'static,
    {
        let result = tokio::task::spawn_blocking(move || self.run_blocking(source)).await?;
        debug!(ok = result.is_ok(), "capture task joined");
        result
    }

    /// Run the capture, cancelling when the shutdown channel fires
    ///
    /// Maps the component-wide broadcast shutdown signal onto this session's
    /// cancellation flag, so a Ctrl+C tears the capture down cooperatively.
    pub async fn run_with_shutdown<R>(
        self,
        source: R,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<Trace, CaptureError>
    where
        R: Read + Send + 'static,
    {
        let cancel = self.cancel_handle();
        let watcher = tokio::spawn(async move {
            if shutdown.recv().await.is_ok() {
                info!("shutdown signal received, cancelling capture");
                cancel.cancel();
            }
        });

        let result = self.run(source).await;
        watcher.abort();
        result
    }
}
