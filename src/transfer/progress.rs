//! Progress reporting for streamed transfers
//!
//! [`ProgressObserver`] wraps any async byte sink. Writes are forwarded
//! unchanged while the observer counts bytes and, at most every 100ms,
//! refreshes a status line. Two presentation modes share the same state:
//! a live bar for interactive downloads and a single terse completion line
//! for batch and background runs.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::io::AsyncWrite;

/// Minimum wall-clock time between two status refreshes
pub const REPORT_INTERVAL: Duration = Duration::from_millis(100);

/// Width of the proportional bar in characters
pub const BAR_WIDTH: usize = 50;

/// How progress is presented to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressMode {
    /// Live bar refreshed while the transfer runs
    #[default]
    Live,
    /// One `completed: <name>` line when the transfer finishes
    Terse,
}

/// Byte accounting for one transfer
#[derive(Debug, Clone)]
pub struct ProgressState {
    pub bytes_written: u64,
    pub total_bytes: Option<u64>,
    pub started_at: Instant,
    pub last_report: Option<Instant>,
}

impl ProgressState {
    pub fn new(total_bytes: Option<u64>) -> Self {
        Self {
            bytes_written: 0,
            total_bytes,
            started_at: Instant::now(),
            last_report: None,
        }
    }

    pub fn record(&mut self, n: usize) {
        self.bytes_written += n as u64;
    }

    /// Percentage complete, if the total size is known
    pub fn percent(&self) -> Option<f64> {
        match self.total_bytes {
            Some(0) => Some(100.0),
            Some(total) => Some(self.bytes_written as f64 / total as f64 * 100.0),
            None => None,
        }
    }

    /// Average throughput since the transfer started, in bytes per second
    pub fn throughput(&self) -> f64 {
        let secs = self.started_at.elapsed().as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.bytes_written as f64 / secs
    }

    /// Returns true if a status refresh is due at `now`
    pub fn should_report(&self, now: Instant) -> bool {
        match self.last_report {
            Some(last) => now.duration_since(last) >= REPORT_INTERVAL,
            None => true,
        }
    }

    pub fn mark_reported(&mut self, now: Instant) {
        self.last_report = Some(now);
    }
}

/// Wraps a byte sink and reports transfer progress
pub struct ProgressObserver<W> {
    inner: W,
    name: String,
    mode: ProgressMode,
    state: ProgressState,
    bar: Option<ProgressBar>,
}

impl<W: AsyncWrite + Unpin> ProgressObserver<W> {
    /// Creates an observer
    ///
    /// # Arguments
    ///
    /// * `inner` - The sink receiving the bytes
    /// * `name` - The name shown in status lines, usually the file name
    /// * `total_bytes` - The expected size, if the server announced one
    /// * `mode` - Live bar or terse completion line
    pub fn new(inner: W, name: impl Into<String>, total_bytes: Option<u64>, mode: ProgressMode) -> Self {
        let name = name.into();
        let bar = match mode {
            ProgressMode::Live => Some(live_bar(&name, total_bytes)),
            ProgressMode::Terse => None,
        };

        Self {
            inner,
            name,
            mode,
            state: ProgressState::new(total_bytes),
            bar,
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> ProgressMode {
        self.mode
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Emits the final status and ends the progress display
    pub fn finish(&mut self) {
        match self.mode {
            ProgressMode::Live => {
                if let Some(bar) = &self.bar {
                    bar.set_position(self.state.bytes_written);
                    bar.finish_with_message(status_message(&self.state));
                }
            }
            ProgressMode::Terse => println!("completed: {}", self.name),
        }
    }

    /// Abandons the live bar without a completion line
    pub fn abandon(&mut self) {
        if let Some(bar) = &self.bar {
            bar.abandon();
        }
    }

    fn refresh(&mut self) {
        let now = Instant::now();
        if !self.state.should_report(now) {
            return;
        }
        self.state.mark_reported(now);

        if let Some(bar) = &self.bar {
            bar.set_position(self.state.bytes_written);
            bar.set_message(status_message(&self.state));
        }
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for ProgressObserver<W> {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(n)) = &poll {
            this.state.record(*n);
            this.refresh();
        }
        poll
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

fn live_bar(name: &str, total_bytes: Option<u64>) -> ProgressBar {
    let (bar, template) = match total_bytes {
        Some(total) => (
            ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stdout()),
            format!(
                "{{prefix}} {{percent:>3}}% [{{bar:{}}}] {{msg}}",
                BAR_WIDTH
            ),
        ),
        None => (
            ProgressBar::with_draw_target(None, ProgressDrawTarget::stdout()),
            "{prefix} {msg}".to_string(),
        ),
    };

    let style = ProgressStyle::with_template(&template)
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.set_prefix(name.to_string());
    bar
}

/// Transferred bytes, total when known, and average rate, all in
/// [`format_bytes`] units
fn status_message(state: &ProgressState) -> String {
    let rate = format_bytes(state.throughput() as u64);
    match state.total_bytes {
        Some(total) => format!(
            "{}/{} {}/s",
            format_bytes(state.bytes_written),
            format_bytes(total),
            rate
        ),
        None => format!("{} {}/s", format_bytes(state.bytes_written), rate),
    }
}

/// Formats a byte count with binary unit scaling
///
/// # Examples
///
/// ```
/// use rwget::transfer::format_bytes;
///
/// assert_eq!(format_bytes(512), "512 B");
/// assert_eq!(format_bytes(1536), "1.5 KB");
/// assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    const PREFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

    if bytes < UNIT {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / UNIT as f64;
    let mut exp = 0;
    while value >= UNIT as f64 && exp < PREFIXES.len() - 1 {
        value /= UNIT as f64;
        exp += 1;
    }
    format!("{:.1} {}B", value, PREFIXES[exp])
}
