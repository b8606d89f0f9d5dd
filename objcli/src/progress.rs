use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};
use log::debug;

use s3::progress::{ProgressEvent, ProgressEventType, ProgressListener};

// minimal interval between two status lines.
pub const SAMPLE_INTERVAL_MS: i64 = 1000;

pub struct AppendProgressListener {
    last_ms: i64,
    last_size: u64,
    curr_size: u64,
    out: Box<dyn Write + Send>,
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

impl AppendProgressListener {
    pub fn new() -> AppendProgressListener {
        AppendProgressListener::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> AppendProgressListener {
        AppendProgressListener {
            last_ms: 0,
            last_size: 0,
            curr_size: 0,
            out: out,
        }
    }

    /// Takes a sample and returns the status line when one is due.
    /// The first sample is only recorded, later ones print once the interval
    /// has passed or the transfer is completed.
    pub fn sample(&mut self, event: &ProgressEvent, now_ms: i64) -> Option<String> {
        let completed = match event.event_type {
            ProgressEventType::Data => false,
            ProgressEventType::Completed => true,
            ProgressEventType::Started => return None,
        };
        if self.last_ms == 0 {
            self.last_size = self.curr_size;
            self.curr_size = event.consumed_bytes;
            self.last_ms = now_ms;
            return None;
        }

        let cost = now_ms - self.last_ms;
        if cost <= SAMPLE_INTERVAL_MS && !completed {
            return None;
        }
        self.last_size = self.curr_size;
        self.curr_size = event.consumed_bytes;
        self.last_ms = now_ms;

        // bytes per ms, close enough to KB/s.
        let speed = self.curr_size.saturating_sub(self.last_size) as f64 / cost.max(1) as f64;
        let rate = if event.total_bytes == 0 {
            100.0
        } else {
            self.curr_size as f64 * 100.0 / event.total_bytes as f64
        };
        Some(format!("\rtotal append {}({:.2}%) byte,speed is {:.2}(KB/s)", event.consumed_bytes, rate, speed))
    }
}

impl ProgressListener for AppendProgressListener {
    fn progress_changed(&mut self, event: &ProgressEvent) {
        if let Some(line) = self.sample(event, now_ms()) {
            if let Err(err) = write!(self.out, "{}", line).and_then(|_| self.out.flush()) {
                debug!("failed to print progress, err: {}", err);
            }
        }
    }
}
