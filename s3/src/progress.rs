use std::io;
use std::time::Duration;
use bytes::Bytes;
use hyper::Body;
use log::debug;
use tokio::io::AsyncReadExt;
use tokio::time::Instant;

const UPLOAD_CHUNK_SIZE: u64 = 256 * 1024;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressEventType {
    Started,
    Data,
    Completed,
}

#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent {
    pub event_type: ProgressEventType,
    // bytes sent so far.
    pub consumed_bytes: u64,
    pub total_bytes: u64,
    // bytes sent by this event.
    pub rw_bytes: u64,
}

pub trait ProgressListener: Send {
    fn progress_changed(&mut self, event: &ProgressEvent);
}

struct UploadState {
    file: tokio::fs::File,
    consumed: u64,
    total: u64,
    listener: Option<Box<dyn ProgressListener>>,
    max_speed: u64,
    started: Option<Instant>,
}

impl UploadState {
    fn publish(&mut self, event_type: ProgressEventType, rw_bytes: u64) {
        let event = ProgressEvent {
            event_type: event_type,
            consumed_bytes: self.consumed,
            total_bytes: self.total,
            rw_bytes: rw_bytes,
        };
        if let Some(listener) = self.listener.as_mut() {
            listener.progress_changed(&event);
        }
    }

    // sleeps until the average speed drops back under max_speed KB/s.
    async fn throttle(&mut self) {
        if self.max_speed == 0 {
            return;
        }
        let start = *self.started.get_or_insert_with(Instant::now);
        let expected = Duration::from_secs_f64(self.consumed as f64 / (self.max_speed * 1024) as f64);
        let elapsed = start.elapsed();
        if expected > elapsed {
            tokio::time::sleep(expected - elapsed).await;
        }
    }
}

async fn next_chunk(mut state: UploadState) -> io::Result<Option<(Bytes, UploadState)>> {
    if state.consumed >= state.total {
        return Ok(None);
    }
    let want = std::cmp::min(UPLOAD_CHUNK_SIZE, state.total - state.consumed) as usize;
    let mut buf = vec![0u8; want];
    let n = state.file.read(&mut buf).await?;
    if n == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof,
            format!("file ends at {} bytes, expect {} bytes", state.consumed, state.total)));
    }
    buf.truncate(n);
    state.consumed += n as u64;
    state.throttle().await;
    state.publish(ProgressEventType::Data, n as u64);
    if state.consumed == state.total {
        debug!("finished reading {} bytes for upload", state.total);
        state.publish(ProgressEventType::Completed, 0);
    }
    Ok(Some((Bytes::from(buf), state)))
}

/// Streams exactly `total` bytes of the file from its current offset,
/// reporting every chunk to the listener.
pub fn file_body(file: std::fs::File,
    total: u64,
    listener: Option<Box<dyn ProgressListener>>,
    max_speed: u64) -> Body {
    let mut state = UploadState {
        file: tokio::fs::File::from_std(file),
        consumed: 0,
        total: total,
        listener: listener,
        max_speed: max_speed,
        started: None,
    };
    state.publish(ProgressEventType::Started, 0);
    if total == 0 {
        state.publish(ProgressEventType::Completed, 0);
    }
    Body::wrap_stream(futures::stream::try_unfold(state, next_chunk))
}
