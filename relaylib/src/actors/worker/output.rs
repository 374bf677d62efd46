use crate::types::JobId;
use bytes::BytesMut;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

const TAIL_LINES: usize = 20;
// ffmpeg redraws its progress line with '\r', a line without either terminator this long is cut
const MAX_LINE: usize = 4096;

/// The last few lines a transcoder wrote to stderr.
#[derive(Debug, Default)]
pub struct StderrTail {
    lines: VecDeque<String>,
}

impl StderrTail {
    pub fn push(&mut self, line: String) {
        if self.lines.len() == TAIL_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}

/// Read and discard everything until EOF.
pub async fn drain<R: AsyncRead + Unpin>(mut reader: R) {
    let mut buf = BytesMut::with_capacity(4096);
    loop {
        match reader.read_buf(&mut buf).await {
            Ok(n) if n > 0 => buf.clear(),
            _ => break,
        }
    }
}

/// Read stderr until EOF, logging each line and keeping the last ones in `tail`.
pub async fn collect_stderr<R: AsyncRead + Unpin>(
    job_id: JobId,
    mut reader: R,
    tail: Arc<Mutex<StderrTail>>,
) {
    let mut buf = BytesMut::with_capacity(MAX_LINE);
    let emit = |raw: &[u8]| {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        debug!(%job_id, "transcoder: {}", line);
        if let Ok(mut tail) = tail.lock() {
            tail.push(line.to_string());
        }
    };

    loop {
        match reader.read_buf(&mut buf).await {
            Ok(n) if n > 0 => {
                while let Some(pos) = buf.iter().position(|b| *b == b'\n' || *b == b'\r') {
                    let line = buf.split_to(pos + 1);
                    emit(&line[..pos]);
                }
                if buf.len() >= MAX_LINE {
                    emit(&buf[..]);
                    buf.clear();
                }
            }
            _ => break,
        }
    }
    // unterminated last line
    emit(&buf[..]);
}
