use futures::stream::BoxStream;
use futures::StreamExt;

use crate::types::types::{ClientError, ProgressRecord};

/// Raw response body chunks, in arrival order.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, ClientError>>;

/// Decodes a newline-delimited JSON body into `ProgressRecord`s.
///
/// The sequence is lazy and finite: each call to `next()` reads only as many
/// body chunks as needed to complete one line. After the first error or the
/// end of the body it yields `None` forever. Dropping the stream drops the
/// underlying response, which releases the connection.
pub struct RecordStream {
    inner: ByteStream,
    buf: Vec<u8>,
    finished: bool,
}

impl RecordStream {
    pub fn new(inner: ByteStream) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            finished: false,
        }
    }

    /// Wraps a `reqwest` response body.
    pub fn from_response(response: reqwest::Response) -> Self {
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(ClientError::from))
            .boxed();
        Self::new(body)
    }

    pub async fn next(&mut self) -> Option<Result<ProgressRecord, ClientError>> {
        if self.finished {
            return None;
        }

        loop {
            if let Some(line) = self.take_line() {
                match decode_line(&line) {
                    Some(Ok(record)) => return Some(Ok(record)),
                    Some(Err(e)) => {
                        self.finished = true;
                        return Some(Err(e));
                    }
                    None => continue, // blank line
                }
            }

            match self.inner.next().await {
                Some(Ok(chunk)) => self.buf.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                None => {
                    self.finished = true;
                    // A final line without a trailing newline.
                    let rest = std::mem::take(&mut self.buf);
                    return decode_line(&rest);
                }
            }
        }
    }

    /// Drains the remaining records. Used by tests and non-interactive callers.
    pub async fn collect(mut self) -> Result<Vec<ProgressRecord>, ClientError> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await {
            records.push(record?);
        }
        Ok(records)
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
        line.pop();
        Some(line)
    }
}

/// `None` for blank lines, otherwise the decoded record. A record carrying
/// an `error` field becomes `ClientError::Server`.
fn decode_line(line: &[u8]) -> Option<Result<ProgressRecord, ClientError>> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let record = match serde_json::from_str::<ProgressRecord>(text) {
        Ok(record) => record,
        Err(e) => {
            log::warn!("[record_stream] undecodable line {:?}: {}", text, e);
            return Some(Err(ClientError::Decode(e)));
        }
    };

    match record.error {
        Some(message) => Some(Err(ClientError::Server(message))),
        None => Some(Ok(record)),
    }
}
