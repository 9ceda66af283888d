use crate::domain::request::InboundRequest;
use crate::domain::verdict::OutboundResponse;
use crate::error::{BrokerError, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

/// Reads inbound requests, one JSON document per line.
///
/// Blank lines are skipped. A line that fails to parse yields an error for
/// that line only; reading continues with the next one.
pub struct RequestReader<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> RequestReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            lines: source.lines(),
        }
    }

    /// Returns `None` once the source is exhausted.
    pub async fn next_request(&mut self) -> Option<Result<InboundRequest>> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => return Some(Err(BrokerError::from(e))),
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&line).map_err(BrokerError::from));
        }
    }
}

/// Writes outbound responses, one JSON document per line.
pub struct ResponseWriter<W> {
    sink: W,
}

impl<W: AsyncWrite + Unpin> ResponseWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    pub async fn write_response(&mut self, response: &OutboundResponse) -> Result<()> {
        let mut line = serde_json::to_vec(response)?;
        line.push(b'\n');
        self.sink.write_all(&line).await?;
        self.sink.flush().await?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}
