//! Line framing for `data: ...` streaming bodies.
//!
//! The response body arrives in arbitrary byte chunks. Chunks are buffered
//! until a full line is available, then each line is classified and JSON
//! payloads are decoded. The stream ends at `data: [DONE]`, at the end of
//! the body, or after the first fatal error.

use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use tracing::{debug, warn};

use super::error::TransportError;

/// Lazy, finite sequence of decoded chunk objects. Dropping it closes the
/// underlying connection.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Value, TransportError>> + Send>>;

const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum SseLine<'a> {
    /// Blank line, comment or other non-data field.
    Skip,
    /// `[DONE]` terminator.
    Done,
    /// JSON payload to decode.
    Data(&'a str),
    /// `error: ...` line sent by the server mid-stream.
    Error(&'a str),
}

pub(crate) fn classify_line(raw: &str) -> SseLine<'_> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with(':') {
        return SseLine::Skip;
    }

    let payload = if let Some(rest) = line.strip_prefix("data:") {
        rest.trim_start()
    } else if let Some(rest) = line.strip_prefix("error:") {
        return SseLine::Error(rest.trim_start());
    } else if line.starts_with("event:") || line.starts_with("id:") || line.starts_with("retry:")
    {
        return SseLine::Skip;
    } else {
        line
    };

    if payload == DONE_SENTINEL {
        SseLine::Done
    } else {
        SseLine::Data(payload)
    }
}

fn find_newline(buf: &BytesMut) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n').map(|pos| pos + 1)
}

struct LineState<S> {
    stream: S,
    buf: BytesMut,
    url: String,
    eof: bool,
    done: bool,
}

/// Decode a raw body stream into JSON chunk objects.
pub(crate) fn decode_chunks<S>(byte_stream: S, url: String) -> ChunkStream
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    let state = LineState {
        stream: byte_stream.boxed(),
        buf: BytesMut::new(),
        url,
        eof: false,
        done: false,
    };

    let stream = futures_util::stream::unfold(state, |mut st| async move {
        if st.done {
            return None;
        }

        loop {
            if let Some(line_end) = find_newline(&st.buf) {
                let line = st.buf.split_to(line_end);
                let text = String::from_utf8_lossy(&line);

                match classify_line(&text) {
                    SseLine::Skip => continue,
                    SseLine::Done => {
                        debug!(url = %st.url, "Stream finished");
                        return None;
                    }
                    SseLine::Data(payload) => {
                        return match serde_json::from_str::<Value>(payload) {
                            Ok(value) => Some((Ok(value), st)),
                            Err(source) => {
                                warn!(url = %st.url, error = %source, "Malformed stream line");
                                st.done = true;
                                let err = TransportError::Protocol {
                                    line: payload.to_string(),
                                    source,
                                };
                                Some((Err(err), st))
                            }
                        };
                    }
                    SseLine::Error(body) => {
                        warn!(url = %st.url, body, "Server reported an error mid-stream");
                        st.done = true;
                        let err = TransportError::Http {
                            url: st.url.clone(),
                            status: 500,
                            body: body.to_string(),
                        };
                        return Some((Err(err), st));
                    }
                }
            }

            if st.eof {
                debug!(url = %st.url, "Stream closed without [DONE]");
                return None;
            }

            match st.stream.next().await {
                Some(Ok(bytes)) => st.buf.extend_from_slice(&bytes),
                Some(Err(e)) => {
                    st.done = true;
                    let err = TransportError::from_reqwest(&st.url, e);
                    return Some((Err(err), st));
                }
                None => {
                    st.eof = true;
                    if !st.buf.is_empty() {
                        st.buf.extend_from_slice(b"\n");
                    }
                }
            }
        }
    });

    Box::pin(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_line() {
        assert_eq!(classify_line(""), SseLine::Skip);
        assert_eq!(classify_line("\r\n"), SseLine::Skip);
        assert_eq!(classify_line(": keep-alive"), SseLine::Skip);
        assert_eq!(classify_line("event: message"), SseLine::Skip);
        assert_eq!(classify_line("data: [DONE]"), SseLine::Done);
        assert_eq!(classify_line("data: {\"a\":1}\r"), SseLine::Data("{\"a\":1}"));
        assert_eq!(classify_line("data:{\"a\":1}"), SseLine::Data("{\"a\":1}"));
        assert_eq!(classify_line("{\"a\":1}"), SseLine::Data("{\"a\":1}"));
        assert_eq!(
            classify_line("error: {\"code\":500}"),
            SseLine::Error("{\"code\":500}")
        );
    }

    #[test]
    fn test_find_newline() {
        let buf = BytesMut::from(&b"ab\ncd"[..]);
        assert_eq!(find_newline(&buf), Some(3));
        assert_eq!(find_newline(&BytesMut::from(&b"abc"[..])), None);
    }
}
