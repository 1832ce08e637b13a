//! Adapter from a raw chunk stream to a stream of classified events.

use std::collections::VecDeque;
use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use llamalink_core::{ChatCompletionChunk, StreamClassifier, StreamEvent};
use serde::Deserialize;

use crate::transport::{ChunkStream, TransportError};

/// Events of one streamed turn, in emission order.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, TransportError>> + Send>>;

struct ClassifyState {
    chunks: ChunkStream,
    classifier: StreamClassifier,
    pending: VecDeque<StreamEvent>,
    finished: bool,
}

/// Classify a chunk stream with a fresh [`StreamClassifier`].
#[must_use]
pub fn classify(chunks: ChunkStream) -> EventStream {
    classify_with(chunks, StreamClassifier::new())
}

/// Classify a chunk stream with a caller-configured classifier.
///
/// When the chunk stream ends cleanly the classifier is finished, which
/// closes an open reasoning block. A transport error ends the event stream
/// after being yielded.
#[must_use]
pub fn classify_with(chunks: ChunkStream, classifier: StreamClassifier) -> EventStream {
    let state = ClassifyState {
        chunks,
        classifier,
        pending: VecDeque::new(),
        finished: false,
    };

    let stream = futures_util::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(event) = st.pending.pop_front() {
                return Some((Ok(event), st));
            }
            if st.finished {
                return None;
            }

            match st.chunks.next().await {
                Some(Ok(value)) => match ChatCompletionChunk::deserialize(&value) {
                    Ok(chunk) => st.pending.extend(st.classifier.push_chunk(&chunk)),
                    Err(source) => {
                        st.finished = true;
                        let line = value.to_string();
                        return Some((Err(TransportError::Protocol { line, source }), st));
                    }
                },
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(e), st));
                }
                None => {
                    st.finished = true;
                    st.pending.extend(st.classifier.finish());
                }
            }
        }
    });

    Box::pin(stream)
}
