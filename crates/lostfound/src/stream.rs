//! Agent stream consumer loop.
//!
//! One sequential loop per stream: await the next chunk (racing the
//! cancellation token), feed the parser, dispatch events synchronously,
//! repeat. A slow event callback therefore slows down reading.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use log::{debug, error};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use lostfound_protocol::{StreamEvent, StreamParser, StreamState};

use crate::error::ApiResult;

/// How a stream ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StreamOutcome {
    /// Done was reached and the completion callback ran.
    Completed {
        events: usize,
        /// `true` when the `[DONE]` sentinel ended the stream, `false` on
        /// end of transport.
        by_sentinel: bool,
    },
    /// The token fired before Done; the completion callback did not run.
    Cancelled { events: usize },
}

impl StreamOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub fn events(&self) -> usize {
        match self {
            Self::Completed { events, .. } | Self::Cancelled { events } => *events,
        }
    }
}

/// Drive a stream body to completion.
///
/// `on_event` runs once per valid frame in arrival order. `on_done` runs
/// exactly once when Done is reached, whether through the sentinel or the end
/// of the body, and never when `cancel` fires first. Transport errors
/// observed after cancellation are reported as [`StreamOutcome::Cancelled`].
pub async fn consume_stream<S, E, D>(
    mut body: S,
    cancel: &CancellationToken,
    mut on_event: E,
    on_done: D,
) -> ApiResult<StreamOutcome>
where
    S: Stream<Item = ApiResult<Bytes>> + Unpin,
    E: FnMut(StreamEvent),
    D: FnOnce(),
{
    let mut parser = StreamParser::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Stream cancelled after {} events", parser.dispatched());
                return Ok(StreamOutcome::Cancelled {
                    events: parser.dispatched(),
                });
            }
            next = body.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                if parser.push(&chunk, &mut on_event) == StreamState::Done {
                    break;
                }
            }
            Some(Err(e)) => {
                if cancel.is_cancelled() {
                    debug!("Stream aborted by cancellation: {}", e);
                    return Ok(StreamOutcome::Cancelled {
                        events: parser.dispatched(),
                    });
                }
                error!("Stream read failed: {}", e);
                return Err(e);
            }
            None => {
                parser.finish(&mut on_event);
                break;
            }
        }
    }

    drop(body);
    on_done();

    let outcome = StreamOutcome::Completed {
        events: parser.dispatched(),
        by_sentinel: parser.completed_by_sentinel(),
    };
    debug!("Stream finished: {:?}", outcome);
    Ok(outcome)
}
