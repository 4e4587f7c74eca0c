//! SSE parser for streaming `/responses` output.
//!
//! Bytes arrive in arbitrary chunks; [`SseDecoder`] buffers partial lines and
//! emits complete `data` payloads, which [`classify_event`] reduces to text
//! deltas. Everything other than output-text deltas and failure events is
//! ignored.

use crate::api::DeltaStream;
use crate::error::ApiError;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;

/// Incremental SSE decoder producing joined `data` payloads.
///
/// Events may contain multiple `data:` lines; payload lines are joined with
/// `\n` and finalized when a blank line is encountered.
#[derive(Debug, Default)]
pub(super) struct SseDecoder {
    buffer: Vec<u8>,
    data_lines: Vec<String>,
}

impl SseDecoder {
    /// Feed one chunk and return the payloads it completed.
    pub(super) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line = self.buffer.drain(..=pos).collect::<Vec<u8>>();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]).into_owned();
            self.line(&line, &mut payloads);
        }
        payloads
    }

    /// Flush whatever is left once the byte stream ends.
    pub(super) fn finish(&mut self) -> Vec<String> {
        let mut payloads = Vec::new();
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let rest = String::from_utf8_lossy(&rest).into_owned();
            self.line(&rest, &mut payloads);
        }
        self.flush(&mut payloads);
        payloads
    }

    fn line(&mut self, raw_line: &str, payloads: &mut Vec<String>) {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        if line.is_empty() {
            self.flush(payloads);
            return;
        }
        if line.starts_with(':') {
            return;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data_lines.push(value.to_string());
        }
    }

    fn flush(&mut self, payloads: &mut Vec<String>) {
        if self.data_lines.is_empty() {
            return;
        }
        payloads.push(self.data_lines.join("\n"));
        self.data_lines.clear();
    }
}

/// Reduce one event payload to an optional text delta.
///
/// `response.failed` and `error` events terminate the stream with an error.
pub(super) fn classify_event(payload: &str) -> Result<Option<String>, ApiError> {
    let payload = payload.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return Ok(None);
    }
    let event: Value = serde_json::from_str(payload)
        .map_err(|err| ApiError::InvalidResponse(format!("invalid streaming event payload: {err}")))?;
    match event
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
    {
        "response.output_text.delta" => Ok(event
            .get("delta")
            .and_then(Value::as_str)
            .filter(|delta| !delta.is_empty())
            .map(str::to_string)),
        "response.failed" => {
            let message = event
                .get("response")
                .and_then(|response| response.get("error"))
                .and_then(|error| error.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("response.failed event received");
            Err(ApiError::Stream(format!("streaming response failed: {message}")))
        }
        "error" => {
            let message = event
                .get("message")
                .or_else(|| event.get("error").and_then(|error| error.get("message")))
                .and_then(Value::as_str)
                .unwrap_or("error event received");
            Err(ApiError::Stream(format!("streaming response failed: {message}")))
        }
        _ => Ok(None),
    }
}

struct DeltaState<S> {
    bytes: S,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

/// Turn a raw SSE byte stream into a stream of text deltas.
///
/// The first error ends the stream; nothing is yielded after it.
pub(super) fn delta_stream<S, E>(bytes: S) -> DeltaStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    let state = DeltaState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };
    let stream = futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(payload) = state.pending.pop_front() {
                match classify_event(&payload) {
                    Ok(Some(delta)) => return Some((Ok(delta), state)),
                    Ok(None) => continue,
                    Err(err) => {
                        state.pending.clear();
                        state.finished = true;
                        return Some((Err(err), state));
                    }
                }
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let completed = state.decoder.push(&chunk);
                    state.pending.extend(completed);
                }
                Some(Err(err)) => {
                    state.finished = true;
                    return Some((Err(err.into()), state));
                }
                None => {
                    state.finished = true;
                    let rest = state.decoder.finish();
                    state.pending.extend(rest);
                }
            }
        }
    });
    Box::pin(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::{sse_done_block, sse_event_block};

    fn chunked(body: &str, size: usize) -> Vec<Result<Bytes, ApiError>> {
        body.as_bytes()
            .chunks(size)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect()
    }

    async fn collect(body: &str, size: usize) -> Vec<Result<String, ApiError>> {
        delta_stream(futures::stream::iter(chunked(body, size)))
            .collect::<Vec<_>>()
            .await
    }

    fn delta(text: &str) -> String {
        sse_event_block(
            "response.output_text.delta",
            &format!(
                r#"{{"type":"response.output_text.delta","delta":{}}}"#,
                Value::String(text.to_string())
            ),
        )
    }

    #[test]
    fn decoder_joins_data_lines_and_skips_comments() {
        let mut decoder = SseDecoder::default();
        let mut payloads = decoder.push(
            b": ping\n\
              event: demo\n\
              data: one\n\
              data: two\n\
              id: 1\n\
              \n\
              data: [DONE]\n",
        );
        payloads.extend(decoder.finish());
        assert_eq!(payloads, vec!["one\ntwo".to_string(), "[DONE]".to_string()]);
    }

    #[test]
    fn decoder_handles_crlf_and_split_lines() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"data: {\"a\"").is_empty());
        assert!(decoder.push(b":1}\r\n").is_empty());
        assert_eq!(decoder.push(b"\r\n"), vec![r#"{"a":1}"#.to_string()]);
    }

    #[test]
    fn classify_ignores_unrelated_events() {
        assert_eq!(
            classify_event(r#"{"type":"response.created","response":{}}"#).unwrap(),
            None
        );
        assert_eq!(classify_event("[DONE]").unwrap(), None);
        assert_eq!(
            classify_event(r#"{"type":"response.output_text.delta","delta":"hi"}"#).unwrap(),
            Some("hi".to_string())
        );
    }

    #[test]
    fn classify_reports_failures() {
        let err = classify_event(
            r#"{"type":"response.failed","response":{"error":{"message":"quota"}}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("quota"));

        let err = classify_event(r#"{"type":"error","message":"boom"}"#).unwrap_err();
        assert!(err.to_string().contains("boom"));

        assert!(classify_event("{not json").is_err());
    }

    #[tokio::test]
    async fn delta_stream_yields_fragments_in_order_across_chunk_boundaries() {
        let body = format!(
            "{}{}{}{}",
            sse_event_block("response.created", r#"{"type":"response.created"}"#),
            delta("Hel"),
            delta("lo"),
            sse_done_block()
        );
        for size in [1, 3, 7, body.len()] {
            let items = collect(&body, size).await;
            let texts: Vec<String> = items.into_iter().map(|item| item.unwrap()).collect();
            assert_eq!(texts, vec!["Hel".to_string(), "lo".to_string()], "chunk size {size}");
        }
    }

    #[tokio::test]
    async fn delta_stream_handles_multibyte_text_split_mid_character() {
        let body = format!("{}{}", delta("héllo ✓"), sse_done_block());
        let items = collect(&body, 1).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap(), "héllo ✓");
    }

    #[tokio::test]
    async fn delta_stream_stops_after_failure_event() {
        let body = format!(
            "{}{}{}",
            delta("partial"),
            sse_event_block(
                "response.failed",
                r#"{"type":"response.failed","response":{"error":{"message":"server overloaded"}}}"#
            ),
            delta("never")
        );
        let items = collect(&body, 16).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "partial");
        assert!(matches!(items[1], Err(ApiError::Stream(_))));
    }

    #[tokio::test]
    async fn delta_stream_flushes_unterminated_final_event() {
        let body = r#"data: {"type":"response.output_text.delta","delta":"tail"}"#;
        let items = collect(body, 5).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap(), "tail");
    }

    #[cfg(feature = "fuzz-tests")]
    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn decoder_output_is_independent_of_chunking(
                payloads in proptest::collection::vec(
                    proptest::string::string_regex("[ -~]{0,24}").expect("regex"),
                    0..8
                ),
                split in 1usize..16
            ) {
                let mut stream = String::new();
                for (idx, payload) in payloads.iter().enumerate() {
                    stream.push_str(": keepalive\n");
                    stream.push_str(&format!("event: e{idx}\n"));
                    stream.push_str("data: ");
                    stream.push_str(payload);
                    stream.push_str("\n\n");
                }

                let mut decoder = SseDecoder::default();
                let mut got = Vec::new();
                for chunk in stream.as_bytes().chunks(split) {
                    got.extend(decoder.push(chunk));
                }
                got.extend(decoder.finish());
                prop_assert_eq!(got, payloads);
            }
        }
    }
}
