//! Shared test fixtures for parser, client, orchestration and server tests.
//!
//! Keeping small reusable helpers here prevents each test module from
//! rebuilding temp-dir, SSE and stub-service code.

use crate::api::{DeltaStream, ResponsesApi, ResponsesRequest};
use crate::error::ApiError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temporary directory fixture with best-effort cleanup.
#[derive(Debug)]
pub struct TestTempDir {
    path: PathBuf,
}

impl TestTempDir {
    /// Create a unique temporary directory with a readable prefix.
    pub fn new(prefix: &str) -> Self {
        let suffix = TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let dir = std::env::temp_dir().join(format!("toolrelay-{prefix}-{millis}-{suffix}"));
        fs::create_dir_all(&dir).expect("failed to create temporary fixture directory");
        Self { path: dir }
    }

    /// Root directory path for this fixture.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build a child path under the fixture root.
    pub fn child(&self, relative: &str) -> PathBuf {
        self.path.join(relative)
    }

    /// Write UTF-8 text to a child path, creating parent directories as needed.
    pub fn write_text(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.child(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent directories for fixture");
        }
        fs::write(&path, content).expect("failed to write fixture file");
        path
    }
}

impl Drop for TestTempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Build one SSE event block with `event:` and `data:` lines.
pub fn sse_event_block(event: &str, data: &str) -> String {
    format!("event: {event}\ndata: {data}\n\n")
}

/// SSE stream terminator block used by OpenAI-compatible streams.
pub fn sse_done_block() -> &'static str {
    "data: [DONE]\n\n"
}

/// One scripted reply from [`StubApi`].
pub enum StubReply {
    /// Buffered payload for `create`.
    Json(Value),
    /// Delta items for `stream`, yielded in order.
    Deltas(Vec<Result<String, ApiError>>),
    /// Stream that yields the given deltas and then never ends.
    Hanging(Vec<String>),
    /// Immediate failure of either call.
    Fail(ApiError),
}

/// Scripted [`ResponsesApi`] that records every request it sees.
#[derive(Default)]
pub struct StubApi {
    replies: Mutex<VecDeque<StubReply>>,
    seen: Mutex<Vec<ResponsesRequest>>,
}

impl StubApi {
    pub fn new(replies: Vec<StubReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<ResponsesRequest> {
        self.seen.lock().expect("stub lock").clone()
    }

    fn next(&self, request: &ResponsesRequest) -> StubReply {
        self.seen.lock().expect("stub lock").push(request.clone());
        self.replies
            .lock()
            .expect("stub lock")
            .pop_front()
            .expect("stub ran out of scripted replies")
    }
}

#[async_trait]
impl ResponsesApi for StubApi {
    async fn create(&self, request: &ResponsesRequest) -> Result<Value, ApiError> {
        match self.next(request) {
            StubReply::Json(value) => Ok(value),
            StubReply::Fail(err) => Err(err),
            StubReply::Deltas(_) | StubReply::Hanging(_) => {
                panic!("stub scripted a stream reply for a buffered call")
            }
        }
    }

    async fn stream(&self, request: &ResponsesRequest) -> Result<DeltaStream, ApiError> {
        match self.next(request) {
            StubReply::Deltas(items) => Ok(Box::pin(futures::stream::iter(items))),
            StubReply::Hanging(items) => {
                use futures::StreamExt;
                let head = futures::stream::iter(items.into_iter().map(Ok));
                Ok(Box::pin(head.chain(futures::stream::pending())))
            }
            StubReply::Fail(err) => Err(err),
            StubReply::Json(_) => panic!("stub scripted a buffered reply for a stream call"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_dir_fixture_writes_and_resolves_paths() {
        let fixture = TestTempDir::new("fixture");
        let file = fixture.write_text("nested/file.txt", "hello");
        assert_eq!(fs::read_to_string(file).unwrap(), "hello");
        assert!(fixture.path().exists());
    }

    #[test]
    fn sse_helpers_emit_expected_wire_format() {
        let block = sse_event_block("response.output_text.delta", r#"{"delta":"hi"}"#);
        assert!(block.starts_with("event: response.output_text.delta\n"));
        assert!(block.ends_with("\n\n"));
        assert_eq!(sse_done_block(), "data: [DONE]\n\n");
    }
}
