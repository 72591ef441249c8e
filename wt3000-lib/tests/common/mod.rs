//! Common test utilities and shared imports

// Allow unused imports and dead code since this is a shared module
// used across multiple test files - not all items are used in every test file
#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use wt3000_lib::command::{Command, Group, Header};
#[allow(unused_imports)]
pub use wt3000_lib::error::WTError;
#[allow(unused_imports)]
pub use wt3000_lib::state::{LinkState, NumericFormat, TransitionCondition};
#[allow(unused_imports)]
pub use wt3000_lib::transport::{Received, Transport};
#[allow(unused_imports)]
pub use wt3000_lib::WT3000;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One scripted outcome for a `receive()` call.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum Reply {
    Data(Vec<u8>),
    Truncated(Vec<u8>),
    Fail,
}

#[derive(Debug, Default)]
struct MockState {
    sent: Vec<Vec<u8>>,
    replies: VecDeque<Reply>,
    fail_sends: usize,
    capacities: Vec<usize>,
}

/// A scripted [`Transport`]. Clones share state, so a test can keep a handle
/// after moving the transport into a [`WT3000`].
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockState>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a complete response for the next `receive()`.
    pub fn reply(&self, data: &[u8]) {
        self.inner.lock().unwrap().replies.push_back(Reply::Data(data.to_vec()));
    }

    /// Queue a response the transport reports as cut short.
    pub fn reply_truncated(&self, data: &[u8]) {
        self.inner
            .lock()
            .unwrap()
            .replies
            .push_back(Reply::Truncated(data.to_vec()));
    }

    /// Queue a receive failure.
    pub fn reply_failure(&self) {
        self.inner.lock().unwrap().replies.push_back(Reply::Fail);
    }

    /// Make the next `count` sends fail.
    pub fn fail_sends(&self, count: usize) {
        self.inner.lock().unwrap().fail_sends = count;
    }

    /// Everything sent so far, one entry per `send()`, as text.
    pub fn sent(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .sent
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }

    /// Capacities requested by each `receive()` call.
    pub fn capacities(&self) -> Vec<usize> {
        self.inner.lock().unwrap().capacities.clone()
    }

    pub fn remaining_replies(&self) -> usize {
        self.inner.lock().unwrap().replies.len()
    }
}

impl Transport for MockTransport {
    fn send(&mut self, data: &[u8]) -> wt3000_lib::Result<()> {
        let mut state = self.inner.lock().unwrap();
        if state.fail_sends > 0 {
            state.fail_sends -= 1;
            return Err(WTError::Transport("mock send failure".to_string()));
        }
        state.sent.push(data.to_vec());
        Ok(())
    }

    fn receive(&mut self, capacity: usize) -> wt3000_lib::Result<Received> {
        let mut state = self.inner.lock().unwrap();
        state.capacities.push(capacity);
        match state.replies.pop_front() {
            Some(Reply::Data(data)) => {
                let truncated = data.len() > capacity;
                let data = Bytes::from(data[..data.len().min(capacity)].to_vec());
                Ok(Received { data, truncated })
            }
            Some(Reply::Truncated(data)) => Ok(Received {
                data: Bytes::from(data),
                truncated: true,
            }),
            Some(Reply::Fail) | None => Err(WTError::Transport("mock receive failure".to_string())),
        }
    }
}

/// Routes the driver's tracing output through the test harness. Set
/// `RUST_LOG=debug` to see the command/response traffic.
#[allow(dead_code)]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A facade over a fresh mock, plus a handle to inspect it.
#[allow(dead_code)]
pub fn mock_device() -> (WT3000<MockTransport>, MockTransport) {
    init_logging();
    let mock = MockTransport::new();
    (WT3000::new(mock.clone()), mock)
}
