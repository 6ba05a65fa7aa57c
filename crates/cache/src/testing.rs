//! Configurable cache backend doubles for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use crate::backend::{BackendKind, CacheBackend, SharedBackend};
use crate::codec;
use crate::error::CacheError;

/// A recorded `set` call.
#[derive(Debug, Clone)]
pub struct SetCall {
    pub key: String,
    pub value: Bytes,
    pub expiry: Option<Duration>,
}

pub struct StubBackend {
    name: &'static str,
    kind: BackendKind,
    value: Option<Bytes>,
    delay: Duration,
    fail: bool,
    gets: AtomicUsize,
    sets: Mutex<Vec<SetCall>>,
}

impl StubBackend {
    pub fn new(name: &'static str, kind: BackendKind) -> Self {
        Self {
            name,
            kind,
            value: None,
            delay: Duration::ZERO,
            fail: false,
            gets: AtomicUsize::new(0),
            sets: Mutex::new(Vec::new()),
        }
    }

    pub fn memory(name: &'static str) -> Self {
        Self::new(name, BackendKind::Memory)
    }

    pub fn remote(name: &'static str) -> Self {
        Self::new(name, BackendKind::Remote)
    }

    /// Answers every `get` with `value`, encoded like a real cached payload.
    pub fn holding(mut self, value: &Value) -> Self {
        self.value = Some(codec::encode(value).unwrap());
        self
    }

    /// Answers every `get` with raw bytes.
    pub fn holding_raw(mut self, bytes: &'static [u8]) -> Self {
        self.value = Some(Bytes::from_static(bytes));
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fails every `get` and `set`.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> Vec<SetCall> {
        self.sets.lock().unwrap().clone()
    }
}

#[async_trait]
impl CacheBackend for StubBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn get(&self, _key: &str) -> Result<Option<Bytes>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(CacheError::Backend(format!("{} is down", self.name)));
        }
        Ok(self.value.clone())
    }

    async fn set(
        &self,
        key: &str,
        value: Bytes,
        expiry: Option<Duration>,
    ) -> Result<(), CacheError> {
        self.sets.lock().unwrap().push(SetCall {
            key: key.to_string(),
            value,
            expiry,
        });
        if self.fail {
            return Err(CacheError::Backend(format!("{} is down", self.name)));
        }
        Ok(())
    }
}

pub fn as_shared(backends: &[Arc<StubBackend>]) -> Vec<SharedBackend> {
    backends
        .iter()
        .map(|b| Arc::clone(b) as SharedBackend)
        .collect()
}

/// Polls `cond` until it holds, giving detached tasks time to run.
pub async fn eventually(cond: impl Fn() -> bool) {
    for _ in 0..100 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}
