//! In-memory collaborators shared by the scheduler tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::feed::LinkSource;
use crate::notify::{Delivery, Notifier};
use crate::store::LinkStore;
use crate::{Error, Result};

/// Ordered record of side effects across fakes
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Returns queued responses, repeating the last one once the queue is drained
pub struct FakeSource {
    responses: Mutex<Vec<std::result::Result<String, String>>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl FakeSource {
    pub fn new(responses: Vec<std::result::Result<&str, &str>>) -> Self {
        let mut responses: Vec<_> = responses
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn always(link: &str) -> Self {
        Self::new(vec![Ok(link)])
    }

    /// Make every fetch take `delay` of (tokio) time
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LinkSource for FakeSource {
    async fn latest_link(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let mut responses = self.responses.lock().unwrap();
        let next = if responses.len() > 1 {
            responses.pop()
        } else {
            responses.last().cloned()
        };
        match next {
            Some(Ok(link)) => Ok(link),
            Some(Err(msg)) => Err(Error::FeedParse(msg)),
            None => Ok(String::new()),
        }
    }
}

/// How the fake notifier answers
#[derive(Clone, Copy)]
pub enum NotifyBehavior {
    Deliver,
    Reject,
    Fail,
}

pub struct RecordingNotifier {
    log: EventLog,
    behavior: NotifyBehavior,
}

impl RecordingNotifier {
    pub fn new(log: EventLog, behavior: NotifyBehavior) -> Self {
        Self { log, behavior }
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, link: &str) -> Result<Delivery> {
        self.log.lock().unwrap().push(format!("notify:{link}"));
        match self.behavior {
            NotifyBehavior::Deliver => Ok(Delivery::Delivered),
            NotifyBehavior::Reject => Ok(Delivery::Rejected {
                status: 500,
                body: "boom".to_string(),
            }),
            NotifyBehavior::Fail => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
        }
    }
}

pub struct MemoryStore {
    log: EventLog,
    value: Mutex<String>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new(log: EventLog, initial: &str) -> Self {
        Self {
            log,
            value: Mutex::new(initial.to_string()),
            fail_writes: false,
        }
    }

    pub fn failing(log: EventLog, initial: &str) -> Self {
        Self {
            fail_writes: true,
            ..Self::new(log, initial)
        }
    }

    pub fn value(&self) -> String {
        self.value.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LinkStore for MemoryStore {
    async fn get(&self) -> Result<String> {
        Ok(self.value())
    }

    async fn set(&self, link: &str) -> Result<()> {
        self.log.lock().unwrap().push(format!("set:{link}"));
        if self.fail_writes {
            return Err(Error::RemoteStore("throughput exceeded".to_string()));
        }
        *self.value.lock().unwrap() = link.to_string();
        Ok(())
    }
}
