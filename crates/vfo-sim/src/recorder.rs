//! Recording frequency setter

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vfo_link::{FrequencySetter, LinkError};

/// One recorded setter invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetterCall {
    /// Label of the setter that was called
    pub label: String,
    /// Requested frequency in Hz
    pub hz: u64,
}

/// Shared, ordered log of setter calls
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<SetterCall>>>,
}

impl CallLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: SetterCall) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
    }

    /// Snapshot of all calls so far
    pub fn calls(&self) -> Vec<SetterCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of calls so far
    pub fn len(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Check if no calls have been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frequencies requested from one setter, oldest first
    pub fn for_label(&self, label: &str) -> Vec<u64> {
        self.calls()
            .into_iter()
            .filter(|c| c.label == label)
            .map(|c| c.hz)
            .collect()
    }

    /// Forget all recorded calls
    pub fn clear(&self) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

/// A setter that only records what it was asked to do
#[derive(Debug)]
pub struct RecordingSetter {
    label: String,
    log: CallLog,
    failing: AtomicBool,
}

impl RecordingSetter {
    /// Create a setter that records into `log` under `label`
    pub fn new(label: impl Into<String>, log: &CallLog) -> Self {
        Self {
            label: label.into(),
            log: log.clone(),
            failing: AtomicBool::new(false),
        }
    }

    /// Make subsequent calls fail with a broken-pipe error
    ///
    /// Calls are still recorded while failing.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl FrequencySetter for RecordingSetter {
    async fn set_frequency(&self, hz: u64) -> Result<(), LinkError> {
        self.log.push(SetterCall {
            label: self.label.clone(),
            hz,
        });

        if self.failing.load(Ordering::SeqCst) {
            return Err(LinkError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                format!("{} is failing", self.label),
            )));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("recorder {}", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_in_order() {
        let log = CallLog::new();
        let a = RecordingSetter::new("a", &log);
        let b = RecordingSetter::new("b", &log);

        a.set_frequency(100).await.unwrap();
        b.set_frequency(200).await.unwrap();
        a.set_frequency(300).await.unwrap();

        assert_eq!(log.len(), 3);
        assert_eq!(log.for_label("a"), vec![100, 300]);
        assert_eq!(log.calls()[1], SetterCall { label: "b".into(), hz: 200 });
    }

    #[tokio::test]
    async fn test_failing_still_records() {
        let log = CallLog::new();
        let a = RecordingSetter::new("a", &log);
        a.set_failing(true);

        assert!(a.set_frequency(100).await.is_err());
        assert_eq!(log.for_label("a"), vec![100]);

        log.clear();
        assert!(log.is_empty());
    }
}
