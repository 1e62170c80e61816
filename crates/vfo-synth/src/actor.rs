//! Allocator actor
//!
//! The allocator is owned by a single task. MIDI callbacks feed it through a
//! bounded channel (see [`MidiAdapter`]) and it applies events strictly in
//! arrival order, retuning voices as it goes. Events the adapters drop on a
//! full queue are counted off the callback thread and reported from here.
//!
//! # Example
//!
//! ```rust,ignore
//! use vfo_synth::{spawn_allocator, ToneEvent};
//!
//! let handle = spawn_allocator(allocator, 1024);
//! handle.sender().send(ToneEvent::start(440)).await?;
//! let allocator = handle.shutdown().await?;
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::allocator::ToneSlotAllocator;
use crate::event::ToneEvent;
use crate::midi::MidiAdapter;

/// Run the allocator until `shutdown` becomes true or every sender is gone
///
/// All voices are silenced before the first event and again on exit. The
/// allocator is handed back so the caller can inspect its final state.
pub async fn run_allocator(
    allocator: ToneSlotAllocator,
    events: mpsc::Receiver<ToneEvent>,
    shutdown: watch::Receiver<bool>,
) -> ToneSlotAllocator {
    run_allocator_with_drops(allocator, events, shutdown, Arc::new(AtomicU64::new(0))).await
}

/// [`run_allocator`], also warning whenever `dropped` has grown
///
/// `dropped` is the counter shared with the [`MidiAdapter`]s feeding
/// `events`.
pub async fn run_allocator_with_drops(
    mut allocator: ToneSlotAllocator,
    mut events: mpsc::Receiver<ToneEvent>,
    mut shutdown: watch::Receiver<bool>,
    dropped: Arc<AtomicU64>,
) -> ToneSlotAllocator {
    info!("Allocator started with {} voices", allocator.voice_count());
    allocator.silence_all().await;

    let mut reported = dropped.load(Ordering::Relaxed);

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }

        tokio::select! {
            biased;

            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }

            event = events.recv() => {
                let Some(event) = event else { break; };
                let outcome = allocator.handle_event(event).await;
                debug!("{} -> {:?}", event, outcome);
                reported = report_drops(&dropped, reported);
            }
        }
    }

    report_drops(&dropped, reported);
    allocator.silence_all().await;
    info!("Allocator stopped");
    allocator
}

/// Warn about drops since `reported`; returns the new total
fn report_drops(dropped: &AtomicU64, reported: u64) -> u64 {
    let total = dropped.load(Ordering::Relaxed);
    if total > reported {
        warn!(
            "Event queue full, dropped {} event(s) ({} so far)",
            total - reported,
            total
        );
    }
    total
}

/// Handle to a spawned allocator task
pub struct AllocatorHandle {
    sender: mpsc::Sender<ToneEvent>,
    shutdown: watch::Sender<bool>,
    dropped: Arc<AtomicU64>,
    task: JoinHandle<ToneSlotAllocator>,
}

/// Spawn [`run_allocator`] with a queue of `capacity` events
pub fn spawn_allocator(allocator: ToneSlotAllocator, capacity: usize) -> AllocatorHandle {
    let (sender, events) = mpsc::channel(capacity.max(1));
    let (shutdown, shutdown_rx) = watch::channel(false);
    let dropped = Arc::new(AtomicU64::new(0));
    let task = tokio::spawn(run_allocator_with_drops(
        allocator,
        events,
        shutdown_rx,
        Arc::clone(&dropped),
    ));

    AllocatorHandle {
        sender,
        shutdown,
        dropped,
        task,
    }
}

impl AllocatorHandle {
    /// A sender for queueing tone events
    pub fn sender(&self) -> mpsc::Sender<ToneEvent> {
        self.sender.clone()
    }

    /// A MIDI adapter feeding this allocator
    ///
    /// Its drops are reported by the allocator task and counted in
    /// [`dropped`](Self::dropped).
    pub fn adapter(&self) -> MidiAdapter {
        MidiAdapter::with_drop_counter(self.sender(), Arc::clone(&self.dropped))
    }

    /// Events every adapter from [`adapter`](Self::adapter) lost to a full queue
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop the task immediately, discarding queued events
    pub async fn shutdown(self) -> Result<ToneSlotAllocator, JoinError> {
        let _ = self.shutdown.send(true);
        self.task.await
    }

    /// Let the task finish everything queued, then stop
    ///
    /// Waits until every other sender and adapter has been dropped too.
    pub async fn drain(self) -> Result<ToneSlotAllocator, JoinError> {
        let Self {
            sender,
            shutdown,
            task,
            ..
        } = self;
        drop(sender);
        let result = task.await;
        drop(shutdown);
        result
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use vfo_sim::{CallLog, RecordingSetter};

    use super::*;
    use crate::midi::Dispatch;
    use crate::slot::VoiceBinding;

    const CARRIER: u64 = 7_030_000;

    fn allocator(voices: usize, log: &CallLog) -> ToneSlotAllocator {
        let bindings = (0..voices)
            .map(|i| VoiceBinding::new(CARRIER, RecordingSetter::new(format!("v{}", i), log)))
            .collect();
        ToneSlotAllocator::new(bindings, 600).unwrap()
    }

    #[tokio::test]
    async fn test_drain_processes_queue_in_order() {
        let log = CallLog::new();
        let handle = spawn_allocator(allocator(2, &log), 16);

        let tx = handle.sender();
        tx.send(ToneEvent::start(440)).await.unwrap();
        tx.send(ToneEvent::start(660)).await.unwrap();
        tx.send(ToneEvent::stop(440)).await.unwrap();
        drop(tx);

        let alloc = handle.drain().await.unwrap();
        assert_eq!(alloc.sounding(), vec![None, None]);
        assert_eq!(
            log.for_label("v0"),
            vec![CARRIER + 600, CARRIER - 440, CARRIER + 600, CARRIER + 600]
        );
        assert_eq!(
            log.for_label("v1"),
            vec![CARRIER + 600, CARRIER - 660, CARRIER + 600]
        );
    }

    #[tokio::test]
    async fn test_shutdown_flag_stops_idle_task() {
        let log = CallLog::new();
        let handle = spawn_allocator(allocator(1, &log), 16);
        let _extra_sender = handle.sender();

        let alloc = tokio::time::timeout(Duration::from_secs(1), handle.shutdown())
            .await
            .expect("allocator should stop")
            .unwrap();
        assert_eq!(alloc.sounding(), vec![None]);
        // Silenced once on start and once on exit
        assert_eq!(log.for_label("v0"), vec![CARRIER + 600, CARRIER + 600]);
    }

    #[tokio::test]
    async fn test_stops_when_senders_dropped() {
        let log = CallLog::new();
        let (tx, rx) = mpsc::channel(4);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        tx.send(ToneEvent::start(500)).await.unwrap();
        drop(tx);

        let alloc = run_allocator(allocator(1, &log), rx, shutdown_rx).await;
        assert_eq!(alloc.sounding(), vec![None]);
        assert_eq!(
            log.for_label("v0"),
            vec![CARRIER + 600, CARRIER - 500, CARRIER + 600]
        );
    }

    #[tokio::test]
    async fn test_adapter_feeds_allocator() {
        let log = CallLog::new();
        let handle = spawn_allocator(allocator(1, &log), 16);

        let adapter = handle.adapter();
        adapter.handle_message(&[0x90, 69, 100]);
        drop(adapter);

        handle.drain().await.unwrap();
        assert!(log.for_label("v0").contains(&(CARRIER - 440)));
    }

    #[tokio::test]
    async fn test_handle_counts_adapter_drops() {
        let log = CallLog::new();
        let handle = spawn_allocator(allocator(1, &log), 1);

        // Single-threaded runtime: the task cannot run until we await
        let adapter = handle.adapter();
        assert!(matches!(adapter.handle_message(&[0x90, 69, 100]), Dispatch::Enqueued(_)));
        assert!(matches!(adapter.handle_message(&[0x80, 69, 0]), Dispatch::Dropped(_)));
        assert!(matches!(adapter.handle_message(&[0x90, 81, 100]), Dispatch::Dropped(_)));
        drop(adapter);

        assert_eq!(handle.dropped(), 2);
        let alloc = handle.drain().await.unwrap();
        assert_eq!(alloc.sounding(), vec![None]);
        assert_eq!(
            log.for_label("v0"),
            vec![CARRIER + 600, CARRIER - 440, CARRIER + 600]
        );
    }

    #[tokio::test]
    async fn test_drop_reporting_survives_preexisting_count() {
        let log = CallLog::new();
        let (tx, rx) = mpsc::channel(4);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let dropped = Arc::new(AtomicU64::new(5));

        tx.send(ToneEvent::start(500)).await.unwrap();
        drop(tx);

        let alloc =
            run_allocator_with_drops(allocator(1, &log), rx, shutdown_rx, Arc::clone(&dropped))
                .await;
        assert_eq!(alloc.sounding(), vec![None]);
        assert_eq!(report_drops(&dropped, 5), 5);
        dropped.fetch_add(2, Ordering::Relaxed);
        assert_eq!(report_drops(&dropped, 5), 7);
    }
}
