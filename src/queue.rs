// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::record::Record;
use crossbeam::queue::{ArrayQueue, SegQueue};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::debug;

enum Backlog {
    Bounded(ArrayQueue<Record>),
    Unbounded(SegQueue<Record>),
}

/// Result of waiting on the queue
#[derive(Debug)]
pub enum Dequeued {
    Record(Record),
    /// Queue closed and fully drained
    Closed,
    TimedOut,
}

/// Queue counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub len: usize,
    /// Oldest records dropped to make room
    pub evicted: usize,
    /// Records offered after close
    pub rejected: usize,
}

/// FIFO of records waiting for one upload worker
///
/// The producer side never blocks: when the backlog limit is reached the
/// oldest record is evicted. Closing the queue acts as the shutdown
/// sentinel, the worker still receives everything enqueued before it.
pub struct UploadQueue {
    backlog: Backlog,
    closed: AtomicBool,
    notify: Notify,
    evicted: AtomicUsize,
    rejected: AtomicUsize,
}

impl UploadQueue {
    /// Queue holding at most `max_backlog` records, unbounded when `None`
    pub fn new(max_backlog: Option<usize>) -> Self {
        let backlog = match max_backlog {
            Some(capacity) => Backlog::Bounded(ArrayQueue::new(capacity.max(1))),
            None => Backlog::Unbounded(SegQueue::new()),
        };

        Self {
            backlog,
            closed: AtomicBool::new(false),
            notify: Notify::new(),
            evicted: AtomicUsize::new(0),
            rejected: AtomicUsize::new(0),
        }
    }

    /// Append a record, evicting the oldest one if the queue is full
    pub fn enqueue(&self, record: Record) {
        if self.closed.load(Ordering::Acquire) {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            debug!("Upload queue closed, dropping record {}", record.date_time);
            return;
        }

        match &self.backlog {
            Backlog::Bounded(queue) => {
                if let Some(old) = queue.force_push(record) {
                    self.evicted.fetch_add(1, Ordering::Relaxed);
                    debug!("Upload backlog full, dropped oldest record {}", old.date_time);
                }
            }
            Backlog::Unbounded(queue) => queue.push(record),
        }

        self.notify.notify_one();
    }

    /// Remove the oldest record without waiting
    pub fn try_dequeue(&self) -> Option<Record> {
        match &self.backlog {
            Backlog::Bounded(queue) => queue.pop(),
            Backlog::Unbounded(queue) => queue.pop(),
        }
    }

    /// Wait up to `timeout` for the oldest record
    ///
    /// Returns [`Dequeued::Closed`] only once the queue is closed and empty.
    pub async fn dequeue_blocking(&self, timeout: Duration) -> Dequeued {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if let Some(record) = self.try_dequeue() {
                return Dequeued::Record(record);
            }

            if self.closed.load(Ordering::Acquire) {
                // A push may have landed between the pop and the flag check
                return match self.try_dequeue() {
                    Some(record) => Dequeued::Record(record),
                    None => Dequeued::Closed,
                };
            }

            // notify_one stores a permit, so a push racing this wait is not lost
            if tokio::time::timeout_at(deadline, self.notify.notified())
                .await
                .is_err()
            {
                return Dequeued::TimedOut;
            }
        }
    }

    /// Stop accepting records and wake the worker
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        match &self.backlog {
            Backlog::Bounded(queue) => queue.len(),
            Backlog::Unbounded(queue) => queue.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Backlog limit, `None` for an unbounded queue
    pub fn capacity(&self) -> Option<usize> {
        match &self.backlog {
            Backlog::Bounded(queue) => Some(queue.capacity()),
            Backlog::Unbounded(_) => None,
        }
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            len: self.len(),
            evicted: self.evicted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}
