//! Shared FIFO queue of planned downloads.

use crate::plan::ResourceDescriptor;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Ordered queue of resource descriptors consumed by concurrent workers.
///
/// `pop_next` is the only mutation; the mutex makes each claim linearizable
/// so a descriptor is never handed to two workers and never skipped. The
/// queue shrinks monotonically to empty.
#[derive(Debug)]
pub struct DownloadQueue {
    items: Mutex<VecDeque<ResourceDescriptor>>,
}

impl DownloadQueue {
    /// Create a queue from the planned descriptors, preserving plan order.
    pub fn new(descriptors: Vec<ResourceDescriptor>) -> Self {
        Self {
            items: Mutex::new(descriptors.into()),
        }
    }

    /// Claim the next descriptor, earliest-planned first.
    pub fn pop_next(&self) -> Option<ResourceDescriptor> {
        self.items.lock().expect("queue lock poisoned").pop_front()
    }

    /// Number of descriptors not yet claimed.
    pub fn len(&self) -> usize {
        self.items.lock().expect("queue lock poisoned").len()
    }

    /// Whether all descriptors have been claimed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
