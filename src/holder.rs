//! Bookkeeping shared by every data holder the renderer can own a GL
//! object for: a process-unique id, per-renderer modification words, and
//! release queues notified when the holder is dropped.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// How many renderers may track resources for the same holder at once.
/// Each renderer claims one slot in the modification words below.
pub const MAX_RESOURCE_INDICES: usize = 4;

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

/// Deferred-deletion queue. Holders push their uid here on drop; the binder
/// that owns the matching GL objects drains the queue from
/// `release_resources` on a thread where its context is current.
#[derive(Debug, Default)]
pub struct ReleaseQueue {
    uids: Mutex<Vec<u64>>,
}

impl ReleaseQueue {
    pub fn push(&self, uid: u64) {
        self.uids.lock().unwrap().push(uid);
    }

    pub fn drain(&self) -> Vec<u64> {
        std::mem::replace(&mut *self.uids.lock().unwrap(), Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.uids.lock().unwrap().is_empty()
    }
}

#[derive(Debug)]
pub struct ResourceHolder {
    uid: u64,
    label: Mutex<String>,
    // One word of change bits per renderer slot. Every mutation ORs its
    // bits into all slots; each renderer consumes its own word with a swap.
    modified: [AtomicU32; MAX_RESOURCE_INDICES],
    // Non-zero when the GL object id is owned by the caller and must never
    // be deleted by a renderer.
    external_gl_id: AtomicU32,
    release_queues: Mutex<Vec<Arc<ReleaseQueue>>>,
}

impl ResourceHolder {
    pub fn new() -> Self {
        ResourceHolder {
            uid: NEXT_UID.fetch_add(1, Ordering::Relaxed),
            label: Mutex::new(String::new()),
            modified: Default::default(),
            external_gl_id: AtomicU32::new(0),
            release_queues: Mutex::new(Vec::new()),
        }
    }

    #[inline]
    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn set_label<S: Into<String>>(&self, label: S) {
        *self.label.lock().unwrap() = label.into();
    }

    pub fn label(&self) -> String {
        self.label.lock().unwrap().clone()
    }

    /// Records a change in every renderer slot.
    pub fn on_changed(&self, bits: u32) {
        for word in &self.modified {
            word.fetch_or(bits, Ordering::Relaxed);
        }
    }

    /// Consumes and returns the pending change bits for one renderer slot.
    pub fn take_modified(&self, index: usize) -> u32 {
        debug_assert!(index < MAX_RESOURCE_INDICES);
        self.modified[index].swap(0, Ordering::Relaxed)
    }

    pub fn peek_modified(&self, index: usize) -> u32 {
        debug_assert!(index < MAX_RESOURCE_INDICES);
        self.modified[index].load(Ordering::Relaxed)
    }

    pub fn set_external_gl_id(&self, id: u32) {
        self.external_gl_id.store(id, Ordering::Relaxed);
    }

    /// The caller-owned GL id, if this holder wraps one.
    pub fn external_gl_id(&self) -> Option<u32> {
        match self.external_gl_id.load(Ordering::Relaxed) {
            0 => None,
            id => Some(id),
        }
    }

    pub fn register_release_queue(&self, queue: &Arc<ReleaseQueue>) {
        let mut queues = self.release_queues.lock().unwrap();
        if !queues.iter().any(|q| Arc::ptr_eq(q, queue)) {
            queues.push(Arc::clone(queue));
        }
    }
}

impl Default for ResourceHolder {
    fn default() -> Self {
        ResourceHolder::new()
    }
}

impl Drop for ResourceHolder {
    fn drop(&mut self) {
        let queues = self.release_queues.get_mut().unwrap();
        for queue in queues.iter() {
            queue.push(self.uid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uids_are_unique() {
        let a = ResourceHolder::new();
        let b = ResourceHolder::new();
        assert_ne!(a.uid(), b.uid());
    }

    #[test]
    fn modified_words_are_per_slot() {
        let holder = ResourceHolder::new();
        holder.on_changed(0b01);
        holder.on_changed(0b10);

        assert_eq!(holder.take_modified(0), 0b11);
        assert_eq!(holder.take_modified(0), 0);
        // Slot 1 still holds both changes.
        assert_eq!(holder.take_modified(1), 0b11);
    }

    #[test]
    fn drop_notifies_release_queues() {
        let queue = Arc::new(ReleaseQueue::default());
        let uid;
        {
            let holder = ResourceHolder::new();
            holder.register_release_queue(&queue);
            holder.register_release_queue(&queue);
            uid = holder.uid();
        }
        assert_eq!(queue.drain(), vec![uid]);
    }
}
