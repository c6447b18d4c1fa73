//! Transform feedback capture holder.

use std::sync::{Arc, RwLock};

use crate::bufferobject::BufferObjectPtr;
use crate::holder::ResourceHolder;

pub type TransformFeedbackPtr = Arc<RwLock<TransformFeedback>>;

pub mod change {
    pub const CAPTURE_BUFFER: u32 = 1 << 0;
}

/// Captures primitives emitted between `begin_transform_feedback` and
/// `end_transform_feedback` into a buffer. Only one draw call may run per
/// capture; enforcing that is the caller's contract.
pub struct TransformFeedback {
    holder: ResourceHolder,
    capture_buffer: Option<BufferObjectPtr>,
}

impl TransformFeedback {
    pub fn new(capture_buffer: BufferObjectPtr) -> Self {
        let tf = TransformFeedback {
            holder: ResourceHolder::new(),
            capture_buffer: Some(capture_buffer),
        };
        tf.holder.on_changed(change::CAPTURE_BUFFER);
        tf
    }

    pub fn holder(&self) -> &ResourceHolder {
        &self.holder
    }

    pub fn set_capture_buffer(&mut self, buffer: Option<BufferObjectPtr>) {
        self.capture_buffer = buffer;
        self.holder.on_changed(change::CAPTURE_BUFFER);
    }

    pub fn capture_buffer(&self) -> Option<&BufferObjectPtr> {
        self.capture_buffer.as_ref()
    }
}
