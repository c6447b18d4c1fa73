//! Vertex and index buffer data holders.

use std::sync::{Arc, RwLock};

use gl::types::GLenum;

use crate::holder::ResourceHolder;
use crate::math::ByteRange;

pub type BufferObjectPtr = Arc<RwLock<BufferObject>>;
pub type IndexBufferPtr = Arc<RwLock<IndexBuffer>>;

pub mod change {
    /// The whole data store changed and must be re-specified.
    pub const DATA: u32 = 1 << 0;
    /// Only the recorded byte ranges changed.
    pub const SUB_DATA: u32 = 1 << 1;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BufferUsage {
    StaticDraw,
    DynamicDraw,
    StreamDraw,
}

impl From<BufferUsage> for GLenum {
    fn from(usage: BufferUsage) -> Self {
        match usage {
            BufferUsage::StaticDraw => gl::STATIC_DRAW,
            BufferUsage::DynamicDraw => gl::DYNAMIC_DRAW,
            BufferUsage::StreamDraw => gl::STREAM_DRAW,
        }
    }
}

/// Access intent for mapped buffer data.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MappingMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl MappingMode {
    pub fn access_bits(self) -> GLenum {
        match self {
            MappingMode::ReadOnly => gl::MAP_READ_BIT,
            MappingMode::WriteOnly => gl::MAP_WRITE_BIT,
            MappingMode::ReadWrite => gl::MAP_READ_BIT | gl::MAP_WRITE_BIT,
        }
    }
}

/// An active mapping of part of a buffer. `shadow` is present when the
/// driver could not map and the renderer handed out CPU memory to flush
/// with `BufferSubData` at unmap time.
pub struct MappedBuffer {
    pub ptr: *mut u8,
    pub range: ByteRange,
    pub mode: MappingMode,
    pub shadow: Option<Vec<u8>>,
}

// The pointer targets either driver memory valid until unmap or the shadow
// vector stored alongside it. Synchronizing access to the mapped bytes is
// the caller's contract.
unsafe impl Send for MappedBuffer {}
unsafe impl Sync for MappedBuffer {}

pub struct BufferObject {
    holder: ResourceHolder,
    data: Vec<u8>,
    struct_size: usize,
    usage: BufferUsage,
    sub_ranges: Vec<ByteRange>,
    mapped: Option<MappedBuffer>,
}

impl BufferObject {
    pub fn new(data: Vec<u8>, struct_size: usize, usage: BufferUsage) -> Self {
        let buffer = BufferObject {
            holder: ResourceHolder::new(),
            data,
            struct_size,
            usage,
            sub_ranges: Vec::new(),
            mapped: None,
        };
        buffer.holder.on_changed(change::DATA);
        buffer
    }

    pub fn holder(&self) -> &ResourceHolder {
        &self.holder
    }

    pub fn set_data(&mut self, data: Vec<u8>, struct_size: usize, usage: BufferUsage) {
        self.data = data;
        self.struct_size = struct_size;
        self.usage = usage;
        self.sub_ranges.clear();
        self.holder.on_changed(change::DATA);
    }

    /// Overwrites `range` with `bytes` and records the range for an
    /// incremental upload. Out-of-bounds edits log a warning and no-op.
    pub fn set_sub_data(&mut self, range: ByteRange, bytes: &[u8]) {
        if range.len != bytes.len() || range.end() > self.data.len() {
            warn!(
                "Ignoring buffer edit of {} bytes at offset {} (buffer holds {} bytes).",
                bytes.len(),
                range.offset,
                self.data.len()
            );
            return;
        }
        self.data[range.offset..range.end()].copy_from_slice(bytes);
        self.sub_ranges.push(range);
        self.holder.on_changed(change::SUB_DATA);
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn struct_size(&self) -> usize {
        self.struct_size
    }

    /// Number of whole structs in the data store.
    pub fn count(&self) -> usize {
        if self.struct_size == 0 {
            0
        } else {
            self.data.len() / self.struct_size
        }
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    pub fn pending_sub_ranges(&self) -> &[ByteRange] {
        &self.sub_ranges
    }

    pub fn clear_sub_ranges(&mut self) {
        self.sub_ranges.clear();
    }

    pub fn mapped(&self) -> Option<&MappedBuffer> {
        self.mapped.as_ref()
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped.is_some()
    }

    pub(crate) fn set_mapped(&mut self, mapped: MappedBuffer) {
        debug_assert!(self.mapped.is_none());
        self.mapped = Some(mapped);
    }

    pub(crate) fn take_mapped(&mut self) -> Option<MappedBuffer> {
        self.mapped.take()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IndexType {
    UnsignedByte,
    UnsignedShort,
    UnsignedInt,
}

impl IndexType {
    pub fn byte_size(self) -> usize {
        match self {
            IndexType::UnsignedByte => 1,
            IndexType::UnsignedShort => 2,
            IndexType::UnsignedInt => 4,
        }
    }
}

impl From<IndexType> for GLenum {
    fn from(ty: IndexType) -> Self {
        match ty {
            IndexType::UnsignedByte => gl::UNSIGNED_BYTE,
            IndexType::UnsignedShort => gl::UNSIGNED_SHORT,
            IndexType::UnsignedInt => gl::UNSIGNED_INT,
        }
    }
}

/// A buffer object whose contents are element indices.
pub struct IndexBuffer {
    base: BufferObject,
    index_type: IndexType,
}

impl IndexBuffer {
    pub fn new(data: Vec<u8>, index_type: IndexType, usage: BufferUsage) -> Self {
        IndexBuffer {
            base: BufferObject::new(data, index_type.byte_size(), usage),
            index_type,
        }
    }

    pub fn buffer(&self) -> &BufferObject {
        &self.base
    }

    pub fn buffer_mut(&mut self) -> &mut BufferObject {
        &mut self.base
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    /// Number of indices in the buffer.
    pub fn index_count(&self) -> usize {
        self.base.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_data_edits_local_copy_and_records_range() {
        let mut buffer = BufferObject::new(vec![0; 8], 4, BufferUsage::DynamicDraw);
        buffer.holder().take_modified(0);

        buffer.set_sub_data(ByteRange::new(2, 3), &[7, 8, 9]);
        assert_eq!(buffer.data(), &[0, 0, 7, 8, 9, 0, 0, 0]);
        assert_eq!(buffer.pending_sub_ranges(), &[ByteRange::new(2, 3)]);
        assert_eq!(buffer.holder().take_modified(0), change::SUB_DATA);
    }

    #[test]
    fn out_of_bounds_sub_data_is_ignored() {
        let mut buffer = BufferObject::new(vec![0; 4], 4, BufferUsage::StaticDraw);
        buffer.holder().take_modified(0);

        buffer.set_sub_data(ByteRange::new(2, 4), &[1, 2, 3, 4]);
        assert_eq!(buffer.data(), &[0, 0, 0, 0]);
        assert!(buffer.pending_sub_ranges().is_empty());
        assert_eq!(buffer.holder().take_modified(0), 0);
    }

    #[test]
    fn index_count_follows_index_type() {
        let buffer = IndexBuffer::new(vec![0; 12], IndexType::UnsignedShort, BufferUsage::StaticDraw);
        assert_eq!(buffer.index_count(), 6);
    }
}
