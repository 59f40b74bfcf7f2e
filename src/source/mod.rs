//! The slab source capability, which feeds the streaming resampler.
//!
//! A slab is a contiguous run of planes along the memory-slowest axis of
//! the stored volume. Sources hand out slabs as raw bytes in stored order;
//! decoding of element type and byte order happens downstream, against the
//! declared [`SourceDescriptor`].
//!
//! The resampler consumes slabs strictly sequentially (non-overlapping
//! ranges, increasing), which is what allows forward-only byte sources
//! such as gzip streams to back a resample.
//!
//! [`SourceDescriptor`]: ../descriptor/struct.SourceDescriptor.html

pub mod npy;
pub mod raw;

pub use self::npy::{parse_npy_header, NpySlabSource};
pub use self::raw::RawSlabSource;

use crate::descriptor::SourceDescriptor;
use crate::error::{Result, VolsampleError};
use std::io::{Error as IoError, ErrorKind};

/// Default dataset path for NeXus tomography files, per the NXTomo
/// convention. Exported for collaborating HDF5 readers; this crate does
/// not read HDF5 itself.
pub const NXTOMO_DATASET_PATH: &str = "/entry1/tomo_entry/data/data";

/// Capability interface for reading a stored volume slab by slab.
///
/// The handle is exclusively owned by the calling context for the duration
/// of one resample; the resampler only reads through this interface and
/// never opens or closes anything.
pub trait SlabSource {
    /// The descriptor of the underlying volume.
    fn descriptor(&self) -> &SourceDescriptor;

    /// Read the planes `[start, end)` along the slowest normalized axis
    /// into `buffer`, replacing its contents. The buffer is resized to
    /// exactly `(end - start) * plane_bytes`.
    fn read_slab_into(&mut self, start: usize, end: usize, buffer: &mut Vec<u8>) -> Result<()>;

    /// Read the planes `[start, end)` into a fresh byte vector.
    fn read_slab(&mut self, start: usize, end: usize) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.read_slab_into(start, end, &mut buffer)?;
        Ok(buffer)
    }
}

/// Validate a requested slab range against the descriptor's slowest-axis
/// extent. Shared by the source implementations.
pub(crate) fn check_slab_range(
    descriptor: &SourceDescriptor,
    start: usize,
    end: usize,
) -> Result<()> {
    let extent = descriptor.normalized_shape()[0];
    if start >= end || end > extent {
        return Err(VolsampleError::SourceReadError(
            start,
            end,
            IoError::new(
                ErrorKind::InvalidInput,
                format!("slab range out of bounds for extent {}", extent),
            ),
        ));
    }
    Ok(())
}

/// A slab source over a byte buffer already resident in memory.
///
/// The buffer holds the bare array payload in stored order; any header
/// bytes are assumed to have been stripped, so the descriptor's header
/// offset is not consulted. Unlike the file-backed sources, slabs may be
/// requested in any order.
#[derive(Debug, Clone)]
pub struct InMemSlabSource {
    descriptor: SourceDescriptor,
    data: Vec<u8>,
}

impl InMemSlabSource {
    /// Create a source over the given payload bytes.
    ///
    /// # Errors
    ///
    /// `InvalidFormat` if the buffer length does not match the
    /// descriptor's payload size.
    pub fn new(descriptor: SourceDescriptor, data: Vec<u8>) -> Result<Self> {
        if data.len() as u64 != descriptor.total_bytes() {
            return Err(VolsampleError::InvalidFormat(format!(
                "payload is {} bytes, descriptor declares {}",
                data.len(),
                descriptor.total_bytes()
            )));
        }
        Ok(InMemSlabSource { descriptor, data })
    }

    /// Retrieve the full payload.
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }
}

impl SlabSource for InMemSlabSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    fn read_slab_into(&mut self, start: usize, end: usize, buffer: &mut Vec<u8>) -> Result<()> {
        check_slab_range(&self.descriptor, start, end)?;
        let plane = self.descriptor.plane_bytes();
        buffer.clear();
        buffer.extend_from_slice(&self.data[start * plane..end * plane]);
        Ok(())
    }
}
