//! The volume sink capability and the metadata record that travels with a
//! completed volume.
//!
//! Concrete serialization layouts (HDF5 group trees, METAImage headers,
//! NIfTI) belong to external collaborators; this module defines the
//! interface they implement, plus a bare raw-bytes file sink.
use crate::descriptor::{ResampleRequest, SourceDescriptor};
use crate::element::DataElement;
use crate::error::Result;
use crate::volume::OutputVolume;
use byteordered::Endianness;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Metadata describing a resampled volume in relation to its source,
/// mirroring the attribute set stored alongside downsampled datasets.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeMetadata {
    /// Shape of the original volume (stored axis order).
    pub original_shape: [usize; 3],
    /// Voxel spacing of the original volume.
    pub original_spacing: [f64; 3],
    /// Origin of the original volume.
    pub original_origin: [f64; 3],
    /// Whether the volume was cropped before resampling.
    pub cropped: bool,
    /// Whether the volume was resampled at all.
    pub resampled: bool,
    /// Whether the slowest axis was eligible for decimation.
    pub resample_z: bool,
    /// Voxel spacing of the output volume.
    pub output_spacing: [f64; 3],
    /// Origin of the output volume.
    pub output_origin: [f64; 3],
}

impl VolumeMetadata {
    /// Build the metadata record for a completed resample.
    pub fn for_resample<T: DataElement>(
        descriptor: &SourceDescriptor,
        request: &ResampleRequest,
        volume: &OutputVolume<T>,
    ) -> Self {
        VolumeMetadata {
            original_shape: descriptor.shape(),
            original_spacing: request.spacing(),
            original_origin: request.origin(),
            cropped: false,
            resampled: volume.shape() != descriptor.normalized_shape(),
            resample_z: request.resamples_z(),
            output_spacing: volume.spacing(),
            output_origin: volume.origin(),
        }
    }
}

/// Capability interface for receiving a completed volume.
///
/// Ownership of the volume stays with the caller; sinks only observe it.
pub trait VolumeSink<T: DataElement> {
    /// Accept a completed volume and its metadata record.
    fn write_volume(&mut self, volume: &OutputVolume<T>, metadata: &VolumeMetadata) -> Result<()>;
}

/// A sink that writes the bare voxel buffer to a byte sink in a fixed
/// byte order, dropping the metadata. Useful for raw-binary interchange
/// and as the smallest possible `VolumeSink` implementation.
#[derive(Debug)]
pub struct RawSink<W> {
    dest: W,
    byte_order: Endianness,
}

impl RawSink<BufWriter<File>> {
    /// Create a little-endian raw sink writing to a new file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(RawSink {
            dest: BufWriter::new(File::create(path)?),
            byte_order: Endianness::Little,
        })
    }
}

impl<W> RawSink<W>
where
    W: Write,
{
    /// Create a raw sink over any byte sink with the given byte order.
    pub fn new(dest: W, byte_order: Endianness) -> Self {
        RawSink { dest, byte_order }
    }

    /// Finish writing and recover the underlying sink.
    pub fn into_inner(self) -> W {
        self.dest
    }
}

impl<W, T> VolumeSink<T> for RawSink<W>
where
    W: Write,
    T: DataElement,
{
    fn write_volume(&mut self, volume: &OutputVolume<T>, _metadata: &VolumeMetadata) -> Result<()> {
        for &value in volume.data() {
            value.write_bytes(&mut self.dest, self.byte_order)?;
        }
        self.dest.flush()?;
        Ok(())
    }
}
