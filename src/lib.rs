//! Memory-bounded, chunked resampling of large 3D imaging volumes.
//!
//! Large tomography and CT datasets often do not fit in memory. This crate
//! computes a reduced-resolution rendition that fits a caller-supplied byte
//! budget, streaming the source volume in axis-aligned slabs instead of
//! loading it wholesale. Heterogeneous on-disk layouts are supported
//! through an immutable [`SourceDescriptor`] (element type, byte order,
//! C/Fortran ordering, header offset) and the [`SlabSource`] capability
//! trait; raw-binary and NumPy `.npy` backends are provided, with optional
//! gzip compression.
//!
//! For acquisition data, whose slowest axis indexes a projection angle
//! rather than a spatial dimension, that axis is never decimated and the
//! in-plane reduction is computed in 2D instead.
//!
//! ```no_run
//! use volsample::{NpySlabSource, OutputVolume, ResampleRequest, Resampler};
//!
//! let mut source = NpySlabSource::open("scan.npy")?;
//! let request = ResampleRequest::new(256 << 20)?;
//! let volume: OutputVolume<u16> = Resampler::new().resample(&mut source, &request)?;
//! # Ok::<(), volsample::VolsampleError>(())
//! ```
//!
//! [`SourceDescriptor`]: ./descriptor/struct.SourceDescriptor.html
//! [`SlabSource`]: ./source/trait.SlabSource.html
#![deny(missing_debug_implementations)]
#![warn(missing_docs, unused_extern_crates, trivial_casts)]

pub mod descriptor;
pub mod element;
pub mod error;
pub mod geometry;
pub mod plan;
pub mod resample;
pub mod sink;
pub mod source;
pub mod volume;

pub use crate::descriptor::{LayoutOrder, ResampleRequest, SourceDescriptor};
pub use crate::element::{DataElement, ElementType};
pub use crate::error::{Result, VolsampleError};
pub use crate::geometry::derive_geometry;
pub use crate::plan::{compute_target_plan, plan_slabs, TargetPlan};
pub use crate::resample::Resampler;
pub use crate::sink::{RawSink, VolumeMetadata, VolumeSink};
pub use crate::source::{InMemSlabSource, NpySlabSource, RawSlabSource, SlabSource};
pub use crate::volume::OutputVolume;
