//! The streaming resampler.
//!
//! Drives a [`SlabSource`] through a [`TargetPlan`]: the output volume is
//! allocated once at full size, then each planned slab is read, resized
//! in-plane with nearest-neighbor selection, cast to the output element
//! type, and written to its destination plane. Slabs are processed in
//! strict destination order, so only one source slab and the output
//! buffer are resident at any time and the source volume is never fully
//! materialized.
//!
//! # Example
//!
//! ```no_run
//! use volsample::{ResampleRequest, Resampler, NpySlabSource, OutputVolume};
//!
//! let mut source = NpySlabSource::open("projections.npy")?;
//! let request = ResampleRequest::new(512 << 20)?.acquisition_data(true);
//! let volume: OutputVolume<f32> = Resampler::new()
//!     .on_progress(|f| eprintln!("{:3.0}%", f * 100.))
//!     .resample(&mut source, &request)?;
//! # Ok::<(), volsample::VolsampleError>(())
//! ```
//!
//! [`SlabSource`]: ../source/trait.SlabSource.html
//! [`TargetPlan`]: ../plan/struct.TargetPlan.html
use crate::descriptor::ResampleRequest;
use crate::element::DataElement;
use crate::error::{Result, VolsampleError};
use crate::geometry::derive_geometry;
use crate::plan::compute_target_plan;
use crate::source::SlabSource;
use crate::volume::OutputVolume;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Builder-style driver for one or more streaming resample operations.
///
/// Progress callbacks are invoked once per slab with a strictly
/// increasing fraction in `(0, 1]`; the callback signature is infallible,
/// so notification is best-effort by construction and can never abort a
/// resample. Cancellation is checked at each slab boundary.
#[derive(Default)]
pub struct Resampler<'a> {
    progress: Option<Box<dyn FnMut(f64) + 'a>>,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> Resampler<'a> {
    /// Create a resampler with no progress reporting or cancellation.
    pub fn new() -> Self {
        Resampler {
            progress: None,
            cancel: None,
        }
    }

    /// Register a progress callback, invoked after each completed slab.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(f64) + 'a,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Register a cancellation flag. When the flag is set, the resample
    /// stops at the next slab boundary with [`VolsampleError::Cancelled`],
    /// discarding the partially filled output.
    ///
    /// [`VolsampleError::Cancelled`]: ../error/enum.VolsampleError.html
    pub fn cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Resample the source volume down to the requested byte budget,
    /// producing a volume of element type `T`.
    ///
    /// The source element type is decoded per the descriptor and cast to
    /// `T`; widening casts are lossless, narrowing casts saturate to
    /// `T`'s range (see [`DataElement::from_f64`]).
    ///
    /// On any failure the partially filled output is discarded; a volume
    /// is only ever returned complete.
    ///
    /// [`DataElement::from_f64`]: ../element/trait.DataElement.html#tymethod.from_f64
    pub fn resample<S, T>(
        &mut self,
        source: &mut S,
        request: &ResampleRequest,
    ) -> Result<OutputVolume<T>>
    where
        S: SlabSource,
        T: DataElement,
    {
        let descriptor = source.descriptor().clone();
        let shape = descriptor.normalized_shape();
        let plan = compute_target_plan(shape, descriptor.total_bytes(), request)?;
        let (spacing, origin) = derive_geometry(request.spacing(), request.origin(), plan.scale())?;

        let [tz, ty, tx] = plan.target_shape();
        let [_, ny, nx] = shape;
        let element_type = descriptor.element_type();
        let byte_order = descriptor.byte_order();
        let element_size = element_type.size_of();

        let mut data = vec![T::zero(); tz * ty * tx];
        let mut slab_bytes = Vec::with_capacity(descriptor.plane_bytes());
        let total_slabs = plan.slabs().len();

        for slab in plan.slabs() {
            if let Some(flag) = self.cancel {
                if flag.load(Ordering::Relaxed) {
                    return Err(VolsampleError::Cancelled(slab.dst_index));
                }
            }
            source.read_slab_into(slab.src_start, slab.src_end, &mut slab_bytes)?;

            // nearest-neighbor: the slab's leading plane, sampled at
            // monotone source indices floor(out * src / dst)
            let plane = &mut data[slab.dst_index * ty * tx..(slab.dst_index + 1) * ty * tx];
            for oy in 0..ty {
                let sy = oy * ny / ty;
                for ox in 0..tx {
                    let sx = ox * nx / tx;
                    let offset = (sy * nx + sx) * element_size;
                    plane[oy * tx + ox] =
                        element_type.read_value(&slab_bytes[offset..], byte_order)?;
                }
            }

            if let Some(callback) = &mut self.progress {
                callback((slab.dst_index + 1) as f64 / total_slabs as f64);
            }
        }

        Ok(OutputVolume::new([tz, ty, tx], spacing, origin, data))
    }
}

impl<'a> fmt::Debug for Resampler<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Resampler")
            .field("has_progress", &self.progress.is_some())
            .field("has_cancel_flag", &self.cancel.is_some())
            .finish()
    }
}
