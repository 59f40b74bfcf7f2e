//! Target shape calculation and slab planning.
//!
//! The calculator decides how much each axis shrinks for a given byte
//! budget; the planner turns the slowest-axis stride into the ordered
//! sequence of source slabs that the streaming loop consumes. Both are
//! pure and deterministic, so a plan can be recomputed and cross-checked
//! at any time.
use crate::descriptor::ResampleRequest;
use crate::error::{Result, VolsampleError};

/// One planned slab: the half-open source range `[src_start, src_end)`
/// along the slowest axis, and the output plane it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlabRange {
    /// First source plane of the slab (inclusive).
    pub src_start: usize,
    /// Last source plane of the slab (exclusive).
    pub src_end: usize,
    /// 0-based position of the produced plane in the output's slowest axis.
    pub dst_index: usize,
}

/// A complete, immutable plan for one resample operation.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPlan {
    target_shape: [usize; 3],
    slab_stride: usize,
    slabs: Vec<SlabRange>,
    scale: [f64; 3],
}

impl TargetPlan {
    /// The output shape, slowest-to-fastest axis order.
    pub fn target_shape(&self) -> [usize; 3] {
        self.target_shape
    }

    /// Source planes consumed per output plane along the slowest axis.
    pub fn slab_stride(&self) -> usize {
        self.slab_stride
    }

    /// The planned slabs, in increasing destination order.
    pub fn slabs(&self) -> &[SlabRange] {
        &self.slabs
    }

    /// The achieved per-axis scale factors (output extent / source extent),
    /// slowest-to-fastest axis order.
    pub fn scale(&self) -> [f64; 3] {
        self.scale
    }
}

/// Compute the target shape and slab plan for resampling a volume of the
/// given normalized shape (slowest-to-fastest) and payload size down to
/// the request's byte budget.
///
/// In the default mode the volume is treated as isotropically reducible:
/// a uniform linear magnification `m = (budget / total) ^ (1/3)` applies
/// to the in-plane axes, and the slowest axis is decimated by the integer
/// stride `max(1, floor(1/m))` with nearest-slice selection. When the
/// request pins the slowest axis (acquisition data, or `resample_z` off),
/// the stride is 1 and the in-plane magnification solves the 2D reduction
/// `m = (budget / total) ^ (1/2)` instead.
///
/// `m` is clamped to 1.0, so a budget at or above the source size yields
/// the identity shape.
///
/// # Errors
///
/// - `InvalidBudget` if `total_bytes` is zero (an empty source cannot be
///   sized against a budget).
/// - `DegenerateShape` if an in-plane target extent rounds down to zero.
pub fn compute_target_plan(
    shape: [usize; 3],
    total_bytes: u64,
    request: &ResampleRequest,
) -> Result<TargetPlan> {
    if total_bytes == 0 {
        return Err(VolsampleError::InvalidBudget);
    }
    let ratio = request.target_byte_budget() as f64 / total_bytes as f64;
    let decimate_z = request.decimates_slowest_axis();

    let (magnification, slab_stride) = if decimate_z {
        let m = ratio.cbrt().min(1.0);
        (m, ((1.0 / m).floor() as usize).max(1))
    } else {
        (ratio.sqrt().min(1.0), 1)
    };

    let slabs = plan_slabs(shape[0], slab_stride);
    // closed form for the boundary walk; must agree with the planner
    let expected_nz = (shape[0] + slab_stride - 1) / slab_stride;
    assert_eq!(
        slabs.len(),
        expected_nz,
        "slab plan does not match the slowest-axis extent"
    );

    let ty = (magnification * shape[1] as f64).floor() as usize;
    let tx = (magnification * shape[2] as f64).floor() as usize;
    if ty == 0 {
        return Err(VolsampleError::DegenerateShape(1));
    }
    if tx == 0 {
        return Err(VolsampleError::DegenerateShape(2));
    }

    let target_shape = [slabs.len(), ty, tx];
    let scale = [
        target_shape[0] as f64 / shape[0] as f64,
        ty as f64 / shape[1] as f64,
        tx as f64 / shape[2] as f64,
    ];
    Ok(TargetPlan {
        target_shape,
        slab_stride,
        slabs,
        scale,
    })
}

/// Produce the ordered slab sequence covering `[0, extent)` with the given
/// stride. Boundaries are laid at `0, stride, 2·stride, …` while below
/// `extent`, with a final boundary at `extent`; the last slab may be
/// shorter than `stride` but is never dropped.
///
/// # Panics
///
/// Panics if `extent` or `stride` is zero (planning over a validated
/// descriptor cannot produce either).
pub fn plan_slabs(extent: usize, stride: usize) -> Vec<SlabRange> {
    assert!(extent > 0 && stride > 0);
    let mut boundaries: Vec<usize> = (0..extent).step_by(stride).collect();
    boundaries.push(extent);
    boundaries
        .windows(2)
        .enumerate()
        .map(|(dst_index, w)| SlabRange {
            src_start: w[0],
            src_end: w[1],
            dst_index,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{compute_target_plan, plan_slabs};
    use crate::descriptor::ResampleRequest;
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;

    #[test]
    fn slabs_cover_extent_exactly() {
        let slabs = plan_slabs(7, 2);
        assert_eq!(slabs.len(), 4);
        assert_eq!(slabs[0].src_start, 0);
        for (i, s) in slabs.iter().enumerate() {
            assert_eq!(s.dst_index, i);
            assert!(s.src_start < s.src_end);
            if i > 0 {
                assert_eq!(s.src_start, slabs[i - 1].src_end);
            }
        }
        assert_eq!(slabs.last().unwrap().src_end, 7);
        // final slab is short but present
        assert_eq!(slabs[3].src_end - slabs[3].src_start, 1);
    }

    #[test]
    fn unit_stride_is_one_slab_per_plane() {
        let slabs = plan_slabs(6, 1);
        assert_eq!(slabs.len(), 6);
        assert!(slabs.iter().all(|s| s.src_end - s.src_start == 1));
    }

    #[test]
    fn identity_when_budget_covers_source() {
        // 5×10×6 u8 volume, 300 bytes
        let request = ResampleRequest::new(300).unwrap();
        let plan = compute_target_plan([5, 10, 6], 300, &request).unwrap();
        assert_eq!(plan.target_shape(), [5, 10, 6]);
        assert_eq!(plan.slab_stride(), 1);
        assert_eq!(plan.scale(), [1., 1., 1.]);

        // and with a budget well above the source size
        let request = ResampleRequest::new(1 << 30).unwrap();
        let plan = compute_target_plan([5, 10, 6], 300, &request).unwrap();
        assert_eq!(plan.target_shape(), [5, 10, 6]);
    }

    #[test]
    fn isotropic_reduction_follows_cbrt() {
        // 64³ u8 volume reduced to 1/8 of its size: m = 0.5
        let request = ResampleRequest::new(64 * 64 * 64 / 8).unwrap();
        let plan = compute_target_plan([64, 64, 64], 64 * 64 * 64, &request).unwrap();
        assert_eq!(plan.slab_stride(), 2);
        assert_eq!(plan.target_shape(), [32, 32, 32]);
        assert_abs_diff_eq!(plan.scale()[0], 0.5);
        // reduced volume fits the element budget
        let elems: usize = plan.target_shape().iter().product();
        assert!(elems <= 64 * 64 * 64 / 8);
    }

    #[test]
    fn concrete_scenario_from_cli_defaults() {
        // stored C-order shape (6, 10, 5), u8, budget 100 bytes
        let request = ResampleRequest::new(100).unwrap();
        let plan = compute_target_plan([6, 10, 5], 300, &request).unwrap();
        let m = (100f64 / 300f64).cbrt();
        assert_eq!(plan.slab_stride(), ((1.0 / m).floor() as usize).max(1));
        assert_eq!(plan.slab_stride(), 1);
        assert_eq!(plan.target_shape()[0], 6);
        assert_eq!(plan.target_shape()[1], (m * 10.).floor() as usize);
        assert_eq!(plan.target_shape()[2], (m * 5.).floor() as usize);
    }

    #[test]
    fn acquisition_mode_pins_slowest_axis() {
        let request = ResampleRequest::new(100).unwrap().acquisition_data(true);
        let plan = compute_target_plan([6, 10, 5], 300, &request).unwrap();
        assert_eq!(plan.slab_stride(), 1);
        assert_eq!(plan.target_shape()[0], 6);
        let m = (100f64 / 300f64).sqrt();
        assert_eq!(plan.target_shape()[1], (m * 10.).floor() as usize);
        assert_eq!(plan.target_shape()[2], (m * 5.).floor() as usize);
    }

    #[test]
    fn resample_z_off_behaves_like_acquisition() {
        let request = ResampleRequest::new(100).unwrap().resample_z(false);
        let plan = compute_target_plan([6, 10, 5], 300, &request).unwrap();
        assert_eq!(plan.target_shape()[0], 6);
        assert_eq!(plan.slab_stride(), 1);
    }

    #[test]
    fn degenerate_target_is_reported() {
        // squeezing 8×3×3 into 1 byte rounds the plane extents to zero
        let request = ResampleRequest::new(1).unwrap();
        let err = compute_target_plan([8, 3, 3], 72, &request).unwrap_err();
        assert!(matches!(
            err,
            crate::error::VolsampleError::DegenerateShape(_)
        ));
    }

    #[test]
    fn plan_count_matches_slowest_extent() {
        for &(extent, budget, total) in
            &[(100usize, 500u64, 4000u64), (33, 100, 1000), (7, 50, 343)]
        {
            let request = ResampleRequest::new(budget).unwrap();
            let plan = compute_target_plan([extent, 10, 10], total, &request).unwrap();
            assert_eq!(plan.slabs().len(), plan.target_shape()[0]);
            assert_eq!(plan.slabs().last().unwrap().src_end, extent);
        }
    }
}
