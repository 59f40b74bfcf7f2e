//! Derivation of output voxel spacing and origin.
//!
//! Coarser sampling means larger spacing: the output spacing is the source
//! spacing divided by the achieved scale factor on each axis, so the
//! physical extent of the volume is preserved. The origin passes through
//! unchanged.
use crate::error::{Result, VolsampleError};

/// Derive the output spacing and origin from the source geometry and the
/// achieved per-axis scale factors (all in slowest-to-fastest axis order).
///
/// # Errors
///
/// `InvalidScale` if any scale factor is zero or negative. This is a
/// programming error in the caller, not a runtime condition to recover
/// from; it is still surfaced as a typed failure.
pub fn derive_geometry(
    source_spacing: [f64; 3],
    source_origin: [f64; 3],
    scale: [f64; 3],
) -> Result<([f64; 3], [f64; 3])> {
    let mut spacing = [0.; 3];
    for axis in 0..3 {
        if scale[axis] <= 0. {
            return Err(VolsampleError::InvalidScale(scale[axis]));
        }
        spacing[axis] = source_spacing[axis] / scale[axis];
    }
    Ok((spacing, source_origin))
}

#[cfg(test)]
mod tests {
    use super::derive_geometry;
    use crate::error::VolsampleError;
    use approx::assert_abs_diff_eq;

    #[test]
    fn spacing_grows_as_sampling_coarsens() {
        let (spacing, origin) =
            derive_geometry([1., 1., 1.], [0., 2., -1.], [0.5, 0.25, 1.]).unwrap();
        assert_abs_diff_eq!(spacing[0], 2.);
        assert_abs_diff_eq!(spacing[1], 4.);
        assert_abs_diff_eq!(spacing[2], 1.);
        assert_eq!(origin, [0., 2., -1.]);
    }

    #[test]
    fn identity_scale_keeps_spacing() {
        let (spacing, _) = derive_geometry([0.7, 0.7, 1.2], [0.; 3], [1., 1., 1.]).unwrap();
        assert_eq!(spacing, [0.7, 0.7, 1.2]);
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        let err = derive_geometry([1.; 3], [0.; 3], [1., 0., 1.]).unwrap_err();
        assert!(matches!(err, VolsampleError::InvalidScale(_)));
        let err = derive_geometry([1.; 3], [0.; 3], [1., 1., -0.5]).unwrap_err();
        assert!(matches!(err, VolsampleError::InvalidScale(f) if f < 0.));
    }
}
