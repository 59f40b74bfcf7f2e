//! Immutable descriptions of an on-disk volume and of a resample request.
//!
//! Both types are validated at construction and never mutated afterwards,
//! so the planning and streaming stages can rely on their invariants
//! without re-checking.
use crate::element::ElementType;
use crate::error::{Result, VolsampleError};
use byteordered::Endianness;

/// Memory layout of the stored array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutOrder {
    /// Row-major: the last axis of the stored shape varies fastest.
    C,
    /// Column-major: the first axis of the stored shape varies fastest.
    Fortran,
}

/// A validated, read-only description of a 3D array as stored on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDescriptor {
    shape: [usize; 3],
    element_type: ElementType,
    byte_order: Endianness,
    layout_order: LayoutOrder,
    header_byte_offset: u64,
}

impl SourceDescriptor {
    /// Create a new descriptor. The shape is given in stored axis order.
    ///
    /// # Errors
    ///
    /// `InvalidFormat` if any shape entry is zero.
    pub fn new(
        shape: [usize; 3],
        element_type: ElementType,
        byte_order: Endianness,
        layout_order: LayoutOrder,
        header_byte_offset: u64,
    ) -> Result<Self> {
        if shape.iter().any(|&d| d == 0) {
            return Err(VolsampleError::InvalidFormat(format!(
                "source shape {:?} has a zero extent",
                shape
            )));
        }
        Ok(SourceDescriptor {
            shape,
            element_type,
            byte_order,
            layout_order,
            header_byte_offset,
        })
    }

    /// The shape in stored axis order.
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// The shape reordered so that index 0 is the memory-slowest axis and
    /// index 2 the memory-fastest. C-ordered shapes are returned as stored;
    /// Fortran-ordered shapes are reversed, so the streaming slab axis is
    /// always the slowest axis of the returned shape.
    pub fn normalized_shape(&self) -> [usize; 3] {
        match self.layout_order {
            LayoutOrder::C => self.shape,
            LayoutOrder::Fortran => [self.shape[2], self.shape[1], self.shape[0]],
        }
    }

    /// The declared element type.
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// The declared byte order.
    pub fn byte_order(&self) -> Endianness {
        self.byte_order
    }

    /// The declared memory layout.
    pub fn layout_order(&self) -> LayoutOrder {
        self.layout_order
    }

    /// Number of bytes to skip before the first element of the array.
    pub fn header_byte_offset(&self) -> u64 {
        self.header_byte_offset
    }

    /// Number of elements in one plane orthogonal to the slab axis.
    pub fn plane_len(&self) -> usize {
        let n = self.normalized_shape();
        n[1] * n[2]
    }

    /// Number of bytes in one plane orthogonal to the slab axis.
    pub fn plane_bytes(&self) -> usize {
        self.plane_len() * self.element_type.size_of()
    }

    /// Total payload size of the stored array, in bytes.
    pub fn total_bytes(&self) -> u64 {
        self.shape.iter().product::<usize>() as u64 * self.element_type.size_of() as u64
    }
}

/// A validated resample request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleRequest {
    target_byte_budget: u64,
    resample_z: bool,
    is_acquisition_data: bool,
    source_spacing: [f64; 3],
    source_origin: [f64; 3],
}

impl ResampleRequest {
    /// Create a request for the given byte budget, with the slowest axis
    /// decimated (`resample_z = true`) and spatial interpretation of all
    /// axes (`is_acquisition_data = false`). Unit spacing, zero origin.
    ///
    /// # Errors
    ///
    /// `InvalidBudget` if the budget is zero.
    pub fn new(target_byte_budget: u64) -> Result<Self> {
        if target_byte_budget == 0 {
            return Err(VolsampleError::InvalidBudget);
        }
        Ok(ResampleRequest {
            target_byte_budget,
            resample_z: true,
            is_acquisition_data: false,
            source_spacing: [1.; 3],
            source_origin: [0.; 3],
        })
    }

    /// Mark the source as acquisition data: the slowest axis indexes a
    /// projection angle and is never decimated.
    pub fn acquisition_data(mut self, flag: bool) -> Self {
        self.is_acquisition_data = flag;
        self
    }

    /// Choose whether the slowest axis may be decimated. When `false`, the
    /// slowest axis is kept at full extent even for spatial data.
    pub fn resample_z(mut self, flag: bool) -> Self {
        self.resample_z = flag;
        self
    }

    /// Declare the physical spacing of the source voxels
    /// (slowest-to-fastest axis order).
    pub fn source_spacing(mut self, spacing: [f64; 3]) -> Self {
        self.source_spacing = spacing;
        self
    }

    /// Declare the physical origin of the source volume
    /// (slowest-to-fastest axis order).
    pub fn source_origin(mut self, origin: [f64; 3]) -> Self {
        self.source_origin = origin;
        self
    }

    /// The requested output size, in bytes.
    pub fn target_byte_budget(&self) -> u64 {
        self.target_byte_budget
    }

    /// Whether the source's slowest axis is a projection index.
    pub fn is_acquisition_data(&self) -> bool {
        self.is_acquisition_data
    }

    /// Whether the slowest axis may be decimated.
    pub fn resamples_z(&self) -> bool {
        self.resample_z
    }

    /// Whether the plan may reduce the slowest-axis extent. Acquisition
    /// data and `resample_z = false` both pin it to the source extent.
    pub fn decimates_slowest_axis(&self) -> bool {
        self.resample_z && !self.is_acquisition_data
    }

    /// The declared source voxel spacing.
    pub fn spacing(&self) -> [f64; 3] {
        self.source_spacing
    }

    /// The declared source origin.
    pub fn origin(&self) -> [f64; 3] {
        self.source_origin
    }
}

#[cfg(test)]
mod tests {
    use super::{LayoutOrder, SourceDescriptor};
    use crate::element::ElementType;
    use byteordered::Endianness;

    fn descriptor(layout: LayoutOrder) -> SourceDescriptor {
        SourceDescriptor::new([6, 10, 5], ElementType::Uint16, Endianness::Little, layout, 0)
            .unwrap()
    }

    #[test]
    fn rejects_zero_extent() {
        let r = SourceDescriptor::new(
            [6, 0, 5],
            ElementType::Uint8,
            Endianness::Little,
            LayoutOrder::C,
            0,
        );
        assert!(r.is_err());
    }

    #[test]
    fn c_order_shape_is_kept() {
        let d = descriptor(LayoutOrder::C);
        assert_eq!(d.normalized_shape(), [6, 10, 5]);
        assert_eq!(d.plane_len(), 50);
        assert_eq!(d.plane_bytes(), 100);
        assert_eq!(d.total_bytes(), 600);
    }

    #[test]
    fn fortran_order_shape_is_reversed() {
        let d = descriptor(LayoutOrder::Fortran);
        assert_eq!(d.normalized_shape(), [5, 10, 6]);
        assert_eq!(d.plane_len(), 60);
        assert_eq!(d.total_bytes(), 600);
    }
}
