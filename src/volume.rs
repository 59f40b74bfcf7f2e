//! The in-memory output volume produced by a resample.
use crate::element::DataElement;

#[cfg(feature = "ndarray_volumes")]
use ndarray::Array3;

/// A fully materialized 3D volume with its physical geometry.
///
/// The buffer is allocated once, at full size, before streaming begins;
/// the shape never changes afterwards. Axis order is slowest-to-fastest
/// (the slab axis first), matching the normalized source shape.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputVolume<T> {
    shape: [usize; 3],
    spacing: [f64; 3],
    origin: [f64; 3],
    data: Vec<T>,
}

impl<T> OutputVolume<T>
where
    T: DataElement,
{
    /// Assemble a volume from its parts.
    ///
    /// # Panics
    ///
    /// Panics if the buffer length does not match the shape.
    pub fn new(shape: [usize; 3], spacing: [f64; 3], origin: [f64; 3], data: Vec<T>) -> Self {
        assert_eq!(data.len(), shape.iter().product::<usize>());
        OutputVolume {
            shape,
            spacing,
            origin,
            data,
        }
    }

    /// The volume shape, slowest-to-fastest axis order.
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// The physical voxel spacing, same axis order as the shape.
    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    /// The physical origin of the volume.
    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    /// Number of voxels in the volume.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the volume holds no voxels. A successfully resampled
    /// volume never is.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fetch a single voxel, if the index is in bounds.
    pub fn get(&self, z: usize, y: usize, x: usize) -> Option<T> {
        let [_, ny, nx] = self.shape;
        if z >= self.shape[0] || y >= ny || x >= nx {
            return None;
        }
        Some(self.data[(z * ny + y) * nx + x])
    }

    /// Retrieve a reference to the voxel buffer.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// View the voxel buffer as native-order raw bytes.
    pub fn raw_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Retrieve the voxel buffer, consuming the volume.
    pub fn into_raw_data(self) -> Vec<T> {
        self.data
    }
}

#[cfg(feature = "ndarray_volumes")]
impl<T> OutputVolume<T>
where
    T: DataElement,
{
    /// Consume the volume into a 3D `ndarray` (C memory order, slowest
    /// axis first), discarding the geometry.
    pub fn into_ndarray(self) -> Array3<T> {
        let [nz, ny, nx] = self.shape;
        Array3::from_shape_vec((nz, ny, nx), self.data)
            .expect("shape and buffer length are consistent by construction")
    }
}
