//! Element types supported by on-disk volumes, plus the data element API
//! used to decode and cast voxel values.
//!
//! Stored samples are decoded according to the declared [`ElementType`] and
//! byte order, then converted to the caller's element type through `f64`
//! with a saturating cast. Narrowing conversions clamp to the target type's
//! natural range rather than wrapping.
use crate::error::{Result, VolsampleError};
use byteordered::{ByteOrdered, Endianness};
use num_traits::AsPrimitive;
use std::io::{Read, Write};

/// Data type for representing a single stored volume element.
/// Covers the signed/unsigned integer and float widths used by raw and
/// NumPy-style tomography datasets.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ElementType {
    /// signed 8-bit integer (`i1`)
    Int8,
    /// unsigned 8-bit integer (`u1`)
    Uint8,
    /// signed 16-bit integer (`i2`)
    Int16,
    /// unsigned 16-bit integer (`u2`)
    Uint16,
    /// signed 32-bit integer (`i4`)
    Int32,
    /// unsigned 32-bit integer (`u4`)
    Uint32,
    /// signed 64-bit integer (`i8`)
    Int64,
    /// unsigned 64-bit integer (`u8`)
    Uint64,
    /// 32-bit float (`f4`)
    Float32,
    /// 64-bit float (`f8`)
    Float64,
}

impl ElementType {
    /// Retrieve the size of an element of this data type, in bytes.
    pub fn size_of(self) -> usize {
        use ElementType::*;
        match self {
            Int8 | Uint8 => 1,
            Int16 | Uint16 => 2,
            Int32 | Uint32 | Float32 => 4,
            Int64 | Uint64 | Float64 => 8,
        }
    }

    /// Interpret a NumPy-style typecode (endianness marker stripped),
    /// such as `"u2"` or `"f4"`.
    pub fn from_typecode(code: &str) -> Result<Self> {
        use ElementType::*;
        Ok(match code {
            "i1" => Int8,
            "u1" | "b1" => Uint8,
            "i2" => Int16,
            "u2" => Uint16,
            "i4" => Int32,
            "u4" => Uint32,
            "i8" => Int64,
            "u8" => Uint64,
            "f4" => Float32,
            "f8" => Float64,
            _ => return Err(VolsampleError::UnsupportedElementType(code.to_owned())),
        })
    }

    /// The NumPy-style typecode for this element type.
    pub fn typecode(self) -> &'static str {
        use ElementType::*;
        match self {
            Int8 => "i1",
            Uint8 => "u1",
            Int16 => "i2",
            Uint16 => "u2",
            Int32 => "i4",
            Uint32 => "u4",
            Int64 => "i8",
            Uint64 => "u8",
            Float32 => "f4",
            Float64 => "f8",
        }
    }

    /// Decode a single stored sample from the given byte source, honoring
    /// the declared byte order, and cast it to the requested element type.
    ///
    /// The conversion routes through `f64`: widening casts are lossless,
    /// narrowing casts saturate to the target's range, and integral values
    /// wider than 53 bits may lose precision.
    pub fn read_value<S, T>(self, source: S, endianness: Endianness) -> Result<T>
    where
        S: Read,
        T: DataElement,
    {
        let mut src = ByteOrdered::runtime(source, endianness);
        let raw: f64 = match self {
            ElementType::Int8 => src.read_i8()? as f64,
            ElementType::Uint8 => src.read_u8()? as f64,
            ElementType::Int16 => src.read_i16()? as f64,
            ElementType::Uint16 => src.read_u16()? as f64,
            ElementType::Int32 => src.read_i32()? as f64,
            ElementType::Uint32 => src.read_u32()? as f64,
            ElementType::Int64 => src.read_i64()? as f64,
            ElementType::Uint64 => src.read_u64()? as f64,
            ElementType::Float32 => src.read_f32()? as f64,
            ElementType::Float64 => src.read_f64()?,
        };
        Ok(T::from_f64(raw))
    }
}

/// Trait type for the primitive numeric types which may hold voxel values
/// in an output volume.
pub trait DataElement:
    'static + Copy + PartialEq + std::fmt::Debug + bytemuck::Pod + AsPrimitive<f64>
{
    /// The `ElementType` mapped to the type `Self`.
    const ELEMENT_TYPE: ElementType;

    /// The additive identity, used to zero-initialize output buffers.
    fn zero() -> Self {
        bytemuck::Zeroable::zeroed()
    }

    /// Convert from a decoded `f64` sample.
    ///
    /// Integer targets saturate to their natural range (a NaN input maps
    /// to zero); float targets use the plain numeric cast.
    fn from_f64(value: f64) -> Self;

    /// Write this value to the given sink with the requested byte order.
    fn write_bytes<W: Write>(self, writer: W, endianness: Endianness) -> ::std::io::Result<()>;
}

macro_rules! data_element {
    ($t:ty, $et:expr, $write:ident) => {
        impl DataElement for $t {
            const ELEMENT_TYPE: ElementType = $et;
            fn from_f64(value: f64) -> Self {
                // `as` from float to int saturates and maps NaN to 0
                value as $t
            }
            fn write_bytes<W: Write>(
                self,
                writer: W,
                endianness: Endianness,
            ) -> ::std::io::Result<()> {
                ByteOrdered::runtime(writer, endianness).$write(self)
            }
        }
    };
}

data_element!(i8, ElementType::Int8, write_i8);
data_element!(u8, ElementType::Uint8, write_u8);
data_element!(i16, ElementType::Int16, write_i16);
data_element!(u16, ElementType::Uint16, write_u16);
data_element!(i32, ElementType::Int32, write_i32);
data_element!(u32, ElementType::Uint32, write_u32);
data_element!(i64, ElementType::Int64, write_i64);
data_element!(u64, ElementType::Uint64, write_u64);
data_element!(f32, ElementType::Float32, write_f32);
data_element!(f64, ElementType::Float64, write_f64);
