//! NumPy `.npy` header parsing and the matching slab source.
//!
//! The header is parsed exactly once into an immutable
//! [`SourceDescriptor`] before any planning begins; all later reads go
//! through the descriptor, never back to the file.
//!
//! [`SourceDescriptor`]: ../../descriptor/struct.SourceDescriptor.html
use super::raw::{is_gz_file, RawSlabSource};
use super::SlabSource;
use crate::descriptor::{LayoutOrder, SourceDescriptor};
use crate::element::ElementType;
use crate::error::{Result, VolsampleError};
use byteordered::ByteOrdered;
use flate2::bufread::GzDecoder;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Parse a NumPy `.npy` (format version 1.x or 2.x) header from the given
/// reader, leaving the reader positioned at the first array element.
///
/// The array must be 3-dimensional with a supported element typecode.
pub fn parse_npy_header<R: Read>(source: &mut R) -> Result<SourceDescriptor> {
    let mut magic = [0u8; 6];
    source.read_exact(&mut magic)?;
    if &magic != NPY_MAGIC {
        return Err(VolsampleError::InvalidFormat(
            "not a NumPy array file (bad magic)".into(),
        ));
    }
    let mut version = [0u8; 2];
    source.read_exact(&mut version)?;
    let mut le = ByteOrdered::le(source.by_ref());
    let (header_len, prefix_len) = match version[0] {
        1 => (u64::from(le.read_u16()?), 6 + 2 + 2),
        2 | 3 => (u64::from(le.read_u32()?), 6 + 2 + 4),
        v => {
            return Err(VolsampleError::InvalidFormat(format!(
                "unsupported .npy format version {}.{}",
                v, version[1]
            )))
        }
    };

    let mut header = vec![0u8; header_len as usize];
    source.read_exact(&mut header)?;
    let header = String::from_utf8_lossy(&header);

    let descr = dict_str_value(&header, "descr")?;
    let fortran = dict_bool_value(&header, "fortran_order")?;
    let shape = dict_shape_value(&header)?;

    let (byte_order, typecode) = split_descr(&descr)?;
    let element_type = ElementType::from_typecode(typecode)?;
    SourceDescriptor::new(
        shape,
        element_type,
        byte_order,
        if fortran {
            LayoutOrder::Fortran
        } else {
            LayoutOrder::C
        },
        prefix_len + header_len,
    )
}

/// Split a NumPy `descr` string such as `"<u2"` into its byte order and
/// bare typecode. `|` (not applicable) and `=` (native) both map to the
/// host machine's byte order.
fn split_descr(descr: &str) -> Result<(byteordered::Endianness, &str)> {
    let mut chars = descr.chars();
    let order = match chars.next() {
        Some('<') => byteordered::Endianness::Little,
        Some('>') => byteordered::Endianness::Big,
        Some('|') | Some('=') => byteordered::Endianness::native(),
        _ => {
            return Err(VolsampleError::InvalidFormat(format!(
                "malformed descr `{}`",
                descr
            )))
        }
    };
    Ok((order, chars.as_str()))
}

fn dict_raw_value<'a>(header: &'a str, key: &str) -> Result<&'a str> {
    let pat = format!("'{}'", key);
    let at = header.find(&pat).ok_or_else(|| {
        VolsampleError::InvalidFormat(format!("missing `{}` in .npy header", key))
    })?;
    let rest = &header[at + pat.len()..];
    let rest = rest.trim_start().strip_prefix(':').ok_or_else(|| {
        VolsampleError::InvalidFormat(format!("malformed `{}` entry in .npy header", key))
    })?;
    Ok(rest.trim_start())
}

fn dict_str_value(header: &str, key: &str) -> Result<String> {
    let rest = dict_raw_value(header, key)?;
    let rest = rest.strip_prefix('\'').ok_or_else(|| {
        VolsampleError::InvalidFormat(format!("`{}` is not a string in .npy header", key))
    })?;
    let end = rest.find('\'').ok_or_else(|| {
        VolsampleError::InvalidFormat(format!("unterminated `{}` in .npy header", key))
    })?;
    Ok(rest[..end].to_owned())
}

fn dict_bool_value(header: &str, key: &str) -> Result<bool> {
    let rest = dict_raw_value(header, key)?;
    if rest.starts_with("True") {
        Ok(true)
    } else if rest.starts_with("False") {
        Ok(false)
    } else {
        Err(VolsampleError::InvalidFormat(format!(
            "`{}` is not a boolean in .npy header",
            key
        )))
    }
}

fn dict_shape_value(header: &str) -> Result<[usize; 3]> {
    let rest = dict_raw_value(header, "shape")?;
    let rest = rest.strip_prefix('(').ok_or_else(|| {
        VolsampleError::InvalidFormat("`shape` is not a tuple in .npy header".into())
    })?;
    let end = rest.find(')').ok_or_else(|| {
        VolsampleError::InvalidFormat("unterminated `shape` in .npy header".into())
    })?;
    let dims = rest[..end]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>().map_err(|_| {
                VolsampleError::InvalidFormat(format!("bad extent `{}` in .npy shape", s))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    match dims[..] {
        [a, b, c] => Ok([a, b, c]),
        _ => Err(VolsampleError::InvalidFormat(format!(
            "expected a 3D array, found {} dimension(s)",
            dims.len()
        ))),
    }
}

/// A slab source over a NumPy `.npy` file (optionally gzip-compressed).
pub struct NpySlabSource {
    inner: RawSlabSource<Box<dyn Read>>,
}

impl NpySlabSource {
    /// Open a `.npy` or `.npy.gz` file, parsing its header into the
    /// source descriptor.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let gz = is_gz_file(&path);
        let file = BufReader::new(File::open(path)?);
        let mut reader: Box<dyn Read> = if gz {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        let descriptor = parse_npy_header(&mut reader)?;
        Ok(NpySlabSource {
            inner: RawSlabSource::after_header(reader, descriptor),
        })
    }

    /// Open a source over a reader yielding `.npy` bytes from the start.
    pub fn from_reader<R: Read + 'static>(mut reader: R) -> Result<Self> {
        let descriptor = parse_npy_header(&mut reader)?;
        let reader: Box<dyn Read> = Box::new(reader);
        Ok(NpySlabSource {
            inner: RawSlabSource::after_header(reader, descriptor),
        })
    }
}

impl fmt::Debug for NpySlabSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NpySlabSource")
            .field("descriptor", self.inner.descriptor())
            .field("planes_read", &self.inner.planes_read())
            .finish()
    }
}

impl SlabSource for NpySlabSource {
    fn descriptor(&self) -> &SourceDescriptor {
        self.inner.descriptor()
    }

    fn read_slab_into(&mut self, start: usize, end: usize, buffer: &mut Vec<u8>) -> Result<()> {
        self.inner.read_slab_into(start, end, buffer)
    }
}

/// Build a version 1.0 `.npy` header for the given dict line. Used by the
/// tests; the padding rules follow the NumPy format specification.
#[cfg(test)]
pub(crate) fn build_npy_bytes(dict: &str, payload: &[u8]) -> Vec<u8> {
    let mut header = dict.as_bytes().to_vec();
    // pad with spaces so that the full prefix is 64-byte aligned,
    // terminated by a newline
    let prefix = NPY_MAGIC.len() + 2 + 2;
    let total = ((prefix + header.len() + 1 + 63) / 64) * 64;
    header.resize(total - prefix - 1, b' ');
    header.push(b'\n');

    let mut out = Vec::new();
    out.extend_from_slice(NPY_MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(&header);
    out.extend_from_slice(payload);
    out
}

#[cfg(test)]
mod tests {
    use super::{build_npy_bytes, parse_npy_header, NpySlabSource};
    use crate::descriptor::LayoutOrder;
    use crate::element::ElementType;
    use crate::source::SlabSource;
    use byteordered::Endianness;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_a_v1_header() {
        let bytes = build_npy_bytes(
            "{'descr': '<u2', 'fortran_order': False, 'shape': (6, 10, 5), }",
            &[],
        );
        let mut cursor = &bytes[..];
        let d = parse_npy_header(&mut cursor).unwrap();
        assert_eq!(d.shape(), [6, 10, 5]);
        assert_eq!(d.element_type(), ElementType::Uint16);
        assert_eq!(d.byte_order(), Endianness::Little);
        assert_eq!(d.layout_order(), LayoutOrder::C);
        assert_eq!(d.header_byte_offset(), bytes.len() as u64);
        // the reader is left at the first element
        assert!(cursor.is_empty());
    }

    #[test]
    fn parses_fortran_and_big_endian() {
        let bytes = build_npy_bytes(
            "{'descr': '>f4', 'fortran_order': True, 'shape': (5, 10, 6), }",
            &[],
        );
        let d = parse_npy_header(&mut &bytes[..]).unwrap();
        assert_eq!(d.element_type(), ElementType::Float32);
        assert_eq!(d.byte_order(), Endianness::Big);
        assert_eq!(d.layout_order(), LayoutOrder::Fortran);
        assert_eq!(d.normalized_shape(), [6, 10, 5]);
    }

    #[test]
    fn rejects_bad_magic_and_rank() {
        assert!(parse_npy_header(&mut &b"\x89PNG\r\n\x1a\n____"[..]).is_err());
        let bytes = build_npy_bytes(
            "{'descr': '<u1', 'fortran_order': False, 'shape': (6, 10), }",
            &[],
        );
        assert!(parse_npy_header(&mut &bytes[..]).is_err());
        let bytes = build_npy_bytes(
            "{'descr': '<c16', 'fortran_order': False, 'shape': (2, 2, 2), }",
            &[],
        );
        assert!(parse_npy_header(&mut &bytes[..]).is_err());
    }

    #[test]
    fn source_reads_payload_past_header() {
        let payload: Vec<u8> = (0..24).collect();
        let bytes = build_npy_bytes(
            "{'descr': '|u1', 'fortran_order': False, 'shape': (4, 2, 3), }",
            &payload,
        );
        let mut src = NpySlabSource::from_reader(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(src.read_slab(0, 2).unwrap(), (0..12).collect::<Vec<u8>>());
        assert_eq!(src.read_slab(3, 4).unwrap(), (18..24).collect::<Vec<u8>>());
    }
}
