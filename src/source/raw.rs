//! Slab source for raw binary files and streams.
//!
//! The reader honors the descriptor's header byte offset, byte order and
//! layout order, and consumes the stream strictly forward. Because slabs
//! are only ever requested in increasing, non-overlapping ranges, plain
//! files and gzip-compressed streams are served by the same code path.
use super::{check_slab_range, SlabSource};
use crate::descriptor::SourceDescriptor;
use crate::error::{Result, VolsampleError};
use flate2::bufread::GzDecoder;
use std::fs::File;
use std::io::{copy, sink, BufReader, Error as IoError, ErrorKind, Read};
use std::path::Path;

/// A slab source over any forward-readable byte stream of raw array data.
#[derive(Debug)]
pub struct RawSlabSource<R> {
    source: R,
    descriptor: SourceDescriptor,
    /// Next plane index to be consumed from the stream.
    position: usize,
    header_skipped: bool,
}

impl RawSlabSource<Box<dyn Read>> {
    /// Open a raw binary file as a slab source. Files ending in `.gz` are
    /// transparently decoded as a Gzip stream; the header offset applies
    /// to the decompressed bytes.
    pub fn open<P: AsRef<Path>>(path: P, descriptor: SourceDescriptor) -> Result<Self> {
        let gz = is_gz_file(&path);
        let file = BufReader::new(File::open(path)?);
        let reader: Box<dyn Read> = if gz {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(RawSlabSource::from_reader(reader, descriptor))
    }
}

impl<R> RawSlabSource<R>
where
    R: Read,
{
    /// Create a slab source over a reader positioned at the start of the
    /// stream. The descriptor's header byte offset will be skipped before
    /// the first slab is read.
    pub fn from_reader(source: R, descriptor: SourceDescriptor) -> Self {
        RawSlabSource {
            source,
            descriptor,
            position: 0,
            header_skipped: false,
        }
    }

    /// Create a slab source over a reader positioned just past the header,
    /// at the first element of the array.
    pub fn after_header(source: R, descriptor: SourceDescriptor) -> Self {
        RawSlabSource {
            source,
            descriptor,
            position: 0,
            header_skipped: true,
        }
    }

    /// Number of planes already consumed from the stream.
    pub fn planes_read(&self) -> usize {
        self.position
    }

    fn skip_bytes(&mut self, nbytes: u64) -> ::std::io::Result<()> {
        let skipped = copy(&mut self.source.by_ref().take(nbytes), &mut sink())?;
        if skipped < nbytes {
            return Err(IoError::new(
                ErrorKind::UnexpectedEof,
                "stream ended while skipping",
            ));
        }
        Ok(())
    }
}

impl<R> SlabSource for RawSlabSource<R>
where
    R: Read,
{
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    fn read_slab_into(&mut self, start: usize, end: usize, buffer: &mut Vec<u8>) -> Result<()> {
        check_slab_range(&self.descriptor, start, end)?;
        if start < self.position {
            return Err(VolsampleError::SourceReadError(
                start,
                end,
                IoError::new(
                    ErrorKind::InvalidInput,
                    format!(
                        "backward read: stream already at plane {}",
                        self.position
                    ),
                ),
            ));
        }
        let plane = self.descriptor.plane_bytes();
        let io = |err| VolsampleError::SourceReadError(start, end, err);

        if !self.header_skipped {
            self.skip_bytes(self.descriptor.header_byte_offset())
                .map_err(io)?;
            self.header_skipped = true;
        }
        if start > self.position {
            self.skip_bytes(((start - self.position) * plane) as u64)
                .map_err(io)?;
            self.position = start;
        }
        buffer.resize((end - start) * plane, 0);
        self.source.read_exact(buffer).map_err(io)?;
        self.position = end;
        Ok(())
    }
}

pub(crate) fn is_gz_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::{is_gz_file, RawSlabSource};
    use crate::descriptor::{LayoutOrder, SourceDescriptor};
    use crate::element::ElementType;
    use crate::source::SlabSource;
    use byteordered::Endianness;

    fn descriptor(offset: u64) -> SourceDescriptor {
        SourceDescriptor::new(
            [3, 2, 2],
            ElementType::Uint8,
            Endianness::Little,
            LayoutOrder::C,
            offset,
        )
        .unwrap()
    }

    #[test]
    fn gz_detection() {
        assert!(is_gz_file("data.raw.gz"));
        assert!(is_gz_file("data.npy.GZ"));
        assert!(!is_gz_file("data.raw"));
        assert!(!is_gz_file("gz"));
    }

    #[test]
    fn header_offset_is_skipped_once() {
        let bytes: Vec<u8> = (0..16).collect();
        let mut src = RawSlabSource::from_reader(&bytes[..], descriptor(4));
        assert_eq!(src.read_slab(0, 1).unwrap(), vec![4, 5, 6, 7]);
        assert_eq!(src.read_slab(1, 3).unwrap(), (8..16).collect::<Vec<u8>>());
    }

    #[test]
    fn skipped_planes_are_discarded() {
        let bytes: Vec<u8> = (0..12).collect();
        let mut src = RawSlabSource::from_reader(&bytes[..], descriptor(0));
        assert_eq!(src.read_slab(2, 3).unwrap(), vec![8, 9, 10, 11]);
        assert_eq!(src.planes_read(), 3);
    }

    #[test]
    fn backward_reads_are_rejected() {
        let bytes: Vec<u8> = (0..12).collect();
        let mut src = RawSlabSource::from_reader(&bytes[..], descriptor(0));
        let _ = src.read_slab(1, 2).unwrap();
        assert!(src.read_slab(0, 1).is_err());
    }

    #[test]
    fn truncated_stream_reports_the_range() {
        let bytes: Vec<u8> = (0..6).collect();
        let mut src = RawSlabSource::from_reader(&bytes[..], descriptor(0));
        let err = src.read_slab(0, 3).unwrap_err();
        match err {
            crate::error::VolsampleError::SourceReadError(0, 3, _) => (),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn gzipped_stream_round_trip() {
        use flate2::{write::GzEncoder, Compression};
        use std::io::Write;

        let payload: Vec<u8> = (0..12).collect();
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&payload).unwrap();
        let compressed = enc.finish().unwrap();

        let gz = flate2::bufread::GzDecoder::new(&compressed[..]);
        let mut src = RawSlabSource::from_reader(gz, descriptor(0));
        assert_eq!(src.read_slab(0, 3).unwrap(), payload);
    }
}
