//! Error types for the resampling pipeline.
use quick_error::quick_error;
use std::io::Error as IoError;

quick_error! {
    /// Error type for all operations in this crate.
    #[derive(Debug)]
    pub enum VolsampleError {
        /// The requested byte budget was zero.
        InvalidBudget {
            display("target byte budget must be positive")
        }
        /// A target dimension rounded down to zero voxels.
        DegenerateShape(axis: usize) {
            display("target shape is degenerate: axis {} would have extent 0", axis)
        }
        /// The declared element typecode is not in the supported enumeration.
        UnsupportedElementType(code: String) {
            display("unsupported element typecode `{}`", code)
        }
        /// A slab could not be retrieved from the source.
        /// Carries the failing slab range along the slowest axis.
        SourceReadError(start: usize, end: usize, err: IoError) {
            source(err)
            display("failed to read source slab [{}, {}): {}", start, end, err)
        }
        /// A non-positive scale factor was passed to the geometry derivation.
        InvalidScale(factor: f64) {
            display("invalid scale factor {}", factor)
        }
        /// Cancellation was requested and observed at a slab boundary.
        Cancelled(slabs_done: usize) {
            display("resample cancelled after {} slab(s)", slabs_done)
        }
        /// A source header or descriptor could not be interpreted.
        InvalidFormat(msg: String) {
            display("invalid source format: {}", msg)
        }
        /// I/O error outside of slab retrieval (headers, sinks).
        Io(err: IoError) {
            from()
            source(err)
            display("{}", err)
        }
    }
}

/// Alias type for results originated from this crate.
pub type Result<T> = ::std::result::Result<T, VolsampleError>;
