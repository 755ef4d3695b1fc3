use thiserror::Error;

/// The `aes-rounds` result type.
pub type Result<T> = core::result::Result<T, Error>;

/// The `aes-rounds` error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// The source and destination buffers differ in length, or their length is not a multiple of
    /// the block size. No output was written.
    #[error(
        "invalid buffer length: src is {src} bytes, dst is {dst} bytes \
         (must be equal multiples of 16)"
    )]
    InvalidLength {
        /// Length of the source buffer.
        src: usize,
        /// Length of the destination buffer.
        dst: usize,
    },

    /// Attempted to schedule a key from a slice which is not exactly 128 bits long.
    #[error("invalid key length: {len} bytes (expected 16)")]
    InvalidKeyLength {
        /// Length of the rejected key slice.
        len: usize,
    },

    /// The requested backend's instructions are not available on this CPU or target.
    #[error("the {backend} backend is not supported on this CPU")]
    Unsupported {
        /// The backend which was requested.
        backend: crate::BackendKind,
    },
}
