//! Runtime selection between the instruction-set backends.

use core::fmt;

use crate::error::{Error, Result};
#[cfg(all(target_arch = "aarch64", not(feature = "portable")))]
use crate::intrinsics::ArmCrypto;
#[cfg(all(any(target_arch = "x86_64", target_arch = "x86"), not(feature = "portable")))]
use crate::intrinsics::AesNi;
use crate::intrinsics::Portable;
use crate::key_schedule::{self, KeyDirection, RoundKeyTable};
use crate::{modes, Block};

/// The instruction sets a [`Backend`] can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum BackendKind {
    /// x86/x86_64 `AESENC`, `AESDEC`, `AESIMC` and `AESKEYGENASSIST`.
    AesNi,
    /// ARMv8 `AESE`, `AESD`, `AESMC` and `AESIMC`.
    ArmCrypto,
    /// Constant-time software rounds from the `aes` crate.
    Portable,
}

impl BackendKind {
    /// Every backend kind, hardware first.
    pub const ALL: [BackendKind; 3] =
        [BackendKind::AesNi, BackendKind::ArmCrypto, BackendKind::Portable];
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::AesNi => "AES-NI",
            BackendKind::ArmCrypto => "ARMv8 crypto extension",
            BackendKind::Portable => "portable",
        })
    }
}

/// A usable AES implementation for the running CPU.
///
/// Hardware backends are only handed out after a successful CPU feature probe, so a [`Backend`]
/// value is proof that its instructions are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backend(Inner);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inner {
    #[cfg(all(any(target_arch = "x86_64", target_arch = "x86"), not(feature = "portable")))]
    AesNi(AesNi),
    #[cfg(all(target_arch = "aarch64", not(feature = "portable")))]
    ArmCrypto(ArmCrypto),
    Portable(Portable),
}

/// Calls a generic function with the concrete backend token.
macro_rules! dispatch {
    ($inner:expr, $b:ident => $body:expr) => {
        match $inner {
            #[cfg(all(
                any(target_arch = "x86_64", target_arch = "x86"),
                not(feature = "portable")
            ))]
            Inner::AesNi($b) => $body,
            #[cfg(all(target_arch = "aarch64", not(feature = "portable")))]
            Inner::ArmCrypto($b) => $body,
            Inner::Portable($b) => $body,
        }
    };
}

impl Backend {
    /// Selects the fastest backend the running CPU supports, falling back to [`Backend::portable`].
    ///
    /// The CPU is probed once per process; later calls read a cached result.
    #[inline]
    pub fn detect() -> Backend {
        BackendKind::ALL
            .into_iter()
            .find_map(|kind| Backend::new(kind).ok())
            .unwrap_or(Backend::portable())
    }

    /// Selects a specific backend.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] if the backend's instructions are not available on this CPU,
    /// were not compiled for this target, or the `portable` feature is enabled.
    pub fn new(kind: BackendKind) -> Result<Backend> {
        let inner = match kind {
            #[cfg(all(
                any(target_arch = "x86_64", target_arch = "x86"),
                not(feature = "portable")
            ))]
            BackendKind::AesNi => AesNi::detect().map(Inner::AesNi),
            #[cfg(all(target_arch = "aarch64", not(feature = "portable")))]
            BackendKind::ArmCrypto => ArmCrypto::detect().map(Inner::ArmCrypto),
            BackendKind::Portable => Some(Inner::Portable(Portable)),
            _ => None,
        };
        inner.map(Backend).ok_or(Error::Unsupported { backend: kind })
    }

    /// The software backend, available everywhere.
    #[inline]
    pub const fn portable() -> Backend {
        Backend(Inner::Portable(Portable))
    }

    /// Returns which instruction set this backend uses.
    #[inline]
    pub const fn kind(self) -> BackendKind {
        match self.0 {
            #[cfg(all(
                any(target_arch = "x86_64", target_arch = "x86"),
                not(feature = "portable")
            ))]
            Inner::AesNi(_) => BackendKind::AesNi,
            #[cfg(all(target_arch = "aarch64", not(feature = "portable")))]
            Inner::ArmCrypto(_) => BackendKind::ArmCrypto,
            Inner::Portable(_) => BackendKind::Portable,
        }
    }

    /// Derives the round-key table for `key` in the given direction.
    #[inline]
    pub fn expand_key(self, key: &Block, direction: KeyDirection) -> RoundKeyTable {
        dispatch!(self.0, b => key_schedule::expand(b, key, direction))
    }

    #[inline]
    pub(crate) fn ecb_encrypt(self, table: &RoundKeyTable, dst: &mut [u8], src: &[u8]) {
        dispatch!(self.0, b => modes::ecb_encrypt(b, table, dst, src));
    }

    #[inline]
    pub(crate) fn ecb_decrypt(self, table: &RoundKeyTable, dst: &mut [u8], src: &[u8]) {
        dispatch!(self.0, b => modes::ecb_decrypt(b, table, dst, src));
    }

    #[inline]
    pub(crate) fn ecb_encrypt_in_place(self, table: &RoundKeyTable, in_out: &mut [u8]) {
        dispatch!(self.0, b => modes::ecb_encrypt_in_place(b, table, in_out));
    }

    #[inline]
    pub(crate) fn ecb_decrypt_in_place(self, table: &RoundKeyTable, in_out: &mut [u8]) {
        dispatch!(self.0, b => modes::ecb_decrypt_in_place(b, table, in_out));
    }

    #[inline]
    pub(crate) fn cbc_encrypt(self, table: &RoundKeyTable, iv: &Block, dst: &mut [u8], src: &[u8]) {
        dispatch!(self.0, b => modes::cbc_encrypt(b, table, iv, dst, src));
    }

    #[inline]
    pub(crate) fn cbc_decrypt(self, table: &RoundKeyTable, iv: &Block, dst: &mut [u8], src: &[u8]) {
        dispatch!(self.0, b => modes::cbc_decrypt(b, table, iv, dst, src));
    }

    #[inline]
    pub(crate) fn cbc_encrypt_in_place(
        self,
        table: &RoundKeyTable,
        iv: &Block,
        in_out: &mut [u8],
    ) {
        dispatch!(self.0, b => modes::cbc_encrypt_in_place(b, table, iv, in_out));
    }

    #[inline]
    pub(crate) fn cbc_decrypt_in_place(
        self,
        table: &RoundKeyTable,
        iv: &Block,
        in_out: &mut [u8],
    ) {
        dispatch!(self.0, b => modes::cbc_decrypt_in_place(b, table, iv, in_out));
    }
}

impl Default for Backend {
    #[inline]
    fn default() -> Backend {
        Backend::detect()
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind(), f)
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn portable_is_always_available() {
        assert_eq!(Backend::new(BackendKind::Portable), Ok(Backend::portable()));
        assert_eq!(Backend::portable().kind(), BackendKind::Portable);
        assert_eq!(Backend::portable().to_string(), "portable");
    }

    #[test]
    fn detect_prefers_hardware() {
        let available: Vec<BackendKind> = BackendKind::ALL
            .into_iter()
            .filter_map(|kind| Backend::new(kind).ok())
            .map(Backend::kind)
            .collect();
        assert_eq!(Backend::detect().kind(), available[0]);
        assert_eq!(Backend::default(), Backend::detect());
    }

    #[test]
    fn requested_kind_is_reported() {
        for kind in BackendKind::ALL {
            match Backend::new(kind) {
                Ok(backend) => assert_eq!(backend.kind(), kind),
                Err(e) => assert_eq!(e, Error::Unsupported { backend: kind }),
            }
        }
    }

    #[test]
    #[cfg(not(any(target_arch = "x86_64", target_arch = "x86")))]
    fn aes_ni_is_unsupported_elsewhere() {
        assert_eq!(
            Backend::new(BackendKind::AesNi),
            Err(Error::Unsupported { backend: BackendKind::AesNi })
        );
    }

    #[test]
    #[cfg(feature = "portable")]
    fn portable_feature_forces_software() {
        assert_eq!(Backend::detect().kind(), BackendKind::Portable);
    }
}
