use core::fmt;
use core::marker::PhantomData;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::key_schedule::{KeyDirection, RoundKeyTable};
use crate::{Block, BLOCK_LEN};

mod sealed {
    pub trait Sealed {}
}

/// The direction a [`CipherContext`] was scheduled for.
pub trait Direction: sealed::Sealed + fmt::Debug + Copy + Send + Sync + 'static {
    /// The round-key order this direction needs.
    const KEYS: KeyDirection;
}

/// Marker for contexts holding an encryption key schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encrypt;

/// Marker for contexts holding a decryption key schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decrypt;

impl sealed::Sealed for Encrypt {}
impl sealed::Sealed for Decrypt {}

impl Direction for Encrypt {
    const KEYS: KeyDirection = KeyDirection::Encrypt;
}

impl Direction for Decrypt {
    const KEYS: KeyDirection = KeyDirection::Decrypt;
}

/// An AES-128 key schedule for one direction, the backend that derived it, and an IV for CBC.
///
/// The round keys are immutable after construction. The IV starts out all-zero and is only changed
/// by [`CipherContext::set_iv`]; the chaining modes read it but do not advance it, so each CBC call
/// starts a new message.
///
/// Contexts are [`Sync`]: a context can be shared across threads for ECB, or for CBC with a fixed
/// IV. Changing the IV needs `&mut self`.
#[derive(Clone)]
pub struct CipherContext<D: Direction> {
    backend: Backend,
    round_keys: RoundKeyTable,
    iv: Block,
    direction: PhantomData<D>,
}

/// Schedules an encryption key with the detected backend.
#[inline]
pub fn schedule_encrypt_key(key: [u8; BLOCK_LEN]) -> CipherContext<Encrypt> {
    CipherContext::new(&key)
}

/// Schedules a decryption key with the detected backend.
#[inline]
pub fn schedule_decrypt_key(key: [u8; BLOCK_LEN]) -> CipherContext<Decrypt> {
    CipherContext::new(&key)
}

impl<D: Direction> CipherContext<D> {
    /// Schedules `key` with the fastest backend available on this CPU.
    #[inline]
    pub fn new(key: &Block) -> CipherContext<D> {
        CipherContext::with_backend(Backend::detect(), key)
    }

    /// Schedules `key` with the given backend.
    pub fn with_backend(backend: Backend, key: &Block) -> CipherContext<D> {
        CipherContext {
            backend,
            round_keys: backend.expand_key(key, D::KEYS),
            iv: [0u8; BLOCK_LEN],
            direction: PhantomData,
        }
    }

    /// Schedules a key given as a slice with the fastest available backend.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKeyLength`] if `key` is not 16 bytes long.
    pub fn new_from_slice(key: &[u8]) -> Result<CipherContext<D>> {
        let key: &Block =
            key.try_into().map_err(|_| Error::InvalidKeyLength { len: key.len() })?;
        Ok(CipherContext::new(key))
    }

    /// Replaces the IV used by the CBC operations. The key schedule is kept.
    #[inline]
    pub fn set_iv(&mut self, iv: [u8; BLOCK_LEN]) {
        self.iv = iv;
    }

    /// Returns the current IV.
    #[inline]
    pub const fn iv(&self) -> &Block {
        &self.iv
    }

    /// Returns the backend which derived the round keys and runs the block transforms.
    #[inline]
    pub const fn backend(&self) -> Backend {
        self.backend
    }

    /// Returns the round-key table in the order this context's direction uses it.
    #[inline]
    pub const fn round_keys(&self) -> &RoundKeyTable {
        &self.round_keys
    }
}

impl CipherContext<Encrypt> {
    /// Encrypts a single block in place.
    #[inline]
    pub fn encrypt_block(&self, block: &mut Block) {
        self.backend.ecb_encrypt_in_place(&self.round_keys, block);
    }

    /// Encrypts `src` into `dst`, each block independently.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLength`] if the buffers differ in length or are not a multiple of
    /// [`BLOCK_LEN`]. Nothing is written in that case.
    pub fn ecb_encrypt(&self, dst: &mut [u8], src: &[u8]) -> Result<()> {
        check_lengths(dst, src)?;
        self.backend.ecb_encrypt(&self.round_keys, dst, src);
        Ok(())
    }

    /// Encrypts `in_out` in place, each block independently.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLength`] if the buffer is not a multiple of [`BLOCK_LEN`].
    pub fn ecb_encrypt_in_place(&self, in_out: &mut [u8]) -> Result<()> {
        check_length(in_out)?;
        self.backend.ecb_encrypt_in_place(&self.round_keys, in_out);
        Ok(())
    }

    /// Encrypts `src` into `dst` in CBC mode, starting from the context's IV.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLength`] if the buffers differ in length or are not a multiple of
    /// [`BLOCK_LEN`]. Nothing is written in that case.
    pub fn cbc_encrypt(&self, dst: &mut [u8], src: &[u8]) -> Result<()> {
        check_lengths(dst, src)?;
        self.backend.cbc_encrypt(&self.round_keys, &self.iv, dst, src);
        Ok(())
    }

    /// Encrypts `in_out` in place in CBC mode, starting from the context's IV.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLength`] if the buffer is not a multiple of [`BLOCK_LEN`].
    pub fn cbc_encrypt_in_place(&self, in_out: &mut [u8]) -> Result<()> {
        check_length(in_out)?;
        self.backend.cbc_encrypt_in_place(&self.round_keys, &self.iv, in_out);
        Ok(())
    }
}

impl CipherContext<Decrypt> {
    /// Decrypts a single block in place.
    #[inline]
    pub fn decrypt_block(&self, block: &mut Block) {
        self.backend.ecb_decrypt_in_place(&self.round_keys, block);
    }

    /// Decrypts `src` into `dst`, each block independently.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLength`] if the buffers differ in length or are not a multiple of
    /// [`BLOCK_LEN`]. Nothing is written in that case.
    pub fn ecb_decrypt(&self, dst: &mut [u8], src: &[u8]) -> Result<()> {
        check_lengths(dst, src)?;
        self.backend.ecb_decrypt(&self.round_keys, dst, src);
        Ok(())
    }

    /// Decrypts `in_out` in place, each block independently.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLength`] if the buffer is not a multiple of [`BLOCK_LEN`].
    pub fn ecb_decrypt_in_place(&self, in_out: &mut [u8]) -> Result<()> {
        check_length(in_out)?;
        self.backend.ecb_decrypt_in_place(&self.round_keys, in_out);
        Ok(())
    }

    /// Decrypts `src` into `dst` in CBC mode, starting from the context's IV.
    ///
    /// Every block is XORed with the preceding ciphertext block from `src`, so the blocks can be
    /// decrypted in any order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLength`] if the buffers differ in length or are not a multiple of
    /// [`BLOCK_LEN`]. Nothing is written in that case.
    pub fn cbc_decrypt(&self, dst: &mut [u8], src: &[u8]) -> Result<()> {
        check_lengths(dst, src)?;
        self.backend.cbc_decrypt(&self.round_keys, &self.iv, dst, src);
        Ok(())
    }

    /// Decrypts `in_out` in place in CBC mode, starting from the context's IV.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLength`] if the buffer is not a multiple of [`BLOCK_LEN`].
    pub fn cbc_decrypt_in_place(&self, in_out: &mut [u8]) -> Result<()> {
        check_length(in_out)?;
        self.backend.cbc_decrypt_in_place(&self.round_keys, &self.iv, in_out);
        Ok(())
    }
}

impl<D: Direction> fmt::Debug for CipherContext<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherContext")
            .field("direction", &D::KEYS)
            .field("backend", &self.backend.kind())
            .finish_non_exhaustive()
    }
}

#[inline]
const fn check_lengths(dst: &[u8], src: &[u8]) -> Result<()> {
    if dst.len() != src.len() || src.len() % BLOCK_LEN != 0 {
        return Err(Error::InvalidLength { src: src.len(), dst: dst.len() });
    }
    Ok(())
}

#[inline]
const fn check_length(in_out: &[u8]) -> Result<()> {
    check_lengths(in_out, in_out)
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use hex_literal::hex;

    use super::*;
    use crate::ROUNDS;

    const KEY: Block = hex!("2b7e151628aed2a6abf7158809cf4f3c");

    #[test]
    fn fips_197_appendix_b() {
        let enc = schedule_encrypt_key(KEY);
        let dec = schedule_decrypt_key(KEY);

        let mut block = hex!("3243f6a8885a308d313198a2e0370734");
        enc.encrypt_block(&mut block);
        assert_eq!(block, hex!("3925841d02dc09fbdc118597196a0b32"));

        dec.decrypt_block(&mut block);
        assert_eq!(block, hex!("3243f6a8885a308d313198a2e0370734"));
    }

    #[test]
    fn schedules_are_mirrored() {
        let enc = schedule_encrypt_key(KEY);
        let dec = schedule_decrypt_key(KEY);
        assert_eq!(dec.round_keys()[0], enc.round_keys()[ROUNDS]);
        assert_eq!(dec.round_keys()[ROUNDS], enc.round_keys()[0]);
    }

    #[test]
    fn invalid_lengths_write_nothing() {
        let enc = schedule_encrypt_key(KEY);

        let mut dst = [0xaa; 32];
        assert_eq!(
            enc.ecb_encrypt(&mut dst[..17], &[0u8; 17]),
            Err(Error::InvalidLength { src: 17, dst: 17 })
        );
        assert_eq!(
            enc.cbc_encrypt(&mut dst, &[0u8; 16]),
            Err(Error::InvalidLength { src: 16, dst: 32 })
        );
        assert_eq!(
            enc.cbc_encrypt_in_place(&mut dst[..31]),
            Err(Error::InvalidLength { src: 31, dst: 31 })
        );
        assert_eq!(dst, [0xaa; 32]);
    }

    #[test]
    fn key_slices() {
        assert_eq!(
            CipherContext::<Encrypt>::new_from_slice(&[0u8; 24]).map(|_| ()),
            Err(Error::InvalidKeyLength { len: 24 })
        );
        let ctx = CipherContext::<Decrypt>::new_from_slice(&KEY).expect("should accept 16 bytes");
        assert_eq!(ctx.round_keys(), schedule_decrypt_key(KEY).round_keys());
    }

    #[test]
    fn iv_defaults_to_zero_and_is_replaceable() {
        let mut ctx = schedule_encrypt_key(KEY);
        assert_eq!(ctx.iv(), &[0u8; 16]);

        let keys = ctx.round_keys().clone();
        ctx.set_iv([9; 16]);
        assert_eq!(ctx.iv(), &[9u8; 16]);
        assert_eq!(ctx.round_keys(), &keys);
    }

    #[test]
    fn debug_omits_key_material() {
        let ctx = CipherContext::<Decrypt>::with_backend(Backend::portable(), &KEY);
        assert_eq!(
            format!("{ctx:?}"),
            "CipherContext { direction: Decrypt, backend: Portable, .. }"
        );
    }
}
