#![allow(unused_unsafe)]

use core::arch::aarch64::{self, *};

use super::{load_all, BlockCipherBackend};
use crate::key_schedule::RoundKeyTable;
use crate::{BLOCK_LEN, ROUND_KEYS};

/// An AES block.
pub use aarch64::uint8x16_t as AesBlock;

cpufeatures::new!(arm_aes, "aes");

/// The ARMv8 crypto extension backend. Only constructible on CPUs which report the AES
/// instructions.
///
/// `AESE` performs AddRoundKey before SubBytes/ShiftRows, so the round keys are consumed one
/// position earlier than with AES-NI and the last key is XORed in separately. The round-key table
/// is the same for both instruction sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmCrypto(());

impl ArmCrypto {
    /// Returns a token if the running CPU supports the ARMv8 AES instructions.
    #[inline]
    pub fn detect() -> Option<ArmCrypto> {
        arm_aes::get().then_some(ArmCrypto(()))
    }
}

impl BlockCipherBackend for ArmCrypto {
    type AesBlock = AesBlock;
    type Keys = [AesBlock; ROUND_KEYS];

    #[inline]
    fn load(self, bytes: &[u8]) -> AesBlock {
        let bytes = &bytes[..BLOCK_LEN];
        // SAFETY: the slice holds 16 readable bytes; NEON is baseline on aarch64.
        unsafe { vld1q_u8(bytes.as_ptr()) }
    }

    #[inline]
    fn store(self, bytes: &mut [u8], block: AesBlock) {
        let bytes = &mut bytes[..BLOCK_LEN];
        // SAFETY: the slice holds 16 writable bytes; NEON is baseline on aarch64.
        unsafe { vst1q_u8(bytes.as_mut_ptr(), block) };
    }

    #[inline]
    fn xor(self, a: AesBlock, b: AesBlock) -> AesBlock {
        // SAFETY: NEON is baseline on aarch64.
        unsafe { veorq_u8(a, b) }
    }

    #[inline]
    fn sub_word(self, word: u32) -> u32 {
        // SAFETY: the AES extension was detected.
        unsafe { sub_word(word) }
    }

    #[inline]
    fn inv_mix_columns(self, block: AesBlock) -> AesBlock {
        // SAFETY: the AES extension was detected.
        unsafe { inv_mix_columns(block) }
    }

    #[inline]
    fn load_keys(self, table: &RoundKeyTable) -> Self::Keys {
        load_all(self, table)
    }

    #[inline]
    fn encrypt(self, keys: &Self::Keys, block: AesBlock) -> AesBlock {
        // SAFETY: the AES extension was detected.
        unsafe { encrypt(keys, block) }
    }

    #[inline]
    fn decrypt(self, keys: &Self::Keys, block: AesBlock) -> AesBlock {
        // SAFETY: the AES extension was detected.
        unsafe { decrypt(keys, block) }
    }
}

/// Runs `AESE` with an all-zero state and the word broadcast as the round key. ShiftRows is the
/// identity on a block with four equal columns, so the first lane is the substituted word.
#[inline]
#[target_feature(enable = "aes")]
unsafe fn sub_word(word: u32) -> u32 {
    unsafe {
        let key = vreinterpretq_u8_u32(vdupq_n_u32(word));
        let block = vaeseq_u8(vdupq_n_u8(0), key);
        vgetq_lane_u32::<0>(vreinterpretq_u32_u8(block))
    }
}

#[inline]
#[target_feature(enable = "aes")]
unsafe fn inv_mix_columns(block: AesBlock) -> AesBlock {
    unsafe { vaesimcq_u8(block) }
}

#[inline]
#[target_feature(enable = "aes")]
unsafe fn encrypt(keys: &[AesBlock; ROUND_KEYS], block: AesBlock) -> AesBlock {
    unsafe {
        let mut state = block;
        state = vaesmcq_u8(vaeseq_u8(state, keys[0]));
        state = vaesmcq_u8(vaeseq_u8(state, keys[1]));
        state = vaesmcq_u8(vaeseq_u8(state, keys[2]));
        state = vaesmcq_u8(vaeseq_u8(state, keys[3]));
        state = vaesmcq_u8(vaeseq_u8(state, keys[4]));
        state = vaesmcq_u8(vaeseq_u8(state, keys[5]));
        state = vaesmcq_u8(vaeseq_u8(state, keys[6]));
        state = vaesmcq_u8(vaeseq_u8(state, keys[7]));
        state = vaesmcq_u8(vaeseq_u8(state, keys[8]));
        state = vaeseq_u8(state, keys[9]);
        veorq_u8(state, keys[10])
    }
}

#[inline]
#[target_feature(enable = "aes")]
unsafe fn decrypt(keys: &[AesBlock; ROUND_KEYS], block: AesBlock) -> AesBlock {
    unsafe {
        let mut state = block;
        state = vaesimcq_u8(vaesdq_u8(state, keys[0]));
        state = vaesimcq_u8(vaesdq_u8(state, keys[1]));
        state = vaesimcq_u8(vaesdq_u8(state, keys[2]));
        state = vaesimcq_u8(vaesdq_u8(state, keys[3]));
        state = vaesimcq_u8(vaesdq_u8(state, keys[4]));
        state = vaesimcq_u8(vaesdq_u8(state, keys[5]));
        state = vaesimcq_u8(vaesdq_u8(state, keys[6]));
        state = vaesimcq_u8(vaesdq_u8(state, keys[7]));
        state = vaesimcq_u8(vaesdq_u8(state, keys[8]));
        state = vaesdq_u8(state, keys[9]);
        veorq_u8(state, keys[10])
    }
}
