#![allow(unused_unsafe)]

#[cfg(target_arch = "x86")]
use core::arch::x86::{self as x86, *};

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::{self as x86, *};

use super::BlockCipherBackend;
use crate::key_schedule::RoundKeyTable;
use crate::{Block, BLOCK_LEN, ROUND_KEYS};

/// An AES block.
pub use x86::__m128i as AesBlock;

cpufeatures::new!(aes_ni, "aes", "sse2");

/// The AES-NI backend. Only constructible on CPUs which report AES-NI and SSE2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AesNi(());

impl AesNi {
    /// Returns a token if the running CPU supports AES-NI.
    #[inline]
    pub fn detect() -> Option<AesNi> {
        aes_ni::get().then_some(AesNi(()))
    }
}

impl BlockCipherBackend for AesNi {
    type AesBlock = AesBlock;
    type Keys = [AesBlock; ROUND_KEYS];

    #[inline]
    fn load(self, bytes: &[u8]) -> AesBlock {
        let bytes = &bytes[..BLOCK_LEN];
        // SAFETY: the slice holds 16 readable bytes and SSE2 was detected.
        unsafe { _mm_loadu_si128(bytes.as_ptr().cast()) }
    }

    #[inline]
    fn store(self, bytes: &mut [u8], block: AesBlock) {
        let bytes = &mut bytes[..BLOCK_LEN];
        // SAFETY: the slice holds 16 writable bytes and SSE2 was detected.
        unsafe { _mm_storeu_si128(bytes.as_mut_ptr().cast(), block) };
    }

    #[inline]
    fn xor(self, a: AesBlock, b: AesBlock) -> AesBlock {
        // SAFETY: SSE2 was detected.
        unsafe { _mm_xor_si128(a, b) }
    }

    #[inline]
    fn sub_word(self, word: u32) -> u32 {
        // SAFETY: AES-NI was detected.
        unsafe { sub_word(word) }
    }

    #[inline]
    fn inv_mix_columns(self, block: AesBlock) -> AesBlock {
        // SAFETY: AES-NI was detected.
        unsafe { _mm_aesimc_si128(block) }
    }

    #[inline]
    fn expand_key(self, key: &Block) -> RoundKeyTable {
        // SAFETY: AES-NI was detected.
        let keys = unsafe { expand_key(key) };
        let mut table = RoundKeyTable::zeroed();
        for (block, key) in table.blocks_mut().iter_mut().zip(keys) {
            self.store(block, key);
        }
        table
    }

    #[inline]
    fn load_keys(self, table: &RoundKeyTable) -> Self::Keys {
        let blocks = table.as_blocks();
        // SAFETY: round-key tables are 16-byte aligned and every entry is exactly one block.
        core::array::from_fn(|i| unsafe { _mm_load_si128(blocks[i].as_ptr().cast()) })
    }

    #[inline]
    fn encrypt(self, keys: &Self::Keys, block: AesBlock) -> AesBlock {
        // SAFETY: AES-NI was detected.
        unsafe { encrypt(keys, block) }
    }

    #[inline]
    fn decrypt(self, keys: &Self::Keys, block: AesBlock) -> AesBlock {
        // SAFETY: AES-NI was detected.
        unsafe { decrypt(keys, block) }
    }
}

/// Runs the final round on a block holding `word` in every column. ShiftRows is the identity on
/// such a block, so the first lane is the substituted word.
#[inline]
#[target_feature(enable = "aes,sse2")]
unsafe fn sub_word(word: u32) -> u32 {
    unsafe {
        let block = _mm_set1_epi32(word as i32);
        _mm_cvtsi128_si32(_mm_aesenclast_si128(block, _mm_setzero_si128())) as u32
    }
}

/// Expands a key with `AESKEYGENASSIST`, as laid out in Intel's AES-NI white paper (323641-001).
#[target_feature(enable = "aes,sse2")]
unsafe fn expand_key(key: &Block) -> [AesBlock; ROUND_KEYS] {
    macro_rules! expand_round {
        ($prev:expr, $rcon:literal) => {{
            let prev = $prev;
            unsafe { key_assist(prev, _mm_aeskeygenassist_si128::<$rcon>(prev)) }
        }};
    }

    let k0 = unsafe { _mm_loadu_si128(key.as_ptr().cast()) };
    let k1 = expand_round!(k0, 0x01);
    let k2 = expand_round!(k1, 0x02);
    let k3 = expand_round!(k2, 0x04);
    let k4 = expand_round!(k3, 0x08);
    let k5 = expand_round!(k4, 0x10);
    let k6 = expand_round!(k5, 0x20);
    let k7 = expand_round!(k6, 0x40);
    let k8 = expand_round!(k7, 0x80);
    let k9 = expand_round!(k8, 0x1b);
    let k10 = expand_round!(k9, 0x36);
    [k0, k1, k2, k3, k4, k5, k6, k7, k8, k9, k10]
}

/// Folds the previous round key into a running XOR of its words and mixes in the assist word
/// (`SubWord(RotWord(w3)) ^ rcon`, broadcast).
#[inline]
#[target_feature(enable = "sse2")]
unsafe fn key_assist(prev: AesBlock, assist: AesBlock) -> AesBlock {
    unsafe {
        let mut t = prev;
        t = _mm_xor_si128(t, _mm_slli_si128::<4>(t));
        t = _mm_xor_si128(t, _mm_slli_si128::<4>(t));
        t = _mm_xor_si128(t, _mm_slli_si128::<4>(t));
        _mm_xor_si128(t, _mm_shuffle_epi32::<0xff>(assist))
    }
}

#[inline]
#[target_feature(enable = "aes,sse2")]
unsafe fn encrypt(keys: &[AesBlock; ROUND_KEYS], block: AesBlock) -> AesBlock {
    unsafe {
        let mut state = _mm_xor_si128(block, keys[0]);
        state = _mm_aesenc_si128(state, keys[1]);
        state = _mm_aesenc_si128(state, keys[2]);
        state = _mm_aesenc_si128(state, keys[3]);
        state = _mm_aesenc_si128(state, keys[4]);
        state = _mm_aesenc_si128(state, keys[5]);
        state = _mm_aesenc_si128(state, keys[6]);
        state = _mm_aesenc_si128(state, keys[7]);
        state = _mm_aesenc_si128(state, keys[8]);
        state = _mm_aesenc_si128(state, keys[9]);
        _mm_aesenclast_si128(state, keys[10])
    }
}

#[inline]
#[target_feature(enable = "aes,sse2")]
unsafe fn decrypt(keys: &[AesBlock; ROUND_KEYS], block: AesBlock) -> AesBlock {
    unsafe {
        let mut state = _mm_xor_si128(block, keys[0]);
        state = _mm_aesdec_si128(state, keys[1]);
        state = _mm_aesdec_si128(state, keys[2]);
        state = _mm_aesdec_si128(state, keys[3]);
        state = _mm_aesdec_si128(state, keys[4]);
        state = _mm_aesdec_si128(state, keys[5]);
        state = _mm_aesdec_si128(state, keys[6]);
        state = _mm_aesdec_si128(state, keys[7]);
        state = _mm_aesdec_si128(state, keys[8]);
        state = _mm_aesdec_si128(state, keys[9]);
        _mm_aesdeclast_si128(state, keys[10])
    }
}
