use aes::hazmat::{cipher_round, equiv_inv_cipher_round, inv_mix_columns, mix_columns};

use super::{load_all, BlockCipherBackend};
use crate::key_schedule::RoundKeyTable;
use crate::{BLOCK_LEN, ROUNDS, ROUND_KEYS};

/// An AES block.
pub use aes::Block as AesBlock;

/// The constant-time software backend, built on the `aes` crate's round functions.
///
/// The round functions only provide full rounds (with MixColumns), so the final round of each
/// direction is computed as a full round with an all-zero key followed by the inverse of its mixing
/// step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Portable;

impl BlockCipherBackend for Portable {
    type AesBlock = AesBlock;
    type Keys = [AesBlock; ROUND_KEYS];

    #[inline]
    fn load(self, bytes: &[u8]) -> AesBlock {
        *AesBlock::from_slice(&bytes[..BLOCK_LEN])
    }

    #[inline]
    fn store(self, bytes: &mut [u8], block: AesBlock) {
        bytes[..BLOCK_LEN].copy_from_slice(&block);
    }

    #[inline]
    fn xor(self, a: AesBlock, b: AesBlock) -> AesBlock {
        let mut out = AesBlock::default();
        for ((z, x), y) in out.iter_mut().zip(a).zip(b) {
            *z = x ^ y;
        }
        out
    }

    #[inline]
    fn sub_word(self, word: u32) -> u32 {
        // ShiftRows is the identity when all four columns are equal.
        let mut block = broadcast(word);
        cipher_round(&mut block, &AesBlock::default());
        inv_mix_columns(&mut block);
        u32::from_le_bytes([block[0], block[1], block[2], block[3]])
    }

    #[inline]
    fn inv_mix_columns(self, mut block: AesBlock) -> AesBlock {
        inv_mix_columns(&mut block);
        block
    }

    #[inline]
    fn load_keys(self, table: &RoundKeyTable) -> Self::Keys {
        load_all(self, table)
    }

    #[inline]
    fn encrypt(self, keys: &Self::Keys, block: AesBlock) -> AesBlock {
        let mut state = self.xor(block, keys[0]);
        for key in &keys[1..ROUNDS] {
            cipher_round(&mut state, key);
        }

        // SubBytes and ShiftRows without MixColumns.
        cipher_round(&mut state, &AesBlock::default());
        inv_mix_columns(&mut state);
        self.xor(state, keys[ROUNDS])
    }

    #[inline]
    fn decrypt(self, keys: &Self::Keys, block: AesBlock) -> AesBlock {
        let mut state = self.xor(block, keys[0]);
        for key in &keys[1..ROUNDS] {
            equiv_inv_cipher_round(&mut state, key);
        }

        // InvSubBytes and InvShiftRows without InvMixColumns.
        equiv_inv_cipher_round(&mut state, &AesBlock::default());
        mix_columns(&mut state);
        self.xor(state, keys[ROUNDS])
    }
}

#[inline]
fn broadcast(word: u32) -> AesBlock {
    let mut block = AesBlock::default();
    for column in block.chunks_exact_mut(4) {
        column.copy_from_slice(&word.to_le_bytes());
    }
    block
}
