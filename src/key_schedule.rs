//! The AES-128 key schedule (FIPS-197 §5.2) and the equivalent-inverse-cipher transform of its
//! output (§5.3.5).

use core::fmt;
use core::ops::Index;

use aligned::{Aligned, A16};

use crate::intrinsics::BlockCipherBackend;
use crate::{Block, BLOCK_LEN, ROUNDS, ROUND_KEYS};

/// The number of 32-bit words in a key.
const NK: usize = 4;

/// The number of 32-bit words produced by the schedule.
const NW: usize = NK * ROUND_KEYS;

/// Whether a round-key table drives the forward or the inverse cipher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyDirection {
    /// Forward order, for encryption.
    Encrypt,
    /// Reversed order with InvMixColumns applied to the middle keys, for decryption.
    Decrypt,
}

/// The [`ROUND_KEYS`] round keys derived from one AES-128 key.
///
/// Index 0 is the whitening key, index [`ROUNDS`] the final-round key. Entries are 16-byte aligned.
/// The [`Debug`] output does not include key material.
#[derive(Clone)]
pub struct RoundKeyTable {
    blocks: Aligned<A16, [Block; ROUND_KEYS]>,
}

impl RoundKeyTable {
    pub(crate) const fn zeroed() -> RoundKeyTable {
        RoundKeyTable { blocks: Aligned([[0u8; BLOCK_LEN]; ROUND_KEYS]) }
    }

    /// Returns the round keys as an array of blocks.
    #[inline]
    pub fn as_blocks(&self) -> &[Block; ROUND_KEYS] {
        &self.blocks
    }

    #[inline]
    pub(crate) fn blocks_mut(&mut self) -> &mut [Block; ROUND_KEYS] {
        &mut self.blocks
    }
}

impl Index<usize> for RoundKeyTable {
    type Output = Block;

    #[inline]
    fn index(&self, index: usize) -> &Block {
        &self.as_blocks()[index]
    }
}

impl PartialEq for RoundKeyTable {
    fn eq(&self, other: &Self) -> bool {
        self.as_blocks() == other.as_blocks()
    }
}

impl Eq for RoundKeyTable {}

impl fmt::Debug for RoundKeyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundKeyTable").field("len", &ROUND_KEYS).finish_non_exhaustive()
    }
}

#[cfg(feature = "zeroize")]
impl Drop for RoundKeyTable {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        self.blocks_mut().zeroize();
    }
}

/// Derives the round-key table for `key` in the given direction.
pub(crate) fn expand<B: BlockCipherBackend>(
    backend: B,
    key: &Block,
    direction: KeyDirection,
) -> RoundKeyTable {
    let forward = backend.expand_key(key);
    match direction {
        KeyDirection::Encrypt => forward,
        KeyDirection::Decrypt => invert(backend, &forward),
    }
}

/// The Rijndael word schedule for Nk = 4, with the backend providing SubWord.
pub(crate) fn rijndael<B: BlockCipherBackend>(backend: B, key: &Block) -> RoundKeyTable {
    let mut w = [0u32; NW];
    for (word, bytes) in w.iter_mut().zip(key.chunks_exact(4)) {
        *word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }

    let mut rcon = 0x01u32;
    for i in NK..NW {
        let mut temp = w[i - 1];
        if i % NK == 0 {
            // RotWord moves the first byte to the end, which for a little-endian word is a right
            // rotation. Rcon only touches the first byte.
            temp = backend.sub_word(temp.rotate_right(8)) ^ rcon;
            rcon = xtime(rcon);
        }
        w[i] = w[i - NK] ^ temp;
    }

    let mut table = RoundKeyTable::zeroed();
    for (block, words) in table.blocks_mut().iter_mut().zip(w.chunks_exact(NK)) {
        for (bytes, word) in block.chunks_exact_mut(4).zip(words) {
            bytes.copy_from_slice(&word.to_le_bytes());
        }
    }

    #[cfg(feature = "zeroize")]
    zeroize::Zeroize::zeroize(&mut w);

    table
}

/// Reorders a forward table for the equivalent inverse cipher: the outer keys swap places and
/// every middle key is replaced by InvMixColumns of its mirror.
pub(crate) fn invert<B: BlockCipherBackend>(backend: B, forward: &RoundKeyTable) -> RoundKeyTable {
    let imc = |block: &Block| {
        let mut out = [0u8; BLOCK_LEN];
        backend.store(&mut out, backend.inv_mix_columns(backend.load(block)));
        out
    };

    let fwd = forward.as_blocks();
    let mut table = RoundKeyTable::zeroed();
    let dec = table.blocks_mut();

    dec[0] = fwd[ROUNDS];
    dec[ROUNDS] = fwd[0];
    for i in 1..=(ROUNDS - 1) / 2 {
        dec[i] = imc(&fwd[ROUNDS - i]);
        dec[ROUNDS - i] = imc(&fwd[i]);
    }
    if ROUNDS % 2 == 0 {
        dec[ROUNDS / 2] = imc(&fwd[ROUNDS / 2]);
    }

    table
}

/// Multiplies by x in GF(2^8) modulo x^8 + x^4 + x^3 + x + 1.
#[inline]
const fn xtime(b: u32) -> u32 {
    let b = b << 1;
    if b & 0x100 != 0 {
        b ^ 0x11b
    } else {
        b
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use expect_test::expect;
    use hex_literal::hex;
    use proptest::prelude::*;

    use super::*;
    use crate::intrinsics::Portable;

    /// FIPS-197 Appendix A.1.
    const FIPS_197_KEY: Block = hex!("2b7e151628aed2a6abf7158809cf4f3c");
    const FIPS_197_SCHEDULE: [Block; ROUND_KEYS] = [
        hex!("2b7e151628aed2a6abf7158809cf4f3c"),
        hex!("a0fafe1788542cb123a339392a6c7605"),
        hex!("f2c295f27a96b9435935807a7359f67f"),
        hex!("3d80477d4716fe3e1e237e446d7a883b"),
        hex!("ef44a541a8525b7fb671253bdb0bad00"),
        hex!("d4d1c6f87c839d87caf2b8bc11f915bc"),
        hex!("6d88a37a110b3efddbf98641ca0093fd"),
        hex!("4e54f70e5f5fc9f384a64fb24ea6dc4f"),
        hex!("ead27321b58dbad2312bf5607f8d292f"),
        hex!("ac7766f319fadc2128d12941575c006e"),
        hex!("d014f9a8c9ee2589e13f0cc8b6630ca6"),
    ];

    fn gmul(mut a: u8, mut b: u8) -> u8 {
        let mut p = 0;
        while b != 0 {
            if b & 1 != 0 {
                p ^= a;
            }
            let carry = a & 0x80;
            a <<= 1;
            if carry != 0 {
                a ^= 0x1b;
            }
            b >>= 1;
        }
        p
    }

    fn reference_inv_mix_columns(block: &Block) -> Block {
        let mut out = [0u8; BLOCK_LEN];
        for (o, c) in out.chunks_exact_mut(4).zip(block.chunks_exact(4)) {
            o[0] = gmul(c[0], 14) ^ gmul(c[1], 11) ^ gmul(c[2], 13) ^ gmul(c[3], 9);
            o[1] = gmul(c[0], 9) ^ gmul(c[1], 14) ^ gmul(c[2], 11) ^ gmul(c[3], 13);
            o[2] = gmul(c[0], 13) ^ gmul(c[1], 9) ^ gmul(c[2], 14) ^ gmul(c[3], 11);
            o[3] = gmul(c[0], 11) ^ gmul(c[1], 13) ^ gmul(c[2], 9) ^ gmul(c[3], 14);
        }
        out
    }

    #[test]
    fn round_constants() {
        let mut rcon = 0x01;
        let mut seq = Vec::new();
        for _ in 0..ROUNDS {
            seq.push(rcon);
            rcon = xtime(rcon);
        }
        assert_eq!(seq, [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1b, 0x36]);
    }

    #[test]
    fn fips_197_forward_schedule() {
        let table = expand(Portable, &FIPS_197_KEY, KeyDirection::Encrypt);
        assert_eq!(table.as_blocks(), &FIPS_197_SCHEDULE);
    }

    #[test]
    fn fips_197_inverse_schedule() {
        let table = expand(Portable, &FIPS_197_KEY, KeyDirection::Decrypt);

        assert_eq!(table[0], FIPS_197_SCHEDULE[ROUNDS]);
        assert_eq!(table[ROUNDS], FIPS_197_SCHEDULE[0]);
        for i in 1..ROUNDS {
            assert_eq!(
                table[i],
                reference_inv_mix_columns(&FIPS_197_SCHEDULE[ROUNDS - i]),
                "middle key {i}"
            );
        }
    }

    #[test]
    fn zero_key_schedule() {
        let table = expand(Portable, &[0u8; 16], KeyDirection::Encrypt);
        expect!["b4ef5bcb3e92e21123e951cf6f8f188e"].assert_eq(&hex::encode(table[ROUNDS]));
    }

    #[test]
    fn debug_redacts_keys() {
        let table = expand(Portable, &FIPS_197_KEY, KeyDirection::Encrypt);
        assert_eq!(format!("{table:?}"), "RoundKeyTable { len: 11, .. }");
    }

    proptest! {
        #[test]
        fn inverse_schedule_mirrors_forward(key: [u8; 16]) {
            let enc = expand(Portable, &key, KeyDirection::Encrypt);
            let dec = expand(Portable, &key, KeyDirection::Decrypt);

            prop_assert_eq!(dec[0], enc[ROUNDS]);
            prop_assert_eq!(dec[ROUNDS], enc[0]);
            for i in 1..ROUNDS {
                prop_assert_eq!(dec[i], reference_inv_mix_columns(&enc[ROUNDS - i]));
            }
        }
    }
}
