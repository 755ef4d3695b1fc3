//! Single-round AES primitives, one implementation per instruction set.
//!
//! Every backend exposes the same [`BlockCipherBackend`] capability. The key schedule and the
//! chaining modes are written once against it and monomorphized per backend.

use crate::key_schedule::{self, RoundKeyTable};
use crate::{Block, ROUND_KEYS};

#[cfg(all(target_arch = "aarch64", not(feature = "portable")))]
pub(crate) use self::aarch64::ArmCrypto;

pub(crate) use self::portable::Portable;

#[cfg(all(any(target_arch = "x86_64", target_arch = "x86"), not(feature = "portable")))]
pub(crate) use self::x86_64::AesNi;

#[cfg(all(target_arch = "aarch64", not(feature = "portable")))]
mod aarch64;

mod portable;

#[cfg(all(any(target_arch = "x86_64", target_arch = "x86"), not(feature = "portable")))]
mod x86_64;

/// An AES-128 implementation built from single-round primitives.
///
/// Implementations are zero-sized capability tokens. A hardware token can only be obtained after a
/// successful CPU feature probe, which makes its safe methods sound.
pub(crate) trait BlockCipherBackend: Copy {
    /// A block held in the backend's native register type.
    type AesBlock: Copy;

    /// Round keys loaded into native registers, ready for [`encrypt`](Self::encrypt) or
    /// [`decrypt`](Self::decrypt).
    type Keys;

    /// Loads a block from the first 16 bytes of the given slice. No alignment is required.
    fn load(self, bytes: &[u8]) -> Self::AesBlock;

    /// Stores a block in the first 16 bytes of the given slice. No alignment is required.
    fn store(self, bytes: &mut [u8], block: Self::AesBlock);

    /// Bitwise XORs the given blocks.
    fn xor(self, a: Self::AesBlock, b: Self::AesBlock) -> Self::AesBlock;

    /// Applies the AES S-box to each byte of a little-endian word.
    fn sub_word(self, word: u32) -> u32;

    /// Applies the InvMixColumns transform to each column of the block.
    fn inv_mix_columns(self, block: Self::AesBlock) -> Self::AesBlock;

    /// Derives the forward (encryption) round keys for the given key.
    #[inline]
    fn expand_key(self, key: &Block) -> RoundKeyTable {
        key_schedule::rijndael(self, key)
    }

    /// Loads a round-key table into native registers.
    fn load_keys(self, table: &RoundKeyTable) -> Self::Keys;

    /// Runs the full forward cipher on one block with an encryption table's keys.
    fn encrypt(self, keys: &Self::Keys, block: Self::AesBlock) -> Self::AesBlock;

    /// Runs the full inverse cipher on one block with a decryption table's keys.
    fn decrypt(self, keys: &Self::Keys, block: Self::AesBlock) -> Self::AesBlock;
}

/// Loads every round key in `table` with the given backend.
#[inline]
pub(crate) fn load_all<B: BlockCipherBackend>(
    backend: B,
    table: &RoundKeyTable,
) -> [B::AesBlock; ROUND_KEYS] {
    let blocks = table.as_blocks();
    [
        backend.load(&blocks[0]),
        backend.load(&blocks[1]),
        backend.load(&blocks[2]),
        backend.load(&blocks[3]),
        backend.load(&blocks[4]),
        backend.load(&blocks[5]),
        backend.load(&blocks[6]),
        backend.load(&blocks[7]),
        backend.load(&blocks[8]),
        backend.load(&blocks[9]),
        backend.load(&blocks[10]),
    ]
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use expect_test::expect;
    use hex_literal::hex;

    use super::*;

    fn check_backend<B: BlockCipherBackend>(backend: B) {
        let a = backend.load(b"ayellowsubmarine");
        let b = backend.load(b"tuneintotheocho!");
        let mut c = [0u8; 16];
        backend.store(&mut c, backend.xor(a, b));
        expect!["150c0b090501031c010a080e11010144"].assert_eq(&hex::encode(c));

        // S(00)=63, S(01)=7c, S(53)=ed, S(ff)=16
        assert_eq!(
            backend.sub_word(u32::from_le_bytes([0x00, 0x01, 0x53, 0xff])),
            u32::from_le_bytes([0x63, 0x7c, 0xed, 0x16])
        );

        // FIPS-197 A.1, i = 4: SubWord(RotWord(09cf4f3c))
        assert_eq!(
            backend.sub_word(u32::from_le_bytes([0xcf, 0x4f, 0x3c, 0x09])),
            u32::from_le_bytes([0x8a, 0x84, 0xeb, 0x01])
        );

        // FIPS-197 5.1.3 MixColumns examples, inverted.
        let mixed = backend.load(&hex!("8e4da1bc 9fdc589d 01010101 d5d5d7d6"));
        let mut unmixed = [0u8; 16];
        backend.store(&mut unmixed, backend.inv_mix_columns(mixed));
        expect!["db135345f20a225c01010101d4d4d4d5"].assert_eq(&hex::encode(unmixed));
    }

    fn check_fips_197_block<B: BlockCipherBackend>(backend: B) {
        let enc = backend.expand_key(&hex!("000102030405060708090a0b0c0d0e0f"));
        let dec = key_schedule::invert(backend, &enc);

        let keys = backend.load_keys(&enc);
        let mut out = [0u8; 16];
        backend.store(
            &mut out,
            backend.encrypt(&keys, backend.load(&hex!("00112233445566778899aabbccddeeff"))),
        );
        expect!["69c4e0d86a7b0430d8cdb78070b4c55a"].assert_eq(&hex::encode(out));

        let keys = backend.load_keys(&dec);
        let ciphertext = backend.load(&out);
        backend.store(&mut out, backend.decrypt(&keys, ciphertext));
        expect!["00112233445566778899aabbccddeeff"].assert_eq(&hex::encode(out));
    }

    #[test]
    fn portable_primitives() {
        check_backend(Portable);
        check_fips_197_block(Portable);
    }

    #[test]
    #[cfg(all(any(target_arch = "x86_64", target_arch = "x86"), not(feature = "portable")))]
    fn aes_ni_primitives() {
        if let Some(backend) = AesNi::detect() {
            check_backend(backend);
            check_fips_197_block(backend);
        }
    }

    #[test]
    #[cfg(all(target_arch = "aarch64", not(feature = "portable")))]
    fn arm_crypto_primitives() {
        if let Some(backend) = ArmCrypto::detect() {
            check_backend(backend);
            check_fips_197_block(backend);
        }
    }

    #[test]
    fn unaligned_loads_and_stores() {
        let buf = *b"xayellowsubmarinex";
        let block = Portable.load(&buf[1..]);
        let mut out = [0u8; 18];
        Portable.store(&mut out[1..], block);
        assert_eq!(&out[1..17], b"ayellowsubmarine");
        assert_eq!((out[0], out[17]), (0, 0));
    }
}
