//! ECB and CBC over any [`BlockCipherBackend`].
//!
//! Callers validate lengths first. Every function here processes `src.len() / BLOCK_LEN` whole
//! blocks and expects `dst` to be at least as long.

use crate::intrinsics::BlockCipherBackend;
use crate::key_schedule::RoundKeyTable;
use crate::{Block, BLOCK_LEN};

pub(crate) fn ecb_encrypt<B: BlockCipherBackend>(
    backend: B,
    table: &RoundKeyTable,
    dst: &mut [u8],
    src: &[u8],
) {
    let keys = backend.load_keys(table);
    for (d, s) in dst.chunks_exact_mut(BLOCK_LEN).zip(src.chunks_exact(BLOCK_LEN)) {
        backend.store(d, backend.encrypt(&keys, backend.load(s)));
    }
}

pub(crate) fn ecb_decrypt<B: BlockCipherBackend>(
    backend: B,
    table: &RoundKeyTable,
    dst: &mut [u8],
    src: &[u8],
) {
    let keys = backend.load_keys(table);
    for (d, s) in dst.chunks_exact_mut(BLOCK_LEN).zip(src.chunks_exact(BLOCK_LEN)) {
        backend.store(d, backend.decrypt(&keys, backend.load(s)));
    }
}

pub(crate) fn ecb_encrypt_in_place<B: BlockCipherBackend>(
    backend: B,
    table: &RoundKeyTable,
    in_out: &mut [u8],
) {
    let keys = backend.load_keys(table);
    for block in in_out.chunks_exact_mut(BLOCK_LEN) {
        let pt = backend.load(block);
        backend.store(block, backend.encrypt(&keys, pt));
    }
}

pub(crate) fn ecb_decrypt_in_place<B: BlockCipherBackend>(
    backend: B,
    table: &RoundKeyTable,
    in_out: &mut [u8],
) {
    let keys = backend.load_keys(table);
    for block in in_out.chunks_exact_mut(BLOCK_LEN) {
        let ct = backend.load(block);
        backend.store(block, backend.decrypt(&keys, ct));
    }
}

pub(crate) fn cbc_encrypt<B: BlockCipherBackend>(
    backend: B,
    table: &RoundKeyTable,
    iv: &Block,
    dst: &mut [u8],
    src: &[u8],
) {
    let keys = backend.load_keys(table);
    let mut feedback = backend.load(iv);
    for (d, s) in dst.chunks_exact_mut(BLOCK_LEN).zip(src.chunks_exact(BLOCK_LEN)) {
        feedback = backend.encrypt(&keys, backend.xor(feedback, backend.load(s)));
        backend.store(d, feedback);
    }
}

pub(crate) fn cbc_encrypt_in_place<B: BlockCipherBackend>(
    backend: B,
    table: &RoundKeyTable,
    iv: &Block,
    in_out: &mut [u8],
) {
    let keys = backend.load_keys(table);
    let mut feedback = backend.load(iv);
    for block in in_out.chunks_exact_mut(BLOCK_LEN) {
        feedback = backend.encrypt(&keys, backend.xor(feedback, backend.load(block)));
        backend.store(block, feedback);
    }
}

/// Each block is decrypted independently and XORed with the previous ciphertext block, read from
/// `src` (or the IV for the first block).
pub(crate) fn cbc_decrypt<B: BlockCipherBackend>(
    backend: B,
    table: &RoundKeyTable,
    iv: &Block,
    dst: &mut [u8],
    src: &[u8],
) {
    let keys = backend.load_keys(table);
    let previous = core::iter::once(iv.as_slice()).chain(src.chunks_exact(BLOCK_LEN));
    let blocks = dst.chunks_exact_mut(BLOCK_LEN).zip(src.chunks_exact(BLOCK_LEN));
    for ((d, s), p) in blocks.zip(previous) {
        let pt = backend.xor(backend.decrypt(&keys, backend.load(s)), backend.load(p));
        backend.store(d, pt);
    }
}

/// The ciphertext block is held in a register before it is overwritten, so the next block still
/// XORs against the original ciphertext.
pub(crate) fn cbc_decrypt_in_place<B: BlockCipherBackend>(
    backend: B,
    table: &RoundKeyTable,
    iv: &Block,
    in_out: &mut [u8],
) {
    let keys = backend.load_keys(table);
    let mut previous = backend.load(iv);
    for block in in_out.chunks_exact_mut(BLOCK_LEN) {
        let ct = backend.load(block);
        backend.store(block, backend.xor(backend.decrypt(&keys, ct), previous));
        previous = ct;
    }
}
