#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub use crate::backend::{Backend, BackendKind};
pub use crate::context::{
    schedule_decrypt_key, schedule_encrypt_key, CipherContext, Decrypt, Direction, Encrypt,
};
pub use crate::error::{Error, Result};
pub use crate::key_schedule::{KeyDirection, RoundKeyTable};

mod backend;
mod context;
mod error;
mod intrinsics;
mod key_schedule;
mod modes;

/// The length of an AES block, key, and IV in bytes.
pub const BLOCK_LEN: usize = 16;

/// The number of AES-128 rounds.
pub const ROUNDS: usize = 10;

/// The number of round keys in a schedule: one whitening key plus one per round.
pub const ROUND_KEYS: usize = ROUNDS + 1;

/// A 16-byte AES block.
pub type Block = [u8; BLOCK_LEN];
