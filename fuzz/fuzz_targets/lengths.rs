#![no_main]
use aes_rounds::{BLOCK_LEN, CipherContext, Decrypt, Error};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    key: Vec<u8>,
    src: Vec<u8>,
    dst_len: u16,
}

fuzz_target!(|input: Input| {
    let dec = match CipherContext::<Decrypt>::new_from_slice(&input.key) {
        Ok(dec) => dec,
        Err(e) => {
            assert_eq!(e, Error::InvalidKeyLength { len: input.key.len() });
            return;
        }
    };

    let mut dst = vec![0u8; usize::from(input.dst_len)];
    let valid = dst.len() == input.src.len() && input.src.len() % BLOCK_LEN == 0;
    match dec.cbc_decrypt(&mut dst, &input.src) {
        Ok(()) => assert!(valid, "accepted ragged buffers"),
        Err(e) => {
            assert!(!valid, "rejected whole blocks");
            assert_eq!(e, Error::InvalidLength { src: input.src.len(), dst: dst.len() });
        }
    }
});
