#![no_main]
use aes_rounds::{BLOCK_LEN, schedule_decrypt_key, schedule_encrypt_key};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    key: [u8; 16],
    plaintext: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let len = input.plaintext.len() - input.plaintext.len() % BLOCK_LEN;
    let plaintext = &input.plaintext[..len];

    let mut ciphertext = vec![0u8; len];
    schedule_encrypt_key(input.key)
        .ecb_encrypt(&mut ciphertext, plaintext)
        .expect("whole blocks should encrypt");

    schedule_decrypt_key(input.key)
        .ecb_decrypt_in_place(&mut ciphertext)
        .expect("whole blocks should decrypt");
    assert_eq!(ciphertext, plaintext, "invalid ECB round trip");
});
