#![no_main]
use aes_rounds::{BLOCK_LEN, Backend, CipherContext, Decrypt, Encrypt};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    key: [u8; 16],
    iv: [u8; 16],
    plaintext: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let len = input.plaintext.len() - input.plaintext.len() % BLOCK_LEN;
    let plaintext = &input.plaintext[..len];

    let mut enc = CipherContext::<Encrypt>::new(&input.key);
    enc.set_iv(input.iv);
    let mut ciphertext = plaintext.to_vec();
    enc.cbc_encrypt_in_place(&mut ciphertext).expect("whole blocks should encrypt");

    let mut portable = CipherContext::<Encrypt>::with_backend(Backend::portable(), &input.key);
    portable.set_iv(input.iv);
    let mut expected = vec![0u8; len];
    portable.cbc_encrypt(&mut expected, plaintext).expect("whole blocks should encrypt");
    assert_eq!(ciphertext, expected, "backends disagree");

    let mut dec = CipherContext::<Decrypt>::new(&input.key);
    dec.set_iv(input.iv);
    let mut decrypted = vec![0u8; len];
    dec.cbc_decrypt(&mut decrypted, &ciphertext).expect("whole blocks should decrypt");
    assert_eq!(decrypted, plaintext, "invalid CBC round trip");
});
