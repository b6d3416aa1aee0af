// RSA Decryption Implementation
// Implements RSA decryption with OAEP unpadding

use zeroize::Zeroize;

use super::encrypt::rsa_transform;
use super::errors::{Result, RsaError};
use super::keygen::{KeyKind, RsaKey};
use super::padding::{oaep_decode, OaepParams};

/// Decrypt ciphertext bytes using RSA private key
/// OAEP with SHA-512 and MGF1-SHA-512
pub fn decrypt(ciphertext: &[u8], private_key: &RsaKey) -> Result<Vec<u8>> {
    decrypt_with(ciphertext, private_key, &OaepParams::default())
}

/// Decrypt ciphertext bytes with explicit OAEP parameters
pub fn decrypt_with(ciphertext: &[u8], private_key: &RsaKey, params: &OaepParams) -> Result<Vec<u8>> {
    if private_key.kind() != KeyKind::Private {
        return Err(RsaError::WrongKeyKind {
            expected: KeyKind::Private,
            actual: private_key.kind(),
        });
    }

    // Validate ciphertext size
    let key_bytes = private_key.size();
    if ciphertext.len() != key_bytes {
        return Err(RsaError::LengthMismatch {
            expected: key_bytes,
            actual: ciphertext.len(),
        });
    }

    // Compute m = c^d mod n
    let mut padded = rsa_transform(ciphertext, private_key)?;

    // Remove OAEP padding
    let plaintext = oaep_decode(&padded, private_key.modulus_bits(), params);
    padded.zeroize();
    plaintext
}

/// Decrypt ciphertext to a string
pub fn decrypt_to_string(ciphertext: &[u8], private_key: &RsaKey) -> Result<String> {
    let plaintext = decrypt(ciphertext, private_key)?;
    String::from_utf8(plaintext).map_err(|err| {
        let mut bytes = err.into_bytes();
        bytes.zeroize();
        RsaError::Decoding
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsa::encrypt::{encrypt, encrypt_with};
    use crate::rsa::keygen::{generate_keypair_with, KeyGenConfig, RsaKeyPair};
    use crate::rsa::padding::HashAlgorithm;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn keypair(bits: usize, seed: u64) -> RsaKeyPair {
        let config = KeyGenConfig::default().with_bit_length(bits);
        generate_keypair_with(&config, &mut StdRng::seed_from_u64(seed)).unwrap()
    }

    fn test_roundtrip(keypair: &RsaKeyPair, message: &[u8]) {
        let ciphertext = keypair.public_key().encrypt(message).unwrap();
        let decrypted = keypair.private_key().decrypt(&ciphertext).unwrap();
        assert_eq!(message, decrypted.as_slice());
    }

    #[test]
    fn test_decrypt_bytes() {
        let keypair = keypair(1536, 1);
        let message = b"Hello, RSA!";

        let ciphertext = encrypt(message, keypair.public_key()).unwrap();
        let decrypted = decrypt(&ciphertext, keypair.private_key()).unwrap();

        assert_eq!(message.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_decrypt_string() {
        let keypair = keypair(1536, 2);
        let message = "Test message for RSA decryption";

        let ciphertext = encrypt(message.as_bytes(), keypair.public_key()).unwrap();
        let decrypted = decrypt_to_string(&ciphertext, keypair.private_key()).unwrap();

        assert_eq!(message, decrypted);
    }

    #[test]
    fn test_decrypt_invalid_utf8() {
        let keypair = keypair(1536, 3);
        let ciphertext = encrypt(&[0xff, 0xfe, 0xfd], keypair.public_key()).unwrap();
        assert_matches!(
            decrypt_to_string(&ciphertext, keypair.private_key()),
            Err(RsaError::Decoding)
        );
    }

    #[test]
    fn test_decrypt_invalid_size() {
        let keypair = keypair(1536, 4);
        assert_matches!(
            decrypt(&[0u8; 10], keypair.private_key()),
            Err(RsaError::LengthMismatch {
                expected: 192,
                actual: 10
            })
        );
    }

    #[test]
    fn test_decrypt_wrong_key() {
        let keypair1 = keypair(1536, 5);
        let keypair2 = keypair(1536, 6);

        let ciphertext = keypair1.public_key().encrypt(b"Test").unwrap();

        // Should fail - wrong key
        let result = keypair2.private_key().decrypt(&ciphertext);
        assert_matches!(result, Err(RsaError::Decoding));
    }

    #[test]
    fn test_decrypt_rejects_public_key() {
        let keypair = keypair(1536, 7);
        let ciphertext = encrypt(b"Test", keypair.public_key()).unwrap();
        assert_matches!(
            decrypt(&ciphertext, keypair.public_key()),
            Err(RsaError::WrongKeyKind { .. })
        );
    }

    #[test]
    fn test_tampered_ciphertext() {
        let keypair = keypair(1536, 8);
        let ciphertext = encrypt(b"integrity", keypair.public_key()).unwrap();

        for pos in [0, 1, 95, 191] {
            let mut tampered = ciphertext.clone();
            tampered[pos] ^= 0x01;
            assert_matches!(
                decrypt(&tampered, keypair.private_key()),
                Err(RsaError::Decoding)
            );
        }
    }

    #[test]
    fn test_roundtrip_various_sizes() {
        let keypair = keypair(1536, 9);
        let max = keypair.public_key().max_message_len(&OaepParams::default());

        // Test various message sizes
        let test_cases: Vec<Vec<u8>> = vec![
            Vec::new(),
            b"A".to_vec(),
            b"Hello, World!".to_vec(),
            vec![0u8; 40],
            vec![255u8; max],
        ];

        for message in test_cases {
            test_roundtrip(&keypair, &message);
        }
    }

    #[test]
    fn test_roundtrip_with_label() {
        let keypair = keypair(1024, 10);
        let params = OaepParams::new(HashAlgorithm::Sha256).with_label("context");
        let mut rng = StdRng::seed_from_u64(1);

        let ciphertext = encrypt_with(b"labelled", keypair.public_key(), &params, &mut rng).unwrap();
        assert_eq!(
            decrypt_with(&ciphertext, keypair.private_key(), &params).unwrap(),
            b"labelled"
        );

        let unlabelled = OaepParams::new(HashAlgorithm::Sha256);
        assert_matches!(
            decrypt_with(&ciphertext, keypair.private_key(), &unlabelled),
            Err(RsaError::Decoding)
        );
    }
}
