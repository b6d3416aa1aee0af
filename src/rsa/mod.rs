// RSA Module - Main module file
// Exports all RSA-related functionality

pub mod bigint;
pub mod decrypt;
pub mod encrypt;
pub mod errors;
pub mod keygen;
pub mod keystore;
pub mod padding;
pub mod prime;

pub use decrypt::{decrypt, decrypt_to_string, decrypt_with};
pub use encrypt::{encrypt, encrypt_string, encrypt_with, rsa_transform};
pub use errors::{ArithmeticError, Result, RsaError};
pub use keygen::{
    generate_default_keypair, generate_keypair, generate_keypair_with, KeyGenConfig, KeyKind,
    RsaKey, RsaKeyPair,
};
pub use keystore::{decode_record, deserialize, serialize};
pub use padding::{mgf1, oaep_decode, oaep_encode, HashAlgorithm, OaepParams};
pub use prime::{generate_prime, is_probable_prime};
