//! RSA key generation, key files and OAEP encryption on a from-scratch
//! big integer core.
//!
//! ```no_run
//! use rsa_oaep::{decrypt, encrypt, generate_keypair};
//!
//! let keypair = generate_keypair(2048)?;
//! let ciphertext = encrypt(b"hello", keypair.public_key())?;
//! assert_eq!(decrypt(&ciphertext, keypair.private_key())?, b"hello");
//! # Ok::<(), rsa_oaep::RsaError>(())
//! ```

pub mod rsa;
pub mod util;

pub use rsa::{
    decrypt, decrypt_to_string, encrypt, encrypt_string, generate_keypair, KeyKind, OaepParams,
    Result, RsaError, RsaKey, RsaKeyPair,
};
pub use util::{load_key, save_key, KeyStoreConfig};
