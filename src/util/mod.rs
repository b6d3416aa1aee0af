// Utility Module
// Key file persistence around the RSA core

pub mod file_ops;

pub use file_ops::{
    decrypt_with_stored_key, encrypt_with_stored_key, generate_and_save, load_key, load_keypair,
    save_key, save_keypair, KeyStoreConfig,
};
