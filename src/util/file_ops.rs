// File Operations for RSA Keys
// Handles atomic writing and reading of key records

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};
use zeroize::Zeroize;

use crate::rsa::decrypt::decrypt_to_string;
use crate::rsa::encrypt::encrypt_string;
use crate::rsa::errors::{Result, RsaError};
use crate::rsa::keygen::{generate_keypair, KeyKind, RsaKey, RsaKeyPair};
use crate::rsa::keystore::{deserialize, serialize};

/// Where the public and private key files live
#[derive(Clone, Debug)]
pub struct KeyStoreConfig {
    pub public_key_path: PathBuf,
    pub private_key_path: PathBuf,
}

impl Default for KeyStoreConfig {
    fn default() -> Self {
        Self {
            public_key_path: PathBuf::from("public.key"),
            private_key_path: PathBuf::from("private.key"),
        }
    }
}

impl KeyStoreConfig {
    /// Both key files inside `dir`, with the default file names
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            public_key_path: dir.join("public.key"),
            private_key_path: dir.join("private.key"),
        }
    }

    pub fn with_public_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.public_key_path = path.into();
        self
    }

    pub fn with_private_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.private_key_path = path.into();
        self
    }

    /// Path for keys of the given kind
    pub fn path_for(&self, kind: KeyKind) -> &Path {
        match kind {
            KeyKind::Public => &self.public_key_path,
            KeyKind::Private => &self.private_key_path,
        }
    }
}

/// Read entire file into memory
fn read_file(path: &Path) -> Result<Vec<u8>> {
    Ok(fs::read(path)?)
}

/// Stage data in a synced temporary file next to `path`
///
/// Nothing at `path` changes until the returned file is persisted. Dropping
/// it removes the temporary file.
fn stage_file(path: &Path, data: &[u8]) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(data)?;
    file.as_file().sync_all()?;
    Ok(file)
}

/// Rename a staged file over `path`
fn persist_file(file: NamedTempFile, path: &Path) -> Result<()> {
    file.persist(path).map_err(|err| RsaError::Io(err.error))?;
    Ok(())
}

/// Stage a key record for `path`, wiping the serialized bytes afterwards
fn stage_key(path: &Path, key: &RsaKey) -> Result<NamedTempFile> {
    let mut record = serialize(key);
    let staged = stage_file(path, &record);
    record.zeroize();
    staged
}

/// Save one key record to `path`, replacing any existing file
pub fn save_key(path: impl AsRef<Path>, key: &RsaKey) -> Result<()> {
    let path = path.as_ref();
    let staged = stage_key(path, key)?;
    persist_file(staged, path)?;

    info!(
        path = %path.display(),
        kind = %key.kind(),
        bits = key.modulus_bits(),
        "saved key"
    );
    Ok(())
}

/// Load one key record from `path`
///
/// The kind comes from the record's tag, not from the file name.
pub fn load_key(path: impl AsRef<Path>) -> Result<RsaKey> {
    let path = path.as_ref();
    let mut data = read_file(path)?;
    let key = deserialize(&data);
    data.zeroize();
    let key = key?;

    debug!(
        path = %path.display(),
        kind = %key.kind(),
        bits = key.modulus_bits(),
        "loaded key"
    );
    Ok(key)
}

/// Save both halves of a key pair to the configured paths
///
/// Both records are written and synced before either file is replaced, so a
/// failed write leaves the previous pair in place.
pub fn save_keypair(config: &KeyStoreConfig, keypair: &RsaKeyPair) -> Result<()> {
    let public_path = config.public_key_path.as_path();
    let private_path = config.private_key_path.as_path();

    let public_file = stage_key(public_path, keypair.public_key())?;
    let private_file = stage_key(private_path, keypair.private_key())?;

    // Only renames from here on
    persist_file(private_file, private_path)?;
    persist_file(public_file, public_path)?;

    info!(
        public = %public_path.display(),
        private = %private_path.display(),
        bits = keypair.bit_length(),
        "saved key pair"
    );
    Ok(())
}

/// Load a key pair from the configured paths
///
/// Fails with a format error if either file holds the wrong kind of key or
/// the two keys do not belong together.
pub fn load_keypair(config: &KeyStoreConfig) -> Result<RsaKeyPair> {
    let public_key = load_expected(config, KeyKind::Public)?;
    let private_key = load_expected(config, KeyKind::Private)?;

    RsaKeyPair::from_keys(public_key, private_key)
        .map_err(|err| RsaError::Format(format!("key files do not form a pair: {}", err)))
}

fn load_expected(config: &KeyStoreConfig, kind: KeyKind) -> Result<RsaKey> {
    let path = config.path_for(kind);
    let key = load_key(path)?;
    if key.kind() != kind {
        return Err(RsaError::Format(format!(
            "{} holds a {} key, expected a {} key",
            path.display(),
            key.kind(),
            kind
        )));
    }
    Ok(key)
}

/// Generate a key pair and store it at the configured paths
pub fn generate_and_save(config: &KeyStoreConfig, bit_length: usize) -> Result<RsaKeyPair> {
    let keypair = generate_keypair(bit_length)?;
    save_keypair(config, &keypair)?;
    Ok(keypair)
}

/// Encrypt a string with the public key stored at the configured path
pub fn encrypt_with_stored_key(config: &KeyStoreConfig, plaintext: &str) -> Result<Vec<u8>> {
    let public_key = load_expected(config, KeyKind::Public)?;
    encrypt_string(plaintext, &public_key)
}

/// Decrypt to a string with the private key stored at the configured path
pub fn decrypt_with_stored_key(config: &KeyStoreConfig, ciphertext: &[u8]) -> Result<String> {
    let private_key = load_expected(config, KeyKind::Private)?;
    decrypt_to_string(ciphertext, &private_key)
}
