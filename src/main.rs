// RSA-OAEP Command Line Front End
// Key generation, encryption and decryption against key files

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rsa_oaep::rsa::keygen::DEFAULT_KEY_BITS;
use rsa_oaep::rsa::OaepParams;
use rsa_oaep::util::{
    decrypt_with_stored_key, encrypt_with_stored_key, generate_and_save, load_key,
    KeyStoreConfig,
};
use rsa_oaep::KeyKind;

#[derive(Parser)]
#[command(name = "rsa-oaep", version, about = "RSA-OAEP (SHA-512) encryption tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a key pair and write both key files
    Keygen {
        /// Modulus size in bits
        #[arg(long, default_value_t = DEFAULT_KEY_BITS)]
        bits: usize,
        /// Output path for the public key
        #[arg(long, default_value = "public.key")]
        public: PathBuf,
        /// Output path for the private key
        #[arg(long, default_value = "private.key")]
        private: PathBuf,
    },
    /// Encrypt a UTF-8 message, printing the ciphertext as hex
    Encrypt {
        /// Public key file
        #[arg(long, default_value = "public.key")]
        key: PathBuf,
        /// Message to encrypt
        text: String,
    },
    /// Decrypt a hex ciphertext, printing the message
    Decrypt {
        /// Private key file
        #[arg(long, default_value = "private.key")]
        key: PathBuf,
        /// Ciphertext as hex
        hex: String,
    },
    /// Describe a key file
    Info {
        /// Key file to inspect
        #[arg(long)]
        key: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Keygen {
            bits,
            public,
            private,
        } => {
            let config = KeyStoreConfig::default()
                .with_public_key_path(public)
                .with_private_key_path(private);
            let keypair = generate_and_save(&config, bits)
                .with_context(|| format!("generating {}-bit key pair", bits))?;
            println!(
                "Generated {}-bit key pair: {} / {}",
                keypair.bit_length(),
                config.public_key_path.display(),
                config.private_key_path.display()
            );
        }
        Command::Encrypt { key, text } => {
            let config = KeyStoreConfig::default().with_public_key_path(&key);
            let ciphertext = encrypt_with_stored_key(&config, &text)
                .with_context(|| format!("encrypting with {}", key.display()))?;
            println!("{}", hex::encode(ciphertext));
        }
        Command::Decrypt { key, hex } => {
            let ciphertext = hex::decode(hex.trim()).context("ciphertext is not valid hex")?;
            let config = KeyStoreConfig::default().with_private_key_path(&key);
            let plaintext = decrypt_with_stored_key(&config, &ciphertext)
                .with_context(|| format!("decrypting with {}", key.display()))?;
            println!("{}", plaintext);
        }
        Command::Info { key: path } => {
            let key = load_key(&path).with_context(|| format!("reading {}", path.display()))?;
            println!("Kind:           {}", key.kind());
            println!("Modulus bits:   {}", key.modulus_bits());
            println!("Block size:     {} bytes", key.size());
            println!(
                "Max message:    {} bytes (OAEP SHA-512)",
                key.max_message_len(&OaepParams::default())
            );
            if key.kind() == KeyKind::Public {
                println!("Exponent:       {}", key.exponent());
            }
            println!("Modulus:        {:x}", key.modulus());
        }
    }
    Ok(())
}
