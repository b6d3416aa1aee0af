// RSA Error Types
// Error taxonomy shared by the arithmetic, padding, key and storage layers

use std::io;

use thiserror::Error;

use super::keygen::KeyKind;

/// Failures of the big integer layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("element has no modular inverse")]
    NotInvertible,
}

/// Errors returned by every public RSA operation
///
/// Messages carry sizes and counts only. Plaintext, private exponents and
/// prime factors never end up in an error value.
#[derive(Debug, Error)]
pub enum RsaError {
    /// The secure random source failed
    #[error("random source failure: {0}")]
    Generation(#[source] rand::Error),

    /// No valid exponent pair within the resampling budget
    #[error("key generation failed after {attempts} attempts")]
    KeyGeneration { attempts: u32 },

    #[error("key size {bits} bits is below the minimum of {min} bits")]
    InvalidKeySize { bits: usize, min: usize },

    #[error("message too long: {len} bytes, at most {max} bytes fit")]
    MessageTooLong { len: usize, max: usize },

    /// Deliberately uninformative
    #[error("decryption error")]
    Decoding,

    #[error("ciphertext length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("wrong key kind: expected {expected}, got {actual}")]
    WrongKeyKind { expected: KeyKind, actual: KeyKind },

    #[error("invalid key: {0}")]
    InvalidKey(&'static str),

    #[error("malformed key record: {0}")]
    Format(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),
}

/// Result type for RSA operations
pub type Result<T> = std::result::Result<T, RsaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_sizes_only() {
        let err = RsaError::MessageTooLong { len: 200, max: 126 };
        assert_eq!(err.to_string(), "message too long: 200 bytes, at most 126 bytes fit");

        let err = RsaError::LengthMismatch { expected: 256, actual: 10 };
        assert_eq!(
            err.to_string(),
            "ciphertext length mismatch: expected 256 bytes, got 10"
        );
    }

    #[test]
    fn test_decoding_error_is_generic() {
        assert_eq!(RsaError::Decoding.to_string(), "decryption error");
    }

    #[test]
    fn test_arithmetic_conversion() {
        let err: RsaError = ArithmeticError::DivisionByZero.into();
        assert!(matches!(err, RsaError::Arithmetic(ArithmeticError::DivisionByZero)));
    }
}
