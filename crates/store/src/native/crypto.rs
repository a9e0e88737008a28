//! Password protection for the native container
//!
//! The body is encrypted with AES-256-CBC under a random file key. Each
//! password gets a key slot holding the file key wrapped under a key derived
//! from that password, plus a digest that tells a wrong password apart from
//! a damaged file.

use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use sha2::{Digest, Sha256};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

const BLOCK: usize = 16;
const KDF_ROUNDS: usize = 4096;

pub type Key = [u8; 32];
pub type Iv = [u8; BLOCK];
pub type Salt = [u8; 16];

/// Why a decryption attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// Ciphertext length is not a whole number of blocks
    Length,
    /// Padding did not verify; the key is wrong or the data is damaged
    Padding,
}

pub fn random_key() -> Key {
    rand::random()
}

pub fn random_iv() -> Iv {
    rand::random()
}

pub fn random_salt() -> Salt {
    rand::random()
}

/// Stretch a password into an AES-256 key
pub fn derive_key(password: &str, salt: &Salt) -> Key {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let mut digest: Key = hasher.finalize().into();

    for _ in 0..KDF_ROUNDS {
        let mut hasher = Sha256::new();
        hasher.update(digest);
        hasher.update(salt);
        hasher.update(password.as_bytes());
        digest = hasher.finalize().into();
    }
    digest
}

/// Digest stored next to a slot to recognise the right derived key
pub fn key_check(key: &Key) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(key);
    hasher.update(b"slot-check");
    hasher.finalize().into()
}

/// Encrypt with PKCS#7 padding
pub fn encrypt(key: &Key, iv: &Iv, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let padding_len = BLOCK - (data.len() % BLOCK);
    let mut padded = Vec::with_capacity(data.len() + padding_len);
    padded.extend_from_slice(data);
    padded.resize(data.len() + padding_len, padding_len as u8);

    let len = padded.len();
    let cipher = Aes256CbcEnc::new(key.into(), iv.into());
    cipher
        .encrypt_padded_mut::<NoPadding>(&mut padded, len)
        .map_err(|_| CryptoError::Length)?;
    Ok(padded)
}

/// Decrypt and strip PKCS#7 padding
pub fn decrypt(key: &Key, iv: &Iv, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if data.is_empty() || data.len() % BLOCK != 0 {
        return Err(CryptoError::Length);
    }

    let mut buffer = data.to_vec();
    let cipher = Aes256CbcDec::new(key.into(), iv.into());
    let decrypted = cipher
        .decrypt_padded_mut::<NoPadding>(&mut buffer)
        .map_err(|_| CryptoError::Padding)?;

    let padding_len = decrypted.last().copied().unwrap_or(0) as usize;
    if padding_len == 0 || padding_len > BLOCK || padding_len > decrypted.len() {
        return Err(CryptoError::Padding);
    }
    let data_len = decrypted.len() - padding_len;
    if decrypted[data_len..].iter().any(|&b| b as usize != padding_len) {
        return Err(CryptoError::Padding);
    }

    Ok(decrypted[..data_len].to_vec())
}
