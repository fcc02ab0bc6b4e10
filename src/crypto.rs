//! At-rest encryption for WhatsApp session blobs.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use hkdf::Hkdf;
use sha2::Sha256;

const HKDF_SALT: &[u8] = b"isa-panel-v1";
const HKDF_INFO: &[u8] = b"whatsapp-session";
const NONCE_LEN: usize = 12;

fn cipher(key: &str) -> Result<Aes256Gcm, String> {
    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), key.as_bytes());
    let mut okm = [0u8; 32];
    hk.expand(HKDF_INFO, &mut okm)
        .map_err(|e| format!("Key derivation failed: {e}"))?;
    Aes256Gcm::new_from_slice(&okm).map_err(|e| format!("Invalid key: {e}"))
}

/// Seal `plaintext`. The 12-byte nonce is prepended to the ciphertext.
pub fn encrypt(plaintext: &[u8], key: &str) -> Result<Vec<u8>, String> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher(key)?
        .encrypt(&nonce, plaintext)
        .map_err(|e| format!("Encryption failed: {e}"))?;

    let mut sealed = nonce.to_vec();
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

pub fn decrypt(sealed: &[u8], key: &str) -> Result<Vec<u8>, String> {
    if sealed.len() < NONCE_LEN {
        return Err("Ciphertext too short".to_string());
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    cipher(key)?
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| format!("Decryption failed: {e}"))
}
