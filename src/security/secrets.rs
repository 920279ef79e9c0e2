// Encrypted secret store for the persisted API key.
//
// Secrets are encrypted with ChaCha20-Poly1305 AEAD using a random key kept
// in `~/.streamsage/.secret_key` with restrictive permissions (0600). The
// config file stores only hex-encoded ciphertext, never the plaintext key.
//
// Each encryption draws a fresh random 12-byte nonce, prepended to the
// ciphertext. The Poly1305 tag rejects tampered values.
//
// Users who prefer plaintext config can set `secrets.encrypt = false`.

use anyhow::{Context, Result};
use chacha20poly1305::aead::{Aead, KeyInit, OsRng};
use chacha20poly1305::{AeadCore, ChaCha20Poly1305, Key, Nonce};
use std::fs;
use std::path::{Path, PathBuf};

/// Length of the random encryption key in bytes (256-bit, matches `ChaCha20`).
const KEY_LEN: usize = 32;

/// ChaCha20-Poly1305 nonce length in bytes.
const NONCE_LEN: usize = 12;

/// Encrypted-value marker in the config file.
const ENC_PREFIX: &str = "enc:";

/// Encrypts and decrypts secrets stored in the config file.
#[derive(Debug, Clone)]
pub struct SecretStore {
    /// Path to the key file (`~/.streamsage/.secret_key`)
    key_path: PathBuf,
    /// Whether encryption is enabled
    enabled: bool,
}

impl SecretStore {
    /// Create a secret store rooted at the given config directory.
    pub fn new(config_dir: &Path, enabled: bool) -> Self {
        Self {
            key_path: config_dir.join(".secret_key"),
            enabled,
        }
    }

    /// Encrypt a plaintext secret.
    /// Format: `enc:<hex(nonce ‖ ciphertext ‖ tag)>` (12 + N + 16 bytes).
    /// If encryption is disabled, returns the plaintext as-is.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        if !self.enabled || plaintext.is_empty() {
            return Ok(plaintext.to_string());
        }

        let key_bytes = self.load_or_create_key()?;
        let key = Key::from_slice(&key_bytes);
        let cipher = ChaCha20Poly1305::new(key);

        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| anyhow::anyhow!("encryption failed: {e}"))?;

        // Nonce travels with the ciphertext
        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);

        Ok(format!("{ENC_PREFIX}{}", hex_encode(&blob)))
    }

    /// Decrypt a secret. Values without the `enc:` prefix are returned as-is
    /// (plaintext config).
    pub fn decrypt(&self, value: &str) -> Result<String> {
        let Some(hex_str) = value.strip_prefix(ENC_PREFIX) else {
            return Ok(value.to_string());
        };

        let blob = hex_decode(hex_str).context("failed to decode encrypted secret (corrupt hex)")?;
        anyhow::ensure!(
            blob.len() > NONCE_LEN,
            "encrypted value too short (missing nonce)"
        );

        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        let key_bytes = self.load_or_create_key()?;
        let key = Key::from_slice(&key_bytes);
        let cipher = ChaCha20Poly1305::new(key);

        let plaintext_bytes = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| anyhow::anyhow!("decryption failed — wrong key or tampered data"))?;

        String::from_utf8(plaintext_bytes).context("decrypted secret is not valid UTF-8")
    }

    /// Check whether a config value is in the encrypted format.
    pub fn is_encrypted(value: &str) -> bool {
        value.starts_with(ENC_PREFIX)
    }

    /// Load the encryption key from disk, or create one if it doesn't exist.
    fn load_or_create_key(&self) -> Result<Vec<u8>> {
        if self.key_path.exists() {
            let hex_key =
                fs::read_to_string(&self.key_path).context("failed to read secret key file")?;
            hex_decode(hex_key.trim()).context("secret key file is corrupt")
        } else {
            let key = generate_random_key();
            if let Some(parent) = self.key_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&self.key_path, hex_encode(&key))
                .context("failed to write secret key file")?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&self.key_path, fs::Permissions::from_mode(0o600))
                    .context("failed to set key file permissions")?;
            }

            Ok(key)
        }
    }
}

/// Random 256-bit key from system entropy (two UUID v4 values).
fn generate_random_key() -> Vec<u8> {
    let u1 = uuid::Uuid::new_v4();
    let u2 = uuid::Uuid::new_v4();
    let mut key = Vec::with_capacity(KEY_LEN);
    key.extend_from_slice(u1.as_bytes());
    key.extend_from_slice(u2.as_bytes());
    key.truncate(KEY_LEN);
    key
}

fn hex_encode(data: &[u8]) -> String {
    let mut s = String::with_capacity(data.len() * 2);
    for b in data {
        use std::fmt::Write;
        let _ = write!(s, "{b:02x}");
    }
    s
}

// Operates on bytes so a corrupt value with multibyte UTF-8 is rejected
// instead of panicking on a char boundary.
fn hex_decode(hex: &str) -> Result<Vec<u8>> {
    let bytes = hex.as_bytes();
    if bytes.len() % 2 != 0 {
        anyhow::bail!("hex string has odd length");
    }
    bytes
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| {
            let digit = |b: u8| -> Result<u8> {
                match b {
                    b'0'..=b'9' => Ok(b - b'0'),
                    b'a'..=b'f' => Ok(b - b'a' + 10),
                    b'A'..=b'F' => Ok(b - b'A' + 10),
                    _ => anyhow::bail!("invalid hex at position {}", i * 2),
                }
            };
            Ok(digit(pair[0])? << 4 | digit(pair[1])?)
        })
        .collect()
}
