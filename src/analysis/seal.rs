//! Opaque type tokens.
//!
//! A token is `nonce || AES-256-GCM(ciphertext || tag)` over the string
//! `<type urn>[@<extra>]*`. The key is the ASCII hex of the MD5 digest of a
//! fixed passphrase, so anyone holding this crate can open a token. Use it to
//! carry a type and some context through a URL, never as access control.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use md5::{Digest, Md5};

use crate::analysis::types::Type;
use crate::error::TypeError;

const PASSPHRASE: &str = "pkgsec/analysis-type";
const NONCE_LEN: usize = 12;
const SEPARATOR: char = '@';

fn cipher() -> Result<Aes256Gcm, TypeError> {
    let key = hex::encode(Md5::digest(PASSPHRASE.as_bytes()));
    Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|e| TypeError::Seal(e.to_string()))
}

impl Type {
    /// Seal this type together with `extra` context tokens.
    pub fn seal(self, extra: &[&str]) -> Result<Vec<u8>, TypeError> {
        if let Some(bad) = extra.iter().find(|e| e.contains(SEPARATOR)) {
            return Err(TypeError::Seal(format!(
                "extra token '{}' contains '{}'",
                bad, SEPARATOR
            )));
        }

        let mut plaintext = self.urn_str().to_string();
        for token in extra {
            plaintext.push(SEPARATOR);
            plaintext.push_str(token);
        }

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher()?
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| TypeError::Seal(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Open a token produced by [`Type::seal`].
    pub fn open(token: &[u8]) -> Result<(Type, Vec<String>), TypeError> {
        if token.len() <= NONCE_LEN {
            return Err(TypeError::Seal("token too short".to_string()));
        }
        let (nonce, ciphertext) = token.split_at(NONCE_LEN);
        let plaintext = cipher()?
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| TypeError::Seal("token authentication failed".to_string()))?;
        let plaintext =
            String::from_utf8(plaintext).map_err(|e| TypeError::Seal(e.to_string()))?;

        let mut parts = plaintext.split(SEPARATOR);
        let urn = parts.next().unwrap_or_default();
        let kind = Type::from_urn(urn)?;
        Ok((kind, parts.map(str::to_string).collect()))
    }
}
