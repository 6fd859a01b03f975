use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce, Tag,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sealing keys are 256 bits.
pub const KEY_LEN: usize = 32;
/// A fresh 96-bit nonce is drawn for every seal.
pub const NONCE_LEN: usize = 12;
/// GCM authentication tags are 128 bits.
pub const TAG_LEN: usize = 16;

/// Failure to seal or unseal a vote payload. Unsealing never yields partial data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum IntegrityFailure {
    #[error("Sealing key must be exactly {KEY_LEN} bytes")]
    BadKey,
    #[error("Nonce must be exactly {NONCE_LEN} bytes")]
    BadNonce,
    #[error("Authentication tag must be exactly {TAG_LEN} bytes")]
    BadTag,
    #[error("Encryption failed")]
    Encryption,
    #[error("Sealed payload failed authentication")]
    Authentication,
    #[error("Sealed payload decrypted to malformed content")]
    Content,
}

/// An authenticated-encrypted vote body, with the nonce and tag needed to open it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedPayload {
    #[serde(with = "serde_base64")]
    pub ciphertext: Vec<u8>,
    #[serde(with = "serde_base64")]
    pub iv: Vec<u8>,
    #[serde(with = "serde_base64")]
    pub auth_tag: Vec<u8>,
}

/// AES-256-GCM sealing with a process-wide key.
#[derive(Clone)]
pub struct VoteSealer {
    cipher: Aes256Gcm,
}

impl VoteSealer {
    pub fn new(key: &[u8]) -> Result<Self, IntegrityFailure> {
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| IntegrityFailure::BadKey)?;
        Ok(Self { cipher })
    }

    /// Encrypt `payload` under a fresh random nonce.
    pub fn seal(&self, payload: &[u8]) -> Result<SealedPayload, IntegrityFailure> {
        let mut iv = [0; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut iv);

        let mut buffer = payload.to_vec();
        let tag = self
            .cipher
            .encrypt_in_place_detached(Nonce::from_slice(&iv), b"", &mut buffer)
            .map_err(|_| IntegrityFailure::Encryption)?;

        Ok(SealedPayload {
            ciphertext: buffer,
            iv: iv.to_vec(),
            auth_tag: tag.to_vec(),
        })
    }

    /// Decrypt and authenticate a sealed payload.
    pub fn unseal(&self, sealed: &SealedPayload) -> Result<Vec<u8>, IntegrityFailure> {
        // `from_slice` panics on a length mismatch, so check first.
        if sealed.iv.len() != NONCE_LEN {
            return Err(IntegrityFailure::BadNonce);
        }
        if sealed.auth_tag.len() != TAG_LEN {
            return Err(IntegrityFailure::BadTag);
        }

        let mut buffer = sealed.ciphertext.clone();
        self.cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(&sealed.iv),
                b"",
                &mut buffer,
                Tag::from_slice(&sealed.auth_tag),
            )
            .map_err(|_| IntegrityFailure::Authentication)?;
        Ok(buffer)
    }
}

/// Serialise byte vectors as standard base64 strings.
mod serde_base64 {
    use data_encoding::BASE64;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded.as_bytes()).map_err(D::Error::custom)
    }
}
