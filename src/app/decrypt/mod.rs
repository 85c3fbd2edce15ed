//! Keystream XOR decryption
//!
//! Encrypted assets only have their head XORed with a keystream derived from
//! the per-asset key. Decryption is the same XOR; bytes past the end of the
//! keystream are left as they are.
//!
//! Failures to obtain a keystream are tolerated: the [`Decryptor`] logs them
//! and hands the buffer back untouched so the caller can still save it and
//! decrypt it offline later.

use std::sync::Arc;

use crate::constants::DEFAULT_KEYSTREAM_LEN;
use crate::errors::{DecryptError, DecryptResult};

pub mod keystream;

pub use keystream::{ExternalKeystream, KeystreamSource, StaticKeystream};

/// XOR `data` in place with `keystream`, returning the number of bytes transformed
///
/// Stops when either side runs out; a short keystream leaves the tail of
/// `data` unmodified.
pub fn xor_decrypt(data: &mut [u8], keystream: &[u8]) -> usize {
    let len = data.len().min(keystream.len());
    data[..len]
        .iter_mut()
        .zip(&keystream[..len])
        .for_each(|(byte, key)| *byte ^= key);
    len
}

/// Result of a tolerant decryption attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptOutcome {
    /// No key material, nothing to do
    Skipped,
    /// Keystream applied to the first `bytes` bytes
    Decrypted { bytes: usize },
    /// Keystream could not be produced; buffer left as downloaded
    Failed { reason: String },
}

impl DecryptOutcome {
    pub fn is_decrypted(&self) -> bool {
        matches!(self, DecryptOutcome::Decrypted { .. })
    }
}

/// Applies keystreams from an injected [`KeystreamSource`]
#[derive(Clone)]
pub struct Decryptor {
    source: Option<Arc<dyn KeystreamSource>>,
    keystream_len: usize,
}

impl std::fmt::Debug for Decryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decryptor")
            .field("source", &self.source.as_ref().map(|s| s.name()))
            .field("keystream_len", &self.keystream_len)
            .finish()
    }
}

impl Default for Decryptor {
    fn default() -> Self {
        Self::disabled()
    }
}

impl Decryptor {
    pub fn new(source: Arc<dyn KeystreamSource>) -> Self {
        Self {
            source: Some(source),
            keystream_len: DEFAULT_KEYSTREAM_LEN,
        }
    }

    /// Decryptor without a keystream source; keyed buffers fail softly
    pub fn disabled() -> Self {
        Self {
            source: None,
            keystream_len: DEFAULT_KEYSTREAM_LEN,
        }
    }

    pub fn with_keystream_len(mut self, keystream_len: usize) -> Self {
        self.keystream_len = keystream_len;
        self
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn keystream_len(&self) -> usize {
        self.keystream_len
    }

    /// Decrypt `buffer` in place with the keystream for `key`
    ///
    /// # Errors
    ///
    /// Returns `DecryptError` if the key is blank, no source is configured
    /// or the source fails to produce a keystream
    pub async fn decrypt(&self, buffer: &mut [u8], key: &str) -> DecryptResult<usize> {
        let key = key.trim();
        if key.is_empty() {
            return Err(DecryptError::InvalidKey {
                key: key.to_string(),
            });
        }
        let source = self
            .source
            .as_ref()
            .ok_or(DecryptError::NoKeystreamSource)?;

        let keystream = source.generate(key, self.keystream_len).await?;
        let bytes = xor_decrypt(buffer, &keystream);
        tracing::debug!(
            "Decrypted {} of {} bytes with {} keystream",
            bytes,
            buffer.len(),
            source.name()
        );
        Ok(bytes)
    }

    /// Decrypt `buffer` in place when `key` is present
    ///
    /// Never fails: a missing source or generator error is logged and
    /// reported as [`DecryptOutcome::Failed`] with `buffer` unchanged.
    pub async fn decrypt_or_passthrough(
        &self,
        buffer: &mut [u8],
        key: Option<&str>,
    ) -> DecryptOutcome {
        let key = match key.map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => return DecryptOutcome::Skipped,
        };

        match self.decrypt(buffer, key).await {
            Ok(bytes) => DecryptOutcome::Decrypted { bytes },
            Err(e) => {
                tracing::warn!(
                    "Decryption failed ({}); saving undecrypted data. Retry offline with the decrypt command",
                    e
                );
                DecryptOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
