//! Keystream generators
//!
//! The real generator is an opaque vendor routine, so it is modelled as the
//! [`KeystreamSource`] capability. [`ExternalKeystream`] shells out to any
//! program that implements the generator; [`StaticKeystream`] serves fixed
//! bytes and doubles as the deterministic stub in tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use crate::errors::{DecryptError, DecryptResult};

/// Produces the keystream for a per-asset seed
#[async_trait]
pub trait KeystreamSource: Send + Sync {
    /// Generate up to `length` keystream bytes for `seed`
    async fn generate(&self, seed: &str, length: usize) -> DecryptResult<Vec<u8>>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Keystream made of fixed bytes, independent of the seed
#[derive(Debug, Clone)]
pub struct StaticKeystream {
    bytes: Vec<u8>,
}

impl StaticKeystream {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Load a previously dumped keystream from disk
    pub async fn from_file(path: &Path) -> DecryptResult<Self> {
        let bytes = tokio::fs::read(path).await?;
        tracing::debug!(
            "Loaded {} keystream bytes from {}",
            bytes.len(),
            path.display()
        );
        Ok(Self { bytes })
    }
}

#[async_trait]
impl KeystreamSource for StaticKeystream {
    async fn generate(&self, seed: &str, length: usize) -> DecryptResult<Vec<u8>> {
        if self.bytes.is_empty() {
            return Err(DecryptError::EmptyKeystream {
                seed: seed.to_string(),
            });
        }
        let end = length.min(self.bytes.len());
        Ok(self.bytes[..end].to_vec())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Keystream produced by an external generator program
///
/// The program is invoked as `<program> [args..] <seed> <length>` and must
/// write the raw keystream to stdout.
///
/// # Examples
///
/// ```no_run
/// use channels_fetcher::app::{ExternalKeystream, KeystreamSource};
/// use std::path::PathBuf;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = ExternalKeystream::new(PathBuf::from("/usr/local/bin/isaac-keystream"));
/// let keystream = source.generate("2136104512", 131072).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ExternalKeystream {
    program: PathBuf,
    args: Vec<String>,
}

impl ExternalKeystream {
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
        }
    }

    /// Fixed arguments placed before the seed and length
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl KeystreamSource for ExternalKeystream {
    async fn generate(&self, seed: &str, length: usize) -> DecryptResult<Vec<u8>> {
        if seed.trim().is_empty() {
            return Err(DecryptError::InvalidKey {
                key: seed.to_string(),
            });
        }

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(seed)
            .arg(length.to_string())
            .output()
            .await
            .map_err(|e| {
                DecryptError::ExternalTool(format!(
                    "failed to execute {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DecryptError::ExternalTool(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        let mut keystream = output.stdout;
        if keystream.is_empty() {
            return Err(DecryptError::EmptyKeystream {
                seed: seed.to_string(),
            });
        }
        if keystream.len() < length {
            tracing::warn!(
                "Keystream generator returned {} of {} requested bytes",
                keystream.len(),
                length
            );
        }
        keystream.truncate(length);
        Ok(keystream)
    }

    fn name(&self) -> &'static str {
        "external"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_static_keystream_truncates_to_length() {
        let source = StaticKeystream::new(vec![1, 2, 3, 4, 5]);
        assert_eq!(source.generate("7", 3).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(source.generate("7", 10).await.unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_static_keystream_empty_is_error() {
        let source = StaticKeystream::new(Vec::new());
        match source.generate("7", 3).await {
            Err(DecryptError::EmptyKeystream { seed }) => assert_eq!(seed, "7"),
            other => panic!("Expected EmptyKeystream, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_static_keystream_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keystream.bin");
        tokio::fs::write(&path, [9u8, 8, 7]).await.unwrap();

        let source = StaticKeystream::from_file(&path).await.unwrap();
        assert_eq!(source.generate("1", 2).await.unwrap(), vec![9, 8]);
    }

    #[tokio::test]
    async fn test_external_keystream_missing_program() {
        let source = ExternalKeystream::new(PathBuf::from("/nonexistent/keystream-generator-xyz"));
        match source.generate("123", 16).await {
            Err(DecryptError::ExternalTool(msg)) => assert!(msg.contains("failed to execute")),
            other => panic!("Expected ExternalTool error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_external_keystream_rejects_blank_seed() {
        let source = ExternalKeystream::new(PathBuf::from("true"));
        assert!(matches!(
            source.generate("  ", 16).await,
            Err(DecryptError::InvalidKey { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_external_keystream_reads_stdout() {
        // sh -c '<script>' sh <seed> <length>: the script echoes its arguments
        let source = ExternalKeystream::new(PathBuf::from("sh")).with_args(vec![
            "-c".to_string(),
            "printf '%s:%s' \"$1\" \"$2\"".to_string(),
            "sh".to_string(),
        ]);

        let keystream = source.generate("42", 64).await.unwrap();
        assert_eq!(keystream, b"42:64".to_vec());

        let truncated = source.generate("42", 2).await.unwrap();
        assert_eq!(truncated, b"42".to_vec());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_external_keystream_nonzero_exit() {
        let source = ExternalKeystream::new(PathBuf::from("sh")).with_args(vec![
            "-c".to_string(),
            "echo nope >&2; exit 3".to_string(),
            "sh".to_string(),
        ]);

        match source.generate("42", 8).await {
            Err(DecryptError::ExternalTool(msg)) => assert!(msg.contains("nope")),
            other => panic!("Expected ExternalTool error, got {:?}", other),
        }
    }
}
