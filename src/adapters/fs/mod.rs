//! Filesystem artifact source with optional integrity verification.
//!
//! An artifact directory holds one JSON file per artifact. It may also hold:
//! - `manifest.json`: SHA-256 digests binding each artifact file
//! - `bundle.sig`: Ed25519 signature over the raw manifest bytes
//!
//! # Verification
//!
//! - With a manifest present, every artifact read is checked against its
//!   digest. Files the manifest does not bind are refused.
//! - With a signature present, it must verify against the configured key.
//! - `require_signed` refuses directories without both files.
//! - Without a manifest (and without `require_signed`), artifacts load
//!   unverified and a warning is logged.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ports::{ArtifactKind, ArtifactReadError, ArtifactSource};

/// Manifest file name inside an artifact directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Signature file name inside an artifact directory.
pub const SIGNATURE_FILE: &str = "bundle.sig";

/// Manifest format version understood by this build.
pub const MANIFEST_VERSION: u32 = 1;

/// Allowed clock skew for `created_at`, in seconds.
const MAX_CLOCK_SKEW_SECS: i64 = 300;

/// Manifest binding artifact files to their SHA-256 digests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    pub files: BTreeMap<String, String>,
}

/// Error opening or verifying an artifact directory.
#[derive(Debug, thiserror::Error)]
pub enum IntegrityError {
    #[error("artifact directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("{MANIFEST_FILE} is required but missing in {0}")]
    MissingManifest(PathBuf),

    #[error("{SIGNATURE_FILE} is required but missing in {0}")]
    MissingSignature(PathBuf),

    #[error("{SIGNATURE_FILE} present but no verifying key is configured")]
    MissingKey,

    #[error("invalid bundle signature")]
    BadSignature,

    #[error("invalid manifest: {0}")]
    Manifest(String),

    #[error("invalid verifying key: {0}")]
    Key(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// How strictly an artifact directory is checked.
#[derive(Debug, Clone, Default)]
pub struct VerificationPolicy {
    /// Refuse directories without a signed manifest
    pub require_signed: bool,
    /// Key that bundle signatures must verify against
    pub verifying_key: Option<VerifyingKey>,
}

/// Decode a base64 Ed25519 verifying key.
///
/// # Errors
/// Returns `IntegrityError::Key` for bad base64 or a wrong-length key.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, IntegrityError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|e| IntegrityError::Key(format!("bad base64: {e}")))?;
    let raw: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| IntegrityError::Key(format!("expected 32 bytes, got {}", bytes.len())))?;
    VerifyingKey::from_bytes(&raw).map_err(|e| IntegrityError::Key(e.to_string()))
}

/// Lower-case hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

// Constant-time compare for equal-length ASCII digests.
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

/// Artifact source backed by a directory.
#[derive(Debug)]
pub struct FsArtifactSource {
    dir: PathBuf,
    manifest: Option<ArtifactManifest>,
}

impl FsArtifactSource {
    /// Open an artifact directory and verify its manifest per `policy`.
    ///
    /// Individual artifact digests are checked lazily in [`ArtifactSource::read`].
    ///
    /// # Errors
    /// Returns `IntegrityError` if the directory is missing or the manifest or
    /// signature does not satisfy the policy.
    pub fn open(
        dir: impl AsRef<Path>,
        policy: &VerificationPolicy,
    ) -> Result<Self, IntegrityError> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(IntegrityError::MissingDirectory(dir));
        }

        let manifest_path = dir.join(MANIFEST_FILE);
        let sig_path = dir.join(SIGNATURE_FILE);

        if !manifest_path.exists() {
            if policy.require_signed {
                return Err(IntegrityError::MissingManifest(dir));
            }
            tracing::warn!(
                "No {MANIFEST_FILE} in {:?}; loading artifacts without integrity checks",
                dir
            );
            return Ok(Self {
                dir,
                manifest: None,
            });
        }

        let manifest_bytes = fs::read(&manifest_path)?;

        if sig_path.exists() {
            let key = policy.verifying_key.as_ref().ok_or(IntegrityError::MissingKey)?;
            let sig_bytes = fs::read(&sig_path)?;
            let sig_raw: [u8; 64] = sig_bytes
                .as_slice()
                .try_into()
                .map_err(|_| IntegrityError::BadSignature)?;
            key.verify(&manifest_bytes, &Signature::from_bytes(&sig_raw))
                .map_err(|_| IntegrityError::BadSignature)?;
            tracing::info!("Artifact manifest signature verified");
        } else if policy.require_signed {
            return Err(IntegrityError::MissingSignature(dir));
        } else {
            tracing::warn!("{MANIFEST_FILE} is not signed; checking digests only");
        }

        let manifest: ArtifactManifest = serde_json::from_slice(&manifest_bytes)
            .map_err(|e| IntegrityError::Manifest(e.to_string()))?;
        if manifest.version != MANIFEST_VERSION {
            return Err(IntegrityError::Manifest(format!(
                "unsupported version {}",
                manifest.version
            )));
        }
        if manifest.files.is_empty() {
            return Err(IntegrityError::Manifest("no files listed".into()));
        }
        if let Some(created_at) = manifest.created_at {
            if created_at > unix_now() + MAX_CLOCK_SKEW_SECS {
                return Err(IntegrityError::Manifest("created_at is in the future".into()));
            }
        }

        Ok(Self {
            dir,
            manifest: Some(manifest),
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether reads are checked against a manifest.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.manifest.is_some()
    }
}

impl ArtifactSource for FsArtifactSource {
    fn describe(&self) -> String {
        format!("{}", self.dir.display())
    }

    fn read(&self, kind: ArtifactKind) -> Result<Vec<u8>, ArtifactReadError> {
        let name = kind.file_name();
        let path = self.dir.join(name);
        if !path.exists() {
            return Err(ArtifactReadError::NotFound(path.display().to_string()));
        }
        let bytes = fs::read(&path)?;

        if let Some(manifest) = &self.manifest {
            let expected = manifest.files.get(name).ok_or_else(|| {
                ArtifactReadError::Integrity(format!("{name} is not bound by {MANIFEST_FILE}"))
            })?;
            if !constant_time_eq_str(&sha256_hex(&bytes), &expected.to_ascii_lowercase()) {
                return Err(ArtifactReadError::Integrity(format!(
                    "digest mismatch for {name}"
                )));
            }
        }

        tracing::debug!("Read artifact {} ({} bytes)", kind, bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::RngCore;
    use tempfile::tempdir;

    fn signing_key() -> SigningKey {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        SigningKey::from_bytes(&seed)
    }

    fn write_artifacts(dir: &Path) {
        for kind in ArtifactKind::ALL {
            fs::write(dir.join(kind.file_name()), format!("{{\"id\":\"{kind}\"}}"))
                .expect("write artifact");
        }
    }

    fn write_manifest(dir: &Path, key: Option<&SigningKey>) -> Vec<u8> {
        let mut files = BTreeMap::new();
        for kind in ArtifactKind::ALL {
            let bytes = fs::read(dir.join(kind.file_name())).expect("read artifact");
            files.insert(kind.file_name().to_string(), sha256_hex(&bytes));
        }
        let manifest = ArtifactManifest {
            version: MANIFEST_VERSION,
            created_at: Some(unix_now()),
            files,
        };
        let bytes = serde_json::to_vec_pretty(&manifest).expect("serialize manifest");
        fs::write(dir.join(MANIFEST_FILE), &bytes).expect("write manifest");
        if let Some(key) = key {
            let sig: Signature = key.sign(&bytes);
            fs::write(dir.join(SIGNATURE_FILE), sig.to_bytes()).expect("write signature");
        }
        bytes
    }

    fn policy(key: &SigningKey, require_signed: bool) -> VerificationPolicy {
        VerificationPolicy {
            require_signed,
            verifying_key: Some(key.verifying_key()),
        }
    }

    #[test]
    fn test_unverified_directory_loads() {
        let temp = tempdir().expect("tempdir");
        write_artifacts(temp.path());

        let source =
            FsArtifactSource::open(temp.path(), &VerificationPolicy::default()).expect("open");
        assert!(!source.is_verified());
        assert!(source.read(ArtifactKind::Classifier).is_ok());
    }

    #[test]
    fn test_missing_artifact_reported() {
        let temp = tempdir().expect("tempdir");
        let source =
            FsArtifactSource::open(temp.path(), &VerificationPolicy::default()).expect("open");
        assert!(matches!(
            source.read(ArtifactKind::LabelDecoder),
            Err(ArtifactReadError::NotFound(_))
        ));
    }

    #[test]
    fn test_missing_directory_rejected() {
        let temp = tempdir().expect("tempdir");
        let err = FsArtifactSource::open(temp.path().join("nope"), &VerificationPolicy::default())
            .unwrap_err();
        assert!(matches!(err, IntegrityError::MissingDirectory(_)));
    }

    #[test]
    fn test_signed_manifest_verifies() {
        let temp = tempdir().expect("tempdir");
        let key = signing_key();
        write_artifacts(temp.path());
        write_manifest(temp.path(), Some(&key));

        let source = FsArtifactSource::open(temp.path(), &policy(&key, true)).expect("open");
        assert!(source.is_verified());
        for kind in ArtifactKind::ALL {
            source.read(kind).expect("verified read");
        }
    }

    #[test]
    fn test_tampered_artifact_rejected() {
        let temp = tempdir().expect("tempdir");
        let key = signing_key();
        write_artifacts(temp.path());
        write_manifest(temp.path(), Some(&key));
        fs::write(temp.path().join("scaler.json"), b"{\"tampered\":true}").expect("tamper");

        let source = FsArtifactSource::open(temp.path(), &policy(&key, true)).expect("open");
        let err = source.read(ArtifactKind::NumericalScaler).unwrap_err();
        assert!(err.to_string().contains("digest mismatch"));
        assert!(source.read(ArtifactKind::Classifier).is_ok());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let temp = tempdir().expect("tempdir");
        let key = signing_key();
        write_artifacts(temp.path());
        write_manifest(temp.path(), Some(&key));

        let other = signing_key();
        let err = FsArtifactSource::open(temp.path(), &policy(&other, false)).unwrap_err();
        assert!(matches!(err, IntegrityError::BadSignature));
    }

    #[test]
    fn test_signature_without_key_rejected() {
        let temp = tempdir().expect("tempdir");
        let key = signing_key();
        write_artifacts(temp.path());
        write_manifest(temp.path(), Some(&key));

        let err = FsArtifactSource::open(temp.path(), &VerificationPolicy::default()).unwrap_err();
        assert!(matches!(err, IntegrityError::MissingKey));
    }

    #[test]
    fn test_require_signed_refuses_unsigned() {
        let temp = tempdir().expect("tempdir");
        let key = signing_key();
        write_artifacts(temp.path());

        let err = FsArtifactSource::open(temp.path(), &policy(&key, true)).unwrap_err();
        assert!(matches!(err, IntegrityError::MissingManifest(_)));

        write_manifest(temp.path(), None);
        let err = FsArtifactSource::open(temp.path(), &policy(&key, true)).unwrap_err();
        assert!(matches!(err, IntegrityError::MissingSignature(_)));

        // Digest-only manifests are fine when signatures are optional.
        let source = FsArtifactSource::open(temp.path(), &policy(&key, false)).expect("open");
        assert!(source.is_verified());
    }

    #[test]
    fn test_verifying_key_from_b64() {
        let key = signing_key();
        let b64 = base64::engine::general_purpose::STANDARD.encode(key.verifying_key().to_bytes());
        let parsed = verifying_key_from_b64(&format!("{b64}\n")).expect("valid key");
        assert_eq!(parsed, key.verifying_key());
        assert!(verifying_key_from_b64("not base64!").is_err());
        assert!(verifying_key_from_b64("AAAA").is_err());
    }
}
