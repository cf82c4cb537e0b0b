//! Artifact signing utility.
//!
//! Writes `manifest.json` (SHA-256 of each artifact file) and `bundle.sig`
//! (Ed25519 signature over the manifest bytes) into an artifact directory.
//!
//! # Usage
//!
//! ```bash
//! sign_artifacts <artifact_dir>
//! sign_artifacts --generate-key <seed_out_path>
//! ```
//!
//! The signing seed (base64, 32 bytes) is read from, in order:
//! `STUNTGUARD_SIGNING_KEY_B64_FD`, `STUNTGUARD_SIGNING_KEY_B64_FILE`,
//! `/run/secrets/stuntguard_signing_key_b64`, and in debug builds only
//! `STUNTGUARD_SIGNING_KEY_B64`.

use std::collections::BTreeMap;
use std::env;
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
#[cfg(unix)]
use std::os::unix::io::FromRawFd;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use stuntguard::adapters::fs::{
    sha256_hex, ArtifactManifest, MANIFEST_FILE, MANIFEST_VERSION, SIGNATURE_FILE,
};
use stuntguard::ports::ArtifactKind;

const KEY_FD_ENV: &str = "STUNTGUARD_SIGNING_KEY_B64_FD";
const KEY_FILE_ENV: &str = "STUNTGUARD_SIGNING_KEY_B64_FILE";
const KEY_DEBUG_ENV: &str = "STUNTGUARD_SIGNING_KEY_B64";
const DOCKER_SECRET_PATH: &str = "/run/secrets/stuntguard_signing_key_b64";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

fn non_empty(secret: &str) -> Result<Zeroizing<String>> {
    let secret = secret.trim_end_matches(['\n', '\r']);
    if secret.is_empty() {
        bail!("Empty signing key");
    }
    Ok(Zeroizing::new(secret.to_string()))
}

fn read_signing_seed_b64() -> Result<Zeroizing<String>> {
    #[cfg(unix)]
    if let Ok(fd_str) = env::var(KEY_FD_ENV) {
        use std::io::Read;

        let fd: i32 = fd_str.trim().parse().context("Invalid key FD")?;
        if fd <= 2 {
            bail!("Refusing to read signing key from stdio FD");
        }
        // SAFETY: the FD is handed to this process for a one-time secret read.
        let mut file = unsafe { fs::File::from_raw_fd(fd) };
        let mut buf = Zeroizing::new(String::new());
        file.read_to_string(&mut buf)
            .context("Failed reading signing key from FD")?;
        return non_empty(&buf);
    }

    if let Ok(path) = env::var(KEY_FILE_ENV) {
        let content = Zeroizing::new(
            fs::read_to_string(path.trim()).context("Failed reading signing key file")?,
        );
        return non_empty(&content);
    }

    if Path::new(DOCKER_SECRET_PATH).exists() {
        let content = Zeroizing::new(
            fs::read_to_string(DOCKER_SECRET_PATH).context("Failed reading docker secret")?,
        );
        return non_empty(&content);
    }

    if cfg!(debug_assertions) {
        if let Ok(v) = env::var(KEY_DEBUG_ENV) {
            return non_empty(&Zeroizing::new(v));
        }
    }

    bail!(
        "Missing signing key. Provide one of: {KEY_FD_ENV}, {KEY_FILE_ENV}, or {DOCKER_SECRET_PATH} ({KEY_DEBUG_ENV} only in debug builds)."
    )
}

fn read_signing_seed() -> Result<Seed> {
    let b64 = read_signing_seed_b64()?;
    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(b64.trim())
            .context("Invalid base64 in signing key")?,
    );
    let bytes: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
        anyhow::anyhow!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        )
    })?;
    Ok(Seed(bytes))
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Create a new seed file (0600 on unix) and print the matching public key.
fn generate_key(out: &Path) -> Result<()> {
    if out.exists() {
        bail!("Refusing to overwrite existing {}", out.display());
    }
    let mut seed = Seed([0u8; 32]);
    rand::rngs::OsRng.fill_bytes(&mut seed.0);
    let verifying_key = SigningKey::from_bytes(&seed.0).verifying_key();

    let encoded = Zeroizing::new(general_purpose::STANDARD.encode(seed.0));
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options
        .open(out)
        .with_context(|| format!("Failed to create {}", out.display()))?;
    std::io::Write::write_all(&mut file, format!("{}\n", encoded.as_str()).as_bytes())?;

    println!("Wrote signing seed: {}", out.display());
    println!(
        "PUBKEY_B64={}",
        general_purpose::STANDARD.encode(verifying_key.as_bytes())
    );
    Ok(())
}

fn sign(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("Artifact directory not found: {}", dir.display());
    }

    let seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed.0);

    let mut files = BTreeMap::new();
    for kind in ArtifactKind::ALL {
        let path = dir.join(kind.file_name());
        let bytes = fs::read(&path)
            .with_context(|| format!("Missing {} artifact at {}", kind, path.display()))?;
        files.insert(kind.file_name().to_string(), sha256_hex(&bytes));
    }

    let manifest = ArtifactManifest {
        version: MANIFEST_VERSION,
        created_at: Some(unix_now()),
        files,
    };
    let manifest_bytes = serde_json::to_vec_pretty(&manifest)?;
    let manifest_path = dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

    let sig: Signature = signing_key.sign(&manifest_bytes);
    let sig_path = dir.join(SIGNATURE_FILE);
    fs::write(&sig_path, sig.to_bytes())
        .with_context(|| format!("Failed to write {}", sig_path.display()))?;

    println!("Signed manifest: {}", manifest_path.display());
    println!("Wrote signature: {}", sig_path.display());
    println!(
        "PUBKEY_B64={}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );
    Ok(())
}

fn usage() -> &'static str {
    "Usage: sign_artifacts <artifact_dir> | sign_artifacts --generate-key <seed_out_path>"
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [flag, out] if flag == "--generate-key" => generate_key(&PathBuf::from(out)),
        [dir] if !dir.starts_with('-') => sign(&PathBuf::from(dir)),
        _ => bail!(usage()),
    }
}
