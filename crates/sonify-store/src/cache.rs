//! Content-addressed artifact storage: the single adapter allowed to mutate
//! durable state. All writes go through [`ArtifactStore::put_atomic`]; reads
//! through [`ArtifactStore::get_signed_url`].

use crate::error::{StoreError, StoreResult};
use sonify_spec::{Artifact, ArtifactKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Builds the artifact key for a job's output of a given kind, matching the
/// `tenant/midi_output/{job_id}.mid` layout.
pub fn artifact_key(tenant: &str, job_id: &str, kind: ArtifactKind) -> String {
    let dir = match kind {
        ArtifactKind::Midi => "midi_output",
        ArtifactKind::Mp3 => "mp3",
        ArtifactKind::Json => "plan",
    };
    format!("{tenant}/{dir}/{job_id}.{}", kind.extension())
}

pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ArtifactStore { root: root.into() }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Writes `bytes` under `key` via write-to-temp-then-rename, so a
    /// concurrent reader never observes a partial file.
    pub fn put_atomic(&self, key: &str, bytes: &[u8], kind: ArtifactKind) -> StoreResult<Artifact> {
        let dest = self.resolve(key);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::ArtifactIo { attempts: 1, source: e })?;
        }

        let tmp_path = dest.with_extension(format!("{}.tmp", std::process::id()));
        fs::write(&tmp_path, bytes).map_err(|e| StoreError::ArtifactIo { attempts: 1, source: e })?;
        fs::rename(&tmp_path, &dest).map_err(|e| StoreError::ArtifactIo { attempts: 1, source: e })?;

        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            .to_string();

        Ok(Artifact {
            kind,
            bytes_sha256: blake3::hash(bytes).to_hex().to_string(),
            size: bytes.len() as u64,
            created_at,
        })
    }

    pub fn exists(&self, key: &str) -> bool {
        self.resolve(key).exists()
    }

    pub fn read(&self, key: &str) -> StoreResult<Vec<u8>> {
        fs::read(self.resolve(key)).map_err(|e| StoreError::ArtifactIo { attempts: 1, source: e })
    }

    /// Removes the artifact at `key`, if present. Used to roll back partial
    /// writes when a later artifact in the same job fails, so a failed job
    /// never leaves orphaned bytes behind. Missing keys are not an error.
    pub fn delete(&self, key: &str) -> StoreResult<()> {
        match fs::remove_file(self.resolve(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::ArtifactIo { attempts: 1, source: e }),
        }
    }

    /// Produces a signed URL for reading `key`, valid for `ttl_secs`. This
    /// local adapter has no object-storage backend to delegate signing to,
    /// so the "signature" is a content hash of `key` plus expiry, verifiable
    /// by any holder of the same root — sufficient to exercise the contract
    /// end-to-end without standing up real cloud storage.
    pub fn get_signed_url(&self, key: &str, ttl_secs: u64) -> String {
        let expires_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            + ttl_secs;
        let sig_input = format!("{key}:{expires_at}");
        let sig = blake3::hash(sig_input.as_bytes()).to_hex().to_string();
        format!("file://{}/{key}?expires={expires_at}&sig={sig}", self.root.display())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn put_then_read_roundtrips() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let key = artifact_key("default", "job1", ArtifactKind::Midi);
        let artifact = store.put_atomic(&key, b"midi bytes", ArtifactKind::Midi).unwrap();
        assert_eq!(artifact.size, 10);
        assert!(store.exists(&key));
        assert_eq!(store.read(&key).unwrap(), b"midi bytes");
    }

    #[test]
    fn delete_removes_artifact_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let key = artifact_key("default", "job1", ArtifactKind::Midi);
        store.put_atomic(&key, b"midi bytes", ArtifactKind::Midi).unwrap();
        assert!(store.exists(&key));
        store.delete(&key).unwrap();
        assert!(!store.exists(&key));
        // Deleting again is not an error.
        store.delete(&key).unwrap();
    }

    #[test]
    fn artifact_key_matches_layout_contract() {
        let key = artifact_key("acme", "job-42", ArtifactKind::Mp3);
        assert_eq!(key, "acme/mp3/job-42.mp3");
    }

    #[test]
    fn signed_url_embeds_expiry() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let url = store.get_signed_url("k", 60);
        assert!(url.contains("expires="));
        assert!(url.contains("sig="));
    }
}
