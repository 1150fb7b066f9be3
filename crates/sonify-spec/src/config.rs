//! Process-wide, explicitly-passed caches for palettes, rules, and motif
//! catalogs — the `CoreServices` value each job build is handed, replacing
//! ambient global mutable state with one value threaded through every call.

use crate::error::{SonifyError, SonifyResult};
use crate::motif::MotifCatalog;
use crate::palette::Palette;
use crate::rules::RuleSet;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use std::time::SystemTime;

/// A value cached against the `(path, mtime)` of the file it was loaded
/// from; reloaded only when the file's mtime changes.
struct MtimeCached<T> {
    path: PathBuf,
    mtime: Option<SystemTime>,
    value: Option<T>,
}

impl<T: Clone> MtimeCached<T> {
    fn new(path: PathBuf) -> Self {
        MtimeCached {
            path,
            mtime: None,
            value: None,
        }
    }

    fn get_or_reload<F>(&mut self, loader: F) -> SonifyResult<T>
    where
        F: FnOnce(&str) -> SonifyResult<T>,
    {
        let current_mtime = fs::metadata(&self.path).and_then(|m| m.modified()).ok();
        if self.value.is_none() || current_mtime != self.mtime {
            let text = fs::read_to_string(&self.path).map_err(|e| {
                SonifyError::ArtifactIoError {
                    attempts: 1,
                    source: e,
                }
            })?;
            let value = loader(&text)?;
            self.value = Some(value);
            self.mtime = current_mtime;
        }
        Ok(self.value.clone().expect("value populated above"))
    }
}

/// Palette bundle: every palette keyed by slug, loaded from one YAML file.
pub fn parse_palettes_yaml(text: &str) -> SonifyResult<HashMap<String, Palette>> {
    let list: Vec<Palette> = serde_yaml::from_str(text)
        .map_err(|e| SonifyError::Internal(format!("invalid palettes YAML: {e}")))?;
    Ok(list.into_iter().map(|p| (p.slug.clone(), p)).collect())
}

/// The explicit, process-wide services a job build reads from: palette
/// bundle, label rules, and motif catalogs by version. All immutable and
/// read-only from the caller's perspective; refreshed lazily on mtime
/// change rather than via a background thread.
pub struct CoreServices {
    palettes: Mutex<MtimeCached<HashMap<String, Palette>>>,
    rules: Mutex<MtimeCached<RuleSet>>,
    catalog_dir: PathBuf,
    catalogs: RwLock<HashMap<String, MotifCatalog>>,
    catalog_mtimes: Mutex<HashMap<String, SystemTime>>,
}

impl CoreServices {
    pub fn new(palettes_path: impl Into<PathBuf>, rules_path: impl Into<PathBuf>, catalog_dir: impl Into<PathBuf>) -> Self {
        CoreServices {
            palettes: Mutex::new(MtimeCached::new(palettes_path.into())),
            rules: Mutex::new(MtimeCached::new(rules_path.into())),
            catalog_dir: catalog_dir.into(),
            catalogs: RwLock::new(HashMap::new()),
            catalog_mtimes: Mutex::new(HashMap::new()),
        }
    }

    pub fn palettes(&self) -> SonifyResult<HashMap<String, Palette>> {
        self.palettes.lock().unwrap().get_or_reload(parse_palettes_yaml)
    }

    pub fn palette(&self, slug: &str) -> SonifyResult<Palette> {
        self.palettes()?
            .get(slug)
            .cloned()
            .ok_or_else(|| SonifyError::UnknownPalette {
                slug: slug.to_string(),
            })
    }

    pub fn rules(&self) -> SonifyResult<RuleSet> {
        self.rules.lock().unwrap().get_or_reload(|text| {
            let set = RuleSet::from_yaml(text)?;
            Ok(set)
        })
    }

    fn catalog_path(&self, version: &str) -> PathBuf {
        self.catalog_dir.join(format!("{version}.json"))
    }

    /// Resolves the latest catalog version by lexicographic filename sort
    /// within the catalog directory (version strings are expected to sort
    /// correctly, e.g. `v1`, `v2`, `v10`).
    pub fn latest_catalog_version(&self) -> SonifyResult<String> {
        let mut versions: Vec<String> = fs::read_dir(&self.catalog_dir)
            .map_err(|e| SonifyError::ArtifactIoError {
                attempts: 1,
                source: e,
            })?
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                name.strip_suffix(".json").map(|v| v.to_string())
            })
            .collect();
        versions.sort();
        versions
            .pop()
            .ok_or_else(|| SonifyError::Internal("no catalog versions found".to_string()))
    }

    /// Loads (and mtime-caches) the motif catalog for a version, defaulting
    /// to the latest available version.
    pub fn catalog(&self, version: Option<&str>) -> SonifyResult<MotifCatalog> {
        let version = match version {
            Some(v) => v.to_string(),
            None => self.latest_catalog_version()?,
        };
        let path = self.catalog_path(&version);
        let current_mtime = fs::metadata(&path).and_then(|m| m.modified()).ok();

        let needs_reload = {
            let mtimes = self.catalog_mtimes.lock().unwrap();
            mtimes.get(&version) != current_mtime.as_ref()
        };

        if needs_reload || !self.catalogs.read().unwrap().contains_key(&version) {
            let text = fs::read_to_string(&path).map_err(|e| SonifyError::ArtifactIoError {
                attempts: 1,
                source: e,
            })?;
            let catalog: MotifCatalog = serde_json::from_str(&text)
                .map_err(|e| SonifyError::Internal(format!("invalid catalog JSON: {e}")))?;
            self.catalogs.write().unwrap().insert(version.clone(), catalog);
            if let Some(mtime) = current_mtime {
                self.catalog_mtimes.lock().unwrap().insert(version.clone(), mtime);
            }
        }

        Ok(self
            .catalogs
            .read()
            .unwrap()
            .get(&version)
            .cloned()
            .expect("catalog populated above"))
    }
}

/// Reads an environment variable, falling back to a default and logging the
/// resolved value once via `tracing` at the call site (left to callers so
/// this stays dependency-free here).
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_path_or(key: &str, default: impl AsRef<Path>) -> PathBuf {
    std::env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| default.as_ref().to_path_buf())
}
