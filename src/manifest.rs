//! Generation manifest
//!
//! Stores hashes of generated fragments in `.seedwork_meta.yaml` inside the
//! output directory, so `seedwork generate` rewrites only fragments whose
//! text changed and removes fragments no declaration produces any more.

use crate::error::{Error, Result};
use crate::synth::GeneratedFragment;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MANIFEST_FILE: &str = ".seedwork_meta.yaml";

/// Suffix of every file this tool writes
pub const FRAGMENT_SUFFIX: &str = ".g.cs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Manifest {
    /// Fragment file name -> SHA256 of its text
    pub fragment_hashes: BTreeMap<String, String>,

    /// Owning declaration (`Ns.Name`) -> fragment file names
    #[serde(default)]
    pub owners: BTreeMap<String, Vec<String>>,

    /// When the fragments were last written
    #[serde(with = "chrono::serde::ts_seconds")]
    #[schemars(with = "String")]
    pub generated_at: DateTime<Utc>,

    /// SeedWork version that wrote them
    pub tool_version: String,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            fragment_hashes: BTreeMap::new(),
            owners: BTreeMap::new(),
            generated_at: Utc::now(),
            tool_version: crate::VERSION.to_string(),
        }
    }
}

impl Manifest {
    /// Load the manifest from an output directory
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let manifest = serde_norway::from_str(&content)
            .map_err(|e| Error::Other(format!("Failed to parse {}: {}", MANIFEST_FILE, e)))?;
        Ok(Some(manifest))
    }

    /// Save the manifest to an output directory
    pub fn save_to_dir(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;

        let mut content = String::from(
            "# AUTO-GENERATED - DO NOT EDIT\n\
             # Hashes of generated fragments, rewritten by 'seedwork generate'\n\n",
        );
        content.push_str(&serde_norway::to_string(self)?);

        std::fs::write(dir.join(MANIFEST_FILE), content)?;
        Ok(())
    }

    /// Fragment differs from what was last written, or was never written
    pub fn is_stale(&self, fragment: &GeneratedFragment) -> bool {
        self.fragment_hashes
            .get(&fragment.slot_name)
            .is_none_or(|hash| *hash != fragment_hash(&fragment.text))
    }

    pub fn record(&mut self, fragment: &GeneratedFragment) {
        self.fragment_hashes
            .insert(fragment.slot_name.clone(), fragment_hash(&fragment.text));
        let files = self.owners.entry(fragment.owner.clone()).or_default();
        if !files.contains(&fragment.slot_name) {
            files.push(fragment.slot_name.clone());
        }
    }

    /// Every file name the manifest knows about
    pub fn tracked_files(&self) -> BTreeSet<String> {
        self.fragment_hashes.keys().cloned().collect()
    }
}

/// SHA256 of a fragment's text
pub fn fragment_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fragment files in `dir` that the current pass did not produce
///
/// Only `*.g.cs` files are considered; hand-written files are never touched.
pub fn find_orphaned_files(dir: &Path, current: &[GeneratedFragment]) -> Result<Vec<PathBuf>> {
    let keep: BTreeSet<&str> = current.iter().map(|f| f.slot_name.as_str()).collect();
    let mut orphaned = Vec::new();

    if !dir.exists() {
        return Ok(orphaned);
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_file() && name.ends_with(FRAGMENT_SUFFIX) && !keep.contains(name) {
            orphaned.push(path);
        }
    }
    orphaned.sort();
    Ok(orphaned)
}

/// What [`write_fragments`] did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub written: Vec<String>,
    pub unchanged: Vec<String>,
    pub removed: Vec<String>,
}

/// Write fragments into `dir`, skipping unchanged ones and removing orphans
pub fn write_fragments(dir: &Path, fragments: &[GeneratedFragment]) -> Result<WriteSummary> {
    std::fs::create_dir_all(dir)?;
    let previous = Manifest::load_from_dir(dir)?.unwrap_or_default();
    let mut manifest = Manifest::default();
    let mut summary = WriteSummary::default();

    for fragment in fragments {
        let path = dir.join(&fragment.slot_name);
        if !previous.is_stale(fragment) && path.exists() {
            summary.unchanged.push(fragment.slot_name.clone());
        } else {
            std::fs::write(&path, &fragment.text)?;
            debug!(file = %fragment.slot_name, "wrote fragment");
            summary.written.push(fragment.slot_name.clone());
        }
        manifest.record(fragment);
    }

    for path in find_orphaned_files(dir, fragments)? {
        std::fs::remove_file(&path)?;
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            summary.removed.push(name.to_string());
        }
    }

    manifest.save_to_dir(dir)?;
    Ok(summary)
}
