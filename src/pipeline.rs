//! Analysis pass
//!
//! Parses sources in parallel, binds one [`Compilation`], then checks and
//! synthesizes every marked declaration in parallel. The compilation is
//! read-only while workers run, and results come back in source order.

use minijinja::Environment;
use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::check::{self, Violation};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::parse::SourceFile;
use crate::shape::{self, DeclarationShape};
use crate::symbols::Compilation;
use crate::synth::{self, GeneratedFragment};
use crate::syntax::Location;
use crate::templates;

/// Cooperative cancellation shared between the caller and workers
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once [`cancel`](Self::cancel) was called
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Rendered fragments per owner, tagged with the hash they were rendered from
///
/// Only skips rendering: a hit returns exactly what rendering the same
/// shape with the same settings would produce. Each owner keeps only its
/// latest entry.
#[derive(Debug, Default)]
pub struct GenerationCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    hits: AtomicUsize,
}

#[derive(Debug)]
struct CacheEntry {
    hash: String,
    fragments: Vec<GeneratedFragment>,
}

impl GenerationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// SHA-256 of the shape and the settings it is rendered with, ignoring
    /// where the declaration sits in its file
    pub fn shape_hash(shape: &DeclarationShape, settings: &str) -> Result<String> {
        let keyed = DeclarationShape {
            location: Location::default(),
            ..shape.clone()
        };
        let mut hasher = Sha256::new();
        hasher.update(settings.as_bytes());
        hasher.update([0u8]);
        hasher.update(serde_json::to_vec(&keyed)?);
        Ok(hex::encode(hasher.finalize()))
    }

    fn get(&self, owner: &str, hash: &str) -> Option<Vec<GeneratedFragment>> {
        let entries = self.entries.lock().ok()?;
        let found = entries
            .get(owner)
            .filter(|entry| entry.hash == hash)
            .map(|entry| entry.fragments.clone());
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Replaces whatever `owner` had before
    fn insert(&self, owner: String, hash: String, fragments: Vec<GeneratedFragment>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(owner, CacheEntry { hash, fragments });
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }
}

/// Everything one pass found out about one marked declaration
#[derive(Debug, Clone, Serialize)]
pub struct DeclarationReport {
    pub shape: DeclarationShape,
    pub violations: Vec<Violation>,
    pub fragments: Vec<GeneratedFragment>,
}

/// Result of one analysis pass
#[derive(Debug, Default, Serialize)]
pub struct PassResult {
    /// One report per marked declaration, in source order
    pub reports: Vec<DeclarationReport>,
    pub files_parsed: usize,
    #[serde(skip)]
    pub duration: Duration,
}

impl PassResult {
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.reports.iter().flat_map(|r| r.violations.iter())
    }

    pub fn fragments(&self) -> impl Iterator<Item = &GeneratedFragment> {
        self.reports.iter().flat_map(|r| r.fragments.iter())
    }

    pub fn has_errors(&self) -> bool {
        self.reports.iter().any(|r| check::has_errors(&r.violations))
    }
}

/// Check and synthesis over a set of sources
pub struct Pipeline {
    config: Config,
    templates: Option<Environment<'static>>,
    cache: Option<Arc<GenerationCache>>,
    synthesize: bool,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            templates: None,
            cache: None,
            synthesize: true,
        }
    }

    /// Render with a custom engine instead of the embedded templates
    pub fn with_templates(mut self, env: Environment<'static>) -> Self {
        self.templates = Some(env);
        self
    }

    pub fn with_cache(mut self, cache: Arc<GenerationCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Skip synthesis, only report violations
    pub fn check_only(mut self) -> Self {
        self.synthesize = false;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run(&self, sources: &[SourceFile], cancel: &CancellationToken) -> Result<PassResult> {
        let start = Instant::now();
        cancel.check()?;

        let trees = sources
            .par_iter()
            .map(SourceFile::parse)
            .collect::<Result<Vec<_>>>()?;
        let compilation = Compilation::new(trees, &self.config);
        let settings = match (&self.cache, self.synthesize) {
            (Some(_), true) => self.settings_fingerprint()?,
            _ => String::new(),
        };
        let candidates = shape::discover(&compilation, &self.config);
        debug!(candidates = candidates.len(), "discovered marked declarations");

        let reports = candidates
            .par_iter()
            .map(|candidate| {
                cancel.check()?;
                let Some(shape) = shape::extract_shape(&compilation, *candidate, &self.config) else {
                    return Ok(None);
                };
                let violations = check::check_shape(&shape, &self.config);
                let fragments = if self.synthesize {
                    self.fragments(&shape, &settings)?
                } else {
                    Vec::new()
                };
                Ok(Some(DeclarationReport {
                    shape,
                    violations,
                    fragments,
                }))
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();

        let result = PassResult {
            reports,
            files_parsed: sources.len(),
            duration: start.elapsed(),
        };
        info!(
            files = result.files_parsed,
            declarations = result.reports.len(),
            violations = result.violations().count(),
            fragments = result.fragments().count(),
            elapsed_ms = result.duration.as_millis() as u64,
            "analysis pass complete"
        );
        Ok(result)
    }

    fn fragments(&self, shape: &DeclarationShape, settings: &str) -> Result<Vec<GeneratedFragment>> {
        let env = self.engine();
        let Some(cache) = &self.cache else {
            return synth::synthesize_with(env, shape, &self.config);
        };

        let owner = shape.owner();
        let hash = GenerationCache::shape_hash(shape, settings)?;
        if let Some(fragments) = cache.get(&owner, &hash) {
            debug!(owner = %owner, "generation cache hit");
            return Ok(fragments);
        }
        let fragments = synth::synthesize_with(env, shape, &self.config)?;
        cache.insert(owner, hash, fragments.clone());
        Ok(fragments)
    }

    fn engine(&self) -> &Environment<'static> {
        self.templates.as_ref().unwrap_or_else(|| templates::engine())
    }

    /// Hash of the config and template text the output depends on
    fn settings_fingerprint(&self) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(&self.config)?);
        hasher.update(templates::fingerprint(self.engine())?.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}
