//! Shared JSON fixtures for motion tests.
//!
//! `fixtures/manifest.json` at the workspace root names every fixture by
//! kind; paths in the manifest are relative to the `fixtures/` directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    sequences: HashMap<String, String>,
    generators: HashMap<String, GeneratorEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeneratorEntry {
    Path(String),
    Detailed {
        path: String,
        #[serde(default)]
        tags: Vec<String>,
    },
}

impl GeneratorEntry {
    fn as_path(&self) -> &str {
        match self {
            GeneratorEntry::Path(path) => path,
            GeneratorEntry::Detailed { path, .. } => path,
        }
    }

    fn tags(&self) -> &[String] {
        match self {
            GeneratorEntry::Path(_) => &[],
            GeneratorEntry::Detailed { tags, .. } => tags,
        }
    }
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod sequences {
    use super::*;

    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.sequences.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.sequences, "sequence", name)?;
        read_to_string(rel)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let rel = lookup(&MANIFEST.sequences, "sequence", name)?;
        super::load_json(rel)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.sequences, "sequence", name)?;
        Ok(resolve_path(rel))
    }
}

pub mod generators {
    use super::*;

    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.generators.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Scenario names carrying `tag`.
    pub fn tagged(tag: &str) -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST
            .generators
            .iter()
            .filter(|(_, entry)| entry.tags().iter().any(|t| t == tag))
            .map(|(name, _)| name.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.generators, "generator", name)?;
        read_to_string(entry.as_path())
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.generators, "generator", name)?;
        super::load_json(entry.as_path())
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let entry = lookup(&MANIFEST.generators, "generator", name)?;
        Ok(resolve_path(entry.as_path()))
    }
}
