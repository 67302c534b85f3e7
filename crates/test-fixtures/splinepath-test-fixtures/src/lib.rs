//! Shared track fixtures for tests and benches.
//!
//! Fixture files live in the workspace `fixtures/` directory and are indexed by
//! `fixtures/manifest.json`.

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
    tracks: HashMap<String, TrackEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TrackEntry {
    Path(String),
    Detailed {
        path: String,
        #[serde(default)]
        description: Option<String>,
    },
}

impl TrackEntry {
    fn as_path(&self) -> &str {
        match self {
            TrackEntry::Path(path) => path,
            TrackEntry::Detailed { path, .. } => path,
        }
    }

    fn description(&self) -> Option<&str> {
        match self {
            TrackEntry::Path(_) => None,
            TrackEntry::Detailed { description, .. } => description.as_deref(),
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
    map.get(name).ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod tracks {
    use super::*;

    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.tracks.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.tracks, "track", name)?;
        read_to_string(entry.as_path())
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.tracks, "track", name)?;
        super::load_json(entry.as_path())
    }

    /// Free-text summary from the manifest, if the entry has one.
    pub fn description(name: &str) -> Result<Option<String>> {
        let entry = lookup(&MANIFEST.tracks, "track", name)?;
        Ok(entry.description().map(str::to_string))
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let entry = lookup(&MANIFEST.tracks, "track", name)?;
        Ok(resolve_path(entry.as_path()))
    }
}
