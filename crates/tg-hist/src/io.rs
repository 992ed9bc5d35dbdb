//! Histogram files and the loader seam used to resolve ledger rows into grids.
//!
//! The on-disk format is a JSON object `{ "histograms": [Grid2D, ...] }`; grids are
//! looked up by name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tg_core::{Error, Result};

use crate::grid::Grid2D;

/// Resolves a `(source_filename, source_histname)` pair into a grid.
pub trait HistogramLoader: Send + Sync {
    /// Load histogram `histname` from `filename`.
    fn load(&self, filename: &str, histname: &str) -> Result<Grid2D>;
}

/// Contents of one histogram file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistogramFile {
    /// Stored grids, in write order.
    pub histograms: Vec<Grid2D>,
}

impl HistogramFile {
    /// Grid named `name`, if present.
    pub fn get(&self, name: &str) -> Option<&Grid2D> {
        self.histograms.iter().find(|h| h.name() == name)
    }

    /// Names of all stored grids.
    pub fn names(&self) -> Vec<&str> {
        self.histograms.iter().map(|h| h.name()).collect()
    }
}

/// Read a histogram file.
pub fn read_histogram_file(path: &Path) -> Result<HistogramFile> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Write `grids` to `path` (pretty JSON), creating parent directories.
///
/// Duplicate names are rejected so every stored grid stays addressable.
pub fn write_histogram_file(path: &Path, grids: &[Grid2D]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for g in grids {
        if !seen.insert(g.name()) {
            return Err(Error::Validation(format!(
                "duplicate histogram name '{}' in {}",
                g.name(),
                path.display()
            )));
        }
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let file = HistogramFile { histograms: grids.to_vec() };
    std::fs::write(path, serde_json::to_vec_pretty(&file)?)?;
    log::info!("wrote {} histograms to {}", grids.len(), path.display());
    Ok(())
}

/// Loader over JSON histogram files, resolving relative names against `base_dir`.
///
/// Each file is parsed once and cached for the lifetime of the store.
#[derive(Debug, Default)]
pub struct JsonHistogramStore {
    base_dir: PathBuf,
    cache: Mutex<HashMap<PathBuf, Arc<HistogramFile>>>,
}

impl JsonHistogramStore {
    /// Store rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into(), cache: Mutex::new(HashMap::new()) }
    }

    fn resolve(&self, filename: &str) -> PathBuf {
        let p = Path::new(filename);
        if p.is_absolute() { p.to_path_buf() } else { self.base_dir.join(p) }
    }

    fn file(&self, filename: &str) -> Result<Arc<HistogramFile>> {
        let path = self.resolve(filename);
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| Error::Validation("histogram cache lock poisoned".into()))?;
        if let Some(f) = cache.get(&path) {
            return Ok(Arc::clone(f));
        }
        log::debug!("opening histogram file {}", path.display());
        let f = Arc::new(read_histogram_file(&path)?);
        cache.insert(path, Arc::clone(&f));
        Ok(f)
    }
}

impl HistogramLoader for JsonHistogramStore {
    fn load(&self, filename: &str, histname: &str) -> Result<Grid2D> {
        let file = self.file(filename)?;
        file.get(histname).cloned().ok_or_else(|| {
            Error::Validation(format!(
                "histogram '{histname}' not found in {} (available: {})",
                self.resolve(filename).display(),
                file.names().join(", ")
            ))
        })
    }
}

/// In-memory loader keyed by `(filename, histname)`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    grids: HashMap<(String, String), Grid2D>,
}

impl InMemoryLoader {
    /// Empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `grid` under `(filename, grid.name())`.
    pub fn insert(&mut self, filename: impl Into<String>, grid: Grid2D) {
        self.grids.insert((filename.into(), grid.name().to_string()), grid);
    }

    /// Builder form of [`InMemoryLoader::insert`].
    pub fn with(mut self, filename: impl Into<String>, grid: Grid2D) -> Self {
        self.insert(filename, grid);
        self
    }
}

impl HistogramLoader for InMemoryLoader {
    fn load(&self, filename: &str, histname: &str) -> Result<Grid2D> {
        self.grids
            .get(&(filename.to_string(), histname.to_string()))
            .cloned()
            .ok_or_else(|| Error::Validation(format!("histogram '{histname}' not found in {filename}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Axis;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn tmp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        let p = std::env::temp_dir().join(format!("tg_hist_{}_{}_{tag}", std::process::id(), nanos));
        std::fs::create_dir_all(&p).unwrap();
        p
    }

    fn grid(name: &str, v: f64) -> Grid2D {
        Grid2D::from_content(
            name,
            Axis::uniform(1, 0.0, 1.0).unwrap(),
            Axis::uniform(2, 0.0, 1.0).unwrap(),
            vec![v, 2.0 * v],
        )
        .unwrap()
    }

    #[test]
    fn write_then_load_through_store() {
        let dir = tmp_dir("store");
        write_histogram_file(&dir.join("sub/hists.json"), &[grid("a", 1.0), grid("b", 3.0)]).unwrap();

        let store = JsonHistogramStore::new(&dir);
        let b = store.load("sub/hists.json", "b").unwrap();
        assert_eq!(b.content(), &[3.0, 6.0]);

        let err = store.load("sub/hists.json", "missing").unwrap_err();
        assert!(err.to_string().contains("available: a, b"), "{err}");
        assert!(store.load("nope.json", "a").is_err());
    }

    #[test]
    fn duplicate_names_rejected() {
        let dir = tmp_dir("dup");
        let err = write_histogram_file(&dir.join("h.json"), &[grid("a", 1.0), grid("a", 2.0)])
            .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn in_memory_loader() {
        let loader = InMemoryLoader::new().with("f", grid("h", 2.0));
        assert_eq!(loader.load("f", "h").unwrap().content(), &[2.0, 4.0]);
        assert!(loader.load("g", "h").is_err());
    }
}
