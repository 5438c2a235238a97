use crate::domain::case::Case;
use crate::domain::error::{AppError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::warn;

pub type CaseMap = Arc<HashMap<String, Case>>;

/// Filesystem-backed case records, one self-describing JSON document per
/// file, cached in memory until `reload`.
///
/// The cache holds an immutable snapshot behind an `Arc`; readers always see
/// a fully-old or fully-new map, never a partially rebuilt one.
pub struct CaseRepository {
    cases_dir: PathBuf,
    cache: RwLock<Option<CaseMap>>,
}

impl CaseRepository {
    pub fn new(cases_dir: impl Into<PathBuf>) -> Self {
        Self {
            cases_dir: cases_dir.into(),
            cache: RwLock::new(None),
        }
    }

    /// All cases keyed by id, scanning the directory on first use.
    pub fn load_all(&self) -> Result<CaseMap> {
        if let Some(cases) = self.cache.read().unwrap().as_ref() {
            return Ok(cases.clone());
        }

        let cases = Arc::new(self.scan()?);
        *self.cache.write().unwrap() = Some(cases.clone());
        Ok(cases)
    }

    fn scan(&self) -> Result<HashMap<String, Case>> {
        let mut cases = HashMap::new();

        if !self.cases_dir.exists() {
            return Ok(cases);
        }

        for entry in fs::read_dir(&self.cases_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            // A malformed file loses that one case, not the whole load.
            match Self::read_case(&path) {
                Ok(case) => {
                    cases.insert(case.id.clone(), case);
                }
                Err(err) => {
                    warn!(file = %path.display(), error = %err, "Skipping malformed case file");
                }
            }
        }

        Ok(cases)
    }

    fn read_case(path: &Path) -> Result<Case> {
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|err| AppError::ParseError(err.to_string()))
    }

    /// Cache-first lookup. An unknown id is a value, not a failure.
    pub fn get(&self, case_id: &str) -> Result<Option<Case>> {
        Ok(self.load_all()?.get(case_id).cloned())
    }

    pub fn list(&self) -> Result<Vec<Case>> {
        let cases = self.load_all()?;
        let mut list: Vec<Case> = cases.values().cloned().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(list)
    }

    /// Drop the cache; the next access rescans the directory.
    pub fn reload(&self) {
        *self.cache.write().unwrap() = None;
    }
}
