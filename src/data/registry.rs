//! Shared, reloadable catalog owned by the server.
//! Requests take an `Arc` snapshot, so a reload never disturbs a simulation in flight.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::data::catalog::WeaponCatalog;
use crate::data::import::{load_catalog, CatalogError};

#[derive(Debug)]
pub struct CatalogHandle {
    path: PathBuf,
    current: RwLock<Arc<WeaponCatalog>>,
}

impl CatalogHandle {
    /// Load the catalog at `path`. Fails if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Arc<CatalogHandle>, CatalogError> {
        let path = path.as_ref().to_path_buf();
        let catalog = load_catalog(&path)?;
        Ok(Self::with_catalog(path, catalog))
    }

    /// Wrap an already-built catalog; `reload` will read from `path`.
    pub fn with_catalog(path: impl Into<PathBuf>, catalog: WeaponCatalog) -> Arc<CatalogHandle> {
        Arc::new(CatalogHandle {
            path: path.into(),
            current: RwLock::new(Arc::new(catalog)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Arc<WeaponCatalog> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Re-read the catalog from disk. On failure the previous catalog stays active.
    pub fn reload(&self) -> Result<Arc<WeaponCatalog>, CatalogError> {
        let fresh = Arc::new(load_catalog(&self.path)?);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Arc::clone(&fresh);
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SPEC_JSON: &str =
        r#"[{"name":"Pin","damage_levels":[{"level":"Lv1","damage":50.0}],"magazine_size":MAG}]"#;

    #[test]
    fn reload_swaps_catalog_but_keeps_old_snapshots() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("weapons.json");
        fs::write(&path, SPEC_JSON.replace("MAG", "6")).expect("write");

        let handle = CatalogHandle::load(&path).expect("loads");
        let before = handle.snapshot();

        fs::write(&path, SPEC_JSON.replace("MAG", "9")).expect("rewrite");
        handle.reload().expect("reloads");

        assert_eq!(before.get("Pin").map(|s| s.magazine_size), Some(6));
        assert_eq!(handle.snapshot().get("Pin").map(|s| s.magazine_size), Some(9));
    }

    #[test]
    fn failed_reload_keeps_previous_catalog() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("weapons.json");
        fs::write(&path, SPEC_JSON.replace("MAG", "6")).expect("write");
        let handle = CatalogHandle::load(&path).expect("loads");

        fs::write(&path, "{not json").expect("rewrite");

        assert!(handle.reload().is_err());
        assert_eq!(handle.snapshot().get("Pin").map(|s| s.magazine_size), Some(6));
    }
}
