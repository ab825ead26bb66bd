//! Cached config lookup.
//!
//! Configs are loaded lazily by key and kept for the lifetime of the
//! store, including the fact that a key has no config. Absence is a
//! normal outcome: it sends the resolver to the geometric tiers.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{ConfigError, Result};
use crate::model::AssemblyConfig;

/// Where configs come from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// A fixed set of configs held in memory.
    Memory(HashMap<String, AssemblyConfig>),
    /// One `<key>.json` or `<key>.toml` file per config.
    Directory(PathBuf),
}

/// Loads assembly configs by key and caches the results.
#[derive(Debug)]
pub struct ConfigStore {
    source: ConfigSource,
    cache: RefCell<HashMap<String, Option<Rc<AssemblyConfig>>>>,
}

impl ConfigStore {
    /// A store over an explicit source.
    pub fn new(source: ConfigSource) -> Self {
        Self {
            source,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// A store with no configs at all.
    pub fn empty() -> Self {
        Self::new(ConfigSource::Memory(HashMap::new()))
    }

    /// A store over in-memory configs.
    pub fn in_memory<K: Into<String>>(configs: impl IntoIterator<Item = (K, AssemblyConfig)>) -> Self {
        Self::new(ConfigSource::Memory(
            configs.into_iter().map(|(k, c)| (k.into(), c)).collect(),
        ))
    }

    /// A store reading files from `dir`.
    pub fn from_directory(dir: impl Into<PathBuf>) -> Self {
        Self::new(ConfigSource::Directory(dir.into()))
    }

    /// The config for `key`, loading it on first use.
    ///
    /// Malformed or invalid files are errors and are not cached, so a fixed
    /// file is picked up on the next call.
    pub async fn load(&self, key: &str) -> Result<Option<Rc<AssemblyConfig>>> {
        if let Some(hit) = self.cache.borrow().get(key) {
            return Ok(hit.clone());
        }

        let loaded = match &self.source {
            ConfigSource::Memory(map) => map.get(key).cloned(),
            ConfigSource::Directory(dir) => read_from_directory(dir, key).await?,
        };
        if let Some(config) = &loaded {
            config.validate()?;
        }
        match &loaded {
            Some(_) => tracing::debug!("loaded assembly config {key}"),
            None => tracing::debug!("no assembly config for {key}"),
        }

        let loaded = loaded.map(Rc::new);
        self.cache.borrow_mut().insert(key.to_string(), loaded.clone());
        Ok(loaded)
    }

    /// The cached result for `key` without loading. `None` means the key
    /// has not been loaded yet.
    pub fn cached(&self, key: &str) -> Option<Option<Rc<AssemblyConfig>>> {
        self.cache.borrow().get(key).cloned()
    }

    /// Drop every cached result.
    pub fn invalidate(&self) {
        self.cache.borrow_mut().clear();
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::empty()
    }
}

async fn read_from_directory(dir: &Path, key: &str) -> Result<Option<AssemblyConfig>> {
    if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
        return Err(ConfigError::Invalid(format!("bad config key {key:?}")));
    }

    let json_path = dir.join(format!("{key}.json"));
    if let Some(text) = read_optional(&json_path).await? {
        return serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| ConfigError::Json {
                path: json_path.display().to_string(),
                source,
            });
    }

    let toml_path = dir.join(format!("{key}.toml"));
    if let Some(text) = read_optional(&toml_path).await? {
        return toml::from_str(&text)
            .map(Some)
            .map_err(|source| ConfigError::Toml {
                path: toml_path.display().to_string(),
                source,
            });
    }
    Ok(None)
}

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Insertion;
    use tempfile::TempDir;

    fn with_offset(offset: [f64; 3]) -> AssemblyConfig {
        AssemblyConfig {
            insertion: Some(Insertion { offset }),
            ..AssemblyConfig::default()
        }
    }

    #[test]
    fn test_memory_store_caches_absence() {
        let store = ConfigStore::in_memory([("cover", with_offset([0.0, 0.0, 0.5]))]);
        assert!(store.cached("cover").is_none());

        let hit = tokio_test::block_on(store.load("cover")).unwrap();
        assert!(hit.is_some());
        let miss = tokio_test::block_on(store.load("hinge")).unwrap();
        assert!(miss.is_none());

        assert!(matches!(store.cached("cover"), Some(Some(_))));
        assert!(matches!(store.cached("hinge"), Some(None)));
        store.invalidate();
        assert!(store.cached("cover").is_none());
    }

    #[test]
    fn test_memory_store_rejects_invalid() {
        let mut bad = AssemblyConfig::default();
        bad.groove_detection.inner_bound_ratio = 2.0;
        let store = ConfigStore::in_memory([("bad", bad)]);
        assert!(tokio_test::block_on(store.load("bad")).is_err());
        assert!(store.cached("bad").is_none());
    }

    #[tokio::test]
    async fn test_directory_json_and_toml() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("damper_cover_assembly.json"),
            r#"{"insertion": {"offset": [0, 0, 0.5]}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("lever.toml"),
            "[grooveDetection]\nnormalTolerance = 0.1\nupAxis = \"z\"\n",
        )
        .unwrap();

        let store = ConfigStore::from_directory(dir.path());
        let cover = store.load("damper_cover_assembly").await.unwrap().unwrap();
        assert_eq!(cover.insertion.as_ref().unwrap().offset, [0.0, 0.0, 0.5]);

        let lever = store.load("lever").await.unwrap().unwrap();
        assert_eq!(lever.groove_detection.normal_tolerance, 0.1);
        assert!(lever.insertion.is_none());

        assert!(store.load("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_directory_cache_survives_file_removal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hinge.json");
        std::fs::write(&path, "{}").unwrap();

        let store = ConfigStore::from_directory(dir.path());
        assert!(store.load("hinge").await.unwrap().is_some());
        std::fs::remove_file(&path).unwrap();
        assert!(store.load("hinge").await.unwrap().is_some());

        store.invalidate();
        assert!(store.load("hinge").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        let store = ConfigStore::from_directory(dir.path());
        let err = store.load("broken").await.unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
        assert!(matches!(
            store.load("../escape").await,
            Err(ConfigError::Invalid(_))
        ));
    }
}
