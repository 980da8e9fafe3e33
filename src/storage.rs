use std::{
    cell::RefCell,
    collections::BTreeMap,
    env, fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

const STORAGE_DIR_NAME: &str = ".activity-feed";
const PREFERENCES_FILE: &str = "preferences.json";

/// Flat string key/value persistence for UI preferences.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

type Preferences = BTreeMap<String, String>;

pub struct FilePreferenceStore {
    registry_path: PathBuf,
}

impl FilePreferenceStore {
    pub fn initialize() -> Result<Self, StoreError> {
        let home = env::var("HOME").map_err(|_| StoreError::HomeDirMissing)?;
        Self::at(PathBuf::from(home).join(STORAGE_DIR_NAME))
    }

    pub fn at(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        Ok(Self {
            registry_path: dir.join(PREFERENCES_FILE),
        })
    }

    fn read_registry(&self) -> Result<Preferences, StoreError> {
        match fs::read_to_string(&self.registry_path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Preferences::default()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_registry(&self, registry: &Preferences) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(registry)?;
        fs::write(&self.registry_path, data)?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_registry()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut registry = self.read_registry()?;
        registry.insert(key.to_owned(), value.to_owned());
        self.write_registry(&registry)
    }
}

/// Session-only store used when nothing can be written to disk.
#[derive(Default)]
pub struct MemoryPreferenceStore {
    entries: RefCell<Preferences>,
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HOME is not set; cannot store preferences under ~/.activity-feed")]
    HomeDirMissing,
    #[error("I/O error while handling stored preferences: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to serialize stored preferences: {0}")]
    Serialization(#[from] serde_json::Error),
}
