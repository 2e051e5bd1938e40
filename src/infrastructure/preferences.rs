// File-backed preferences, one TOML table per file
use crate::application::error::StoreError;
use crate::application::target_store::{PreferenceSnapshot, PreferenceStore, PreferenceValue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Preferences persisted as a TOML table.
///
/// `commit` writes the whole table to a sibling temporary file and renames it
/// over the original, and `snapshot` parses the file from a single read, so
/// readers see either the old or the new table.
/// There is no checksum: a hand-edited but well-formed file is trusted.
pub struct FilePreferences {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read_table(&self) -> Result<toml::Table, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(toml::Table::new()),
            Err(e) => return Err(e.into()),
        };

        raw.parse::<toml::Table>()
            .map_err(|e| StoreError::Format(format!("{}: {}", self.path.display(), e)))
    }
}

#[async_trait]
impl PreferenceStore for FilePreferences {
    async fn snapshot(&self) -> Result<PreferenceSnapshot, StoreError> {
        let mut values = HashMap::new();
        for (key, value) in self.read_table().await? {
            let value = match value {
                toml::Value::Float(value) => PreferenceValue::Float(value),
                toml::Value::Integer(value) => PreferenceValue::Float(value as f64),
                toml::Value::String(value) => PreferenceValue::Text(value),
                other => {
                    return Err(StoreError::Format(format!(
                        "{} holds an unsupported {}",
                        key,
                        other.type_str()
                    )));
                }
            };
            values.insert(key, value);
        }
        Ok(PreferenceSnapshot::new(values))
    }

    async fn commit(&self, entries: Vec<(String, PreferenceValue)>) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut table = self.read_table().await?;
        for (key, value) in entries {
            let value = match value {
                PreferenceValue::Float(value) => toml::Value::Float(value),
                PreferenceValue::Text(value) => toml::Value::String(value),
            };
            table.insert(key, value);
        }
        let contents =
            toml::to_string(&table).map_err(|e| StoreError::Format(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let temp = self.temp_path();
        let mut file = tokio::fs::File::create(&temp).await?;
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&temp, &self.path).await?;

        tracing::debug!("Committed preferences to {}", self.path.display());
        Ok(())
    }
}
