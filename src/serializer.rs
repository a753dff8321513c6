use crate::error::{Error, Result as EngineResult};
use crate::schema::SchemaNode;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Version written into every schema file; files with any other version are ignored
pub const SCHEMA_FORMAT_VERSION: u32 = 1;

/// Persisted compilation result of a single handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaFile {
    pub version: u32,
    pub handler_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_schema: Option<SchemaNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<SchemaNode>,
}

impl SchemaFile {
    pub fn new(
        handler_name: impl Into<String>,
        request_schema: Option<SchemaNode>,
        response_schema: Option<SchemaNode>,
    ) -> Self {
        Self {
            version: SCHEMA_FORMAT_VERSION,
            handler_name: handler_name.into(),
            request_schema,
            response_schema,
        }
    }
}

/// On-disk encoding of schema files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Json,
    Yaml,
}

impl SchemaFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SchemaFormat::Json => "json",
            SchemaFormat::Yaml => "yaml",
        }
    }

    /// Format implied by a file extension, if it is one the store reads
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Some(SchemaFormat::Json),
            Some("yaml") | Some("yml") => Some(SchemaFormat::Yaml),
            _ => None,
        }
    }
}

/// Serialize a schema file to YAML
///
/// # Errors
///
/// Returns an error if serialization fails
pub fn serialize_yaml(file: &SchemaFile) -> Result<String> {
    debug!("Serializing schema file for {} to YAML", file.handler_name);
    serde_yaml::to_string(file).context("Failed to serialize schema file to YAML")
}

/// Serialize a schema file to pretty-printed JSON
///
/// # Errors
///
/// Returns an error if serialization fails
pub fn serialize_json(file: &SchemaFile) -> Result<String> {
    debug!("Serializing schema file for {} to JSON", file.handler_name);
    serde_json::to_string_pretty(file).context("Failed to serialize schema file to JSON")
}

pub fn serialize(file: &SchemaFile, format: SchemaFormat) -> Result<String> {
    match format {
        SchemaFormat::Json => serialize_json(file),
        SchemaFormat::Yaml => serialize_yaml(file),
    }
}

/// Parse schema file content, rejecting unknown format versions
pub fn parse_schema_file(content: &str, format: SchemaFormat) -> Result<SchemaFile> {
    let file: SchemaFile = match format {
        SchemaFormat::Json => {
            serde_json::from_str(content).context("Failed to parse JSON schema file")?
        }
        SchemaFormat::Yaml => {
            serde_yaml::from_str(content).context("Failed to parse YAML schema file")?
        }
    };
    if file.version != SCHEMA_FORMAT_VERSION {
        anyhow::bail!(
            "Unsupported schema file version {} (expected {})",
            file.version,
            SCHEMA_FORMAT_VERSION
        );
    }
    Ok(file)
}

/// Write content to a file, creating parent directories as needed
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot be written
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing output to file: {}", path.display());

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create parent directories for: {}", path.display())
            })?;
        }
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// File name used for a handler; characters unsafe in file names become `_`
pub fn file_name_for(handler_name: &str, format: SchemaFormat) -> String {
    let stem: String = handler_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.{}", stem, format.extension())
}

/// Write one schema file into `dir` and return its path
pub fn write_schema_file(dir: &Path, file: &SchemaFile, format: SchemaFormat) -> Result<PathBuf> {
    let content = serialize(file, format)?;
    let path = dir.join(file_name_for(&file.handler_name, format));
    write_to_file(&content, &path)?;
    Ok(path)
}

/// Pre-generated schemas loaded from a directory, keyed by handler name
#[derive(Debug, Clone, Default)]
pub struct SchemaStore {
    schemas: HashMap<String, SchemaFile>,
}

impl SchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every schema file in `dir`.
    ///
    /// Files that cannot be read, fail to parse, or carry another format version are
    /// skipped with a warning. Only an unreadable directory is an error.
    pub fn load_dir(dir: &Path) -> EngineResult<Self> {
        let entries = fs::read_dir(dir).map_err(|e| {
            Error::InvalidConfig(format!(
                "cannot read schema directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        let mut store = Self::new();
        for path in paths {
            let Some(format) = SchemaFormat::from_path(&path) else {
                continue;
            };
            match Self::load_file(&path, format) {
                Ok(file) => {
                    if let Some(previous) = store.schemas.get(&file.handler_name) {
                        warn!(
                            "Schema for handler {} defined more than once, using {}",
                            previous.handler_name,
                            path.display()
                        );
                    }
                    store.insert(file);
                }
                Err(e) => warn!("Skipping schema file {}: {:#}", path.display(), e),
            }
        }

        info!(
            "Loaded {} stored schema(s) from {}",
            store.len(),
            dir.display()
        );
        Ok(store)
    }

    fn load_file(path: &Path, format: SchemaFormat) -> Result<SchemaFile> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        parse_schema_file(&content, format)
    }

    pub fn insert(&mut self, file: SchemaFile) {
        self.schemas.insert(file.handler_name.clone(), file);
    }

    pub fn get(&self, handler_name: &str) -> Option<&SchemaFile> {
        self.schemas.get(handler_name)
    }

    pub fn request_schema(&self, handler_name: &str) -> Option<&SchemaNode> {
        self.get(handler_name)?.request_schema.as_ref()
    }

    pub fn response_schema(&self, handler_name: &str) -> Option<&SchemaNode> {
        self.get(handler_name)?.response_schema.as_ref()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaType;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn create_test_file() -> SchemaFile {
        let mut properties = BTreeMap::new();
        properties.insert("id".to_string(), SchemaNode::of_type(SchemaType::Integer));
        let mut name = SchemaNode::of_type(SchemaType::String);
        name.min_length = Some(1);
        properties.insert("name".to_string(), name);
        properties.insert(
            "tags".to_string(),
            SchemaNode::array(SchemaNode::of_type(SchemaType::String)),
        );

        SchemaFile::new(
            "create_user",
            Some(SchemaNode::object(properties, vec!["name".to_string()])),
            None,
        )
    }

    #[test]
    fn test_serialize_json_field_names() {
        let json = serialize_json(&create_test_file()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["version"], 1);
        assert_eq!(value["handlerName"], "create_user");
        assert_eq!(value["requestSchema"]["type"], "object");
        assert_eq!(value["requestSchema"]["required"][0], "name");
        assert_eq!(
            value["requestSchema"]["properties"]["name"]["minLength"],
            1
        );
        assert!(value.get("responseSchema").is_none());
    }

    #[test]
    fn test_yaml_round_trip() {
        let file = create_test_file();
        let yaml = serialize_yaml(&file).unwrap();
        assert!(yaml.contains("handlerName: create_user"));
        assert_eq!(parse_schema_file(&yaml, SchemaFormat::Yaml).unwrap(), file);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let content = r#"{"version": 2, "handlerName": "x"}"#;
        let err = parse_schema_file(content, SchemaFormat::Json).unwrap_err();
        assert!(err.to_string().contains("Unsupported schema file version 2"));
    }

    #[test]
    fn test_write_to_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/out.json");
        write_to_file("{}", &path).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "{}");
    }

    #[test]
    fn test_file_name_for() {
        assert_eq!(file_name_for("create_user", SchemaFormat::Json), "create_user.json");
        assert_eq!(
            file_name_for("POST /users/{id}", SchemaFormat::Yaml),
            "POST__users__id_.yaml"
        );
    }

    #[test]
    fn test_store_loads_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        write_schema_file(dir, &create_test_file(), SchemaFormat::Json).unwrap();
        let response_only = SchemaFile::new(
            "list_users",
            None,
            Some(SchemaNode::array(SchemaNode::of_type(SchemaType::Object))),
        );
        write_schema_file(dir, &response_only, SchemaFormat::Yaml).unwrap();
        fs::write(dir.join("broken.json"), "{ not json").unwrap();
        fs::write(dir.join("old.yml"), "version: 0\nhandlerName: old\n").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let store = SchemaStore::load_dir(dir).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("create_user"), Some(&create_test_file()));
        assert!(store.request_schema("list_users").is_none());
        assert_eq!(
            store.response_schema("list_users").and_then(|s| s.schema_type),
            Some(SchemaType::Array)
        );
        assert!(store.get("old").is_none());
    }

    #[test]
    fn test_store_missing_directory() {
        let err = SchemaStore::load_dir(Path::new("/nonexistent/schemas")).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
