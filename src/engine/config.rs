//! JSON config document shared by all modules.
//!
//! Layout on disk:
//!
//! ```json
//! { "App": { "name": "...", "organization": "...", "max_fps": 60,
//!            "window": { ... }, "renderer": { ... } } }
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::{Map, Value};

use crate::engine::context::AppInfo;
use crate::engine::error::EngineError;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

const APP_KEY: &str = "App";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    /// Everything outside the `App` object, kept so saving does not drop it.
    root: Map<String, Value>,
    app: Map<String, Value>,
}

impl ConfigDocument {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self, EngineError> {
        let Value::Object(mut root) = serde_json::from_str::<Value>(text)? else {
            return Err(EngineError::Config("config root must be a JSON object".into()));
        };
        let app = match root.remove(APP_KEY) {
            Some(Value::Object(app)) => app,
            _ => Map::new(),
        };
        Ok(Self { root, app })
    }

    /// Reads the document at `path`. A missing file yields `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>, EngineError> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(&self.to_value())?;
        fs::write(path, text)?;
        Ok(())
    }

    pub fn to_value(&self) -> Value {
        let mut root = self.root.clone();
        root.insert(APP_KEY.to_string(), Value::Object(self.app.clone()));
        Value::Object(root)
    }

    pub fn app_info(&self) -> AppInfo {
        let mut info = AppInfo::default();
        if let Some(name) = self.app.get("name").and_then(Value::as_str) {
            info.name = name.to_string();
        }
        if let Some(org) = self.app.get("organization").and_then(Value::as_str) {
            info.organization = org.to_string();
        }
        info
    }

    pub fn set_app_info(&mut self, info: &AppInfo) {
        self.app.insert("name".into(), Value::String(info.name.clone()));
        self.app
            .insert("organization".into(), Value::String(info.organization.clone()));
    }

    pub fn max_fps(&self) -> Option<i32> {
        self.app
            .get("max_fps")
            .and_then(Value::as_i64)
            .map(|fps| fps.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
    }

    pub fn set_max_fps(&mut self, fps: i32) {
        self.app.insert("max_fps".into(), Value::from(fps));
    }

    pub fn module_section(&self, module: &str) -> Option<&Value> {
        self.app.get(module)
    }

    pub fn set_module_section(&mut self, module: &str, section: Value) {
        self.app.insert(module.to_string(), section);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_app_info_and_sections() {
        let doc = ConfigDocument::parse(
            r#"{"App": {"name": "Engine", "organization": "Org", "max_fps": 30,
                         "renderer": {"draw_normals": true}}}"#,
        )
        .unwrap();
        let info = doc.app_info();
        assert_eq!(info.name, "Engine");
        assert_eq!(info.organization, "Org");
        assert_eq!(doc.max_fps(), Some(30));
        assert_eq!(doc.module_section("renderer"), Some(&json!({"draw_normals": true})));
        assert!(doc.module_section("editor").is_none());
    }

    #[test]
    fn missing_app_object_is_created() {
        let mut doc = ConfigDocument::parse(r#"{"other": 1}"#).unwrap();
        doc.set_module_section("window", json!({"width": 800}));
        let value = doc.to_value();
        assert_eq!(value["other"], json!(1));
        assert_eq!(value["App"]["window"]["width"], json!(800));
    }

    #[test]
    fn rejects_non_object_root() {
        assert!(ConfigDocument::parse("[1, 2]").is_err());
        assert!(ConfigDocument::parse("{ not json").is_err());
    }

    #[test]
    fn load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ConfigDocument::load(&dir.path().join("nope.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn save_then_load_preserves_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut doc = ConfigDocument::parse(r#"{"App": {"custom": {"keep": true}}}"#).unwrap();
        doc.set_app_info(&AppInfo {
            name: "Saved".into(),
            organization: "Us".into(),
        });
        doc.save(&path).unwrap();

        let loaded = ConfigDocument::load(&path).unwrap().unwrap();
        assert_eq!(loaded.app_info().name, "Saved");
        assert_eq!(loaded.module_section("custom"), Some(&json!({"keep": true})));
    }
}
