use chrono::NaiveDate;
use include_dir::{include_dir, Dir};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::app_dirs::AppDirs;

static BUNDLED_CLASSES: Dir = include_dir!("src/classes");

const TRAINING_FILE: &str = "training.json";

/// Directories probed, relative to the working directory, before falling
/// back to the user data dir and the bundled classes.
const CANDIDATE_DIRS: [&str; 3] = ["static/classes", "../static/classes", "../../static/classes"];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("class '{0}' not found")]
    ClassNotFound(String),
    #[error("training.json not found in class '{0}'")]
    MissingTrainingFile(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub class_id: Option<String>,
    pub title: String,
    pub date: String,
    pub description: String,
}

/// Reference to the image shown for an item. Resolved by the presentation
/// layer; the core only carries it around.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource(String);

impl Resource {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionPayload {
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub speed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub payload: ActionPayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingItem {
    #[serde(default, deserialize_with = "lenient_text")]
    pub item_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_image")]
    pub image: Resource,
    #[serde(default, deserialize_with = "lenient_text")]
    text: Option<String>,
    #[serde(default, deserialize_with = "lenient_actions")]
    pub actions: Vec<Action>,
}

impl TrainingItem {
    pub fn new(image: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            item_id: None,
            image: Resource::new(image),
            text: Some(text.into()),
            actions: Vec::new(),
        }
    }

    /// The item's text; absent text reads as empty.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingData {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default, deserialize_with = "lenient_items")]
    pub items: Vec<TrainingItem>,
}

impl TrainingData {
    pub fn new(items: Vec<TrainingItem>) -> Self {
        Self {
            meta: Meta::default(),
            items,
        }
    }

    /// Parse a training bundle. Only JSON syntax errors fail; a wrong shape
    /// degrades to fewer (or zero) items.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value).unwrap_or_else(|e| {
                log::warn!("training data has an unexpected shape ({e}), using no items");
                Self::default()
            }),
            _ => {
                log::warn!("training data is not an object, using no items");
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_image<'de, D>(deserializer: D) -> Result<Resource, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.map(Resource).unwrap_or_default())
}

fn lenient_actions<'de, D>(deserializer: D) -> Result<Vec<Action>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(values) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    Ok(values
        .into_iter()
        .filter_map(|v| match serde_json::from_value::<Action>(v) {
            Ok(action) => Some(action),
            Err(e) => {
                log::debug!("ignoring malformed action: {e}");
                None
            }
        })
        .collect())
}

/// Every object becomes an item, with bad fields read as their defaults.
/// Anything else in the list is dropped.
fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<TrainingItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = match Value::deserialize(deserializer)? {
        Value::Array(values) => values,
        Value::Null => return Ok(Vec::new()),
        other => {
            log::warn!("training items should be a list, got {other}; using no items");
            return Ok(Vec::new());
        }
    };

    Ok(values
        .into_iter()
        .enumerate()
        .filter_map(|(idx, v)| {
            if !v.is_object() {
                log::warn!("dropping training item {idx}: not an object");
                return None;
            }
            match serde_json::from_value::<TrainingItem>(v) {
                Ok(item) => Some(item),
                Err(e) => {
                    log::warn!("dropping malformed training item {idx}: {e}");
                    None
                }
            }
        })
        .collect())
}

/// Summary of one class as shown in a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningPath {
    pub id: String,
    pub title: String,
    pub date: String,
    pub description: String,
    pub item_count: usize,
}

/// Where training classes come from.
#[derive(Debug, Clone)]
pub enum Catalog {
    Directory(PathBuf),
    Bundled,
}

impl Catalog {
    /// Use `explicit` if given, otherwise the first classes directory that
    /// exists, otherwise the classes compiled into the binary.
    pub fn discover(explicit: Option<&Path>) -> Self {
        if let Some(dir) = explicit {
            return Catalog::Directory(dir.to_path_buf());
        }

        let user_dir = AppDirs::classes_dir();
        let found = CANDIDATE_DIRS
            .iter()
            .map(PathBuf::from)
            .chain(user_dir)
            .find(|p| p.is_dir());

        match found {
            Some(dir) => {
                log::info!("using classes directory {}", dir.display());
                Catalog::Directory(dir)
            }
            None => {
                log::info!("no classes directory found, using bundled classes");
                Catalog::Bundled
            }
        }
    }

    /// All classes, newest first. Classes whose `training.json` cannot be
    /// parsed are skipped with a warning.
    pub fn learning_paths(&self) -> Result<Vec<LearningPath>, CatalogError> {
        let mut paths = Vec::new();

        for id in self.class_ids()? {
            match self.load(&id) {
                Ok(data) => paths.push(LearningPath {
                    title: if data.meta.title.is_empty() {
                        id.clone()
                    } else {
                        data.meta.title.clone()
                    },
                    id,
                    date: data.meta.date,
                    description: data.meta.description,
                    item_count: data.items.len(),
                }),
                Err(CatalogError::MissingTrainingFile(_)) => {
                    log::debug!("skipping '{id}': no {TRAINING_FILE}");
                }
                Err(e) => log::warn!("skipping '{id}': {e}"),
            }
        }

        sort_learning_paths(&mut paths);
        log::debug!("found {} learning paths", paths.len());
        Ok(paths)
    }

    pub fn load(&self, class_id: &str) -> Result<TrainingData, CatalogError> {
        let mut data = match self {
            Catalog::Directory(root) => {
                let class_path = root.join(class_id);
                if !class_path.is_dir() {
                    return Err(CatalogError::ClassNotFound(class_id.to_string()));
                }
                let json_path = class_path.join(TRAINING_FILE);
                if !json_path.is_file() {
                    return Err(CatalogError::MissingTrainingFile(class_id.to_string()));
                }
                load_file(&json_path)?
            }
            Catalog::Bundled => {
                if BUNDLED_CLASSES.get_dir(class_id).is_none() {
                    return Err(CatalogError::ClassNotFound(class_id.to_string()));
                }
                let file = BUNDLED_CLASSES
                    .get_file(format!("{class_id}/{TRAINING_FILE}"))
                    .ok_or_else(|| CatalogError::MissingTrainingFile(class_id.to_string()))?;
                let json = file.contents_utf8().unwrap_or_default();
                TrainingData::from_json(json).map_err(|source| CatalogError::Json {
                    origin: format!("bundled class '{class_id}'"),
                    source,
                })?
            }
        };

        if data.meta.class_id.is_none() {
            data.meta.class_id = Some(class_id.to_string());
        }
        log::info!("loaded class '{class_id}' with {} items", data.items.len());
        Ok(data)
    }

    fn class_ids(&self) -> Result<Vec<String>, CatalogError> {
        match self {
            Catalog::Directory(root) => {
                let entries = fs::read_dir(root).map_err(|source| CatalogError::Io {
                    path: root.clone(),
                    source,
                })?;
                let mut ids = Vec::new();
                for entry in entries {
                    let entry = entry.map_err(|source| CatalogError::Io {
                        path: root.clone(),
                        source,
                    })?;
                    let path = entry.path();
                    if !path.is_dir() {
                        continue;
                    }
                    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                        ids.push(name.to_string());
                    }
                }
                Ok(ids)
            }
            Catalog::Bundled => Ok(BUNDLED_CLASSES
                .dirs()
                .filter_map(|d| d.path().file_name())
                .filter_map(|n| n.to_str())
                .map(str::to_string)
                .collect()),
        }
    }
}

pub fn load_file(path: &Path) -> Result<TrainingData, CatalogError> {
    let json = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    TrainingData::from_json(&json).map_err(|source| CatalogError::Json {
        origin: path.display().to_string(),
        source,
    })
}

fn sort_learning_paths(paths: &mut [LearningPath]) {
    let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();

    paths.sort_by(|a, b| {
        // newest first, undated last
        match (parse(&a.date), parse(&b.date)) {
            (Some(da), Some(db)) => db.cmp(&da),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
        .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_class(root: &Path, id: &str, json: &str) {
        let dir = root.join(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(TRAINING_FILE), json).unwrap();
    }

    #[test]
    fn test_parse_full_training_file() {
        let json = r#"{
          "meta": {
            "title": "Marcus Aurelius Quotes",
            "date": "2025-06-29",
            "description": "flash test"
          },
          "items": [
            {
              "text": "Men exist for the sake of one another.",
              "image": "/static/classes/test-1/test_pattern.png",
              "actions": [
                { "type": "flash", "payload": { "duration": 85, "speed": 11 } }
              ]
            }
          ]
        }"#;

        let data = TrainingData::from_json(json).unwrap();
        assert_eq!(data.meta.title, "Marcus Aurelius Quotes");
        assert_eq!(data.len(), 1);
        let item = &data.items[0];
        assert_eq!(item.text(), "Men exist for the sake of one another.");
        assert_eq!(item.image.as_str(), "/static/classes/test-1/test_pattern.png");
        assert_eq!(item.actions[0].action_type, "flash");
        assert_eq!(item.actions[0].payload.duration, 85);
    }

    #[test]
    fn test_missing_items_is_empty() {
        let data = TrainingData::from_json(r#"{"meta": {"title": "t"}}"#).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_non_array_items_is_empty() {
        let data = TrainingData::from_json(r#"{"items": "nope"}"#).unwrap();
        assert!(data.is_empty());
        let data = TrainingData::from_json(r#"{"items": null}"#).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_non_object_root_is_empty() {
        let data = TrainingData::from_json("[1, 2, 3]").unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_non_string_text_reads_empty() {
        let data =
            TrainingData::from_json(r#"{"items": [{"image": "a.png", "text": 42}, {"image": "b.png"}]}"#)
                .unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.items[0].text(), "");
        assert_eq!(data.items[1].text(), "");
    }

    #[test]
    fn test_malformed_items_dropped() {
        let data = TrainingData::from_json(
            r#"{"items": [7, {"image": "a.png", "text": "ok"}, "junk"]}"#,
        )
        .unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data.items[0].text(), "ok");
    }

    #[test]
    fn test_bad_fields_keep_the_item() {
        let json = r#"{"items": [
          {"text": "no type", "image": "a.png", "actions": [{"payload": {"duration": 1}}]},
          {"text": "fractional", "image": "b.png",
           "actions": [{"type": "flash", "payload": {"duration": 85.5}}, {"type": "fade"}]},
          {"text": "numeric image", "image": 7},
          {"text": "numeric id", "image": "d.png", "item_id": 12},
          {"text": "first", "image": "e.png", "item_id": "e", "actions": "nope"}
        ]}"#;

        let data = TrainingData::from_json(json).unwrap();
        let texts: Vec<&str> = data.items.iter().map(|i| i.text()).collect();
        assert_eq!(
            texts,
            vec!["no type", "fractional", "numeric image", "numeric id", "first"]
        );

        assert!(data.items[0].actions.is_empty());
        assert_eq!(data.items[1].actions.len(), 1);
        assert_eq!(data.items[1].actions[0].action_type, "fade");
        assert_eq!(data.items[2].image.as_str(), "");
        assert_eq!(data.items[3].item_id, None);
        assert_eq!(data.items[3].image.as_str(), "d.png");
        assert_eq!(data.items[4].item_id.as_deref(), Some("e"));
        assert!(data.items[4].actions.is_empty());
    }

    #[test]
    fn test_syntax_error_is_reported() {
        assert!(TrainingData::from_json("{ not json").is_err());
    }

    #[test]
    fn test_directory_catalog_lists_and_sorts() {
        let dir = tempdir().unwrap();
        write_class(
            dir.path(),
            "old",
            r#"{"meta": {"title": "Old", "date": "2024-01-01"}, "items": []}"#,
        );
        write_class(
            dir.path(),
            "new",
            r#"{"meta": {"title": "New", "date": "2025-06-29"}, "items": [{"image": "x", "text": "y"}]}"#,
        );
        write_class(dir.path(), "undated", r#"{"items": []}"#);
        fs::create_dir_all(dir.path().join("no-training-file")).unwrap();
        fs::write(dir.path().join("stray.txt"), "ignored").unwrap();

        let catalog = Catalog::Directory(dir.path().to_path_buf());
        let paths = catalog.learning_paths().unwrap();

        let ids: Vec<&str> = paths.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);
        assert_eq!(paths[0].item_count, 1);
        // falls back to the id when the title is missing
        assert_eq!(paths[2].title, "undated");
    }

    #[test]
    fn test_directory_catalog_load_errors() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        let catalog = Catalog::Directory(dir.path().to_path_buf());

        assert!(matches!(
            catalog.load("missing"),
            Err(CatalogError::ClassNotFound(_))
        ));
        assert!(matches!(
            catalog.load("empty"),
            Err(CatalogError::MissingTrainingFile(_))
        ));
    }

    #[test]
    fn test_load_sets_class_id() {
        let dir = tempdir().unwrap();
        write_class(dir.path(), "quotes", r#"{"items": [{"image": "x", "text": "y"}]}"#);
        let catalog = Catalog::Directory(dir.path().to_path_buf());
        let data = catalog.load("quotes").unwrap();
        assert_eq!(data.meta.class_id.as_deref(), Some("quotes"));
    }

    #[test]
    fn test_load_file_missing() {
        let dir = tempdir().unwrap();
        let err = load_file(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }

    #[test]
    fn test_bundled_catalog_has_sample_class() {
        let catalog = Catalog::Bundled;
        let paths = catalog.learning_paths().unwrap();
        assert!(!paths.is_empty());

        let data = catalog.load(&paths[0].id).unwrap();
        assert!(!data.is_empty());
        assert!(data.items.iter().all(|i| !i.text().is_empty()));
    }

    #[test]
    fn test_candidate_dirs_are_distinct() {
        let mut normalized: Vec<PathBuf> = CANDIDATE_DIRS
            .iter()
            .map(|d| {
                Path::new(d)
                    .components()
                    .filter(|c| !matches!(c, std::path::Component::CurDir))
                    .collect()
            })
            .collect();
        normalized.sort();
        normalized.dedup();
        assert_eq!(normalized.len(), CANDIDATE_DIRS.len());
    }

    #[test]
    fn test_explicit_directory_wins() {
        let dir = tempdir().unwrap();
        match Catalog::discover(Some(dir.path())) {
            Catalog::Directory(p) => assert_eq!(p, dir.path()),
            Catalog::Bundled => panic!("expected directory catalog"),
        }
    }
}
