//! Request and response records for the Vision experiment-tracking API
//!
//! Request bodies are fully typed. Response records type the fields this
//! crate reads or rewrites and keep everything else in `extra`, so a record
//! fetched from the API can be sent back without losing fields.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Literal class name of the aggregate evaluation row
pub const AVERAGE_CLASS_NAME: &str = "average";

/// Token exchange request
#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest<'a> {
    pub refresh_token: &'a str,
}

/// Token exchange response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub id_token: Option<String>,
}

/// Project creation request
#[derive(Debug, Clone, Serialize)]
pub struct ProjectCreate<'a> {
    pub name: &'a str,
}

/// Vision project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Caller-side description of an experiment to create
#[derive(Debug, Clone)]
pub struct NewExperiment {
    pub name: String,
    pub model: String,
    pub model_type: String,
    pub task_type: String,
    pub status: String,
    pub files_uri: Option<String>,
    pub config_uri: Option<String>,
    pub class_map: IndexMap<String, String>,
}

impl NewExperiment {
    /// Experiment with an empty status, no artifact URIs and an empty class map
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        model_type: impl Into<String>,
        task_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            model_type: model_type.into(),
            task_type: task_type.into(),
            status: String::new(),
            files_uri: None,
            config_uri: None,
            class_map: IndexMap::new(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_files_uri(mut self, uri: impl Into<String>) -> Self {
        self.files_uri = Some(uri.into());
        self
    }

    pub fn with_config_uri(mut self, uri: impl Into<String>) -> Self {
        self.config_uri = Some(uri.into());
        self
    }

    pub fn with_class(mut self, class_id: impl Into<String>, class_name: impl Into<String>) -> Self {
        self.class_map.insert(class_id.into(), class_name.into());
        self
    }
}

/// Experiment creation body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentCreate<'a> {
    pub name: &'a str,
    pub project: String,
    pub model: &'a str,
    pub model_type: &'a str,
    pub task_type: &'a str,
    pub status: &'a str,
    pub files_uri: Option<&'a str>,
    pub config_uri: Option<&'a str>,
    pub class_map: &'a IndexMap<String, String>,
}

impl<'a> ExperimentCreate<'a> {
    pub fn new(project_id: Uuid, experiment: &'a NewExperiment) -> Self {
        Self {
            name: &experiment.name,
            project: project_id.to_string(),
            model: &experiment.model,
            model_type: &experiment.model_type,
            task_type: &experiment.task_type,
            status: &experiment.status,
            files_uri: experiment.files_uri.as_deref(),
            config_uri: experiment.config_uri.as_deref(),
            class_map: &experiment.class_map,
        }
    }
}

/// Vision experiment as stored by the API.
///
/// Only the scores are typed; `id` and everything else stay in `extra`
/// exactly as the server sent them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    #[serde(default)]
    pub f1_score: Option<f64>,
    #[serde(default)]
    pub precision: Option<f64>,
    #[serde(default)]
    pub recall: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Experiment {
    /// Server-assigned identifier, if present and a valid UUID
    pub fn id(&self) -> Option<Uuid> {
        self.extra
            .get("id")
            .and_then(Value::as_str)
            .and_then(|id| Uuid::parse_str(id).ok())
    }

    /// Replace the aggregate scores with those of `item`
    pub fn apply_scores(&mut self, item: &EvaluationItem) {
        self.f1_score = Some(item.f1);
        self.precision = Some(item.precision);
        self.recall = Some(item.recall);
    }
}

/// Class identifier of an evaluation row: an index for real classes,
/// free text (usually "average") for the aggregate row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassId {
    Index(i64),
    Label(String),
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{}", i),
            Self::Label(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ClassId {
    fn from(i: i64) -> Self {
        Self::Index(i)
    }
}

impl From<&str> for ClassId {
    fn from(s: &str) -> Self {
        Self::Label(s.to_string())
    }
}

/// One row of an evaluation report, as produced by the training side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationItem {
    pub f1: f64,
    pub precision: f64,
    pub recall: f64,
    pub class_id: ClassId,
    pub class_name: String,
}

impl EvaluationItem {
    pub fn new(
        class_id: impl Into<ClassId>,
        class_name: impl Into<String>,
        f1: f64,
        precision: f64,
        recall: f64,
    ) -> Self {
        Self {
            f1,
            precision,
            recall,
            class_id: class_id.into(),
            class_name: class_name.into(),
        }
    }

    pub fn is_average(&self) -> bool {
        self.class_name == AVERAGE_CLASS_NAME
    }
}

/// Per-class statistics in the shape the Vision API expects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStatistic {
    pub f1_score: f64,
    pub recall: f64,
    pub class_id: ClassId,
    pub precision: f64,
    pub class_name: String,
}

impl From<&EvaluationItem> for ClassStatistic {
    fn from(item: &EvaluationItem) -> Self {
        Self {
            f1_score: item.f1,
            recall: item.recall,
            class_id: item.class_id.clone(),
            precision: item.precision,
            class_name: item.class_name.clone(),
        }
    }
}

/// Caller-side description of an evaluated scene
#[derive(Debug, Clone)]
pub struct NewScene {
    pub rf_project_id: Uuid,
    pub rf_project_layer_id: Uuid,
    pub source_annotation_group: Uuid,
    pub aoi_annotation_group: Option<Uuid>,
    pub store_annotation_group: Option<Uuid>,
    pub scene_name: String,
    pub scene_type: String,
    pub eval_items: Vec<EvaluationItem>,
}

/// Scene creation body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneCreate {
    pub scene_type: String,
    pub source_project: Uuid,
    pub source_project_layer: Uuid,
    pub source_annotation_group: Uuid,
    pub aoi_annotation_group: Option<Uuid>,
    pub store_annotation_group: Option<Uuid>,
    pub class_statistics: Vec<ClassStatistic>,
    pub f1_score: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
}

/// Vision scene as returned by the API; empty when the server sent no body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
