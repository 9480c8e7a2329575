//! Client for the Vision experiment-tracking API
//!
//! Covers the calls rf makes when publishing a trained model:
//! - POST /api/tokens - Exchange a refresh token
//! - POST /api/projects - Create a project
//! - POST /api/projects/{id}/experiments - Create an experiment
//! - GET/PUT /api/projects/{id}/experiments/{id} - Update experiment scores
//! - POST /api/projects/{id}/experiments/{id}/scenes - Save a scene evaluation

pub mod client;
pub mod evaluation;
pub mod models;

pub use client::VisionApiClient;
pub use evaluation::SceneEvaluation;
pub use models::{
    ClassId, ClassStatistic, EvaluationItem, Experiment, NewExperiment, NewScene, Project, Scene,
    SceneCreate, AVERAGE_CLASS_NAME,
};
