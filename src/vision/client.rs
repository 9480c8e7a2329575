//! Vision API client
//!
//! Every operation is a single independent round-trip (two for
//! [`VisionApiClient::save_experiment_scores`]). Nothing is retried or
//! cached; the first non-2xx response is returned to the caller as an error.
//!
//! Authenticated requests carry the identity token verbatim in the
//! `Authorization` header, without a `Bearer ` prefix. The Vision API
//! expects exactly that, so it must not be "corrected".

use super::models::*;
use crate::config::VisionConfig;
use crate::error::{Result, VisionError};
use crate::metrics::METRICS;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Client for the Vision experiment-tracking API
#[derive(Debug, Clone)]
pub struct VisionApiClient {
    http: Client,
    config: VisionConfig,
    base_url: String,
}

impl VisionApiClient {
    /// Create a new Vision API client
    pub fn new(config: VisionConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        let base_url = config.base_url();

        Ok(Self {
            http,
            config,
            base_url,
        })
    }

    /// Create a client for `api_host` with default settings
    pub fn for_host(api_host: impl Into<String>) -> Result<Self> {
        Self::new(VisionConfig::for_host(api_host))
    }

    /// Configuration this client was built from
    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    /// Exchange a refresh token for an identity token.
    ///
    /// The identity token is not cached; renewing it is up to the caller.
    pub async fn get_api_token(&self, refresh_token: &SecretString) -> Result<SecretString> {
        let start = Instant::now();
        let result = self.exchange_token(refresh_token).await;
        record("get_api_token", &result, start);
        result
    }

    /// Exchange the refresh token held in the configuration
    pub async fn authenticate(&self) -> Result<SecretString> {
        let refresh_token = self.config.refresh_token.as_ref().ok_or_else(|| {
            VisionError::Authentication("no refresh token configured".to_string())
        })?;
        self.get_api_token(refresh_token).await
    }

    async fn exchange_token(&self, refresh_token: &SecretString) -> Result<SecretString> {
        if refresh_token.expose_secret().is_empty() {
            return Err(VisionError::Authentication("refresh token is empty".to_string()));
        }

        let url = format!("{}/api/tokens", self.base_url);
        debug!("Exchanging refresh token at {}", url);

        let response = self
            .http
            .post(&url)
            .json(&TokenRequest {
                refresh_token: refresh_token.expose_secret(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Token exchange rejected with status {}", status);
            return Err(VisionError::Authentication(format!(
                "Status {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| VisionError::Authentication(format!("malformed token response: {}", e)))?;

        token
            .id_token
            .map(SecretString::new)
            .ok_or_else(|| VisionError::Authentication("token response has no id_token".to_string()))
    }

    /// Create a project
    pub async fn create_project(&self, token: &SecretString, name: &str) -> Result<Project> {
        let start = Instant::now();
        let url = format!("{}/api/projects", self.base_url);
        debug!("Creating Vision project {:?}", name);

        let result: Result<Project> = self
            .send(
                self.authorized(Method::POST, &url, token)
                    .json(&ProjectCreate { name }),
            )
            .await;

        if let Ok(project) = &result {
            info!("Created Vision project {} ({})", project.id, project.name);
        }
        record("create_project", &result, start);
        result
    }

    /// Create an experiment in `project_id`
    pub async fn create_experiment(
        &self,
        token: &SecretString,
        project_id: Uuid,
        experiment: &NewExperiment,
    ) -> Result<Experiment> {
        let start = Instant::now();
        let url = format!("{}/api/projects/{}/experiments", self.base_url, project_id);
        debug!(
            "Creating experiment {:?} with {} classes in project {}",
            experiment.name,
            experiment.class_map.len(),
            project_id
        );

        let result: Result<Experiment> = self
            .send(
                self.authorized(Method::POST, &url, token)
                    .json(&ExperimentCreate::new(project_id, experiment)),
            )
            .await;

        if let Ok(created) = &result {
            info!(
                "Created experiment {} in project {}",
                created.id().map(|id| id.to_string()).unwrap_or_default(),
                project_id
            );
        }
        record("create_experiment", &result, start);
        result
    }

    /// Fetch an experiment
    pub async fn get_experiment(
        &self,
        token: &SecretString,
        project_id: Uuid,
        experiment_id: Uuid,
    ) -> Result<Experiment> {
        let start = Instant::now();
        let result = self
            .send(self.authorized(Method::GET, &self.experiment_url(project_id, experiment_id), token))
            .await;
        record("get_experiment", &result, start);
        result
    }

    /// Overwrite an experiment's aggregate scores with those of `eval_item`.
    ///
    /// This is a read-modify-write: the full record is fetched, the three
    /// scores are replaced and the record is PUT back. It is not atomic, so
    /// concurrent updates of the same experiment race and the last write
    /// wins. If the GET fails, no PUT is sent; if the PUT fails, nothing is
    /// undone.
    pub async fn save_experiment_scores(
        &self,
        token: &SecretString,
        project_id: Uuid,
        experiment_id: Uuid,
        eval_item: &EvaluationItem,
    ) -> Result<Experiment> {
        let mut experiment = self.get_experiment(token, project_id, experiment_id).await?;
        experiment.apply_scores(eval_item);

        let start = Instant::now();
        let url = self.experiment_url(project_id, experiment_id);
        let result = self.put_experiment(&url, token, experiment).await;
        record("save_experiment_scores", &result, start);
        result
    }

    async fn put_experiment(
        &self,
        url: &str,
        token: &SecretString,
        experiment: Experiment,
    ) -> Result<Experiment> {
        let response = self
            .authorized(Method::PUT, url, token)
            .json(&experiment)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Experiment update returned {}: {}", status, body);

        if !status.is_success() {
            return Err(VisionError::Request { status, body });
        }
        if body.trim().is_empty() {
            return Ok(experiment);
        }
        decode(&body)
    }

    /// Record an evaluated scene in an experiment.
    ///
    /// Fails with [`VisionError::ResponseShape`] before sending anything if
    /// `scene.eval_items` is non-empty but has no "average" row. Once the
    /// server has answered 2xx the scene exists, so an empty or unexpected
    /// response body yields an empty [`Scene`] rather than an error.
    pub async fn save_scene_with_eval(
        &self,
        token: &SecretString,
        project_id: Uuid,
        experiment_id: Uuid,
        scene: &NewScene,
    ) -> Result<Scene> {
        let start = Instant::now();
        let body = match SceneCreate::from_scene(scene) {
            Ok(body) => body,
            Err(e) => {
                warn!("Not saving scene {:?}: {}", scene.scene_name, e);
                let result: Result<Scene> = Err(e);
                record("save_scene_with_eval", &result, start);
                return result;
            }
        };

        let url = format!("{}/scenes", self.experiment_url(project_id, experiment_id));
        debug!(
            "Saving scene {:?} with {} class statistics to experiment {}",
            scene.scene_name,
            body.class_statistics.len(),
            experiment_id
        );

        let result = self
            .send_accepted(self.authorized(Method::POST, &url, token).json(&body))
            .await;
        record("save_scene_with_eval", &result, start);
        result
    }

    fn experiment_url(&self, project_id: Uuid, experiment_id: Uuid) -> String {
        format!(
            "{}/api/projects/{}/experiments/{}",
            self.base_url, project_id, experiment_id
        )
    }

    /// Request builder carrying the raw identity token
    fn authorized(&self, method: Method, url: &str, token: &SecretString) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(AUTHORIZATION, token.expose_secret().as_str())
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!("Vision API returned {}: {}", status, body);
            return Err(VisionError::Request { status, body });
        }

        decode(&body)
    }

    /// Like `send`, but any 2xx is success: a body that does not decode as
    /// `T` is logged and replaced by `T::default()`
    async fn send_accepted<T: DeserializeOwned + Default>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!("Vision API returned {}: {}", status, body);
            return Err(VisionError::Request { status, body });
        }
        if body.trim().is_empty() {
            return Ok(T::default());
        }

        Ok(decode(&body).unwrap_or_else(|e| {
            warn!("Accepted with {} but {}", status, e);
            T::default()
        }))
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| VisionError::ResponseShape(format!("invalid response body: {}", e)))
}

fn record<T>(operation: &str, result: &Result<T>, start: Instant) {
    let status = match result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    };
    METRICS.record(operation, status, start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = VisionApiClient::for_host("vision.example.com");
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_rejects_invalid_config() {
        let result = VisionApiClient::for_host("https://vision.example.com");
        assert!(matches!(result, Err(VisionError::Configuration(_))));
    }

    #[test]
    fn test_experiment_url() {
        let client = VisionApiClient::for_host("vision.example.com").unwrap();
        let pid = Uuid::nil();
        let eid = Uuid::nil();
        assert_eq!(
            client.experiment_url(pid, eid),
            format!("https://vision.example.com/api/projects/{}/experiments/{}", pid, eid)
        );
    }

    #[tokio::test]
    async fn test_empty_refresh_token_rejected_locally() {
        let client = VisionApiClient::for_host("vision.example.com").unwrap();
        let result = client.get_api_token(&SecretString::new(String::new())).await;
        assert!(matches!(result, Err(VisionError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_authenticate_without_refresh_token() {
        let client = VisionApiClient::for_host("vision.example.com").unwrap();
        let result = client.authenticate().await;
        assert!(matches!(result, Err(VisionError::Authentication(_))));
    }
}
