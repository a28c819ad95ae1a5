use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use super::ApiError;
use super::types::{Cluster, ErrorResponse, NodeDeployment, Project};
use crate::id::{ClusterId, NodeDeploymentId};

const API_PREFIX: &str = "api/v1";
const MERGE_PATCH: &str = "application/merge-patch+json";

#[derive(Clone)]
pub struct KubermaticClient {
    client: reqwest::Client,
    base_url: String,
}

impl KubermaticClient {
    /// `host` is the Kubermatic dashboard URL, e.g. `https://kubermatic.example.com`.
    pub fn new(host: String, token: String) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", token);
        let header_value = HeaderValue::from_str(&auth_value)
            .map_err(|_| ApiError::Config("invalid token format".to_string()))?;
        headers.insert(AUTHORIZATION, header_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            client,
            base_url: host.trim_end_matches('/').to_string(),
        })
    }

    pub fn host(&self) -> &str {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = format!("{}/{}", self.base_url, API_PREFIX);
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    fn cluster_url(&self, cluster: &ClusterId, rest: &[&str]) -> String {
        let mut segments = vec![
            "projects",
            cluster.project_id.as_str(),
            "dc",
            cluster.datacenter.as_str(),
            "clusters",
            cluster.cluster_id.as_str(),
        ];
        segments.extend_from_slice(rest);
        self.url(&segments)
    }

    fn node_deployment_url(&self, id: &NodeDeploymentId) -> String {
        self.cluster_url(
            &id.cluster(),
            &["nodedeployments", id.node_deployment_id.as_str()],
        )
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Project, ApiError> {
        let url = self.url(&["projects", project_id]);
        self.send(self.client.get(&url), "project", project_id).await
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<(), ApiError> {
        let url = self.url(&["projects", project_id]);
        self.send_empty(self.client.delete(&url), "project", project_id)
            .await?;
        tracing::info!(project_id, "project deleted");
        Ok(())
    }

    pub async fn get_cluster(&self, cluster: &ClusterId) -> Result<Cluster, ApiError> {
        let url = self.cluster_url(cluster, &[]);
        self.send(self.client.get(&url), "cluster", &cluster.to_string())
            .await
    }

    pub async fn list_node_deployments(
        &self,
        cluster: &ClusterId,
    ) -> Result<Vec<NodeDeployment>, ApiError> {
        let url = self.cluster_url(cluster, &["nodedeployments"]);
        self.send(self.client.get(&url), "cluster", &cluster.to_string())
            .await
    }

    pub async fn get_node_deployment(
        &self,
        id: &NodeDeploymentId,
    ) -> Result<NodeDeployment, ApiError> {
        let url = self.node_deployment_url(id);
        tracing::debug!(%id, "fetching node deployment");
        self.send(self.client.get(&url), "node deployment", &id.to_string())
            .await
    }

    /// Applies a JSON merge patch; only the fields present in `patch` change.
    pub async fn patch_node_deployment(
        &self,
        id: &NodeDeploymentId,
        patch: &serde_json::Value,
    ) -> Result<NodeDeployment, ApiError> {
        let url = self.node_deployment_url(id);
        let request = self
            .client
            .patch(&url)
            .header(CONTENT_TYPE, MERGE_PATCH)
            .body(patch.to_string());
        let patched = self
            .send(request, "node deployment", &id.to_string())
            .await?;
        tracing::info!(%id, "node deployment patched");
        Ok(patched)
    }

    pub async fn delete_node_deployment(&self, id: &NodeDeploymentId) -> Result<(), ApiError> {
        let url = self.node_deployment_url(id);
        self.send_empty(self.client.delete(&url), "node deployment", &id.to_string())
            .await?;
        tracing::info!(%id, "node deployment deleted");
        Ok(())
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &'static str,
        id: &str,
    ) -> Result<T, ApiError> {
        let response = Self::check(request.send().await?, resource, id).await?;
        response.json().await.map_err(|e| ApiError::Decode {
            resource,
            message: e.to_string(),
        })
    }

    async fn send_empty(
        &self,
        request: RequestBuilder,
        resource: &'static str,
        id: &str,
    ) -> Result<(), ApiError> {
        Self::check(request.send().await?, resource, id).await?;
        Ok(())
    }

    async fn check(
        response: reqwest::Response,
        resource: &'static str,
        id: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });

        tracing::debug!(status = status.as_u16(), resource, %message, "API request failed");

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Auth { message },
            StatusCode::NOT_FOUND => ApiError::NotFound {
                resource,
                id: id.to_string(),
            },
            _ => ApiError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }
}

impl std::fmt::Debug for KubermaticClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubermaticClient")
            .field("host", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}
