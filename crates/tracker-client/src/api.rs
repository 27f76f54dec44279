use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use tracker_types::api::{
    ClaimRequest, ClaimResponse, CreateTimelineResponse, ErrorResponse, Facets, MessageResponse,
    PageResponse, PostCommentRequest, TimelineDraft, TimelinePatch, TimelineQuery,
    UpdateTimelineRequest,
};
use tracker_types::{Comment, CommentThread, TimelineRecord, UserComment};

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered and said no.
    #[error("{message} (HTTP {status})")]
    Rejected { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("No email is saved on this device. Claim or submit a timeline first.")]
    NoIdentity,
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Thin HTTP client for the tracker API. One method per route.
#[derive(Debug, Clone)]
pub struct TrackerClient {
    http: Client,
    base_url: String,
}

impl TrackerClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        debug!("GET {}", path);
        let resp = self.http.get(self.url(path)).send().await?;
        decode(resp).await
    }

    async fn send_json<B, T>(&self, method: reqwest::Method, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("{} {}", method, path);
        let resp = self.http.request(method, self.url(path)).json(body).send().await?;
        decode(resp).await
    }

    pub async fn health(&self) -> Result<Value, ClientError> {
        self.get("/health").await
    }

    pub async fn list_timelines(&self) -> Result<Vec<TimelineRecord>, ClientError> {
        self.get("/timelines").await
    }

    /// The listing as undecoded JSON, for callers that tolerate bad payloads.
    pub async fn list_timelines_raw(&self) -> Result<Value, ClientError> {
        self.get("/timelines").await
    }

    pub async fn view(&self, query: &TimelineQuery) -> Result<PageResponse, ClientError> {
        debug!("GET /timelines/view");
        let resp = self
            .http
            .get(self.url("/timelines/view"))
            .query(query)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn facets(&self) -> Result<Facets, ClientError> {
        self.get("/timelines/facets").await
    }

    pub async fn get_timeline(&self, id: i64) -> Result<TimelineRecord, ClientError> {
        self.get(&format!("/timelines/{id}")).await
    }

    pub async fn create_timeline(&self, draft: &TimelineDraft) -> Result<CreateTimelineResponse, ClientError> {
        self.send_json(reqwest::Method::POST, "/timelines", draft).await
    }

    pub async fn update_timeline(
        &self,
        id: i64,
        email: &str,
        updates: &TimelinePatch,
    ) -> Result<MessageResponse, ClientError> {
        let body = UpdateTimelineRequest {
            email: email.to_string(),
            updates: updates.clone(),
        };
        self.send_json(reqwest::Method::PATCH, &format!("/timelines/{id}"), &body)
            .await
    }

    pub async fn claim_timeline(&self, id: i64, email: &str) -> Result<ClaimResponse, ClientError> {
        let body = ClaimRequest {
            email: email.to_string(),
        };
        self.send_json(reqwest::Method::POST, &format!("/timelines/{id}/claim"), &body)
            .await
    }

    pub async fn comments(&self, timeline_id: i64) -> Result<Vec<CommentThread>, ClientError> {
        self.get(&format!("/timelines/{timeline_id}/comments")).await
    }

    pub async fn post_comment(
        &self,
        timeline_id: i64,
        request: &PostCommentRequest,
    ) -> Result<Comment, ClientError> {
        self.send_json(
            reqwest::Method::POST,
            &format!("/timelines/{timeline_id}/comments"),
            request,
        )
        .await
    }

    pub async fn user_comments(&self, email: &str) -> Result<Vec<UserComment>, ClientError> {
        debug!("GET /comments");
        let resp = self
            .http
            .get(self.url("/comments"))
            .query(&[("email", email)])
            .send()
            .await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("Request failed").to_string()
            } else {
                body.trim().to_string()
            }
        });

    Err(ClientError::Rejected {
        status: status.as_u16(),
        message,
    })
}
