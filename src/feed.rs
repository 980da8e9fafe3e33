use std::time::Duration;

use reqwest::{
    StatusCode,
    blocking::Client,
    header::{ACCEPT, USER_AGENT},
};
use serde::Deserialize;
use thiserror::Error;

use crate::{config::ServerConfig, domain::PageResponse};

const USER_AGENT_HEADER: &str = "activity-feed-egui/0.1";

/// Anything able to hand back one page of the activity stream.
pub trait EventSource: Send + Sync {
    fn fetch_page(&self, page: u32) -> Result<PageResponse, FetchError>;
}

pub struct HttpEventSource {
    client: Client,
    endpoint: String,
}

impl HttpEventSource {
    pub fn new(server: &ServerConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client()?,
            endpoint: events_endpoint(server),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl EventSource for HttpEventSource {
    fn fetch_page(&self, page: u32) -> Result<PageResponse, FetchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("page", page)])
            .header(USER_AGENT, USER_AGENT_HEADER)
            .header(ACCEPT, "application/json")
            .send()?;

        // Failing statuses become the error card, even when the body is JSON.
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ServerErrorBody>()
                .map(|body| body.error)
                .unwrap_or_else(|_| status_reason(status));
            return Err(FetchError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json()?)
    }
}

pub fn build_client() -> Result<Client, FetchError> {
    Client::builder()
        .user_agent(USER_AGENT_HEADER)
        // A slow page holds pagination until the server answers.
        .timeout(None::<Duration>)
        .build()
        .map_err(FetchError::Http)
}

fn events_endpoint(server: &ServerConfig) -> String {
    let base = server.base_url.trim_end_matches('/');
    let path = server.events_path.trim_start_matches('/');
    format!("{base}/{path}")
}

fn status_reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("unexpected status")
        .to_owned()
}

pub type FetchOutcome = Result<PageResponse, FetchError>;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Activity request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server answered {status}: {message}")]
    Server { status: u16, message: String },
    #[error("Background worker disconnected before returning a result")]
    BackgroundWorkerGone,
}

// Response payloads ---------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ServerErrorBody {
    error: String,
}

// -------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------
