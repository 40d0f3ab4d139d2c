//! Shared HTTP plumbing for the registry and issue tracker clients.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::NudgeConfig;
use crate::error::{CheckError, Result};

/// Build the client used by one upstream service.
pub(crate) fn build_client(config: &NudgeConfig) -> Result<Client> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(config.connect_timeout)
        .timeout(config.read_timeout)
        .build()
        .map_err(CheckError::from)
}

/// Body of a successful response, or the status of a 4xx answer.
#[derive(Debug)]
pub(crate) enum Fetched<T> {
    Found(T),
    ClientError(StatusCode),
}

/// Send `request` and decode a JSON body.
///
/// Client errors are returned as [`Fetched::ClientError`] because the checks
/// turn them into an explanation for the assignee; every other non-success
/// status is an error.
pub(crate) async fn get_json<T: DeserializeOwned>(request: RequestBuilder, url: &str) -> Result<Fetched<T>> {
    let response = request.send().await?;
    let status = response.status();
    debug!(url = %url, status = status.as_u16(), "upstream response");

    if status.is_client_error() {
        return Ok(Fetched::ClientError(status));
    }
    if !status.is_success() {
        return Err(CheckError::UnexpectedStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await?;
    Ok(Fetched::Found(serde_json::from_slice(&body)?))
}
