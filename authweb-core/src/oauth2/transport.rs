//! Back-channel plumbing shared by the token exchange and the profile fetch

use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Run `fut` until it completes, `timeout` elapses, or `cancel` fires.
///
/// Dropping the future aborts the in-flight request.
pub(crate) async fn bounded<F, T>(
    fut: F,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        res = tokio::time::timeout(timeout, fut) => res.map_err(|_| Error::Timeout(timeout))?,
    }
}

/// Validate a provider response and decode its JSON body.
///
/// Order matters: a non-2xx status is reported with the raw body before the
/// content type is looked at, and the content type is checked before the
/// body is parsed.
pub(crate) async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let content_type = response.headers().get(CONTENT_TYPE).cloned();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(Error::ProviderStatus { status, body });
    }

    let media_type = media_type(content_type.as_ref())?;
    if media_type != "application/json" {
        return Err(Error::UnexpectedContentType(media_type));
    }

    serde_json::from_str(&body).map_err(|e| Error::Decode(e.to_string()))
}

/// Media type of a `Content-Type` value, lowercased, parameters dropped.
fn media_type(value: Option<&HeaderValue>) -> Result<String> {
    let raw = value
        .ok_or_else(|| Error::UnexpectedContentType("no Content-Type header".to_string()))?
        .to_str()
        .map_err(|_| Error::UnexpectedContentType("non-ASCII Content-Type header".to_string()))?;

    let essence = raw
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence.is_empty() || !essence.contains('/') {
        return Err(Error::UnexpectedContentType(format!(
            "malformed Content-Type {raw:?}"
        )));
    }

    Ok(essence)
}
