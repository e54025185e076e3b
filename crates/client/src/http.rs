//! Plumbing shared by the HTTP clients.

use std::future::Future;

use reqwest::Response;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{Error, Result};

/// Runs `fut` unless `cancel` fires first, in which case [`Error::Cancelled`] is returned and
/// `fut` is dropped.
pub(crate) async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;

        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

/// Makes `url` usable as a base for relative joins by giving its path a trailing slash.
pub(crate) fn base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Builds a [`Error::Protocol`] from an unexpected response, consuming its body.
pub(crate) async fn protocol_error(url: Url, response: Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Error::Protocol { url, status, body }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let url = base_url(Url::parse("http://localhost:5052").unwrap());
        assert_eq!(url.as_str(), "http://localhost:5052/");

        let url = base_url(Url::parse("http://localhost:5052/beacon").unwrap());
        assert_eq!(
            url.join("eth/v1/events").unwrap().as_str(),
            "http://localhost:5052/beacon/eth/v1/events"
        );

        let url = base_url(Url::parse("http://localhost:5052/beacon/").unwrap());
        assert_eq!(url.as_str(), "http://localhost:5052/beacon/");
    }

    #[tokio::test]
    async fn cancellable_prefers_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = cancellable(&cancel, std::future::pending::<Result<()>>()).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn cancellable_passes_result_through() {
        let cancel = CancellationToken::new();
        let result = cancellable(&cancel, async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
