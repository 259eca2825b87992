// http.rs - Blocking reqwest transport bridged onto the single-threaded pool
use anyhow::{Context, Result};
use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use log::debug;
use reqwest::blocking::Client;
use reqwest::Url;
use std::thread;
use std::time::Duration;

use crate::traits::DocumentFetcher;

/// Fetches over HTTP(S) on a worker thread per request.
///
/// The request runs off-thread; its result comes back through a oneshot
/// channel and is observed wherever the returned future is polled.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// `timeout` of None waits indefinitely
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("qr-model-viewer/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

fn fetch_blocking(client: &Client, url: &Url) -> Result<Vec<u8>> {
    let response = client
        .get(url.clone())
        .send()
        .with_context(|| format!("Request to {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Server rejected request to {}", url))?;
    let bytes = response
        .bytes()
        .with_context(|| format!("Failed to read response body from {}", url))?;
    debug!("Fetched {} bytes from {}", bytes.len(), url);
    Ok(bytes.to_vec())
}

impl DocumentFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> LocalBoxFuture<'static, Result<Vec<u8>>> {
        let (tx, rx) = oneshot::channel();
        let client = self.client.clone();
        let target = url.clone();

        let spawned = thread::Builder::new()
            .name("http-fetch".to_string())
            .spawn(move || {
                // Receiver gone means the request was superseded
                let _ = tx.send(fetch_blocking(&client, &target));
            });

        async move {
            spawned.context("Failed to start fetch thread")?;
            rx.await.context("Fetch thread ended without a response")?
        }
        .boxed_local()
    }
}
