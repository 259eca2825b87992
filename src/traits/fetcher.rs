use futures::future::LocalBoxFuture;
use reqwest::Url;

/// Fetches raw documents and assets over the network
pub trait DocumentFetcher {
    /// Fetch the body at `url`. Completion is delivered on the caller's context.
    fn fetch(&self, url: &Url) -> LocalBoxFuture<'static, anyhow::Result<Vec<u8>>>;
}
