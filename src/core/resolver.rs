use anyhow::{bail, Context};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::rc::Rc;

use crate::error::ViewerError;
use crate::traits::DocumentFetcher;
use crate::types::ContentDescriptor;

/// Query parameter that carries the real target
const SRC_PARAM: &str = "src";
const ASSET_EXTENSIONS: &[&str] = &["glb", "gltf"];
const METADATA_EXTENSIONS: &[&str] = &["json"];
const MODEL_SCHEMES: &[&str] = &["http", "https"];

/// Effective target of a payload after unwrapping `src`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadTarget {
    /// Binary asset, used directly as the model URL
    Asset(Url),
    /// Metadata document to fetch and parse
    Metadata(Url),
}

impl PayloadTarget {
    pub fn url(&self) -> &Url {
        match self {
            PayloadTarget::Asset(url) | PayloadTarget::Metadata(url) => url,
        }
    }
}

/// Metadata document wire format. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct MetadataDocument {
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    description: Option<Value>,
    #[serde(default)]
    price: Option<Value>,
    #[serde(default)]
    origin: Option<Value>,
    #[serde(default)]
    model: Option<Value>,
}

/// Turns decoded payloads into content descriptors
pub struct ContentResolver {
    base: Url,
    fetcher: Rc<dyn DocumentFetcher>,
}

impl ContentResolver {
    /// `base` plays the role of the current document location
    pub fn new(base: Url, fetcher: Rc<dyn DocumentFetcher>) -> Self {
        Self { base, fetcher }
    }

    /// Parse and classify a payload without touching the network
    pub fn classify(&self, payload: &str) -> Result<PayloadTarget, ViewerError> {
        let unsupported = || ViewerError::UnsupportedPayload {
            payload: payload.to_string(),
        };

        let trimmed = payload.trim();
        if trimmed.is_empty() {
            return Err(unsupported());
        }

        let url = self.base.join(trimmed).map_err(|_| unsupported())?;
        let src = url
            .query_pairs()
            .find(|(key, _)| key == SRC_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.trim().is_empty());

        let effective = match src {
            Some(src) => url.join(src.trim()).map_err(|_| unsupported())?,
            None => url,
        };

        if !matches!(effective.scheme(), "http" | "https") {
            return Err(unsupported());
        }

        match extension(&effective) {
            None => Ok(PayloadTarget::Metadata(effective)),
            Some(ext) if ASSET_EXTENSIONS.contains(&ext.as_str()) => {
                Ok(PayloadTarget::Asset(effective))
            }
            Some(ext) if METADATA_EXTENSIONS.contains(&ext.as_str()) => {
                Ok(PayloadTarget::Metadata(effective))
            }
            Some(_) => Err(unsupported()),
        }
    }

    /// Produce the descriptor for an already classified target
    pub async fn resolve_target(
        &self,
        target: PayloadTarget,
    ) -> Result<ContentDescriptor, ViewerError> {
        match target {
            PayloadTarget::Asset(url) => Ok(ContentDescriptor::for_asset(url)),
            PayloadTarget::Metadata(url) => {
                let bytes = self
                    .fetcher
                    .fetch(&url)
                    .await
                    .map_err(|err| ViewerError::resolution(url.as_str(), &err))?;
                parse_metadata(&url, &bytes)
                    .map_err(|err| ViewerError::resolution(url.as_str(), &err))
            }
        }
    }

    pub async fn resolve(&self, payload: &str) -> Result<ContentDescriptor, ViewerError> {
        let target = self.classify(payload)?;
        self.resolve_target(target).await
    }
}

/// Lowercased extension of the last path segment, if it has one
fn extension(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.last()?;
    segment
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

fn parse_metadata(document_url: &Url, bytes: &[u8]) -> anyhow::Result<ContentDescriptor> {
    let document: MetadataDocument =
        serde_json::from_slice(bytes).context("Metadata document is not valid JSON")?;

    let model = match &document.model {
        None | Some(Value::Null) => bail!("Metadata document has no model URL"),
        Some(Value::String(model)) => model.trim(),
        Some(other) => bail!("Metadata model field must be a string, got {}", other),
    };
    if model.is_empty() {
        bail!("Metadata document has no model URL");
    }

    let model_url = document_url
        .join(model)
        .with_context(|| format!("Invalid model URL: {}", model))?;
    if !MODEL_SCHEMES.contains(&model_url.scheme()) {
        bail!("Unsupported model URL scheme: {}", model_url);
    }

    Ok(ContentDescriptor {
        name: display_text(document.name),
        description: display_text(document.description),
        price: display_text(document.price),
        origin: display_text(document.origin),
        model_url,
    })
}

/// Render a scalar metadata field as text; missing or null becomes empty
fn display_text(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::{self, FutureExt, LocalBoxFuture};

    struct NoFetch;

    impl DocumentFetcher for NoFetch {
        fn fetch(&self, url: &Url) -> LocalBoxFuture<'static, anyhow::Result<Vec<u8>>> {
            let url = url.to_string();
            future::ready(Err(anyhow::anyhow!("unexpected fetch of {}", url))).boxed_local()
        }
    }

    fn resolver() -> ContentResolver {
        ContentResolver::new(Url::parse("https://shop.example/scan/").unwrap(), Rc::new(NoFetch))
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_classify_asset_suffixes() {
        let resolver = resolver();
        assert_eq!(
            resolver.classify("https://x/y.glb").unwrap(),
            PayloadTarget::Asset(url("https://x/y.glb"))
        );
        assert_eq!(
            resolver.classify("https://x/Y.GLTF").unwrap(),
            PayloadTarget::Asset(url("https://x/Y.GLTF"))
        );
    }

    #[test]
    fn test_classify_ignores_query_and_fragment_for_suffix() {
        let target = resolver().classify("https://x/y.glb?v=2#top").unwrap();
        assert!(matches!(target, PayloadTarget::Asset(_)));
    }

    #[test]
    fn test_classify_metadata_default_path() {
        let resolver = resolver();
        assert!(matches!(
            resolver.classify("https://x/card.json").unwrap(),
            PayloadTarget::Metadata(_)
        ));
        assert!(matches!(
            resolver.classify("https://x/products/42").unwrap(),
            PayloadTarget::Metadata(_)
        ));
    }

    #[test]
    fn test_classify_src_param() {
        let target = resolver()
            .classify("https://x/page?src=https://x/card.json")
            .unwrap();
        assert_eq!(target, PayloadTarget::Metadata(url("https://x/card.json")));
    }

    #[test]
    fn test_classify_relative_src_resolves_against_payload() {
        let target = resolver()
            .classify("https://x/viewer/index.html?src=models/chair.glb")
            .unwrap();
        assert_eq!(target, PayloadTarget::Asset(url("https://x/viewer/models/chair.glb")));
    }

    #[test]
    fn test_classify_relative_payload_uses_base() {
        let target = resolver().classify("vase.glb").unwrap();
        assert_eq!(target, PayloadTarget::Asset(url("https://shop.example/scan/vase.glb")));
    }

    #[test]
    fn test_classify_unsupported() {
        let resolver = resolver();
        for payload in ["https://x/unknown.txt", "", "   ", "WIFI:S:home;T:WPA;P:secret;;"] {
            let err = resolver.classify(payload).unwrap_err();
            assert!(
                matches!(err, ViewerError::UnsupportedPayload { .. }),
                "{payload:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_parse_metadata_maps_fields() {
        let doc = br#"{"name":"Vase","description":"Clay","price":"10","origin":"Thailand","model":"https://x/vase.glb","sku":"ignored"}"#;
        let descriptor = parse_metadata(&url("https://x/card.json"), doc).unwrap();
        assert_eq!(descriptor.name, "Vase");
        assert_eq!(descriptor.description, "Clay");
        assert_eq!(descriptor.price, "10");
        assert_eq!(descriptor.origin, "Thailand");
        assert_eq!(descriptor.model_url.as_str(), "https://x/vase.glb");
    }

    #[test]
    fn test_parse_metadata_relative_model_and_numeric_price() {
        let doc = br#"{"name":"Bowl","price":12.5,"model":"assets/bowl.glb"}"#;
        let descriptor = parse_metadata(&url("https://x/cards/bowl.json"), doc).unwrap();
        assert_eq!(descriptor.price, "12.5");
        assert_eq!(descriptor.description, "");
        assert_eq!(descriptor.model_url.as_str(), "https://x/cards/assets/bowl.glb");
    }

    #[test]
    fn test_parse_metadata_requires_model() {
        assert!(parse_metadata(&url("https://x/a.json"), br#"{"name":"A"}"#).is_err());
        assert!(parse_metadata(&url("https://x/a.json"), br#"{"model":"  "}"#).is_err());
        assert!(parse_metadata(&url("https://x/a.json"), b"<html>").is_err());
    }

    #[test]
    fn test_parse_metadata_rejects_non_string_model() {
        let docs: [&[u8]; 3] = [
            br#"{"model":5}"#,
            br#"{"model":{"url":"a.glb"}}"#,
            br#"{"model":["a.glb"]}"#,
        ];
        for doc in docs {
            let reason = format!("{:#}", parse_metadata(&url("https://x/a.json"), doc).unwrap_err());
            assert!(reason.contains("model field must be a string"), "{reason}");
            assert!(!reason.contains("not valid JSON"), "{reason}");
        }
    }

    #[test]
    fn test_parse_metadata_null_model_is_missing() {
        let err = parse_metadata(&url("https://x/a.json"), br#"{"model":null}"#).unwrap_err();
        assert!(err.to_string().contains("no model URL"));
    }

    #[test]
    fn test_parse_metadata_rejects_non_http_model() {
        for model in ["file:///etc/vase.glb", "data:model/gltf-binary;base64,AAAA", "ftp://x/vase.glb"] {
            let doc = format!(r#"{{"model":"{model}"}}"#);
            let err = parse_metadata(&url("https://x/a.json"), doc.as_bytes()).unwrap_err();
            assert!(
                err.to_string().contains("Unsupported model URL scheme"),
                "{model} gave {err:#}"
            );
        }
    }

    #[test]
    fn test_parse_metadata_accepts_plain_http_model() {
        let doc = br#"{"model":"http://x/vase.glb"}"#;
        let descriptor = parse_metadata(&url("https://x/a.json"), doc).unwrap();
        assert_eq!(descriptor.model_url.scheme(), "http");
    }

    #[test]
    fn test_resolve_asset_without_fetch() {
        let descriptor = futures::executor::block_on(resolver().resolve("https://x/y.glb")).unwrap();
        assert!(descriptor.is_bare());
        assert_eq!(descriptor.model_url.as_str(), "https://x/y.glb");
    }

    #[test]
    fn test_resolve_fetch_failure_is_resolution_failed() {
        let err = futures::executor::block_on(resolver().resolve("https://x/card.json")).unwrap_err();
        assert!(matches!(err, ViewerError::ResolutionFailed { .. }));
    }
}
