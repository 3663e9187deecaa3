use crate::error::{Result, ScrapeError};
use crate::types::ImageRef;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use leptess::LepTess;
use std::collections::HashMap;
use std::time::Duration;

/// Recognition port. Each invocation is independent and stateless from the
/// caller's perspective; no partial or fallback value is ever synthesized.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &ImageRef) -> Result<String>;
}

/// Tesseract-backed engine. Resolves an image reference to bytes (embedded
/// data URI, absolute URL, or path relative to the source page) and runs
/// recognition on the blocking pool with a fresh engine handle per call.
pub struct TesseractOcr {
    client: reqwest::Client,
    base_url: reqwest::Url,
    language: String,
}

impl TesseractOcr {
    pub fn new(base_url: &str, language: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = reqwest::Url::parse(base_url)
            .map_err(|e| ScrapeError::Config(format!("invalid source URL '{}': {}", base_url, e)))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            language: language.into(),
        })
    }

    async fn resolve(&self, image: &ImageRef) -> Result<Vec<u8>> {
        let src = image.as_str();
        if src.starts_with("data:") {
            return decode_data_uri(src);
        }

        let url = self
            .base_url
            .join(src)
            .map_err(|e| ScrapeError::Ocr(format!("invalid image reference '{}': {}", src, e)))?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ScrapeError::Ocr(format!("image fetch failed for '{}': {}", url, e)))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ScrapeError::Ocr(format!("image read failed for '{}': {}", url, e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image: &ImageRef) -> Result<String> {
        let bytes = self.resolve(image).await?;
        let language = self.language.clone();

        tokio::task::spawn_blocking(move || recognize_image(&bytes, &language))
            .await
            .map_err(|e| ScrapeError::Ocr(format!("OCR worker join failed: {}", e)))?
    }
}

/// Runs one recognition with a scoped engine handle. The handle is created
/// here and dropped on every exit path, success or failure.
fn recognize_image(bytes: &[u8], language: &str) -> Result<String> {
    let mut engine = LepTess::new(None, language)
        .map_err(|e| ScrapeError::Ocr(format!("failed to initialize Tesseract: {}", e)))?;
    engine
        .set_image_from_mem(bytes)
        .map_err(|e| ScrapeError::Ocr(format!("failed to load image: {}", e)))?;
    let text = engine
        .get_utf8_text()
        .map_err(|e| ScrapeError::Ocr(format!("recognition failed: {}", e)))?;
    Ok(text.trim().to_string())
}

fn decode_data_uri(src: &str) -> Result<Vec<u8>> {
    let (header, data) = src
        .split_once(',')
        .ok_or_else(|| ScrapeError::Ocr("malformed data URI".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(ScrapeError::Ocr(format!(
            "unsupported data URI encoding: '{}'",
            header
        )));
    }
    STANDARD
        .decode(data.trim())
        .map_err(|e| ScrapeError::Ocr(format!("invalid base64 image data: {}", e)))
}

/// Fixed-response engine for tests and development: maps image references to
/// canned text without requiring a native Tesseract install.
pub struct FixedOcr {
    texts: HashMap<String, String>,
}

impl FixedOcr {
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            texts: texts
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl OcrEngine for FixedOcr {
    async fn recognize(&self, image: &ImageRef) -> Result<String> {
        self.texts
            .get(image.as_str())
            .map(|text| text.trim().to_string())
            .ok_or_else(|| ScrapeError::Ocr(format!("no recognition result for '{}'", image)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64_data_uri() {
        // "flow" as a png-less stand-in payload
        let bytes = decode_data_uri("data:image/png;base64,Zmxvdw==").unwrap();
        assert_eq!(bytes, b"flow");
    }

    #[test]
    fn rejects_non_base64_data_uri() {
        let err = decode_data_uri("data:text/plain,hello").unwrap_err();
        assert!(matches!(err, ScrapeError::Ocr(_)));
    }

    #[test]
    fn rejects_data_uri_without_payload() {
        assert!(decode_data_uri("data:image/png;base64").is_err());
    }

    #[tokio::test]
    async fn fixed_engine_trims_and_errors_on_unknown_refs() {
        let ocr = FixedOcr::new([("a.png", "  15.2 m3/s\n")]);
        let text = ocr.recognize(&ImageRef("a.png".to_string())).await.unwrap();
        assert_eq!(text, "15.2 m3/s");

        let err = ocr
            .recognize(&ImageRef("missing.png".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Ocr(_)));
    }
}
