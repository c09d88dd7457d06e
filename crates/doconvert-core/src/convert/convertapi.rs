use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::traits::{ConversionTarget, ConvertedFile, ConverterInfo, OfficeConverter};
use crate::asset::InputAsset;
use crate::error::{Error, Result};

/// Hosted conversion through the ConvertAPI REST service.
///
/// The file is uploaded with `StoreFile=true`; the service answers with a
/// download URL which is then fetched.
pub struct ConvertApiConverter {
    client: Client,
    /// Base URL for the API (e.g., "https://v2.convertapi.com")
    pub api_base: String,
    /// API secret, sent as a bearer token
    pub secret: Option<String>,
    /// Number of attempts per request
    pub retry_count: u32,
    /// Delay between attempts in milliseconds
    pub retry_delay_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConvertResponse {
    files: Vec<ResultFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResultFile {
    file_name: String,
    url: String,
}

impl ConvertApiConverter {
    pub fn new(
        api_base: String,
        secret: Option<String>,
        timeout: Duration,
        retry_count: u32,
        retry_delay_ms: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::CollaboratorFailure(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base,
            secret: secret.filter(|s| !s.is_empty()),
            retry_count: retry_count.max(1),
            retry_delay_ms,
        })
    }

    fn convert_url(&self, from: &str, target: ConversionTarget) -> String {
        format!(
            "{}/convert/{}/to/{}",
            self.api_base.trim_end_matches('/'),
            from,
            target.extension()
        )
    }

    /// Upload the file and return the stored result's descriptor.
    async fn request_with_retry(
        &self,
        secret: &str,
        asset: &InputAsset,
        url: &str,
    ) -> Result<ResultFile> {
        let mut last_error = None;

        for attempt in 0..self.retry_count {
            debug!(
                "Conversion request attempt {}/{} to {}",
                attempt + 1,
                self.retry_count,
                url
            );

            // Multipart forms are consumed on send, so rebuild per attempt
            let part = Part::bytes(asset.bytes.to_vec()).file_name(asset.filename.clone());
            let form = Form::new().part("File", part).text("StoreFile", "true");

            let request = self
                .client
                .post(url)
                .header("Authorization", format!("Bearer {secret}"))
                .multipart(form);

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        match response.json::<ConvertResponse>().await {
                            Ok(body) => {
                                if let Some(file) = body.files.into_iter().next() {
                                    return Ok(file);
                                }
                                last_error = Some(Error::CollaboratorFailure(
                                    "Conversion service returned no files".to_string(),
                                ));
                            }
                            Err(e) => {
                                warn!("Failed to parse conversion response: {}", e);
                                last_error = Some(Error::CollaboratorFailure(format!(
                                    "Invalid conversion response: {e}"
                                )));
                            }
                        }
                    } else {
                        let body = response.text().await.unwrap_or_default();
                        warn!("Conversion API error: {} - {}", status, body);
                        let err = Error::CollaboratorFailure(format!(
                            "Conversion failed: HTTP {status}: {body}"
                        ));

                        // Client errors won't improve on retry
                        if status.is_client_error() && status.as_u16() != 429 {
                            return Err(err);
                        }
                        last_error = Some(err);
                    }
                }
                Err(e) => {
                    warn!("Conversion request failed: {}", e);
                    last_error = Some(Error::CollaboratorFailure(if e.is_timeout() {
                        "Conversion request timed out".to_string()
                    } else {
                        format!("Conversion request failed: {e}")
                    }));
                }
            }

            if attempt + 1 < self.retry_count {
                tokio::time::sleep(Duration::from_millis(self.retry_delay_ms)).await;
            }
        }

        error!("Conversion failed after {} attempts", self.retry_count);
        Err(last_error
            .unwrap_or_else(|| Error::CollaboratorFailure("Conversion failed".to_string())))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                Error::CollaboratorFailure(format!("Failed to download converted file: {e}"))
            })?;

        if !response.status().is_success() {
            warn!("Download of {} returned {}", url, response.status());
            return Err(Error::CollaboratorFailure(
                "Failed to download converted file".to_string(),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| {
                Error::CollaboratorFailure(format!("Failed to download converted file: {e}"))
            })?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl OfficeConverter for ConvertApiConverter {
    fn info(&self) -> ConverterInfo {
        ConverterInfo {
            name: "ConvertAPI",
        }
    }

    fn is_available(&self) -> bool {
        self.secret.is_some()
    }

    async fn convert(&self, asset: &InputAsset, target: ConversionTarget) -> Result<ConvertedFile> {
        let Some(secret) = self.secret.as_deref() else {
            return Err(Error::CollaboratorFailure(
                "CONVERTAPI_SECRET not configured".to_string(),
            ));
        };
        target.check_source(asset)?;

        let from = asset
            .extension()
            .ok_or_else(|| Error::InvalidInput(format!("{} has no extension", asset.filename)))?;
        let url = self.convert_url(&from, target);

        let result = self.request_with_retry(secret, asset, &url).await?;
        debug!("Conversion produced {}", result.file_name);

        let bytes = self.download(&result.url).await?;

        Ok(ConvertedFile {
            bytes,
            filename: target.output_filename(asset),
            content_type: target.content_type(),
        })
    }
}
