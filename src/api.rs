// API client module: a small blocking HTTP client for the asset API.
// Two calls are used: create-asset (multipart upload) and get-operation.
// Both sit behind the `AssetApi` trait so the submit and poll stages can be
// driven by a scripted client in tests.

use crate::config::{Config, Creator};
use crate::error::{Result, UploaderError};
use reqwest::blocking::{multipart, Client};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs::File;
use std::path::PathBuf;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Everything needed to upload one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUpload {
    pub display_name: String,
    pub path: PathBuf,
    pub mime_type: &'static str,
}

/// Parsed state of a server-side operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    /// Finished. `asset_id` is `None` when the server gave no result.
    Done { asset_id: Option<String> },
}

/// The two remote calls the uploader relies on.
pub trait AssetApi {
    /// Start an upload. Returns the full URL of the operation to poll.
    fn create_asset(&self, upload: &AssetUpload) -> Result<String>;

    /// Fetch the current state of an operation.
    fn get_operation(&self, operation_url: &str) -> Result<OperationStatus>;
}

impl<T: AssetApi + ?Sized> AssetApi for &T {
    fn create_asset(&self, upload: &AssetUpload) -> Result<String> {
        (**self).create_asset(upload)
    }

    fn get_operation(&self, operation_url: &str) -> Result<OperationStatus> {
        (**self).get_operation(operation_url)
    }
}

/// Blocking client for the asset API. Every request carries the API key.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    creator: Creator,
}

#[derive(Deserialize)]
struct OperationBody {
    path: Option<String>,
    #[serde(default)]
    done: bool,
    response: Option<OperationResult>,
}

#[derive(Deserialize)]
struct OperationResult {
    #[serde(rename = "assetId")]
    asset_id: Option<Value>,
}

impl ApiClient {
    /// Build a client with the API key header and request timeout from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .default_headers(api_key_headers(&config.api_key)?)
            .timeout(config.request_timeout)
            .build()?;

        Ok(ApiClient {
            client,
            base_url: config.base_url.clone(),
            creator: config.creator,
        })
    }

    fn assets_url(&self) -> String {
        format!("{}/assets/v1/assets", self.base_url)
    }

    fn operation_url(&self, path: &str) -> String {
        format!("{}/assets/v1/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl AssetApi for ApiClient {
    fn create_asset(&self, upload: &AssetUpload) -> Result<String> {
        let request = asset_request_json(&upload.display_name, &self.creator);

        let file = File::open(&upload.path)?;
        let file_name = upload
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
            .to_string();

        let request_part = multipart::Part::text(request.to_string()).mime_str("application/json")?;
        let file_part = multipart::Part::reader(file)
            .file_name(file_name)
            .mime_str(upload.mime_type)?;
        let form = multipart::Form::new()
            .part("request", request_part)
            .part("fileContent", file_part);

        tracing::debug!(name = %upload.display_name, path = %upload.path.display(), "Sending create-asset request");
        let res = self.client.post(self.assets_url()).multipart(form).send()?;

        let status = res.status();
        let body = res.text()?;
        if !status.is_success() {
            return Err(UploaderError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let path = parse_create_response(&body)?;
        Ok(self.operation_url(&path))
    }

    fn get_operation(&self, operation_url: &str) -> Result<OperationStatus> {
        let res = self.client.get(operation_url).send()?;

        let status = res.status();
        let body = res.text()?;
        if status != StatusCode::OK {
            return Err(UploaderError::Http {
                status: status.as_u16(),
                body,
            });
        }
        parse_operation(&body)
    }
}

/// Default headers for every request. The key is marked sensitive so it
/// never shows up in debug output.
fn api_key_headers(api_key: &str) -> Result<HeaderMap> {
    let mut key = HeaderValue::from_str(api_key)
        .map_err(|_| UploaderError::Config("API key contains invalid header characters".into()))?;
    key.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(API_KEY_HEADER, key);
    Ok(headers)
}

/// Metadata part of the create-asset request.
pub fn asset_request_json(display_name: &str, creator: &Creator) -> Value {
    let mut creator_obj = serde_json::Map::new();
    creator_obj.insert(creator.kind.id_field().to_string(), json!(creator.id));

    json!({
        "assetType": "Image",
        "displayName": display_name,
        "description": "",
        "creationContext": {
            "creator": Value::Object(creator_obj)
        }
    })
}

/// Extract the operation path from a create-asset response body.
pub fn parse_create_response(body: &str) -> Result<String> {
    let parsed: OperationBody =
        serde_json::from_str(body).map_err(|e| UploaderError::MalformedResponse(e.to_string()))?;
    match parsed.path {
        Some(path) if !path.trim().is_empty() => Ok(path),
        _ => Err(UploaderError::MissingOperationPath),
    }
}

/// Interpret a get-operation response body.
///
/// `assetId` may be a string or a number; empty strings count as absent.
pub fn parse_operation(body: &str) -> Result<OperationStatus> {
    let parsed: OperationBody =
        serde_json::from_str(body).map_err(|e| UploaderError::MalformedResponse(e.to_string()))?;

    if !parsed.done {
        return Ok(OperationStatus::Pending);
    }

    let asset_id = parsed
        .response
        .and_then(|r| r.asset_id)
        .and_then(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
    Ok(OperationStatus::Done { asset_id })
}
