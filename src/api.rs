// API client module: contains a small blocking HTTP client that talks to
// an Immich server. It is intentionally small and synchronous; the tool
// issues one request at a time, so an async runtime would buy nothing.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

/// Header Immich uses to identify the API caller.
const API_KEY_HEADER: &str = "x-api-key";

/// Path segment under which the documented endpoints are served.
const API_ROOT: &str = "/api";

/// Job name the server expects when queuing a video transcode.
const TRANSCODE_JOB_NAME: &str = "transcode-video";

/// Normalize a user-supplied server URL into the API root URL.
///
/// Strips a single trailing slash from the path and appends `/api` unless
/// the path already ends with it; every other component (scheme, host,
/// port, query, fragment) is left as-is. Normalizing an already-normalized
/// URL returns it unchanged. Strings the `url` crate cannot parse get the
/// same path fixup applied to the raw string, so this never fails.
pub fn parse_server_url(server_url: &str) -> String {
    match Url::parse(server_url) {
        Ok(mut parsed) => {
            let path = normalize_api_path(parsed.path());
            parsed.set_path(&path);
            parsed.to_string()
        }
        // Typically a missing scheme: treat the whole string as the path
        // and fix it up best-effort.
        Err(_) => normalize_api_path(server_url),
    }
}

fn normalize_api_path(path: &str) -> String {
    let path = path.strip_suffix('/').unwrap_or(path);
    if path.ends_with(API_ROOT) {
        path.to_string()
    } else {
        format!("{}{}", path, API_ROOT)
    }
}

/// Asset record returned by the server. Immich sends many more fields;
/// only the two this tool inspects are typed and serde drops the rest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    /// Id of the embedded live video clip; `None` for ordinary photos.
    pub live_photo_video_id: Option<String>,
}

/// Envelope of the metadata search endpoint.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    assets: SearchPage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPage {
    items: Vec<Asset>,
    /// Continuation token. Kept as a raw JSON value because the server
    /// returns a number or a string depending on version; keeping it
    /// flexible avoids parsing issues, and we only echo it back.
    next_page: Option<Value>,
}

/// The server signals the end of a scan with a null or empty `nextPage`;
/// anything else is a usable page token.
fn has_next_page(next: &Value) -> bool {
    match next {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Blocking client bound to one server: holds the normalized API root URL
/// and the default headers (JSON content negotiation plus the caller's
/// API key) attached to every request.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    server_url: String,
    headers: HeaderMap,
}

impl ApiClient {
    /// Build a client for `server_url`, normalizing it to the API root.
    /// Fails only when the API key cannot be encoded as a header value
    /// or the HTTP client cannot be constructed.
    pub fn new(server_url: &str, api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_str(api_key).context("API key is not a valid header value")?,
        );

        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(ApiClient {
            client,
            server_url: parse_server_url(server_url),
            headers,
        })
    }

    /// The normalized API root this client talks to.
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Decode the response body when the status matches `expected`,
    /// otherwise return `None`.
    fn json_or_none<T: DeserializeOwned>(
        response: Response,
        expected: StatusCode,
    ) -> Result<Option<T>> {
        if response.status() != expected {
            return Ok(None);
        }
        let value = response.json().context("Parsing response json")?;
        Ok(Some(value))
    }

    /// Fetch metadata for a single asset. Any non-200 response means
    /// `None`; a missing asset is not an error.
    pub fn get_asset_info(&self, asset_id: &str) -> Result<Option<Asset>> {
        let url = format!("{}/assets/{}", &self.server_url, asset_id);
        let res = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .context("Failed to send asset info request")?;
        Self::json_or_none(res, StatusCode::OK)
    }

    /// Return all assets that carry a live video, optionally restricted
    /// to those taken at or after `taken_after`.
    ///
    /// Walks the paginated search endpoint sequentially starting at page
    /// 1; a failed page request ends the scan with whatever was collected
    /// so far. Returns `None` when nothing matched.
    pub fn get_mp_assets(
        &self,
        taken_after: Option<NaiveDateTime>,
    ) -> Result<Option<Vec<Asset>>> {
        let url = format!("{}/search/metadata", &self.server_url);
        // Millisecond precision, no timezone, matching the server filter.
        let taken_after =
            taken_after.map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string());

        let mut motion_photos: Vec<Asset> = Vec::new();
        let mut page = Value::from(1);

        loop {
            let mut body = json!({
                "isMotion": true,
                "page": page,
            });
            if let Some(taken_after) = &taken_after {
                body["takenAfter"] = Value::String(taken_after.clone());
            }

            let res = self
                .client
                .post(&url)
                .headers(self.headers.clone())
                .json(&body)
                .send()
                .context("Failed to send search request")?;

            let data: Option<SearchResponse> = Self::json_or_none(res, StatusCode::OK)?;
            let Some(data) = data else {
                // A failed page ends the scan; keep what we have.
                break;
            };

            // Should already be all motion photos, but let's be sure:
            // keep only assets that really carry a live video.
            motion_photos.extend(
                data.assets
                    .items
                    .into_iter()
                    .filter(|asset| asset.live_photo_video_id.is_some()),
            );

            match data.assets.next_page {
                Some(next) if has_next_page(&next) => page = next,
                _ => break,
            }
        }

        if motion_photos.is_empty() {
            Ok(None)
        } else {
            Ok(Some(motion_photos))
        }
    }

    /// Ask the server to queue a transcode job for the given video ids.
    /// The server answers 204 when the job is accepted; anything else is
    /// a generic request failure. Fire-and-forget: the client has no
    /// visibility into job completion.
    pub fn transcode_assets(&self, asset_ids: &[String]) -> Result<()> {
        let url = format!("{}/assets/jobs", &self.server_url);
        let body = json!({
            "assetIds": asset_ids,
            "name": TRANSCODE_JOB_NAME,
        });

        let res = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .context("Failed to send transcode job request")?;

        if res.status() != StatusCode::NO_CONTENT {
            anyhow::bail!("Transcode job request failed: {}", res.status());
        }
        Ok(())
    }
}
