//! Galaxy API client utilities.
//!
//! This module provides a lightweight client for talking to a Galaxy server.
//! It focuses on:
//!
//! - Constructing an HTTP client with sensible defaults
//! - Discovering the API key from `GALAXY_API_KEY`, a `.env` file, or a key file
//! - Validating the Galaxy base URL
//! - Building requests with a consistent User-Agent, Accept and `x-api-key` headers
//!
//! The primary entry point is [`GalaxyClient`]. Create an instance via
//! [`GalaxyClient::new`], and then build requests with [`GalaxyClient::request`].
//!
//! # Example
//!
//! ```ignore
//! use glxy_api::{GalaxyClient, discover_api_key};
//!
//! async fn list() -> anyhow::Result<()> {
//!     let key = discover_api_key().expect("GALAXY_API_KEY");
//!     let client = GalaxyClient::new("https://usegalaxy.org", &key)?;
//!     let res = client.request(reqwest::Method::GET, "/api/libraries").send().await?;
//!     println!("status: {}", res.status());
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, RequestBuilder, Url, header};
use tracing::{debug, warn};

/// Environment variable holding the Galaxy API key.
pub const API_KEY_ENV: &str = "GALAXY_API_KEY";
/// File searched for in the working directory and its ancestors.
pub const DOTENV_FILE_NAME: &str = ".env";
/// Header Galaxy reads the API key from.
const API_KEY_HEADER: &str = "x-api-key";
/// Hostnames that may use plain HTTP without a warning.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

#[derive(Debug, Clone)]
/// Thin wrapper around a configured `reqwest::Client` for Galaxy API access.
///
/// The client pre-configures default headers (including the API key) and
/// builds requests against a validated base URL.
pub struct GalaxyClient {
    pub base_url: String,
    pub http: Client,
    pub user_agent: String,
}

impl GalaxyClient {
    /// Construct a [`GalaxyClient`] for the Galaxy instance at `base_url`.
    ///
    /// A trailing slash on `base_url` is dropped so API-relative paths such as
    /// `/api/histories` can be appended directly. Instances served under a path
    /// prefix (`https://host/galaxy/`) are supported.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        validate_base_url(&base_url)?;

        let mut default_headers = header::HeaderMap::new();
        let mut key_header = header::HeaderValue::from_str(api_key.trim()).context("API key is not a valid header value")?;
        key_header.set_sensitive(true);
        default_headers.insert(API_KEY_HEADER, key_header);
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(300))
            .build()
            .context("build http client")?;

        Ok(Self {
            base_url,
            http,
            user_agent: format!("glxy-wf/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
        })
    }

    /// Build a `reqwest::RequestBuilder` for a method and API-relative path.
    pub fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "building request");

        self.http
            .request(method, url)
            .header(header::USER_AGENT, &self.user_agent)
    }
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - scheme must be `http` or `https`
/// - a host is required
/// - plain `http` is accepted but logged for anything other than localhost,
///   since the API key travels in a header
fn validate_base_url(base: &str) -> Result<()> {
    let parsed_base_url = Url::parse(base).map_err(|e| anyhow!("Invalid Galaxy URL '{}': {}", base, e))?;

    let host_name = parsed_base_url
        .host_str()
        .ok_or_else(|| anyhow!("Galaxy URL must include a host"))?;

    match parsed_base_url.scheme() {
        "https" => Ok(()),
        "http" => {
            if !LOCALHOST_DOMAINS
                .iter()
                .any(|&allowed| host_name.eq_ignore_ascii_case(allowed))
            {
                warn!(host = %host_name, "Galaxy URL uses plain http; the API key is sent unencrypted");
            }
            Ok(())
        }
        other => Err(anyhow!("Galaxy URL must use http or https; got '{}://'", other)),
    }
}

/// Discover the Galaxy API key.
///
/// Resolution order:
/// - `GALAXY_API_KEY` environment variable
/// - `GALAXY_API_KEY=...` line in the nearest `.env` file, searching the
///   current directory and then each ancestor
pub fn discover_api_key() -> Option<String> {
    if let Ok(value) = env::var(API_KEY_ENV)
        && !value.trim().is_empty()
    {
        return Some(value.trim().to_string());
    }
    let cwd = env::current_dir().ok()?;
    let dotenv = find_dotenv(&cwd)?;
    let content = fs::read_to_string(&dotenv).ok()?;
    debug!(path = %dotenv.display(), "reading API key from dotenv file");
    parse_dotenv_value(&content, API_KEY_ENV)
}

/// Read an API key from the first line of a key file.
///
/// Relative paths are taken relative to the user's home directory.
pub fn read_api_key_file(path: &Path) -> Result<String> {
    let resolved = if path.is_absolute() {
        path.to_path_buf()
    } else {
        dirs_next::home_dir()
            .ok_or_else(|| anyhow!("cannot determine home directory"))?
            .join(path)
    };
    let content = fs::read_to_string(&resolved).with_context(|| format!("read API key file {}", resolved.display()))?;
    content
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("API key file {} is empty", resolved.display()))
}

/// Walk from `start` towards the filesystem root looking for a `.env` file.
fn find_dotenv(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|directory| directory.join(DOTENV_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Minimal `.env` reader: `KEY=value` lines, optional `export ` prefix,
/// single or double quotes around the value, `#` comments.
fn parse_dotenv_value(content: &str, key: &str) -> Option<String> {
    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((name, value)) = line.split_once('=') else {
            continue;
        };
        if name.trim() != key {
            continue;
        }
        let value = value.trim();
        let unquoted = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
            .unwrap_or_else(|| value.split(" #").next().unwrap_or(value).trim());
        if unquoted.is_empty() {
            return None;
        }
        return Some(unquoted.to_string());
    }
    None
}
