//! DRM configuration
//!
//! The engine does license acquisition itself; the player only tells it where
//! to go and how to authenticate:
//! - Widevine (Chrome, Android, Chromecast)
//! - PlayReady (Edge, Windows)
//! - FairPlay (Safari, iOS, tvOS)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     DrmConfig                        │
//! ├─────────────────────────────────────────────────────┤
//! │                                                     │
//! │  ┌──────────────┐           ┌──────────────────┐    │
//! │  │ engine       │           │ license request  │    │
//! │  │ configuration│           │ filter           │    │
//! │  │ (servers,    │           │ (header/query    │    │
//! │  │  certificate,│           │  auth, cookies)  │    │
//! │  │  robustness) │           │                  │    │
//! │  └──────┬───────┘           └────────┬─────────┘    │
//! │         │                            │              │
//! │         └────────────┬───────────────┘              │
//! │                      │                              │
//! │               StreamingEngine                       │
//! └─────────────────────────────────────────────────────┘
//! ```

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use url::Url;

/// Key systems the player can configure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeySystem {
    #[serde(rename = "com.widevine.alpha")]
    Widevine,
    #[serde(rename = "com.microsoft.playready")]
    PlayReady,
    #[serde(rename = "com.apple.fps")]
    FairPlay,
}

impl KeySystem {
    /// EME key system string
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySystem::Widevine => "com.widevine.alpha",
            KeySystem::PlayReady => "com.microsoft.playready",
            KeySystem::FairPlay => "com.apple.fps",
        }
    }

    /// Protection system id found in PSSH boxes
    pub fn system_id(&self) -> &'static str {
        match self {
            KeySystem::Widevine => "edef8ba9-79d6-4ace-a3c8-27dcd51d21ed",
            KeySystem::PlayReady => "9a04f079-9840-4286-ab92-e65be0885f95",
            KeySystem::FairPlay => "94ce86fb-07ff-4f43-adb8-93d2fa968ca2",
        }
    }
}

impl fmt::Display for KeySystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySystem::Widevine => write!(f, "Widevine"),
            KeySystem::PlayReady => write!(f, "PlayReady"),
            KeySystem::FairPlay => write!(f, "FairPlay"),
        }
    }
}

/// How license requests authenticate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    /// Add `header_key: header_value`
    Header,
    /// Append `parameter_value` to the license URL
    Parameter,
}

/// Requested robustness levels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Robustness {
    pub video_robustness: String,
    pub audio_robustness: String,
}

/// DRM configuration for a playlist entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrmConfig {
    pub key_system: KeySystem,
    /// License server
    pub server_url: Option<Url>,
    /// FairPlay server certificate, base64 encoded
    pub certificate: Option<String>,
    /// FairPlay server certificate location
    pub certificate_url: Option<Url>,
    pub robustness: Option<Robustness>,
    pub auth_type: Option<AuthType>,
    pub header_key: Option<String>,
    pub header_value: Option<String>,
    pub parameter_value: Option<String>,
    /// Send cookies with cross-site license requests
    #[serde(default)]
    pub with_cookie: bool,
}

impl DrmConfig {
    /// Create a configuration for a license server
    pub fn new(key_system: KeySystem, server_url: Url) -> Self {
        Self {
            key_system,
            server_url: Some(server_url),
            certificate: None,
            certificate_url: None,
            robustness: None,
            auth_type: None,
            header_key: None,
            header_value: None,
            parameter_value: None,
            with_cookie: false,
        }
    }

    /// Create a Widevine configuration
    pub fn widevine(server_url: Url) -> Self {
        Self::new(KeySystem::Widevine, server_url)
    }

    /// Create a FairPlay configuration
    pub fn fairplay(server_url: Url, certificate_url: Url) -> Self {
        Self {
            certificate_url: Some(certificate_url),
            ..Self::new(KeySystem::FairPlay, server_url)
        }
    }

    /// Authenticate license requests with a header
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.auth_type = Some(AuthType::Header);
        self.header_key = Some(key.to_string());
        self.header_value = Some(value.to_string());
        self
    }

    /// Authenticate license requests with a query suffix
    pub fn with_parameter(mut self, value: &str) -> Self {
        self.auth_type = Some(AuthType::Parameter);
        self.parameter_value = Some(value.to_string());
        self
    }

    pub fn with_cookie(mut self) -> Self {
        self.with_cookie = true;
        self
    }

    pub fn with_robustness(mut self, video: &str, audio: &str) -> Self {
        self.robustness = Some(Robustness {
            video_robustness: video.to_string(),
            audio_robustness: audio.to_string(),
        });
        self
    }

    /// Decoded FairPlay certificate
    pub fn certificate_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.certificate
            .as_deref()
            .map(|encoded| {
                STANDARD
                    .decode(encoded.trim())
                    .map_err(|e| Error::InvalidDrm(format!("certificate is not valid base64: {}", e)))
            })
            .transpose()
    }

    /// Configuration trees to merge into the engine, in order
    pub fn engine_configuration(&self) -> Result<Vec<serde_json::Value>> {
        let system = self.key_system.as_str();
        let mut configs = Vec::new();

        if let Some(server) = &self.server_url {
            configs.push(json!({ "drm": { "servers": { system: server.as_str() } } }));
        }

        if self.key_system == KeySystem::FairPlay {
            if let Some(certificate) = self.certificate_bytes()? {
                configs.push(json!({
                    "drm": { "advanced": { system: { "serverCertificate": certificate } } }
                }));
            }
            if let Some(uri) = &self.certificate_url {
                configs.push(json!({
                    "drm": { "advanced": { system: { "serverCertificateUri": uri.as_str() } } }
                }));
            }
        }

        if let Some(robustness) = &self.robustness {
            configs.push(json!({
                "drm": {
                    "advanced": {
                        system: {
                            "videoRobustness": robustness.video_robustness,
                            "audioRobustness": robustness.audio_robustness,
                        }
                    }
                }
            }));
        }

        Ok(configs)
    }

    /// Apply authentication to an outgoing license request
    pub fn apply_to_license_request(&self, request: &mut LicenseRequest) {
        match self.auth_type {
            Some(AuthType::Header) => {
                if let (Some(key), Some(value)) = (&self.header_key, &self.header_value) {
                    request.headers.insert(key.clone(), value.clone());
                }
            }
            Some(AuthType::Parameter) => {
                if let (Some(value), Some(uri)) = (&self.parameter_value, request.uris.first_mut()) {
                    uri.push_str(value);
                }
            }
            None => {}
        }

        if self.with_cookie {
            request.allow_cross_site_credentials = true;
        }
    }

    /// Request filter to register on the engine
    pub fn request_filter(&self) -> RequestFilter {
        let config = self.clone();
        Box::new(move |kind, request| {
            if kind == RequestType::License {
                config.apply_to_license_request(request);
            }
        })
    }
}

/// Kind of network request issued by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    Manifest,
    Segment,
    License,
    Other,
}

/// Outgoing engine request, as seen by request filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseRequest {
    pub uris: Vec<String>,
    pub headers: HashMap<String, String>,
    pub allow_cross_site_credentials: bool,
}

impl LicenseRequest {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uris: vec![uri.into()],
            ..Default::default()
        }
    }
}

/// Hook run by the engine before each request
pub type RequestFilter = Box<dyn Fn(RequestType, &mut LicenseRequest) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    fn license_url() -> Url {
        Url::parse("https://license.example.com/widevine").unwrap()
    }

    #[test]
    fn test_key_system_json_names() {
        let json = r#"{"keySystem":"com.microsoft.playready","serverUrl":"https://pr.example.com/rightsmanager.asmx"}"#;
        let config: DrmConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.key_system, KeySystem::PlayReady);
        assert!(!config.with_cookie);
        assert_eq!(KeySystem::Widevine.system_id(), "edef8ba9-79d6-4ace-a3c8-27dcd51d21ed");
    }

    #[test]
    fn test_servers_configuration() {
        let config = DrmConfig::widevine(license_url());
        let trees = config.engine_configuration().unwrap();

        assert_eq!(trees.len(), 1);
        assert_eq!(
            trees[0]["drm"]["servers"]["com.widevine.alpha"],
            "https://license.example.com/widevine"
        );
    }

    #[test]
    fn test_fairplay_certificate() {
        let mut config = DrmConfig::fairplay(
            Url::parse("https://fps.example.com/license").unwrap(),
            Url::parse("https://fps.example.com/cert.der").unwrap(),
        );
        config.certificate = Some(STANDARD.encode([1u8, 2, 3]));

        assert_eq!(config.certificate_bytes().unwrap(), Some(vec![1, 2, 3]));

        let trees = config.engine_configuration().unwrap();
        assert_eq!(trees.len(), 3);
        assert_eq!(
            trees[1]["drm"]["advanced"]["com.apple.fps"]["serverCertificate"],
            json!([1, 2, 3])
        );
        assert_eq!(
            trees[2]["drm"]["advanced"]["com.apple.fps"]["serverCertificateUri"],
            "https://fps.example.com/cert.der"
        );
    }

    #[test]
    fn test_invalid_certificate() {
        let mut config = DrmConfig::fairplay(license_url(), license_url());
        config.certificate = Some("not base64!".to_string());

        assert!(matches!(config.engine_configuration(), Err(Error::InvalidDrm(_))));
    }

    #[test]
    fn test_robustness() {
        let config = DrmConfig::widevine(license_url()).with_robustness("HW_SECURE_ALL", "SW_SECURE_CRYPTO");
        let trees = config.engine_configuration().unwrap();

        assert_eq!(
            trees[1]["drm"]["advanced"]["com.widevine.alpha"]["videoRobustness"],
            "HW_SECURE_ALL"
        );
    }

    #[test]
    fn test_header_auth_only_on_license_requests() {
        let filter = DrmConfig::widevine(license_url())
            .with_header("x-dt-auth-token", "secret")
            .with_cookie()
            .request_filter();

        let mut segment = LicenseRequest::new("https://cdn.example.com/seg1.m4s");
        filter(RequestType::Segment, &mut segment);
        assert!(segment.headers.is_empty());

        let mut license = LicenseRequest::new("https://license.example.com/widevine");
        filter(RequestType::License, &mut license);
        assert_eq!(license.headers.get("x-dt-auth-token").map(String::as_str), Some("secret"));
        assert!(license.allow_cross_site_credentials);
    }

    #[test]
    fn test_parameter_auth() {
        let config = DrmConfig::widevine(license_url()).with_parameter("?token=abc");
        let mut request = LicenseRequest::new("https://license.example.com/widevine");
        config.apply_to_license_request(&mut request);

        assert_eq!(request.uris[0], "https://license.example.com/widevine?token=abc");
    }
}
