//! Host page collaborators
//!
//! Everything the player needs from the page it is embedded in: the media
//! element, an engine factory, fullscreen control, stylesheet loading and a
//! description of the platform.

use crate::engine::{EngineFactory, MediaElement};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Element a fullscreen request applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FullscreenTarget {
    /// The widget container, controls included
    Container,
    /// The bare media element, for platforms that only allow that
    MediaElement,
}

/// Browser fullscreen API
pub trait Fullscreen: Send + Sync {
    fn is_fullscreen(&self) -> bool;

    /// `force` asks even when something is already fullscreen
    fn request(&self, target: FullscreenTarget, force: bool);

    fn exit(&self);
}

/// Switch fullscreen. iPhones only allow the media element, so they always request it.
pub fn toggle_fullscreen(fullscreen: &dyn Fullscreen, platform: &Platform) {
    if platform.is_iphone {
        fullscreen.request(FullscreenTarget::MediaElement, true);
    } else if !fullscreen.is_fullscreen() {
        fullscreen.request(FullscreenTarget::Container, false);
    } else {
        fullscreen.exit();
    }
}

/// Injects the widget stylesheet into the page
#[async_trait]
pub trait StylesheetLoader: Send + Sync {
    /// Already present in the document
    fn is_loaded(&self) -> bool;

    /// Resolves once the stylesheet has loaded
    async fn load(&self, href: &str) -> Result<()>;
}

/// Load the stylesheet, failing after `timeout`
pub async fn load_stylesheet(loader: &dyn StylesheetLoader, href: &str, timeout: Duration) -> Result<()> {
    if loader.is_loaded() {
        debug!(href, "Stylesheet already loaded");
        return Ok(());
    }

    match tokio::time::timeout(timeout, loader.load(href)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(href, timeout_ms = timeout.as_millis() as u64, "Stylesheet load timed out");
            Err(Error::Stylesheet { url: href.to_string() })
        }
    }
}

/// What the player knows about the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Platform {
    pub is_touch_device: bool,
    pub is_apple_device: bool,
    pub is_iphone: bool,
}

impl Platform {
    pub fn desktop() -> Self {
        Self::default()
    }

    pub fn touch() -> Self {
        Self {
            is_touch_device: true,
            ..Self::default()
        }
    }
}

/// Collaborators handed to a session
#[derive(Clone)]
pub struct Host {
    pub media: Arc<dyn MediaElement>,
    pub engines: Arc<dyn EngineFactory>,
    /// Missing fullscreen support turns fullscreen requests into no-ops
    pub fullscreen: Option<Arc<dyn Fullscreen>>,
    /// Without a loader the stylesheet is assumed to be present
    pub stylesheet: Option<Arc<dyn StylesheetLoader>>,
    pub platform: Platform,
    /// Rendered width of the widget, in CSS pixels
    pub width: f64,
    /// Raw JSON of the host element's options data attribute
    pub data_options: Option<String>,
}

impl Host {
    pub fn new(media: Arc<dyn MediaElement>, engines: Arc<dyn EngineFactory>) -> Self {
        Self {
            media,
            engines,
            fullscreen: None,
            stylesheet: None,
            platform: Platform::default(),
            width: 640.0,
            data_options: None,
        }
    }

    pub fn with_fullscreen(mut self, fullscreen: Arc<dyn Fullscreen>) -> Self {
        self.fullscreen = Some(fullscreen);
        self
    }

    pub fn with_stylesheet(mut self, loader: Arc<dyn StylesheetLoader>) -> Self {
        self.stylesheet = Some(loader);
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    pub fn with_data_options(mut self, json: impl Into<String>) -> Self {
        self.data_options = Some(json.into());
        self
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("platform", &self.platform)
            .field("width", &self.width)
            .field("fullscreen", &self.fullscreen.is_some())
            .field("stylesheet", &self.stylesheet.is_some())
            .finish()
    }
}
