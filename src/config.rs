use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::motion::spring::SpringConfig;

/// Top-level configuration, parsed from kebab-case YAML.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Configuration {
    pub site: SiteConfig,
    pub content_api: ContentApiConfig,
    #[serde(default)]
    pub showcase: ShowcaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SiteConfig {
    /// Public origin used for sitemap/robots entries, without trailing slash.
    #[serde(default = "SiteConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "SiteConfig::default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Seconds a rendered blog page stays fresh before revalidation.
    #[serde(default = "SiteConfig::default_page_ttl_secs")]
    pub page_ttl_secs: u64,
}

impl SiteConfig {
    fn default_base_url() -> String {
        "https://www.dadalab.cn".to_string()
    }

    fn default_bind_addr() -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], 8080))
    }

    fn default_page_ttl_secs() -> u64 {
        300
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ContentApiConfig {
    /// PostgREST-style base, e.g. `https://xyz.supabase.co/rest/v1`.
    pub rest_url: String,
    /// Auth provider base, e.g. `https://xyz.supabase.co/auth/v1`.
    pub auth_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ShowcaseConfig {
    /// Source image for the distortion card. Missing or undecodable images
    /// render transparent rather than failing the viewer.
    #[serde(default = "ShowcaseConfig::default_image_path")]
    pub image_path: PathBuf,
    #[serde(default)]
    pub tilt: TiltOptions,
    #[serde(default)]
    pub hover: HoverOptions,
    #[serde(default)]
    pub marquee: MarqueeOptions,
    #[serde(default)]
    pub parallax: ParallaxOptions,
    #[serde(default)]
    pub stack: StackOptions,
}

impl ShowcaseConfig {
    fn default_image_path() -> PathBuf {
        PathBuf::from("assets/hero.jpg")
    }
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            image_path: Self::default_image_path(),
            tilt: TiltOptions::default(),
            hover: HoverOptions::default(),
            marquee: MarqueeOptions::default(),
            parallax: ParallaxOptions::default(),
            stack: StackOptions::default(),
        }
    }
}

/// 3D-tilt card: pointer position mapped to degrees, spring-smoothed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TiltOptions {
    #[serde(default = "TiltOptions::default_max_degrees")]
    pub max_degrees: f32,
    #[serde(default = "TiltOptions::default_spring")]
    pub spring: SpringConfig,
}

impl TiltOptions {
    fn default_max_degrees() -> f32 {
        15.0
    }

    fn default_spring() -> SpringConfig {
        SpringConfig {
            stiffness: 150.0,
            damping: 15.0,
            mass: 1.0,
        }
    }
}

impl Default for TiltOptions {
    fn default() -> Self {
        Self {
            max_degrees: Self::default_max_degrees(),
            spring: Self::default_spring(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct HoverOptions {
    /// Per-second rate at which intensity climbs toward 1 while triggered.
    #[serde(default = "HoverOptions::default_ramp")]
    pub ramp: f32,
    /// Exponential decay rate once pointer movement stops.
    #[serde(default = "HoverOptions::default_decay")]
    pub decay: f32,
    /// Horizontal per-channel offset at full intensity, in pixels.
    #[serde(default = "HoverOptions::default_aberration_px")]
    pub aberration_px: f32,
    /// Jitter amplitude at full intensity, in pixels.
    #[serde(default = "HoverOptions::default_jitter_px")]
    pub jitter_px: f32,
}

impl HoverOptions {
    fn default_ramp() -> f32 {
        9.0
    }

    fn default_decay() -> f32 {
        3.0
    }

    fn default_aberration_px() -> f32 {
        6.0
    }

    fn default_jitter_px() -> f32 {
        10.0
    }
}

impl Default for HoverOptions {
    fn default() -> Self {
        Self {
            ramp: Self::default_ramp(),
            decay: Self::default_decay(),
            aberration_px: Self::default_aberration_px(),
            jitter_px: Self::default_jitter_px(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MarqueeOptions {
    /// Baseline drift in percent of strip width per second.
    #[serde(default = "MarqueeOptions::default_base_velocity")]
    pub base_velocity: f32,
    #[serde(default = "MarqueeOptions::default_spring")]
    pub spring: SpringConfig,
}

impl MarqueeOptions {
    fn default_base_velocity() -> f32 {
        100.0
    }

    fn default_spring() -> SpringConfig {
        SpringConfig {
            stiffness: 400.0,
            damping: 50.0,
            mass: 1.0,
        }
    }
}

impl Default for MarqueeOptions {
    fn default() -> Self {
        Self {
            base_velocity: Self::default_base_velocity(),
            spring: Self::default_spring(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ParallaxOptions {
    /// Scroll offset (px) that maps to the full parallax travel.
    #[serde(default = "ParallaxOptions::default_scroll_range_px")]
    pub scroll_range_px: f32,
    /// Vertical travel of the background layer across the range.
    #[serde(default = "ParallaxOptions::default_travel_px")]
    pub travel_px: f32,
    /// Scroll offset at which the hero text has fully faded out.
    #[serde(default = "ParallaxOptions::default_fade_range_px")]
    pub fade_range_px: f32,
}

impl ParallaxOptions {
    fn default_scroll_range_px() -> f32 {
        500.0
    }

    fn default_travel_px() -> f32 {
        200.0
    }

    fn default_fade_range_px() -> f32 {
        300.0
    }
}

impl Default for ParallaxOptions {
    fn default() -> Self {
        Self {
            scroll_range_px: Self::default_scroll_range_px(),
            travel_px: Self::default_travel_px(),
            fade_range_px: Self::default_fade_range_px(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StackOptions {
    #[serde(default = "StackOptions::default_cards")]
    pub cards: usize,
}

impl StackOptions {
    fn default_cards() -> usize {
        3
    }
}

impl Default for StackOptions {
    fn default() -> Self {
        Self {
            cards: Self::default_cards(),
        }
    }
}

impl Configuration {
    /// Reject values that parsed but cannot drive the site or the viewer.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.site.base_url.is_empty(), "site.base-url is empty");
        ensure!(
            !self.site.base_url.ends_with('/'),
            "site.base-url must not end with a slash"
        );
        ensure!(self.site.page_ttl_secs > 0, "site.page-ttl-secs must be positive");
        ensure!(
            !self.content_api.rest_url.is_empty(),
            "content-api.rest-url is empty"
        );
        ensure!(
            !self.content_api.auth_url.is_empty(),
            "content-api.auth-url is empty"
        );
        ensure!(
            !self.content_api.api_key.is_empty(),
            "content-api.api-key is empty"
        );
        self.showcase.tilt.spring.validate().context("showcase.tilt")?;
        self.showcase
            .marquee
            .spring
            .validate()
            .context("showcase.marquee")?;
        ensure!(self.showcase.hover.ramp > 0.0, "showcase.hover.ramp must be positive");
        ensure!(
            self.showcase.hover.decay > 0.0,
            "showcase.hover.decay must be positive"
        );
        ensure!(
            self.showcase.parallax.scroll_range_px > 0.0,
            "showcase.parallax.scroll-range-px must be positive"
        );
        ensure!(
            self.showcase.parallax.fade_range_px > 0.0,
            "showcase.parallax.fade-range-px must be positive"
        );
        ensure!(self.showcase.stack.cards > 0, "showcase.stack.cards must be positive");
        Ok(())
    }
}

/// Load and parse the YAML configuration file.
pub fn from_yaml_file(path: &Path) -> Result<Configuration, crate::Error> {
    let raw = std::fs::read_to_string(path)?;
    let cfg = serde_yaml::from_str(&raw)?;
    Ok(cfg)
}
