//! Configuration management for the portal.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::Path;

use siaksim_common::constants::{DEFAULT_DATABASE_URL, DEFAULT_LISTEN_ADDR};

use crate::faults::FaultProfile;

/// Siaksim - SIAK-NG portal mock
#[derive(Parser, Debug)]
#[command(name = "siaksim")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/siaksim.toml")]
    pub config: String,

    /// Listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    pub listen: Option<String>,

    /// SQLite database URL (overrides config)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Cookie signing secret (overrides config)
    #[arg(long, env = "COOKIE_SECRET")]
    pub cookie_secret: Option<String>,

    /// Disable all fault injection for this run
    #[arg(long, default_value = "false")]
    pub no_faults: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    pub json_logs: bool,
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// SQLite database URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Secret for the signed-cookie codec (auto-generated if not set;
    /// sessions then die with the process)
    #[serde(default = "generate_cookie_secret")]
    pub cookie_secret: String,

    /// Directory holding the portal's HTML pages
    #[serde(default = "default_pages_dir")]
    pub pages_dir: String,

    /// CAPTCHA configuration
    #[serde(default)]
    pub captcha: CaptchaConfig,

    /// Fault injection configuration
    #[serde(default)]
    pub faults: FaultConfig,
}

/// Cloudflare Turnstile configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CaptchaConfig {
    /// Site key spliced into the plan-editor widget
    #[serde(default)]
    pub site_key: String,

    /// Secret key for siteverify; empty disables remote verification
    #[serde(default)]
    pub secret_key: String,

    /// Verification endpoint
    #[serde(default = "default_verify_url")]
    pub verify_url: String,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            site_key: String::new(),
            secret_key: String::new(),
            verify_url: default_verify_url(),
        }
    }
}

/// Fault injection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FaultConfig {
    /// Master switch. Off means zero delay and zero faults everywhere,
    /// with reduced log lines.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Probability table for human sessions
    #[serde(default = "FaultProfile::human")]
    pub human: FaultProfile,

    /// Probability table for bot sessions
    #[serde(default = "FaultProfile::bot")]
    pub bot: FaultProfile,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            human: FaultProfile::human(),
            bot: FaultProfile::bot(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}
fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}
fn default_pages_dir() -> String {
    "response".to_string()
}
fn default_verify_url() -> String {
    "https://challenges.cloudflare.com/turnstile/v0/siteverify".to_string()
}
fn default_true() -> bool {
    true
}

fn generate_cookie_secret() -> String {
    use rand::Rng;
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    URL_SAFE_NO_PAD.encode(bytes)
}

impl AppConfig {
    /// Load configuration from file, with CLI overrides
    pub fn load(config_path: &str, args: &Args) -> Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let settings = config::Config::builder()
                .add_source(config::File::with_name(config_path))
                .build()
                .context("Failed to load config file")?;

            settings
                .try_deserialize()
                .context("Failed to parse config")?
        } else {
            tracing::warn!("Config file not found, using defaults");
            Self::default()
        };

        // Apply CLI overrides
        if let Some(ref listen) = args.listen {
            config.listen_addr = listen.clone();
        }
        if let Some(ref database_url) = args.database_url {
            config.database_url = database_url.clone();
        }
        if let Some(ref secret) = args.cookie_secret {
            config.cookie_secret = secret.clone();
        }
        if args.no_faults {
            config.faults.enabled = false;
        }

        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            database_url: default_database_url(),
            cookie_secret: generate_cookie_secret(),
            pages_dir: default_pages_dir(),
            captcha: CaptchaConfig::default(),
            faults: FaultConfig::default(),
        }
    }
}
