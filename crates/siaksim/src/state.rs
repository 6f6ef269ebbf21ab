//! Application state and shared resources.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::captcha::CaptchaVerifier;
use crate::config::AppConfig;
use crate::faults::{FaultInjector, RandomSource, ThreadRandom};
use crate::pages::Pages;
use crate::store::RecordStore;
use crate::token::TokenCodec;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Records table (SQLite)
    pub store: RecordStore,

    /// Signed-cookie codec
    pub codec: Arc<TokenCodec>,

    /// Per-request fault decision maker
    pub injector: Arc<FaultInjector>,

    /// CAPTCHA verifier
    pub captcha: Arc<CaptchaVerifier>,

    /// Portal HTML pages
    pub pages: Arc<Pages>,
}

impl AppState {
    /// Create production state: open the database, load pages, and wire
    /// the injector to the thread RNG.
    pub async fn new(config: AppConfig) -> Result<Self> {
        let store = RecordStore::connect(&config.database_url)
            .await
            .context("Failed to open records database")?;
        let pages =
            Pages::load(Path::new(&config.pages_dir)).context("Failed to load portal pages")?;
        Ok(Self::with_parts(config, store, pages, Box::new(ThreadRandom)))
    }

    /// Assemble state from parts; tests use this with an in-memory store
    /// and a seeded random source.
    pub fn with_parts(
        config: AppConfig,
        store: RecordStore,
        pages: Pages,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        let codec = Arc::new(TokenCodec::new(config.cookie_secret.as_bytes().to_vec()));
        let injector = Arc::new(FaultInjector::new(&config.faults, rng));
        let captcha = Arc::new(CaptchaVerifier::from_config(&config.captcha));
        Self {
            config,
            store,
            codec,
            injector,
            captcha,
            pages: Arc::new(pages),
        }
    }
}
