use anyhow::Context;
use edu_config::EduConfig;
use edu_db::service::EduService;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: EduService,
    pub config: EduConfig,
}

impl AppContext {
    /// Open every configured store.
    pub async fn init(config: EduConfig) -> anyhow::Result<Self> {
        let service = EduService::open(&config)
            .await
            .context("failed to initialize edu-db service")?;
        Ok(Self { service, config })
    }

    /// Default result limit from `[general]`.
    #[must_use]
    pub const fn default_limit(&self) -> u32 {
        self.config.general.default_limit
    }
}
