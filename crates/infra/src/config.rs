use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_env: String,
    pub port: u16,
    pub log_level: String,
    pub tx_max_attempts: u32,
    pub event_buffer: usize,
    pub push_enabled: bool,
    pub push_gateway_url: String,
    pub push_timeout_ms: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let cfg = config::Config::builder()
            .set_default("app_env", "development")?
            .set_default("port", 3000)?
            .set_default("log_level", "info")?
            .set_default("tx_max_attempts", 5)?
            .set_default("event_buffer", 1024)?
            .set_default("push_enabled", false)?
            .set_default("push_gateway_url", "http://127.0.0.1:9300/push")?
            .set_default("push_timeout_ms", 2500)?
            .add_source(config::Environment::default().separator("__"))
            .build()?;
        cfg.try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}
