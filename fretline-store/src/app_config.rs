use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// Currency assumed when a price lookup does not name one.
    #[serde(default = "default_currency")]
    pub default_currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Baseline shipped with the binary.
            .add_source(config::File::with_name("config/default"))
            // Settings for the active run mode, if a file exists for it.
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Machine-local overrides, kept out of version control.
            .add_source(config::File::with_name("config/local").required(false))
            // FRETLINE__SERVER__PORT style variables win over every file.
            .add_source(config::Environment::with_prefix("FRETLINE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
