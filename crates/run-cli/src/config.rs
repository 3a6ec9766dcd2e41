//! Config loading, generalized from the reference workspace's
//! `core::config_loader::ConfigLoader`: TOML base, `RUN_`-prefixed env
//! overrides, optional JSON overlay.

use figment::providers::{Env, Format, Json, Toml};
use figment::Figment;
use run_core::config::AppConfig;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `AppConfig` from `path`, then `RUN_`-prefixed environment
    /// variables, then an optional `<path>.json` overlay (same directory,
    /// `.json` extension in place of `.toml`).
    ///
    /// # Errors
    /// Returns an error if `path` cannot be read or any layer fails to
    /// parse into `AppConfig`.
    pub fn load(path: &str) -> anyhow::Result<AppConfig> {
        let json_overlay = path.strip_suffix(".toml").map_or_else(
            || format!("{path}.json"),
            |stem| format!("{stem}.json"),
        );

        let config: AppConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("RUN_"))
            .join(Json::file(json_overlay))
            .extract()?;

        Ok(config)
    }
}
