use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

use crate::prelude::*;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Term,
    Compact,
    Full,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
    pub token_var: String,
    pub api_host: String,
    pub api_port: u16,
    pub ca_bundle_path: PathBuf,
    pub poll_interval_secs: u64,
    pub poll_timeout_secs: u64,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            token_var: "TG_DISPATCH_TOKEN".into(),
            api_host: "api.telegram.org".into(),
            api_port: 443,
            ca_bundle_path: "/etc/ssl/certs/ca-certificates.crt".into(),
            poll_interval_secs: 1,
            poll_timeout_secs: 30,
            log_format: LogFormat::Term,
        }
    }
}

pub const PACKAGE_VERSION: &'static str = std::env!("CARGO_PKG_VERSION");

pub const DEFAULT_CONFIG_PATH: &'static str = "tg_dispatch.toml";

pub fn create<T>(cfg_path: &str) -> UResult<T>
where
    T: Default + Serialize,
{
    let default_config = T::default();
    let serialized = toml::to_string(&default_config)?;
    let mut file = std::fs::File::create(cfg_path)?;
    write!(file, "{}", serialized)?;
    Ok(default_config)
}

pub fn read<T>(cfg_path: &str) -> UResult<T>
where
    T: DeserializeOwned,
{
    let contents = std::fs::read_to_string(&cfg_path)?;
    let config = toml::from_str::<T>(&contents)?;
    Ok(config)
}

pub fn read_or_create<T>(cfg_path: &str) -> UResult<T>
where
    T: Default + DeserializeOwned + Serialize,
{
    if std::path::Path::new(cfg_path).exists() {
        read::<T>(cfg_path)
    } else {
        create(cfg_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("tg-dispatch-{}-{}.toml", name, std::process::id()))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn read_or_create_writes_defaults_then_reads_them_back() {
        let path = temp_path("defaults");
        let _ = std::fs::remove_file(&path);

        let created: Config = read_or_create(&path).unwrap();
        assert_eq!(created.api_host, "api.telegram.org");
        assert!(std::path::Path::new(&path).exists());

        let reread: Config = read_or_create(&path).unwrap();
        assert_eq!(reread.poll_timeout_secs, 30);
        assert_eq!(reread.log_format, LogFormat::Term);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn parses_custom_settings() {
        let config: Config = toml::from_str(
            r#"
            token_var = 'MY_TOKEN'
            api_host = 'localhost'
            api_port = 8443
            ca_bundle_path = '/tmp/ca.pem'
            poll_interval_secs = 0
            poll_timeout_secs = 5
            log_format = 'compact'
            "#,
        )
        .unwrap();
        assert_eq!(config.token_var, "MY_TOKEN");
        assert_eq!(config.api_port, 8443);
        assert_eq!(config.log_format, LogFormat::Compact);
    }

    #[test]
    fn broken_file_is_reported_not_overwritten() {
        let path = temp_path("broken");
        std::fs::write(&path, "api_port = 'not a number'").unwrap();

        assert!(read_or_create::<Config>(&path).is_err());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "api_port = 'not a number'"
        );

        let _ = std::fs::remove_file(&path);
    }
}
