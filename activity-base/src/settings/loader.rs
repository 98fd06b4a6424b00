use std::{env, error::Error, path::Path, path::PathBuf};

use config::{Config, Environment, File};
use eyre::{bail, Context, Result};

use crate::settings::Settings;

const ENV_PREFIX: &str = "HIST";

/// Load the settings from `./config`, `CONFIG_FILES` and the environment.
pub fn load_settings() -> Result<Settings> {
    let config_file_paths: Vec<PathBuf> = env::var("CONFIG_FILES")
        .map(|s| s.split(',').map(PathBuf::from).collect())
        .unwrap_or_default();
    load_settings_from(Path::new("./config"), &config_file_paths)
}

/// Load the settings from `*.json` files in `config_dir` (if it exists),
/// then `config_files`, then the environment.
pub fn load_settings_from(config_dir: &Path, config_files: &[PathBuf]) -> Result<Settings> {
    let mut base_config_sources = vec![];
    let mut builder = Config::builder();

    if config_dir.is_dir() {
        let mut entries = vec![];
        for entry in config_dir
            .read_dir()
            .context("Failed to open config directory")?
        {
            let path = entry?.path();
            if path.is_file() && path.extension() == Some("json".as_ref()) {
                entries.push(path);
            }
        }
        entries.sort();
        for path in entries {
            base_config_sources.push(format!("{path:?}"));
            builder = builder.add_source(File::from(path));
        }
    }

    for path in config_files {
        if !path.exists() {
            bail!("Provided config path via CONFIG_FILES does not exist ({path:?})");
        } else if !path.is_file() {
            bail!("Provided config path via CONFIG_FILES is not a file ({path:?})");
        } else if path.extension() != Some("json".as_ref()) {
            bail!("Provided config path via CONFIG_FILES is of an unsupported type ({path:?})");
        }
        base_config_sources.push(format!("{path:?}"));
        builder = builder.add_source(File::from(path.clone()));
    }

    let config_deserializer = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .context("Failed to load config sources")?;

    Config::try_deserialize::<Settings>(config_deserializer).or_else(|err| {
        let mut err = if let Some(source_err) = err.source() {
            let source = format!("Config error source: {source_err}");
            Err(err).context(source)
        } else {
            Err(err.into())
        };
        for cfg_path in &base_config_sources {
            err = err.with_context(|| format!("Config loaded: {cfg_path}"));
        }
        err.context("Config deserialization error")
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::settings::{BackendConf, Level, DEFAULT_PAGE_SIZE};

    #[test]
    fn test_later_files_override_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("config");
        fs::create_dir(&config_dir).unwrap();
        fs::write(
            config_dir.join("base.json"),
            r#"{
                "db": "/tmp/history",
                "tracing": { "level": "info" },
                "chains": {
                    "tezos": {
                        "account": "tz1abc",
                        "backend": { "type": "ledger", "url": "https://api.tzkt.io/v1" }
                    },
                    "ethereum": {
                        "backend": {
                            "type": "balances_api",
                            "url": "https://api.covalenthq.com/v1",
                            "chain_name": "eth-mainnet",
                            "page_size": 25
                        }
                    },
                    "gnosis": {
                        "backend": { "type": "explorer", "url": "https://gnosis.blockscout.com/api/v2" }
                    }
                }
            }"#,
        )
        .unwrap();
        let overrides = dir.path().join("override.json");
        fs::write(
            &overrides,
            r#"{ "db": "/data/history", "tracing": { "level": "debug" } }"#,
        )
        .unwrap();

        let settings = load_settings_from(&config_dir, &[overrides]).unwrap();
        assert_eq!(settings.db, PathBuf::from("/data/history"));
        assert_eq!(settings.tracing.level, Level::Debug);

        let tezos = settings.chain("tezos").unwrap();
        assert_eq!(tezos.account.as_deref(), Some("tz1abc"));
        assert!(matches!(
            &tezos.backend,
            BackendConf::Ledger { page_size, .. } if *page_size == DEFAULT_PAGE_SIZE
        ));
        assert!(matches!(
            &settings.chain("ethereum").unwrap().backend,
            BackendConf::BalancesApi { page_size: 25, chain_name, .. } if chain_name == "eth-mainnet"
        ));
        assert!(matches!(
            &settings.chain("gnosis").unwrap().backend,
            BackendConf::Explorer { .. }
        ));
        assert!(settings.chain("polygon").is_err());
    }

    #[test]
    fn test_missing_config_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_settings_from(dir.path(), &[dir.path().join("nope.json")]).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
