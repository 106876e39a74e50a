use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};

/// Write `data` as pretty JSON; used for pool exports.
pub fn save_to_file<T: Serialize + ?Sized>(data: &T, path: &str) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path))?;
    serde_json::to_writer_pretty(BufWriter::new(file), data)
        .with_context(|| format!("writing {}", path))
}

/// Read a JSON file, such as the CLI's [`crate::config::AppConfig`].
pub fn load_from_file<T: DeserializeOwned>(path: &str) -> Result<T> {
    let file = File::open(path).with_context(|| format!("opening {}", path))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("parsing {}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, NetworkId};

    #[test]
    fn test_app_config_file() {
        let path = std::env::temp_dir().join(format!("minswap-kupo-rs-{}.json", std::process::id()));
        let path = path.to_string_lossy().into_owned();
        let config = AppConfig {
            kupo_url: "http://kupo:1442".to_string(),
            network: NetworkId::Testnet,
            concurrency: 8,
        };
        save_to_file(&config, &path).unwrap();
        let back: AppConfig = load_from_file(&path).unwrap();
        assert_eq!(back, config);
        std::fs::remove_file(&path).unwrap();

        let err = load_from_file::<AppConfig>(&path).unwrap_err();
        assert!(format!("{:#}", err).starts_with("opening"));
    }
}
