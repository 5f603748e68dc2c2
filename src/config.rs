use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::qr::MAX_MODULE_PX;

pub const DEFAULT_OUTPUT: &str = "otp_accounts.html";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub output: PathBuf,
    pub qr_module_px: u32,
    pub lenient_enums: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            qr_module_px: 4,
            lenient_enums: false,
        }
    }
}

impl Config {
    /// Load an explicit config file, or the default one if it exists.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let cfg: Config = serde_json::from_str(&data)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        cfg.validate()
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_MODULE_PX).contains(&self.qr_module_px) {
            anyhow::bail!(
                "qr_module_px must be between 1 and {MAX_MODULE_PX}, got {}",
                self.qr_module_px
            );
        }
        Ok(())
    }
}

/// `<config dir>/otpmigrate/config.json`, e.g. ~/.config/otpmigrate/config.json
pub fn config_path() -> Option<PathBuf> {
    let mut dir = dirs::config_dir()?;
    dir.push("otpmigrate");
    Some(dir.join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(tag: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "otpmigrate-config-{tag}-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let path = temp_config("partial", r#"{ "lenient_enums": true }"#);
        let cfg = Config::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(cfg.lenient_enums);
        assert_eq!(cfg.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(cfg.qr_module_px, 4);
    }

    #[test]
    fn reads_all_keys() {
        let path = temp_config(
            "full",
            r#"{ "output": "out/report.html", "qr_module_px": 8, "lenient_enums": false }"#,
        );
        let cfg = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(cfg.output, PathBuf::from("out/report.html"));
        assert_eq!(cfg.qr_module_px, 8);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("otpmigrate-does-not-exist.json");
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("cannot read config file"));
    }

    #[test]
    fn rejects_out_of_range_module_size() {
        for (tag, px) in [("zero", 0u64), ("huge", 200_000_000)] {
            let path = temp_config(tag, &format!(r#"{{ "qr_module_px": {px} }}"#));
            let err = Config::from_file(&path).unwrap_err();
            std::fs::remove_file(&path).unwrap();
            assert!(format!("{err:#}").contains("qr_module_px must be between 1 and 64"));
        }
    }

    #[test]
    fn invalid_json_is_an_error() {
        let path = temp_config("broken", "{ not json");
        let err = Config::from_file(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(err.to_string().contains("invalid config file"));
    }
}
