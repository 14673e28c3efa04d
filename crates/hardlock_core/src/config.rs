//! File locations for the licensing core.
//!
//! All paths resolve beside the executable by default, which keeps the
//! deployed layout self-contained: the host application, its bundled
//! `public.pem`, and the `License.key` travel together. An optional
//! `hardlock.json` beside the executable overrides individual fields;
//! a missing or unparseable file falls back to the defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "hardlock.json";

const LICENSE_FILE: &str = "License.key";
const PUBLIC_KEY_FILE: &str = "public.pem";
const CUSTOM_PUBLIC_KEY_FILE: &str = "CustomPublicKey.pem";
const PRIVATE_KEY_FILE: &str = "private.pem";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// The signed binary license blob.
    pub license_file: PathBuf,
    /// Public key bundled with the client.
    pub public_key_file: PathBuf,
    /// Operator-supplied public key; takes precedence over the bundled one.
    pub custom_public_key_file: PathBuf,
    /// Issuer-side signing key. Never distributed.
    pub private_key_file: PathBuf,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            license_file: PathBuf::from(LICENSE_FILE),
            public_key_file: PathBuf::from(PUBLIC_KEY_FILE),
            custom_public_key_file: PathBuf::from(CUSTOM_PUBLIC_KEY_FILE),
            private_key_file: PathBuf::from(PRIVATE_KEY_FILE),
        }
    }
}

impl LicenseConfig {
    /// Resolve the configuration for this process: defaults anchored beside
    /// the executable, overridden by `hardlock.json` if one is present there.
    pub fn resolved() -> Self {
        Self::load(&executable_dir())
    }

    /// Default file names anchored in `dir`, with `dir/hardlock.json`
    /// overrides applied when present.
    pub fn load(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                log::warn!(
                    "Ignoring unparseable config {}: {}",
                    config_path.display(),
                    e
                );
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        config.anchor(dir);
        config
    }

    /// Default file names anchored in `dir`, ignoring any config file.
    pub fn in_dir(dir: &Path) -> Self {
        let mut config = Self::default();
        config.anchor(dir);
        config
    }

    fn anchor(&mut self, dir: &Path) {
        for path in [
            &mut self.license_file,
            &mut self.public_key_file,
            &mut self.custom_public_key_file,
            &mut self.private_key_file,
        ] {
            if path.is_relative() {
                let anchored = dir.join(path.as_path());
                *path = anchored;
            }
        }
    }
}

fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_anchor_in_dir() {
        let config = LicenseConfig::in_dir(Path::new("/opt/app"));
        assert_eq!(config.license_file, Path::new("/opt/app/License.key"));
        assert_eq!(config.public_key_file, Path::new("/opt/app/public.pem"));
        assert_eq!(
            config.custom_public_key_file,
            Path::new("/opt/app/CustomPublicKey.pem")
        );
        assert_eq!(config.private_key_file, Path::new("/opt/app/private.pem"));
    }

    #[test]
    fn test_load_applies_partial_override() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("hardlock.json"),
            r#"{"license_file": "licenses/Customer.key"}"#,
        )
        .unwrap();

        let config = LicenseConfig::load(tmp.path());
        assert_eq!(
            config.license_file,
            tmp.path().join("licenses/Customer.key")
        );
        // Unset fields keep their defaults, anchored in the same dir
        assert_eq!(config.public_key_file, tmp.path().join("public.pem"));
    }

    #[test]
    fn test_load_tolerates_bad_config() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("hardlock.json"), "{not json").unwrap();

        let config = LicenseConfig::load(tmp.path());
        assert_eq!(config.license_file, tmp.path().join("License.key"));
    }

    #[test]
    fn test_absolute_override_kept_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("hardlock.json"),
            r#"{"public_key_file": "/etc/hardlock/public.pem"}"#,
        )
        .unwrap();

        let config = LicenseConfig::load(tmp.path());
        assert_eq!(
            config.public_key_file,
            Path::new("/etc/hardlock/public.pem")
        );
    }
}
