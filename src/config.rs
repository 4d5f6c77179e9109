use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::AppError;

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_MAX_UPLOAD_MB: usize = 10;

const ENV_ADDR: &str = "SITOPTENKIT_ADDR";
const ENV_DATA_DIR: &str = "SITOPTENKIT_DATA_DIR";
const ENV_ADMIN_PASSWORD: &str = "SITOPTENKIT_ADMIN_PASSWORD";
const ENV_MAX_UPLOAD_MB: &str = "SITOPTENKIT_MAX_UPLOAD_MB";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub data_dir: PathBuf,
    /// When unset the admin pages are open to everyone.
    pub admin_password: Option<String>,
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            admin_password: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

impl AppConfig {
    /// Read the process environment; positional arguments `[addr] [data_dir]`
    /// take precedence over it.
    pub fn load() -> Result<Self, AppError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::from_sources(&vars, &args)
    }

    pub fn from_sources(vars: &HashMap<String, String>, args: &[String]) -> Result<Self, AppError> {
        let mut config = Self::default();
        let var = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        if let Some(addr) = args.first().map(String::as_str).or_else(|| var(ENV_ADDR)) {
            config.addr = addr
                .parse()
                .map_err(|_| AppError::Config(format!("invalid listen address '{}'", addr)))?;
        }
        if let Some(dir) = args.get(1).map(String::as_str).or_else(|| var(ENV_DATA_DIR)) {
            config.data_dir = PathBuf::from(dir);
        }
        config.admin_password = var(ENV_ADMIN_PASSWORD).map(str::to_string);
        if let Some(mb) = var(ENV_MAX_UPLOAD_MB) {
            let mb: usize = mb.parse().map_err(|_| {
                AppError::Config(format!("{} must be a whole number, got '{}'", ENV_MAX_UPLOAD_MB, mb))
            })?;
            config.max_upload_bytes = mb.max(1).saturating_mul(1024 * 1024);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let c = AppConfig::from_sources(&HashMap::new(), &[]).unwrap();
        assert_eq!(c.addr.to_string(), DEFAULT_ADDR);
        assert_eq!(c.data_dir, PathBuf::from("data"));
        assert!(c.admin_password.is_none());
        assert_eq!(c.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_env_overrides() {
        let v = vars(&[
            ("SITOPTENKIT_ADDR", "0.0.0.0:8080"),
            ("SITOPTENKIT_DATA_DIR", "/srv/desa"),
            ("SITOPTENKIT_ADMIN_PASSWORD", "rahasia"),
            ("SITOPTENKIT_MAX_UPLOAD_MB", "2"),
        ]);
        let c = AppConfig::from_sources(&v, &[]).unwrap();
        assert_eq!(c.addr.port(), 8080);
        assert_eq!(c.data_dir, PathBuf::from("/srv/desa"));
        assert_eq!(c.admin_password.as_deref(), Some("rahasia"));
        assert_eq!(c.max_upload_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn test_args_take_precedence() {
        let v = vars(&[("SITOPTENKIT_ADDR", "0.0.0.0:8080")]);
        let args = vec!["127.0.0.1:9000".to_string(), "other".to_string()];
        let c = AppConfig::from_sources(&v, &args).unwrap();
        assert_eq!(c.addr.port(), 9000);
        assert_eq!(c.data_dir, PathBuf::from("other"));
    }

    #[test]
    fn test_blank_password_means_open() {
        let v = vars(&[("SITOPTENKIT_ADMIN_PASSWORD", "  ")]);
        let c = AppConfig::from_sources(&v, &[]).unwrap();
        assert!(c.admin_password.is_none());
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        assert!(matches!(
            AppConfig::from_sources(&vars(&[("SITOPTENKIT_ADDR", "nope")]), &[]),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_sources(&vars(&[("SITOPTENKIT_MAX_UPLOAD_MB", "ten")]), &[]),
            Err(AppError::Config(_))
        ));
    }
}
