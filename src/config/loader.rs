//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "TUNESCOUT";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `TUNESCOUT_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `TUNESCOUT_SITE__BASE_URL=https://www.gequbao.com`
/// - `TUNESCOUT_CACHE__MAX_AGE_SECS=3600`
/// - `TUNESCOUT_UPLOAD__ENABLED=true`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("site.timeout_secs", 10)?
        .set_default("cache.max_age_secs", 86400)?
        .set_default("cache.sweep_on_start", false)?
        .set_default("upload.enabled", false)?
        .set_default("upload.queue_capacity", 32)?
        .set_default("upload.shutdown_grace_secs", 30)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级），变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.site.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Site base URL cannot be empty".to_string(),
        ));
    }

    if config.site.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Site timeout cannot be 0".to_string(),
        ));
    }

    if config.upload.queue_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "Upload queue capacity cannot be 0".to_string(),
        ));
    }

    if config.upload.enabled && config.upload.resolved_base_url().is_none() {
        return Err(ConfigError::ValidationError(
            "Upload base URL is required when upload is enabled".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Site: {}", config.site.base_url);
    tracing::info!("Site Timeout: {}s", config.site.timeout_secs);
    tracing::info!("Cache Directory: {:?}", config.cache.cache_dir());
    tracing::info!("Cache Max Age: {}s", config.cache.max_age_secs);
    tracing::info!("Upload Enabled: {}", config.upload.enabled);
    if config.upload.enabled {
        tracing::info!("Upload Base URL: {:?}", config.upload.resolved_base_url());
        tracing::info!("Upload Root: {}", config.upload.remote_root);
        tracing::info!("Token Path: {:?}", config.upload.token_path);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
