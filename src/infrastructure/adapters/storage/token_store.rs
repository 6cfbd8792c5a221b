//! Token Store - 读取预先写好的上传凭证
//!
//! 凭证是一个 JWT，只检查 `exp`，不校验签名；重新登录不在这里处理

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// 默认凭证文件
pub const DEFAULT_TOKEN_PATH: &str = "/tmp/alist.token";

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<f64>,
}

/// 解析 JWT payload 中的过期时间（秒），没有 `exp` 时返回 None
pub fn token_expiry(token: &str) -> Result<Option<i64>, String> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err("token is not a JWT".to_string()),
    };

    let decoded = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| format!("invalid payload encoding: {}", e))?;
    let claims: Claims =
        serde_json::from_slice(&decoded).map_err(|e| format!("invalid payload: {}", e))?;

    Ok(claims.exp.map(|exp| exp as i64))
}

/// 凭证文件
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_PATH)
    }
}

impl TokenStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取未过期的凭证
    pub async fn load(&self) -> Option<String> {
        let token = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "Token file not readable");
                return None;
            }
        };

        if token.is_empty() {
            return None;
        }

        match token_expiry(&token) {
            Ok(Some(exp)) if exp <= Utc::now().timestamp() => {
                tracing::info!(exp = exp, "Upload token expired");
                None
            }
            Ok(exp) => {
                tracing::debug!(exp = ?exp, "Upload token loaded");
                Some(token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Upload token is invalid");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn jwt(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_token_expiry() {
        assert_eq!(token_expiry(&jwt(r#"{"exp": 1700000000}"#)).unwrap(), Some(1700000000));
        assert_eq!(token_expiry(&jwt(r#"{"username": "upload"}"#)).unwrap(), None);
        assert!(token_expiry("not-a-jwt").is_err());
    }

    #[tokio::test]
    async fn test_load_rejects_expired_token() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("alist.token");

        let valid = jwt(&format!(r#"{{"exp": {}}}"#, Utc::now().timestamp() + 3600));
        std::fs::write(&path, format!("{}\n", valid)).unwrap();
        assert_eq!(TokenStore::new(&path).load().await, Some(valid));

        let expired = jwt(&format!(r#"{{"exp": {}}}"#, Utc::now().timestamp() - 60));
        std::fs::write(&path, expired).unwrap();
        assert_eq!(TokenStore::new(&path).load().await, None);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        assert_eq!(TokenStore::new(dir.path().join("none")).load().await, None);
    }
}
