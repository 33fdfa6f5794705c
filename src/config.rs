/*
 * Responsibility
 * - 環境変数の読み込み (DATABASE_URL, VAULT_URL, VAULT_IDS, EMR 設定など)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - 起動後は不変。AppState 経由で read-only に共有する
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings handed to the EMR Serverless job submitter.
#[derive(Debug, Clone)]
pub struct EmrSettings {
    pub application_id: String,
    pub execution_role_arn: String,
    pub entry_point: String,
    pub spark_submit_parameters: Option<String>,
    pub log_uri: String,
    // Secret reference passed through to the Spark job as an argument. Never logged.
    pub secrets: String,
}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub database_url: String,
    pub db_max_connections: u32,

    pub vault_url: String,
    pub vault_ids: Vec<String>,
    pub auth_scheme: String,
    pub authorization_timeout: Duration,

    pub region: String,
    pub emr: EmrSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let database_url = database_url_from_env()?;

        let db_max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5);

        let vault_url = required("VAULT_URL")?;
        Url::parse(&vault_url).map_err(|_| ConfigError::Invalid("VAULT_URL"))?;
        let vault_url = vault_url.trim_end_matches('/').to_string();

        let vault_ids = parse_csv(&std::env::var("VAULT_IDS").unwrap_or_default());

        let auth_scheme = parse_auth_scheme(std::env::var("AUTH_SCHEME").ok())?;
        let authorization_timeout =
            parse_authorization_timeout(std::env::var("AUTHORIZATION_TIMEOUT_SECONDS").ok());

        let region = required("REGION")?;

        let emr = EmrSettings {
            application_id: required("APPLICATION_ID")?,
            execution_role_arn: required("EXECUTION_ROLE_ARN")?,
            entry_point: required("ENTRYPOINT")?,
            spark_submit_parameters: std::env::var("SPARK_SUBMIT_PARAMETERS")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            log_uri: required("LOG_URI")?,
            secrets: required("SECRETS")?,
        };

        Ok(Self {
            addr,
            app_env,
            database_url,
            db_max_connections,
            vault_url,
            vault_ids,
            auth_scheme,
            authorization_timeout,
            region,
            emr,
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

// DATABASE_URL が無ければ DB_HOST / DB_PORT / DB_USER / DB_PASSWORD / DB_NAME から組み立てる
fn database_url_from_env() -> Result<String, ConfigError> {
    if let Ok(url) = std::env::var("DATABASE_URL") {
        return Ok(url);
    }

    let host = required("DB_HOST").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
    let port = parse_db_port(std::env::var("DB_PORT").ok())?;
    let user = required("DB_USER")?;
    let password = std::env::var("DB_PASSWORD").unwrap_or_default();
    let name = required("DB_NAME")?;

    build_database_url(&host, port, &user, &password, &name)
}

pub(crate) fn parse_db_port(raw: Option<String>) -> Result<u16, ConfigError> {
    match raw {
        None => Ok(5432),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid("DB_PORT")),
    }
}

pub(crate) fn build_database_url(
    host: &str,
    port: u16,
    user: &str,
    password: &str,
    name: &str,
) -> Result<String, ConfigError> {
    let mut url =
        Url::parse("postgres://localhost").map_err(|_| ConfigError::Invalid("DATABASE_URL"))?;
    // set_* は URL エンコードを任せるために使う (password に記号が入っても壊れない)
    url.set_host(Some(host)).map_err(|_| ConfigError::Invalid("DB_HOST"))?;
    url.set_port(Some(port)).map_err(|_| ConfigError::Invalid("DB_PORT"))?;
    url.set_username(user).map_err(|_| ConfigError::Invalid("DB_USER"))?;
    if !password.is_empty() {
        url.set_password(Some(password)).map_err(|_| ConfigError::Invalid("DB_PASSWORD"))?;
    }
    url.set_path(name);
    url.set_query(Some("sslmode=disable"));
    Ok(url.to_string())
}

// 未設定なら Bearer。空白を含む値はヘッダの先頭トークンと一致し得ないので起動時に弾く
pub(crate) fn parse_auth_scheme(raw: Option<String>) -> Result<String, ConfigError> {
    let scheme = raw.unwrap_or_else(|| "Bearer".to_string());
    if scheme.trim().is_empty() || scheme.contains(char::is_whitespace) {
        return Err(ConfigError::Invalid("AUTH_SCHEME"));
    }
    Ok(scheme)
}

pub(crate) fn parse_authorization_timeout(raw: Option<String>) -> Duration {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(60))
}

pub(crate) fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
