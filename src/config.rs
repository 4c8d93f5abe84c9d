use std::str::FromStr;

use serde::Deserialize;

/// Which users `GET /` renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UsersView {
    #[default]
    All,
    /// Only the first stored record; kept for the original single-user demo page.
    First,
}

impl FromStr for UsersView {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "first" => Ok(Self::First),
            other => anyhow::bail!("unknown USERS_VIEW '{other}', expected 'all' or 'first'"),
        }
    }
}

/// Which user field ends up in the rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserField {
    Name,
    #[default]
    Email,
}

impl FromStr for UserField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            other => anyhow::bail!("unknown USERS_FIELD '{other}', expected 'name' or 'email'"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    pub json_body_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub http: HttpConfig,
    pub view: UsersView,
    pub field: UserField,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            cors_origin: "http://localhost:4000".into(),
            json_body_limit: 100 * 1024,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        Self::from_lookup(database_url, |key| std::env::var(key).ok())
    }

    fn from_lookup(
        database_url: String,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let defaults = HttpConfig::default();
        let http = HttpConfig {
            host: lookup("APP_HOST").unwrap_or(defaults.host),
            port: lookup("APP_PORT")
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(defaults.port),
            cors_origin: lookup("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            json_body_limit: lookup("JSON_BODY_LIMIT")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(defaults.json_body_limit),
        };
        let view = match lookup("USERS_VIEW") {
            Some(v) => v.parse()?,
            None => UsersView::default(),
        };
        let field = match lookup("USERS_FIELD") {
            Some(v) => v.parse()?,
            None => UserField::default(),
        };
        Ok(Self {
            database_url,
            max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            http,
            view,
            field,
        })
    }
}
