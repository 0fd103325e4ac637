use std::future::Future;

use log::debug;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;

use crate::types::config::DbConfig;
use crate::types::{DbError, DbResult};

/// Anything that can run the workload query. Implementations must be safe
/// to share between all workers of a run.
pub trait QueryExecutor: Send + Sync + 'static {
    fn execute(&self, query: &str) -> impl Future<Output = DbResult<()>> + Send;
}

/// Connection settings for one run
#[derive(Debug, Clone)]
pub struct DbSettings {
    url: String,
    max_connections: u32,
}

impl DbSettings {
    /// Resolve settings from the `[db]` section. A full URL wins over the
    /// discrete host/user/password/database fields, which describe MySQL.
    pub fn from_config(db: &DbConfig, max_connections: u32) -> DbResult<Self> {
        let url = match db.url() {
            Some(url) => url.to_string(),
            None => mysql_url(db)?,
        };
        Ok(Self {
            url,
            max_connections: max_connections.max(1),
        })
    }

    pub fn from_url(url: impl Into<String>, max_connections: u32) -> Self {
        Self {
            url: url.into(),
            max_connections: max_connections.max(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// URL with any password masked, for logging
    pub fn redacted_url(&self) -> String {
        match (self.url.find("://"), self.url.rfind('@')) {
            (Some(scheme_end), Some(at)) if at > scheme_end => {
                let credentials = &self.url[scheme_end + 3..at];
                match credentials.split_once(':') {
                    Some((user, _)) => format!(
                        "{}{}:***{}",
                        &self.url[..scheme_end + 3],
                        user,
                        &self.url[at..]
                    ),
                    None => self.url.clone(),
                }
            }
            _ => self.url.clone(),
        }
    }
}

fn mysql_url(db: &DbConfig) -> DbResult<String> {
    let (host, port) = split_host_port(db.host())?;
    let mut options = MySqlConnectOptions::new()
        .host(host)
        .username(db.user())
        .database(db.database());
    if let Some(port) = port {
        options = options.port(port);
    }
    if !db.password().is_empty() {
        options = options.password(db.password());
    }
    Ok(options.to_url_lossy().to_string())
}

fn split_host_port(address: &str) -> DbResult<(&str, Option<u16>)> {
    let address = address.trim();
    if address.is_empty() {
        return Err(DbError::InvalidHost(address.to_string()));
    }
    match address.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => port
            .parse::<u16>()
            .map(|port| (host, Some(port)))
            .map_err(|_| DbError::InvalidHost(address.to_string())),
        Some(_) => Err(DbError::InvalidHost(address.to_string())),
        None => Ok((address, None)),
    }
}

/// The single shared database handle of a run. Each arm holds the native
/// driver's pool so result rows are never converted to a generic row type.
#[derive(Clone, Debug)]
pub enum SqlHandle {
    MySql(MySqlPool),
    Sqlite(SqlitePool),
}

impl SqlHandle {
    pub async fn connect(settings: &DbSettings) -> DbResult<Self> {
        let url = settings.url();
        debug!("Connecting to {}", settings.redacted_url());
        let connect_error = |source: sqlx::Error| DbError::Connect {
            url: settings.redacted_url(),
            source,
        };

        match url.split_once(':').map(|(scheme, _)| scheme) {
            Some("mysql" | "mariadb") => MySqlPoolOptions::new()
                .max_connections(settings.max_connections)
                .connect(url)
                .await
                .map(Self::MySql)
                .map_err(connect_error),
            Some("sqlite") => SqlitePoolOptions::new()
                .max_connections(settings.max_connections)
                .connect(url)
                .await
                .map(Self::Sqlite)
                .map_err(connect_error),
            _ => Err(DbError::UnsupportedScheme(settings.redacted_url())),
        }
    }

    pub async fn close(&self) {
        match self {
            Self::MySql(pool) => pool.close().await,
            Self::Sqlite(pool) => pool.close().await,
        }
    }
}

impl QueryExecutor for SqlHandle {
    async fn execute(&self, query: &str) -> DbResult<()> {
        // Result rows are discarded; only completion matters
        match self {
            Self::MySql(pool) => {
                sqlx::raw_sql(query).execute(pool).await?;
            }
            Self::Sqlite(pool) => {
                sqlx::raw_sql(query).execute(pool).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_takes_precedence() {
        let db = DbConfig {
            host: Some("ignored:1".to_string()),
            url: Some("sqlite::memory:".to_string()),
            ..Default::default()
        };
        let settings = DbSettings::from_config(&db, 4).unwrap();
        assert_eq!(settings.url(), "sqlite::memory:");
    }

    #[test]
    fn builds_mysql_url_from_defaults() {
        let settings = DbSettings::from_config(&DbConfig::default(), 10).unwrap();
        let url = settings.url();
        assert!(url.starts_with("mysql://root@localhost:3306/"), "{url}");
        assert!(url.contains("your_database_name"), "{url}");
    }

    #[test]
    fn password_is_redacted() {
        let db = DbConfig {
            host: Some("db:3306".to_string()),
            password: Some("hunter2".to_string()),
            ..Default::default()
        };
        let settings = DbSettings::from_config(&db, 1).unwrap();
        assert!(settings.url().contains("hunter2"));
        let redacted = settings.redacted_url();
        assert!(!redacted.contains("hunter2"), "{redacted}");
        assert!(redacted.starts_with("mysql://root:***@db:3306"), "{redacted}");
    }

    #[test]
    fn rejects_bad_host() {
        for host in ["", ":3306", "db:notaport"] {
            let db = DbConfig {
                host: Some(host.to_string()),
                ..Default::default()
            };
            assert!(
                matches!(
                    DbSettings::from_config(&db, 1),
                    Err(DbError::InvalidHost(_))
                ),
                "{host}"
            );
        }
    }

    #[tokio::test]
    async fn unknown_scheme_is_rejected_before_connecting() {
        let settings = DbSettings::from_url("postgres://localhost/db", 1);
        assert!(matches!(
            SqlHandle::connect(&settings).await,
            Err(DbError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn host_without_port() {
        assert_eq!(split_host_port("db").unwrap(), ("db", None));
        assert_eq!(split_host_port("db:3307").unwrap(), ("db", Some(3307)));
    }
}
