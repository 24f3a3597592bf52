//! PostgreSQL session backend

use std::fmt;

use postgres::{Client, NoTls};

use super::{Connector, DbError, Session};
use crate::config::ConnectionConfig;

/// Schema searched by the existence check
pub const TARGET_SCHEMA: &str = "public";

const APPLICATION_NAME: &str = "pgsetup";

/// Opens PostgreSQL sessions from a [`ConnectionConfig`]
#[derive(Debug, Clone)]
pub struct PgConnector {
    config: ConnectionConfig,
}

impl PgConnector {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    /// Translate the connection settings into a client configuration
    ///
    /// Host, database name and user must be present. Password and port are
    /// passed through only when set.
    fn client_config(&self) -> Result<postgres::Config, DbError> {
        let cfg = &self.config;
        let host = cfg.host.as_deref().ok_or(DbError::MissingSetting("host"))?;
        let dbname = cfg
            .dbname
            .as_deref()
            .ok_or(DbError::MissingSetting("database name"))?;
        let user = cfg.user.as_deref().ok_or(DbError::MissingSetting("user"))?;

        let mut pg = postgres::Config::new();
        pg.host(host)
            .dbname(dbname)
            .user(user)
            .connect_timeout(cfg.connect_timeout)
            .application_name(APPLICATION_NAME);
        if let Some(port) = cfg.port {
            pg.port(port);
        }
        if let Some(password) = &cfg.password {
            pg.password(password);
        }
        Ok(pg)
    }
}

impl Connector for PgConnector {
    type Session = PgSession;

    fn target(&self) -> String {
        let cfg = &self.config;
        let port = cfg
            .port
            .map(|p| p.to_string())
            .unwrap_or_else(|| "5432".to_string());
        format!(
            "postgres://{}@{}:{}/{}",
            cfg.user.as_deref().unwrap_or("?"),
            cfg.host.as_deref().unwrap_or("?"),
            port,
            cfg.dbname.as_deref().unwrap_or("?"),
        )
    }

    fn connect(&self) -> Result<PgSession, DbError> {
        let mut client = self.client_config()?.connect(NoTls)?;
        client.batch_execute("BEGIN")?;
        Ok(PgSession { client })
    }
}

/// One PostgreSQL connection with an open transaction
pub struct PgSession {
    client: Client,
}

impl fmt::Debug for PgSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgSession")
            .field("closed", &self.client.is_closed())
            .finish()
    }
}

impl Session for PgSession {
    fn table_exists(&mut self, name: &str) -> Result<bool, DbError> {
        // information_schema columns are sql_identifier; compare as text so
        // the parameters bind as plain strings
        let row = self.client.query_one(
            "SELECT EXISTS (
                SELECT FROM information_schema.tables
                WHERE table_schema::text = $1
                AND table_name::text = $2
            )",
            &[&TARGET_SCHEMA, &name],
        )?;
        Ok(row.try_get::<_, bool>(0)?)
    }

    fn execute(&mut self, sql: &str) -> Result<(), DbError> {
        self.client.batch_execute(sql)?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DbError> {
        self.client.batch_execute("COMMIT")?;
        Ok(())
    }

    fn close(self) -> Result<(), DbError> {
        self.client.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::core::{acquire, RetryPolicy};
    use crate::database::testing::RecordingObserver;
    use std::time::Duration;

    fn full_config() -> ConnectionConfig {
        ConnectionConfig {
            dbname: Some("findings".to_string()),
            user: Some("setup".to_string()),
            password: Some("secret".to_string()),
            host: Some("db.internal".to_string()),
            port: Some(6543),
            ..Default::default()
        }
    }

    #[test]
    fn test_target_hides_password() {
        let target = PgConnector::new(full_config()).target();
        assert_eq!(target, "postgres://setup@db.internal:6543/findings");
        assert!(!target.contains("secret"));
    }

    #[test]
    fn test_target_with_missing_settings() {
        let target = PgConnector::new(ConnectionConfig::default()).target();
        assert_eq!(target, "postgres://?@?:5432/?");
    }

    #[test]
    fn test_client_config() {
        let pg = PgConnector::new(full_config()).client_config().unwrap();

        assert_eq!(pg.get_dbname(), Some("findings"));
        assert_eq!(pg.get_user(), Some("setup"));
        assert_eq!(pg.get_password(), Some(&b"secret"[..]));
        assert_eq!(pg.get_ports(), &[6543]);
        assert_eq!(pg.get_connect_timeout(), Some(&Duration::from_secs(10)));
        assert_eq!(pg.get_application_name(), Some(APPLICATION_NAME));
    }

    #[test]
    fn test_missing_host() {
        let config = ConnectionConfig {
            host: None,
            ..full_config()
        };
        let err = PgConnector::new(config).client_config().unwrap_err();
        assert!(matches!(err, DbError::MissingSetting("host")));
    }

    #[test]
    fn test_missing_dbname() {
        let config = ConnectionConfig {
            dbname: None,
            ..full_config()
        };
        let err = PgConnector::new(config).client_config().unwrap_err();
        assert!(matches!(err, DbError::MissingSetting("database name")));
    }

    #[test]
    fn test_unconfigured_connector_gives_up_after_one_attempt() {
        let connector = PgConnector::new(ConnectionConfig::default());
        let observer = RecordingObserver::default();
        let policy = RetryPolicy::new(3, Duration::from_secs(30));

        let err = acquire(&connector, &policy, &observer).unwrap_err();

        assert_eq!(err.attempts, 1);
        assert!(!err.source.is_transient());
    }

    #[test]
    fn test_unreachable_server_exhausts_retries() {
        // nothing listens on port 1; the refusal is immediate
        let config = ConnectionConfig {
            host: Some("127.0.0.1".to_string()),
            port: Some(1),
            connect_timeout: Duration::from_secs(2),
            ..full_config()
        };
        let connector = PgConnector::new(config);
        let observer = RecordingObserver::default();
        let policy = RetryPolicy::new(2, Duration::from_millis(20));

        let err = acquire(&connector, &policy, &observer).unwrap_err();

        assert_eq!(err.attempts, 2);
        assert!(err.source.is_transient());
        assert_eq!(observer.count("connect_failed"), 2);
    }
}
