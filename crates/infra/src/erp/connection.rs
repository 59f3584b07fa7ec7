//! TDS connection manager for bb8

use std::time::Duration;

use async_trait::async_trait;
use dealbridge_core::settings::service::ConnectionTarget;
use dealbridge_domain::PoolLimits;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

use super::error::TdsError;

/// One authenticated TDS connection.
///
/// `broken` is set by a session after a transport failure so the pool drops
/// the connection instead of handing it out again.
pub struct TdsConnection {
    pub(crate) client: Client<Compat<TcpStream>>,
    pub(crate) broken: bool,
}

/// Opens SQL Server connections for one [`ConnectionTarget`]
pub struct TdsConnectionManager {
    config: Config,
    connect_timeout: Duration,
}

impl TdsConnectionManager {
    pub fn new(target: &ConnectionTarget, limits: &PoolLimits) -> Self {
        let settings = &target.settings;
        let mut config = Config::new();
        config.host(&settings.identity.host);
        config.port(settings.identity.port);
        config.database(&settings.identity.database);
        config.application_name(&limits.application_name);
        config.authentication(AuthMethod::sql_server(
            &settings.identity.user,
            &target.password,
        ));
        config.encryption(if settings.encrypt {
            EncryptionLevel::Required
        } else {
            EncryptionLevel::Off
        });
        if settings.trust_server_certificate {
            config.trust_cert();
        }

        Self { config, connect_timeout: limits.connect_timeout }
    }

    async fn open(&self) -> Result<TdsConnection, TdsError> {
        let mut config = self.config.clone();
        loop {
            let tcp = TcpStream::connect(config.get_addr()).await?;
            tcp.set_nodelay(true)?;

            match Client::connect(config.clone(), tcp.compat_write()).await {
                Ok(client) => return Ok(TdsConnection { client, broken: false }),
                // Azure SQL and availability groups may point us elsewhere.
                Err(tiberius::error::Error::Routing { host, port }) => {
                    debug!(%host, port, "ERP server redirected the connection");
                    config.host(&host);
                    config.port(port);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

#[async_trait]
impl bb8::ManageConnection for TdsConnectionManager {
    type Connection = TdsConnection;
    type Error = TdsError;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        tokio::time::timeout(self.connect_timeout, self.open())
            .await
            .map_err(|_| TdsError::Timeout(self.connect_timeout))?
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.client.simple_query("SELECT 1").await?.into_row().await?;
        Ok(())
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        conn.broken
    }
}
