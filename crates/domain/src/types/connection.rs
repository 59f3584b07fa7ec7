//! ERP connection identity, settings and lifecycle types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::impl_domain_enum_conversions;

/// Identifies one ERP database login.
///
/// Serves both as the pool's dedup key and as the keychain account. Any
/// change to a field invalidates the live pool and the stored password lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionIdentity {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
}

impl ConnectionIdentity {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self { host: host.into(), port, database: database.into(), user: user.into() }
    }

    /// Keychain account string: `host:port-database-user`.
    #[must_use]
    pub fn vault_account(&self) -> String {
        format!("{}:{}-{}-{}", self.host, self.port, self.database, self.user)
    }

    /// Returns the names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.host.trim().is_empty() {
            missing.push("host");
        }
        if self.port == 0 {
            missing.push("port");
        }
        if self.database.trim().is_empty() {
            missing.push("database");
        }
        if self.user.trim().is_empty() {
            missing.push("user");
        }
        missing
    }
}

impl fmt::Display for ConnectionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

/// Non-secret connection parameters persisted in the settings store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSettings {
    #[serde(flatten)]
    pub identity: ConnectionIdentity,
    #[serde(default)]
    pub encrypt: bool,
    #[serde(default)]
    pub trust_server_certificate: bool,
}

/// What the caller asked to happen to the stored password.
///
/// "No change requested" and "clear the password" are different intents, so
/// an omitted field and an empty string must not collapse into one case.
#[derive(Clone, PartialEq, Eq)]
pub enum PasswordUpdate {
    Unchanged,
    Clear,
    Set(String),
}

impl PasswordUpdate {
    /// Maps the caller's optional password field onto the three intents.
    #[must_use]
    pub fn from_field(field: Option<String>) -> Self {
        match field {
            None => Self::Unchanged,
            Some(value) if value.is_empty() => Self::Clear,
            Some(value) => Self::Set(value),
        }
    }
}

impl fmt::Debug for PasswordUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => f.write_str("Unchanged"),
            Self::Clear => f.write_str("Clear"),
            Self::Set(_) => f.write_str("Set(<redacted>)"),
        }
    }
}

/// Lifecycle of the shared ERP pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolState {
    Absent,
    Connecting,
    Connected,
    Errored,
}

impl_domain_enum_conversions!(PoolState {
    Absent => "absent",
    Connecting => "connecting",
    Connected => "connected",
    Errored => "errored",
});

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> ConnectionIdentity {
        ConnectionIdentity::new("erp.local", 1433, "eazybusiness", "sa")
    }

    #[test]
    fn vault_account_uses_host_port_database_user() {
        assert_eq!(identity().vault_account(), "erp.local:1433-eazybusiness-sa");
    }

    #[test]
    fn password_field_maps_to_three_intents() {
        assert_eq!(PasswordUpdate::from_field(None), PasswordUpdate::Unchanged);
        assert_eq!(PasswordUpdate::from_field(Some(String::new())), PasswordUpdate::Clear);
        assert_eq!(
            PasswordUpdate::from_field(Some("s3cret".into())),
            PasswordUpdate::Set("s3cret".into())
        );
    }

    #[test]
    fn debug_never_prints_password() {
        let rendered = format!("{:?}", PasswordUpdate::Set("s3cret".into()));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn settings_round_trip_camel_case_flattened() {
        let json = serde_json::json!({
            "host": "erp.local",
            "port": 1433,
            "database": "eazybusiness",
            "user": "sa",
            "encrypt": true,
            "trustServerCertificate": true
        });

        let settings: ConnectionSettings = serde_json::from_value(json).unwrap();
        assert_eq!(settings.identity, identity());
        assert!(settings.encrypt);
        assert!(settings.trust_server_certificate);
    }

    #[test]
    fn missing_fields_are_reported() {
        let blank = ConnectionIdentity::new(" ", 0, "", "sa");
        assert_eq!(blank.missing_fields(), vec!["host", "port", "database"]);
        assert!(identity().missing_fields().is_empty());
    }
}
