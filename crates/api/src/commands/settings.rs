//! ERP connection settings and credential commands

use std::fmt;

use dealbridge_domain::{ActionResult, ConnectionSettings, DealBridgeError, PasswordUpdate};
use serde::Deserialize;

use crate::utils::command_helpers::execute_logged;
use crate::AppContext;

/// Settings plus the optional password field as sent by the caller.
///
/// An absent `password` leaves the stored one alone, an empty string clears
/// it, anything else replaces it.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequest {
    #[serde(flatten)]
    pub settings: ConnectionSettings,
    #[serde(default)]
    pub password: Option<String>,
}

impl fmt::Debug for ConnectionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRequest")
            .field("settings", &self.settings)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Persists settings, applies the password intent and drops the live pool.
pub async fn save_settings(ctx: &AppContext, request: ConnectionRequest) -> ActionResult {
    let result = execute_logged("settings::save_settings", || async move {
        let saved = ctx
            .settings
            .save_settings(&request.settings, PasswordUpdate::from_field(request.password))
            .await;
        // Settings may have been written even when the vault failed.
        ctx.erp_pool.close_pool().await;
        saved
    })
    .await;

    match result {
        Ok(()) => ActionResult::ok("Settings saved"),
        Err(err) => ActionResult::failed(err.to_string()),
    }
}

pub async fn get_settings(ctx: &AppContext) -> Result<Option<ConnectionSettings>, String> {
    execute_logged("settings::get_settings", || ctx.settings.get_settings())
        .await
        .map_err(|e| format!("Failed to load connection settings: {e}"))
}

/// Probes the given settings on an isolated pool.
pub async fn test_connection(ctx: &AppContext, request: ConnectionRequest) -> ActionResult {
    let result = execute_logged("settings::test_connection", || {
        ctx.erp_pool.test_connection(&request.settings, request.password.clone())
    })
    .await;

    match result {
        Ok(true) => ActionResult::ok("Connection successful"),
        Ok(false) => ActionResult::failed("Connection test failed"),
        Err(err) => ActionResult::failed(err.to_string()),
    }
}

/// Removes the stored password of the configured identity.
pub async fn clear_password(ctx: &AppContext) -> ActionResult {
    let result = execute_logged("settings::clear_password", || async {
        ctx.settings.clear_password().await?;
        ctx.erp_pool.close_pool().await;
        Ok::<_, DealBridgeError>(())
    })
    .await;

    match result {
        Ok(()) => ActionResult::ok("Password cleared"),
        Err(err) => ActionResult::failed(err.to_string()),
    }
}
