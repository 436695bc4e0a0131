/**
 * Server Initialization
 *
 * Builds the application from configuration:
 * 1. Open the store and run migrations
 * 2. Seed the bootstrap super admin, when configured
 * 3. Assemble `AppState`
 * 4. Start the periodic cleanup of idle realtime groups
 * 5. Create the router
 */

use crate::backend::auth::users::{self, NewUser};
use crate::backend::error::BackendError;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, AdminSeed, AppConfig};
use crate::backend::server::state::AppState;
use crate::shared::Role;
use axum::Router;
use sqlx::SqlitePool;

/// Create and configure the Axum application
///
/// # Arguments
///
/// * `config` - Loaded configuration
///
/// # Returns
///
/// The router together with the state it was built from.
///
/// # Errors
///
/// Fails when the store cannot be opened or the admin seed cannot be
/// written.
pub async fn create_app(config: AppConfig) -> Result<(Router, AppState), BackendError> {
    tracing::info!("Initializing casedesk backend");

    let db_pool = load_database(&config.database_url).await?;

    if let Some(seed) = &config.bootstrap_admin {
        ensure_super_admin(&db_pool, seed, config.bcrypt_cost).await?;
    }

    let app_state = AppState::new(db_pool, config);

    let cleanup_groups = app_state.case_groups.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            let removed = cleanup_groups.cleanup_inactive_groups();
            tracing::debug!("Removed {} idle realtime groups", removed);
        }
    });

    let app = create_router(app_state.clone());
    tracing::info!("Router configured");

    Ok((app, app_state))
}

/// Create the configured super admin unless the email is already taken
///
/// An existing account with that email is left untouched, whatever its
/// role.
pub async fn ensure_super_admin(pool: &SqlitePool, seed: &AdminSeed, bcrypt_cost: u32) -> Result<(), BackendError> {
    if users::get_user_by_email(pool, &seed.email).await?.is_some() {
        tracing::info!("Bootstrap admin {} already exists", seed.email);
        return Ok(());
    }

    let password_hash = bcrypt::hash(&seed.password, bcrypt_cost)?;
    let admin = users::create_user(
        pool,
        NewUser {
            email: seed.email.clone(),
            password_hash,
            name: seed.name.clone(),
            phone: None,
            role: Role::SuperAdmin,
            email_verified: true,
        },
    )
    .await?;

    tracing::info!("Created bootstrap super admin {} (id {})", admin.email, admin.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_support;

    #[tokio::test]
    async fn test_ensure_super_admin_is_idempotent() {
        let ctx = test_support::context().await;
        let seed = AdminSeed {
            email: "root@example.com".to_string(),
            password: "supersecret".to_string(),
            name: "Root".to_string(),
        };

        ensure_super_admin(&ctx.state.db_pool, &seed, 4).await.unwrap();
        ensure_super_admin(&ctx.state.db_pool, &seed, 4).await.unwrap();

        let admin = users::get_user_by_email(&ctx.state.db_pool, "root@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, Role::SuperAdmin);
        assert!(bcrypt::verify("supersecret", &admin.password_hash).unwrap());
    }
}
