mod cfg;
mod user_settings;

use crate::prelude::*;
use crate::Result;

pub(crate) use cfg::*;
pub(crate) use user_settings::UserSettingsRepo;

/// Most likely unrecoverable errors from the database communication layer
#[derive(Debug, thiserror::Error)]
pub(crate) enum DbError {
    #[error("Failed to connect to the database")]
    Connect { source: sqlx::Error },

    #[error("Failed to migrate the database")]
    Migrate { source: sqlx::migrate::MigrateError },

    #[error("Database query failed")]
    Query {
        #[from]
        source: sqlx::Error,
    },

    #[error("Value doesn't fit into the database representation: {message}")]
    Serialize { message: String },
}

pub(crate) struct Repo {
    pub(crate) user_settings: UserSettingsRepo,
}

pub(crate) async fn init(cfg: Config) -> Result<Repo> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(cfg.pool_size)
        .connect(cfg.url.as_str())
        .await
        .map_err(err_ctx!(DbError::Connect))?;

    // Verify that the connection is working early and bring the schema
    // up to date. The pool created here is reused for the whole process
    // lifetime.
    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(err_ctx!(DbError::Migrate))?;

    info!("Database is initialized");

    Ok(Repo {
        user_settings: UserSettingsRepo::new(pool),
    })
}

pub(crate) fn user_id_to_db(user_id: teloxide::types::UserId) -> Result<i64> {
    i64::try_from(user_id.0).map_err(|_| {
        DbError::Serialize {
            message: format!("user id {user_id} overflows BIGINT"),
        }
        .into()
    })
}
