use super::user_id_to_db;
use crate::prelude::*;
use crate::settings::SettingMap;
use crate::Result;
use sea_query::{Expr, OnConflict, PostgresQueryBuilder, Query, SimpleExpr};
use sea_query_binder::SqlxBinder;
use teloxide::types::UserId;

// The `Table` variant renders as the snake_case enum name
#[derive(sea_query::Iden)]
enum UserSettings {
    Table,
    UserId,
    Key,
    Value,
    UpdatedAt,
}

/// Persisted per-user settings: one row per `(user, key)` with a JSON
/// value. A task loads the whole map once at start and never re-reads it,
/// so mid-task settings edits only affect subsequent tasks.
pub(crate) struct UserSettingsRepo {
    db: sqlx::PgPool,
}

impl UserSettingsRepo {
    pub(crate) fn new(db: sqlx::PgPool) -> Self {
        Self { db }
    }

    #[instrument(skip_all, fields(user_id = %user_id))]
    pub(crate) async fn snapshot(&self, user_id: UserId) -> Result<SettingMap> {
        let (sql, values) = Query::select()
            .columns([UserSettings::Key, UserSettings::Value])
            .from(UserSettings::Table)
            .and_where(Expr::col(UserSettings::UserId).eq(user_id_to_db(user_id)?))
            .build_sqlx(PostgresQueryBuilder);

        let rows: Vec<(String, serde_json::Value)> = sqlx::query_as_with(&sql, values)
            .fetch_all(&self.db)
            .await
            .map_err(err_ctx!(super::DbError::Query))?;

        Ok(rows.into_iter().collect())
    }

    #[instrument(skip_all, fields(user_id = %user_id, key = key))]
    pub(crate) async fn set(
        &self,
        user_id: UserId,
        key: &str,
        value: serde_json::Value,
    ) -> Result {
        let mut on_conflict = OnConflict::columns([UserSettings::UserId, UserSettings::Key]);
        on_conflict
            .update_column(UserSettings::Value)
            .value(UserSettings::UpdatedAt, Expr::current_timestamp());

        let values: Vec<SimpleExpr> = vec![
            user_id_to_db(user_id)?.into(),
            key.into(),
            value.into(),
        ];

        let (sql, values) = Query::insert()
            .into_table(UserSettings::Table)
            .columns([UserSettings::UserId, UserSettings::Key, UserSettings::Value])
            .values_panic(values)
            .on_conflict(on_conflict)
            .build_sqlx(PostgresQueryBuilder);

        sqlx::query_with(&sql, values)
            .execute(&self.db)
            .await
            .map_err(err_ctx!(super::DbError::Query))?;

        Ok(())
    }

    #[instrument(skip_all, fields(user_id = %user_id, key = key))]
    pub(crate) async fn unset(&self, user_id: UserId, key: &str) -> Result {
        let (sql, values) = Query::delete()
            .from_table(UserSettings::Table)
            .and_where(Expr::col(UserSettings::UserId).eq(user_id_to_db(user_id)?))
            .and_where(Expr::col(UserSettings::Key).eq(key))
            .build_sqlx(PostgresQueryBuilder);

        sqlx::query_with(&sql, values)
            .execute(&self.db)
            .await
            .map_err(err_ctx!(super::DbError::Query))?;

        Ok(())
    }
}
