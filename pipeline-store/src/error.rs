use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("an active job already exists for this item/season/stage/disc")]
    DuplicateActiveJob,

    #[error("invalid stored value in column {column}: {value}")]
    InvalidColumn { column: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// SQLite reports the partial unique index violation as a generic
/// constraint error; this is the only `UNIQUE` constraint a job insert can
/// hit, so any constraint violation on that table means one thing.
pub(crate) fn map_insert_job_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return StoreError::DuplicateActiveJob;
        }
    }
    StoreError::Database(err)
}
