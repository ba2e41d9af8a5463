use thiserror::Error;

/// Errors surfaced by catalog store operations.
///
/// The server maps these onto HTTP status codes: `NotFound` -> 404,
/// `Duplicate` -> 409, `MissingParent` -> 422, `Database` -> 500.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} '{id}' already exists")]
    Duplicate { entity: &'static str, id: String },

    #[error("referenced {entity} '{id}' does not exist")]
    MissingParent { entity: &'static str, id: String },

    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: &str) -> StoreError {
        StoreError::NotFound {
            entity,
            id: id.to_owned(),
        }
    }

    pub fn duplicate(entity: &'static str, id: &str) -> StoreError {
        StoreError::Duplicate {
            entity,
            id: id.to_owned(),
        }
    }

    pub fn missing_parent(entity: &'static str, id: &str) -> StoreError {
        StoreError::MissingParent {
            entity,
            id: id.to_owned(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
