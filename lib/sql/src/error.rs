use thiserror::Error;

/// What went wrong inside a failed statement, derived from the driver's
/// error codes. Services use this to turn constraint violations into
/// domain-level 4xx responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    UniqueViolation,
    ForeignKeyViolation,
    NotNullViolation,
    Syntax,
    Connection,
    Other,
}

#[derive(Error, Debug)]
pub enum SqlError {
    /// A single statement failed. Never partially applied.
    #[error("query failed: {message}")]
    Query {
        kind: QueryErrorKind,
        message: String,
    },

    /// A transaction closure failed; the transaction was rolled back.
    #[error("transaction failed: {0}")]
    Transaction(#[source] Box<SqlError>),

    /// The backend could not be reached, or the store was closed.
    #[error("connection error: {0}")]
    Connection(String),

    /// The configured backend could not be opened at startup.
    #[error("no database backend available: {0}")]
    NoBackend(String),
}

impl SqlError {
    pub fn query(kind: QueryErrorKind, message: impl Into<String>) -> Self {
        SqlError::Query {
            kind,
            message: message.into(),
        }
    }

    /// The query kind, looking through transaction wrapping.
    pub fn kind(&self) -> Option<QueryErrorKind> {
        match self {
            SqlError::Query { kind, .. } => Some(*kind),
            SqlError::Transaction(inner) => inner.kind(),
            _ => None,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        self.kind() == Some(QueryErrorKind::UniqueViolation)
    }
}
