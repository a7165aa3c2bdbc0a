use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("unsupported binding expression `{expr}`: {reason}")]
    UnsupportedExpression { expr: String, reason: String },

    #[error("cannot bind `{0}`: constant to constant or constant to method call bindings are not supported")]
    ConstantBinding(String),

    #[error("argument `{0}` must not be null or empty")]
    NullArgument(&'static str),

    #[error("event [{event}] has not been configured for type [{type_name}]")]
    UnregisteredEvent { event: String, type_name: String },

    #[error("[{member}] is null in expression `{expr}`")]
    NullReference { member: String, expr: String },

    #[error("invalid cast from {from} to {to}")]
    InvalidCast { from: String, to: String },

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("`{method}` expects {expected} arguments, got {actual}")]
    ArgumentCount {
        method: String,
        expected: usize,
        actual: usize,
    },

    #[error("member [{member}] not found on type [{type_name}]")]
    MemberNotFound { member: String, type_name: String },

    #[error("method [{0}] cannot be represented by a method delegate")]
    UnsupportedMethod(String),

    #[error("member [{0}] cannot be read")]
    NotReadable(String),

    #[error("member [{0}] cannot be written")]
    NotWritable(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("{0}")]
    Host(String),

    #[error("error in entry {index}{}: {source}", .expr.as_ref().map(|e| format!(" `{e}`")).unwrap_or_default())]
    Entry {
        index: usize,
        expr: Option<String>,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Failure raised by host code: accessors, handlers, commands.
    pub fn host<M: Into<String>>(message: M) -> Self {
        Self::Host(message.into())
    }

    pub fn unsupported<E: ToString, R: Into<String>>(expr: &E, reason: R) -> Self {
        Self::UnsupportedExpression {
            expr: expr.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_cast<F: Into<String>, T: Into<String>>(from: F, to: T) -> Self {
        Self::InvalidCast {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Wraps a construction failure with the position of the offending entry.
    pub fn at_entry(self, index: usize, expr: Option<String>) -> Self {
        Self::Entry {
            index,
            expr,
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping positional wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Self::Entry { source, .. } => source.root(),
            other => other,
        }
    }
}
