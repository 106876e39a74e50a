use thiserror::Error;

/// Failures of the datum codec and the AMM math.
///
/// Decode errors carry a field path such as `OrderDatum[6].SwapExactIn[2]` so a
/// bad datum can be traced back to the exact slot that broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Bytes that do not parse as a Plutus data value.
    #[error("malformed value: {0}")]
    MalformedValue(String),

    /// A value parsed, but is not what the field at this position must hold.
    #[error("unexpected shape at `{field}`: expected {expected}, found {found}")]
    UnexpectedShape {
        field: String,
        expected: String,
        found: String,
    },

    /// A constructor alternative outside the closed set a codec knows.
    #[error("unknown {kind} alternative {alternative} at `{field}`")]
    UnknownVariant {
        kind: &'static str,
        field: String,
        alternative: u64,
    },

    /// Order datum whose outer constructor tag is not 121.
    #[error("order datum must be tagged 121, found tag {tag}")]
    InvalidDatumShape { tag: u64 },

    /// Pool datum whose outer constructor tag is not 121.
    #[error("pool datum must be tagged 121, found tag {tag}")]
    WrongPoolTag { tag: u64 },

    /// Zero divisor, out of range tolerance, negative intermediate.
    #[error("arithmetic precondition violated: {0}")]
    ArithmeticPrecondition(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid asset: {0}")]
    InvalidAsset(String),

    #[error("unknown network `{0}`")]
    UnknownNetwork(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn shape(field: impl Into<String>, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Error::UnexpectedShape {
            field: field.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn precondition(msg: impl Into<String>) -> Self {
        Error::ArithmeticPrecondition(msg.into())
    }

    /// Prefix the field path of a decode error with the position of its parent.
    pub fn nested_in(self, parent: &str) -> Self {
        match self {
            Error::UnexpectedShape { field, expected, found } => Error::UnexpectedShape {
                field: join_path(parent, &field),
                expected,
                found,
            },
            Error::UnknownVariant { kind, field, alternative } => Error::UnknownVariant {
                kind,
                field: join_path(parent, &field),
                alternative,
            },
            other => other,
        }
    }

    /// Field path of a decode error, if it has one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::UnexpectedShape { field, .. } | Error::UnknownVariant { field, .. } => Some(field),
            _ => None,
        }
    }
}

fn join_path(parent: &str, child: &str) -> String {
    if child.is_empty() {
        parent.to_string()
    } else {
        format!("{}.{}", parent, child)
    }
}
