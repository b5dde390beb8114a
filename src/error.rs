use std::{error::Error, fmt, io};

use machine_learning::MlErr;

use crate::net_builder::NetBuilderKind;

/// The result type used across the net builder crate.
pub type Result<T> = std::result::Result<T, NetBuilderErr>;

/// Failures while building q-networks and serving modules.
#[derive(Debug)]
pub enum NetBuilderErr {
    /// A normalization entry is missing the statistics its feature type needs.
    MalformedNormalization { feature_id: i32, reason: String },
    /// A builder or feature configuration is invalid.
    InvalidConfig(String),
    /// No builder is registered for the requested configuration kind.
    UnknownBuilder(NetBuilderKind),
    /// A builder is already registered for this configuration kind.
    DuplicateBuilder(NetBuilderKind),
    /// The default serving path was asked to serve id-list features.
    UnexpectedIdListFeatures { count: usize },
    /// A declared id-list feature is absent from the serving input.
    MissingIdListFeature { feature_id: i32 },
    /// The network's output width doesn't match the amount of action names.
    ActionCountMismatch { got: usize, expected: usize },
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    Ml(MlErr),
    Json(serde_json::Error),
    Io(io::Error),
}

impl fmt::Display for NetBuilderErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedNormalization { feature_id, reason } => {
                write!(f, "malformed normalization for feature {feature_id}: {reason}")
            }
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::UnknownBuilder(kind) => write!(f, "no net builder registered for {kind}"),
            Self::DuplicateBuilder(kind) => {
                write!(f, "a net builder is already registered for {kind}")
            }
            Self::UnexpectedIdListFeatures { count } => write!(
                f,
                "the feature config declares {count} id-list feature(s) but the builder \
                 doesn't support them"
            ),
            Self::MissingIdListFeature { feature_id } => {
                write!(f, "id-list feature {feature_id} is missing from the input")
            }
            Self::ActionCountMismatch { got, expected } => write!(
                f,
                "the network outputs {got} q-value(s) but {expected} action name(s) were given"
            ),
            Self::ShapeMismatch {
                what,
                got,
                expected,
            } => write!(f, "shape mismatch for {what}: got {got}, expected {expected}"),
            Self::Ml(e) => write!(f, "model error: {e}"),
            Self::Json(e) => write!(f, "json error: {e}"),
            Self::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for NetBuilderErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Ml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MlErr> for NetBuilderErr {
    fn from(e: MlErr) -> Self {
        Self::Ml(e)
    }
}

impl From<serde_json::Error> for NetBuilderErr {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<io::Error> for NetBuilderErr {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
