//! Error handling for the engine.
//!
//! Every fallible operation returns [`Result`]. Arithmetic never reports
//! overflow: canonical residues are an internal invariant, so the only
//! runtime errors are bad inputs, decomposition defects and contention.

use std::fmt;

/// Engine error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FheError {
    /// Parameter, key or ciphertext shape mismatch, or an input outside its
    /// allowed range. Raised before any computation starts.
    Configuration(String),
    /// A gadget digit fell outside `[-base/2, base/2)`, or the value could not
    /// be represented in the configured number of digits.
    InvalidDigitRange {
        /// The offending value, centered.
        value: i64,
        /// Gadget base.
        base: u64,
        /// Gadget digit count.
        digits: usize,
    },
    /// The dispatcher already has a request in flight. Retry later.
    Busy,
    /// Key material could not be encoded or decoded.
    Serialization(String),
}

impl fmt::Display for FheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Self::InvalidDigitRange {
                value,
                base,
                digits,
            } => write!(
                f,
                "value {value} does not decompose into {digits} signed digits of base {base}"
            ),
            Self::Busy => write!(f, "engine busy: a request is already in flight"),
            Self::Serialization(msg) => write!(f, "serialization error: {msg}"),
        }
    }
}

impl std::error::Error for FheError {}

impl FheError {
    /// Create a configuration error with the given message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether the caller may simply retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

impl From<std::io::Error> for FheError {
    fn from(err: std::io::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for FheError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, FheError>;

/// Create a configuration error with format string support
macro_rules! config_err {
    ($($arg:tt)*) => {
        $crate::error::FheError::Configuration(format!($($arg)*))
    };
}

pub(crate) use config_err;

/// Return early with a configuration error unless the condition holds
macro_rules! ensure {
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::config_err!($($arg)*));
        }
    };
}

pub(crate) use ensure;
