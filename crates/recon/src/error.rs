use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconError {
    /// Required input is missing, has the wrong shape, or breaks a precondition
    /// (empty or unordered date sequence, ledger document that is not an array).
    InvalidInput(String),
    /// A date string that does not parse in the expected layout.
    DateParse { value: String, expected: &'static str },
    /// CSV / JSON document could not be read.
    Parse(String),
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (duplicate aircraft type, unknown location, etc.).
    ConfigValidation(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::DateParse { value, expected } => {
                write!(f, "cannot parse date '{value}' (expected {expected})")
            }
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
