use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum EstimateError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (blank selection, duplicate part, bad rate, etc.).
    ConfigValidation(String),
    /// Filtering a schedule table by the vehicle selection left zero rows.
    NoMatchingContext { table: String, selection: String },
    /// An edit referenced a part that is not in the selection table.
    UnknownPart(String),
    /// The part table has not been confirmed yet.
    NotConfirmed,
    /// The confirmed part table holds no non-blank parts.
    NoParts,
}

impl fmt::Display for EstimateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::NoMatchingContext { table, selection } => {
                write!(f, "no matching data found for the selected inputs ({table} table, {selection})")
            }
            Self::UnknownPart(part) => write!(f, "part '{part}' is not in the selection table"),
            Self::NotConfirmed => write!(f, "parts and costs have not been confirmed"),
            Self::NoParts => write!(f, "no parts selected"),
        }
    }
}

impl std::error::Error for EstimateError {}
