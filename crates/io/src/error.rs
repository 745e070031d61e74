use std::fmt;

#[derive(Debug)]
pub enum SourceError {
    /// Location string is neither a SQLite URL/path nor a CSV path.
    UnsupportedLocation(String),
    /// Opening or pinging the store failed.
    Connect { label: String, message: String },
    /// Reading the table (or applying the filter) failed.
    Fetch { label: String, table: String, message: String },
    /// Schema introspection failed.
    Introspect { label: String, table: String, message: String },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedLocation(loc) => write!(
                f,
                "unsupported location '{loc}' (expected sqlite:///path, a .db/.sqlite file, or a .csv file)"
            ),
            Self::Connect { label, message } => {
                write!(f, "failed to connect to {label}: {message}")
            }
            Self::Fetch { label, table, message } => {
                write!(f, "failed to fetch {table} from {label}: {message}")
            }
            Self::Introspect { label, table, message } => {
                write!(f, "cannot inspect {table} on {label}: {message}")
            }
        }
    }
}

impl std::error::Error for SourceError {}
