use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad threshold, zero retention, bad cell reference, etc.).
    ConfigValidation(String),
    /// A required cell or field is missing or cannot be parsed.
    InputFormat {
        file: String,
        line: usize,
        message: String,
    },
    /// A required input file does not exist.
    MissingFile(String),
    /// Two persisted records carry the same member id.
    DuplicateIdentity { file: String, id: i64 },
    /// IO error (file read, write, rename).
    Io(String),
}

impl ReconError {
    pub fn input(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::InputFormat {
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::InputFormat { file, line, message } => {
                write!(f, "'{file}', line {line}: {message}")
            }
            Self::MissingFile(path) => write!(f, "required file not found: {path}"),
            Self::DuplicateIdentity { file, id } => {
                write!(f, "'{file}': member id {id} appears more than once")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
