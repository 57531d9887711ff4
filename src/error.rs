/// Failure categories surfaced by the pipeline.
///
/// The first four are the contract-level failures of the core transformations;
/// the rest come from the surrounding I/O layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source JSON or persisted CSV is malformed or missing fields.
    DataFormat,
    /// Not enough rows/windows for the requested operation.
    InsufficientData,
    /// A scaler or model was used before fit/load.
    NotFitted,
    /// An expected scaler/model file is absent.
    MissingArtifact,
    Io,
    Network,
    Config,
}

impl ErrorKind {
    fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Config => 2,
            ErrorKind::DataFormat | ErrorKind::InsufficientData => 3,
            ErrorKind::Io | ErrorKind::Network => 4,
            ErrorKind::NotFitted | ErrorKind::MissingArtifact => 5,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            exit_code: kind.exit_code(),
            message: message.into(),
        }
    }

    pub fn data_format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataFormat, message)
    }

    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientData, message)
    }

    pub fn not_fitted(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFitted, message)
    }

    pub fn missing_artifact(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingArtifact, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
