use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport initialization failed: {0}")]
    InitializationFailed(String),

    #[error("failed to send message: {0}")]
    SendFailed(String),

    #[error("failed to load conversation state: {0}")]
    StateLoadFailed(String),

    #[error("failed to save conversation state: {0}")]
    StateSaveFailed(String),

    #[error("transport not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum RecognizerError {
    #[error("recognizer initialization failed: {0}")]
    InitializationFailed(String),

    #[error("recognizer unavailable: {0}")]
    Unavailable(String),

    #[error("culture not supported by recognizer: {0}")]
    UnsupportedCulture(String),

    #[error("recognizer not found: {0}")]
    NotFound(String),
}

/// Infrastructure failures of a prompt turn.
///
/// Recognition outcomes such as `NotRecognized` are never reported here; they
/// travel as data inside `RecognitionResult`.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Recognizer(#[from] RecognizerError),

    #[error("prompt text must not be empty")]
    EmptyPrompt,

    #[error("turn cancelled")]
    Cancelled,
}
