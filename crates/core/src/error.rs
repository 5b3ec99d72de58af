/// Result alias that carries the custom [`DeckError`] type.
pub type Result<T> = std::result::Result<T, DeckError>;

/// Common error type for the core crate.
///
/// Frame steps and tone playback never return these; they degrade silently.
/// The variants cover configuration loading, graph construction and the
/// offline export paths used by the command line front end.
#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    /// Free-form message for failures without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// An audio parameter automation request the host model would reject.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("wav export failed: {0}")]
    Wav(#[from] hound::Error),
    #[error("fft failed: {0}")]
    Fft(#[from] realfft::FftError),
}

impl DeckError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<&str> for DeckError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for DeckError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
