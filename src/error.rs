pub type SlidecastResult<T> = Result<T, SlidecastError>;

#[derive(thiserror::Error, Debug)]
pub enum SlidecastError {
    /// Script document missing or malformed. Fatal for the run.
    #[error("script error: {0}")]
    Script(String),

    /// Bad configuration or geometry, caught before any output is written.
    #[error("validation error: {0}")]
    Validation(String),

    /// Final export failed. Fatal; the partial output file is removed.
    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SlidecastError {
    pub fn script(msg: impl Into<String>) -> Self {
        Self::Script(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            SlidecastError::script("x")
                .to_string()
                .contains("script error:")
        );
        assert!(
            SlidecastError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            SlidecastError::encode("x")
                .to_string()
                .contains("encode error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = SlidecastError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
