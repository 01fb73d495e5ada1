pub type PhotoflatResult<T> = Result<T, PhotoflatError>;

#[derive(thiserror::Error, Debug)]
pub enum PhotoflatError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("evaluation error: {0}")]
    Evaluation(String),

    #[error("resource error: {0}")]
    Resource(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PhotoflatError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            PhotoflatError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            PhotoflatError::evaluation("x")
                .to_string()
                .contains("evaluation error:")
        );
        assert!(
            PhotoflatError::resource("x")
                .to_string()
                .contains("resource error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = PhotoflatError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
