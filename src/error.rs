use std::fmt;

/// Error kinds raised while rewriting selections as SAS URLs.
///
/// These travel inside `anyhow::Error` and are recovered by downcast where
/// the pipeline's tolerance policy needs to tell them apart.
#[derive(Debug)]
pub enum SignError {
    /// No selection was given, or the only selection is an empty cursor
    EmptySelection,

    /// Selected text is not a syntactically valid URL
    Parse(url::ParseError),

    /// URL does not have the expected account host or container/blob path
    Locator(String),

    /// User dismissed a prompt without providing a value
    UserInterrupted,

    /// The signing call failed (e.g. malformed account key)
    Signing(String),
}

impl SignError {
    /// The locator failure message shared by both extraction rules.
    pub fn locator() -> Self {
        SignError::Locator("cannot find account name, container, or blob".to_string())
    }
}

impl fmt::Display for SignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignError::EmptySelection => {
                write!(f, "nothing is selected; highlight a blob URI first")
            }
            SignError::Parse(err) => {
                write!(f, "selected text is not a valid URL: {}", err)
            }
            SignError::Locator(msg) => {
                write!(f, "{}", msg)
            }
            SignError::UserInterrupted => {
                write!(f, "user interrupted")
            }
            SignError::Signing(msg) => {
                write!(f, "signing failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for SignError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SignError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<url::ParseError> for SignError {
    fn from(err: url::ParseError) -> Self {
        SignError::Parse(err)
    }
}

/// True when the error (at any depth) is a prompt cancellation.
///
/// Cancellation aborts a run regardless of the selection-count tolerance
/// policy, so the pipeline checks this before swallowing per-entry errors.
pub fn is_interrupted(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<SignError>(),
            Some(SignError::UserInterrupted)
        )
    })
}
