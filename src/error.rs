use thiserror::Error;

/// Errors raised by the content script and its page backends
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The host page no longer contains an element the script expects
    #[error("element does not exist (did the site change?): {0}")]
    ElementMissing(String),

    /// A selector string could not be parsed
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// A page backend operation failed
    #[error("page operation failed: {0}")]
    PageOperationFailed(String),

    /// The document was replaced (reload or navigation) and took our observers with it
    #[error("page was unloaded")]
    PageUnloaded,

    /// An unknown hook id was passed to the page
    #[error("unknown hook: {0}")]
    UnknownHook(u64),

    /// A message on the background channel or the window bus did not decode
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The background channel is gone
    #[error("channel closed")]
    ChannelClosed,

    /// Browser launch failed
    #[error("failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Connecting to a running browser failed
    #[error("failed to connect to browser: {0}")]
    ConnectionFailed(String),

    /// Tab lookup or creation failed
    #[error("tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScriptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_missing_message() {
        let err = ScriptError::ElementMissing("#vslider".to_string());
        assert_eq!(err.to_string(), "element does not exist (did the site change?): #vslider");
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: ScriptError = parse.unwrap_err().into();
        assert!(matches!(err, ScriptError::Json(_)));
    }
}
