use std::error::Error as StdError;
use std::fmt;

use tracing_error::{SpanTrace, SpanTraceStatus};

/* 📖 # Why a custom error type and not use anyhow/eyre/thiserror etc?

- Better control over how errors turn into `{ "error": ... }` response bodies
- No dependencies to compile and integrate
- More transparency into error handling logic
 */

/// Error variants that can occur while simulating the backend.
/// Each variant represents a specific error category with its associated context.
#[derive(Debug)]
pub enum ErrorKind {
    /// A request URL could not be resolved into addressing information
    UrlParse { url: String, message: String },

    /// A request body was not the JSON shape the handler expects
    MalformedBody { message: String },

    /// A filter pattern did not compile into a regular expression
    InvalidFilter { pattern: String, message: String },

    /// The engine was asked to do something its configuration cannot support
    BadConfiguration { message: String },

    /// The seed provider could not build a collection store
    Seed { message: String },

    /// Catch-all for other errors with a message
    Message { message: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::UrlParse { url, message } => {
                write!(f, "unable to parse url '{}'; original error: {}", url, message)
            }
            ErrorKind::MalformedBody { message } => write!(f, "Malformed request body: {}", message),
            ErrorKind::InvalidFilter { pattern, message } => {
                write!(f, "Invalid filter pattern '{}': {}", pattern, message)
            }
            ErrorKind::BadConfiguration { message } => write!(f, "Bad configuration: {}", message),
            ErrorKind::Seed { message } => write!(f, "Unable to create database: {}", message),
            ErrorKind::Message { message } => write!(f, "{}", message),
        }
    }
}

/* 📖 # Why separate ErrorKind and MockApiError?
ErrorKind carries the structural variant; MockApiError adds the runtime context strings,
an optional cause and the span trace captured where the error was created. Callers match on
`kind()` and the dispatcher only needs `Display`.
*/

/// Error type wrapping ErrorKind with context, an optional cause and a span trace.
pub struct MockApiError {
    kind: ErrorKind,
    context: Vec<String>,
    cause: Option<Box<MockApiError>>,
    span_trace: SpanTrace,
}

impl MockApiError {
    /// Creates a new error from an ErrorKind, capturing the current span trace.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: vec![],
            cause: None,
            span_trace: SpanTrace::capture(),
        }
    }

    /// Creates a `Message` error.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Message {
            message: message.into(),
        })
    }

    /// Attaches context to an error.
    /// Context is displayed before the error message.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Attaches context using lazy evaluation.
    pub fn with_context<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> String,
    {
        self.context.push(f());
        self
    }

    /// Records the error that led to this one.
    pub fn caused_by(mut self, cause: MockApiError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Returns a reference to the underlying ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the attached context strings, oldest first.
    pub fn get_context(&self) -> &[String] {
        &self.context
    }

    /// Returns the span trace captured when the error was created.
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        writeln!(f, "{}", self.kind)?;
        let cause_count = usize::from(self.cause.is_some());
        let total = self.context.len() + cause_count;
        for (i, ctx) in self.context.iter().enumerate() {
            let branch = if i + 1 == total { "└─" } else { "├─" };
            writeln!(f, "{}{} {}", indent, branch, ctx)?;
        }
        if let Some(cause) = &self.cause {
            write!(f, "{}└─ cause: ", indent)?;
            cause.fmt_tree(f, &format!("{}   ", indent))?;
        }
        Ok(())
    }
}

impl From<ErrorKind> for MockApiError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl StdError for MockApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

impl fmt::Display for MockApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ctx in &self.context {
            write!(f, "{}: ", ctx)?;
        }
        write!(f, "{}", self.kind)
    }
}

impl fmt::Debug for MockApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, "")?;
        if self.span_trace.status() == SpanTraceStatus::CAPTURED {
            writeln!(f, "Trace: {}", self.span_trace)?;
        }
        Ok(())
    }
}

/* 📖 # Why use Box<MockApiError> in the result type?

Boxing the error keeps `Result` small on the success path, which is every CRUD call.
*/

/// Standard result type for mockrest operations.
pub type MockApiResult<T> = std::result::Result<T, Box<MockApiError>>;

/// Extension trait for attaching context to Results.
pub trait ResultExt<T> {
    /// Attaches context to an error, consuming and re-wrapping it.
    fn context(self, context: impl Into<String>) -> MockApiResult<T>;

    /// Attaches context using lazy evaluation.
    /// Context is only evaluated if the result is an error.
    fn with_context<F>(self, f: F) -> MockApiResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for MockApiResult<T> {
    fn context(self, context: impl Into<String>) -> MockApiResult<T> {
        self.map_err(|err| Box::new(err.context(context)))
    }

    fn with_context<F>(self, f: F) -> MockApiResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| Box::new(err.with_context(f)))
    }
}

/// Build a boxed `Message` error from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        Box::new($crate::error::MockApiError::message(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_message() {
        let error = MockApiError::message("something went wrong");

        match error.kind() {
            ErrorKind::Message { message } => {
                assert_eq!(message, "something went wrong");
            }
            _ => panic!("Expected Message variant"),
        }
    }

    #[test]
    fn test_error_display_with_multiple_contexts() {
        let error = MockApiError::message("root error")
            .context("first")
            .context("second");
        assert_eq!(error.to_string(), "first: second: root error");
        assert_eq!(error.get_context(), ["first", "second"]);
    }

    #[test]
    fn test_url_parse_display() {
        let error = MockApiError::new(ErrorKind::UrlParse {
            url: "http://[".to_string(),
            message: "invalid IPv6 address".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "unable to parse url 'http://['; original error: invalid IPv6 address"
        );
    }

    #[test]
    fn test_invalid_filter_display() {
        let error = MockApiError::new(ErrorKind::InvalidFilter {
            pattern: "(".to_string(),
            message: "unclosed group".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "Invalid filter pattern '(': unclosed group"
        );
    }

    #[test]
    fn test_source_is_cause() {
        let error = MockApiError::message("outer").caused_by(MockApiError::message("inner"));
        assert_eq!(error.source().map(|e| e.to_string()), Some("inner".into()));
        assert!(MockApiError::message("alone").source().is_none());
    }

    #[test]
    fn test_result_ext_chaining() {
        let result: MockApiResult<i32> = Err(crate::err!("root"));
        let err = result
            .context("step 1")
            .with_context(|| "step 2".to_string())
            .unwrap_err();
        assert_eq!(err.to_string(), "step 1: step 2: root");
    }

    #[test]
    fn test_result_ext_success_untouched() {
        let result: MockApiResult<i32> = Ok(42);
        assert_eq!(result.context("never shown").unwrap(), 42);
    }

    #[test]
    fn test_err_macro_formats() {
        let error = crate::err!("Unknown command \"{}\"", "nuke");
        assert_eq!(error.to_string(), "Unknown command \"nuke\"");
    }
}
