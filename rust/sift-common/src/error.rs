use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_format(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn corrupt_index(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::CorruptIndex {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn format_version(element: impl Into<String>, version: i32, min: i32, max: i32) -> Error {
        Error(
            ErrorKind::FormatVersion {
                element: element.into(),
                version,
                min,
                max,
            }
            .into(),
        )
    }

    pub fn checksum_mismatch(element: impl Into<String>, expected: u64, actual: u64) -> Error {
        Error(
            ErrorKind::ChecksumMismatch {
                element: element.into(),
                expected,
                actual,
            }
            .into(),
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    /// Returns `true` when the error indicates damaged or mismatched stored data,
    /// as opposed to caller misuse or an I/O failure.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidFormat { .. }
                | ErrorKind::CorruptIndex { .. }
                | ErrorKind::FormatVersion { .. }
                | ErrorKind::ChecksumMismatch { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("invalid storage format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("corrupt index: {message}")]
    CorruptIndex { message: String },

    #[error("unsupported format version {version} for '{element}' (expected {min}..={max})")]
    FormatVersion {
        element: String,
        version: i32,
        min: i32,
        max: i32,
    },

    #[error("checksum mismatch for '{element}': expected {expected:#018x}, actual {actual:#018x}")]
    ChecksumMismatch {
        element: String,
        expected: u64,
        actual: u64,
    },

    #[error("IO error for '{context}': {source}'")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(_: std::convert::Infallible) -> Self {
        Error::invalid_operation("conversion")
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind};

    #[test]
    fn test_io_error_conversion() {
        let e: Error = std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into();
        assert!(matches!(e.kind(), ErrorKind::Io { .. }));
        assert!(!e.is_data_error());
    }

    #[test]
    fn test_data_error_classification() {
        assert!(Error::corrupt_index("docs out of order").is_data_error());
        assert!(Error::format_version("doc", 7, 0, 2).is_data_error());
        assert!(Error::checksum_mismatch("pos", 1, 2).is_data_error());
        assert!(!Error::invalid_arg("target", "negative").is_data_error());
        let msg = Error::format_version("doc", 7, 0, 2).to_string();
        assert!(msg.contains("7"), "{msg}");
    }
}
