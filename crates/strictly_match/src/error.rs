//! Location-tracking error structs.

/// Declares an error struct that records where it was created.
///
/// The display form is `"<prefix>: <message> at <file>:<line>"`.
macro_rules! located_error {
    ($(#[$attr:meta])* $vis:vis struct $name:ident, $prefix:tt) => {
        $(#[$attr])*
        #[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
        #[display("{}: {} at {}:{}", $prefix, message, file, line)]
        $vis struct $name {
            /// Error message.
            pub message: String,
            /// Line number where error occurred.
            pub line: u32,
            /// Source file where error occurred.
            pub file: &'static str,
        }

        impl $name {
            /// Creates the error, recording the caller's location.
            #[track_caller]
            #[tracing::instrument(skip(message))]
            pub fn new(message: impl Into<String>) -> Self {
                let loc = std::panic::Location::caller();
                Self {
                    message: message.into(),
                    line: loc.line(),
                    file: loc.file(),
                }
            }
        }
    };
}

pub(crate) use located_error;

#[cfg(test)]
mod tests {
    located_error!(
        /// Error used only here.
        struct SampleError,
        "Sample error"
    );

    #[test]
    fn test_records_caller_location() {
        let err = SampleError::new("boom");
        assert_eq!(err.message, "boom");
        assert_eq!(err.file, file!());
        assert_eq!(err.line, line!() - 3);
        assert_eq!(
            err.to_string(),
            format!("Sample error: boom at {}:{}", file!(), err.line)
        );
    }
}
