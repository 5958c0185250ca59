use crate::response::StatusCode;

/// This is the enumeration of all the different kinds of errors which this
/// crate generates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request body grew past the length declared in the
    /// `Content-Length` header.
    #[error("request body of {received} bytes exceeds declared Content-Length {declared}")]
    ContentLengthMismatch {
        declared: usize,
        received: usize,
    },

    /// The `Content-Length` header value is not a non-negative integer.
    #[error("malformed Content-Length header value")]
    ContentLengthMalformed(#[source] std::num::ParseIntError),

    /// The attached header line has no colon separating name from value.
    #[error("header line is missing a colon")]
    HeaderLineMissingColon(String),

    /// The peer closed the stream before the request was fully framed.
    #[error("incomplete request")]
    IncompleteRequest,

    /// The attached field name is empty, contains characters outside the
    /// HTTP token set, or is followed by whitespace before its colon.
    #[error("invalid header field name: {0:?}")]
    InvalidHeaderName(String),

    /// The underlying stream failed.
    #[error("I/O error on connection")]
    Io(#[from] std::io::Error),

    /// The attached request line has the wrong number of tokens, a method
    /// that is not all uppercase letters, or a version other than
    /// `HTTP/1.1`.
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    /// A writer method was called while the writer was in a state which
    /// does not accept it.
    #[error("{operation} called out of order (writer is in state {state})")]
    OutOfOrderWrite {
        operation: &'static str,
        state: &'static str,
    },

    /// The request was asked to parse more input after it was done.
    #[error("request parser invoked after the request was complete")]
    ParseAfterDone,

    /// The attached bytes did not parse as valid text for the HTTP request
    /// line.
    #[error("request line is not valid text")]
    RequestLineNotValidText(Vec<u8>),

    /// The writer only knows the reason phrases of a fixed set of codes.
    #[error("unsupported status code {0}")]
    UnsupportedStatusCode(u16),
}

impl Error {
    /// Pick the status code of the error response sent back to a peer whose
    /// request failed with this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::ContentLengthMalformed(_)
            | Error::ContentLengthMismatch { .. }
            | Error::HeaderLineMissingColon(_)
            | Error::IncompleteRequest
            | Error::InvalidHeaderName(_)
            | Error::MalformedRequestLine(_)
            | Error::RequestLineNotValidText(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
