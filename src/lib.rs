#![warn(clippy::pedantic)]
#![allow(clippy::non_ascii_literal)]
#![allow(clippy::missing_errors_doc)]

mod buffer;
mod error;
mod headers;
mod request;
mod response;
mod server;

pub use crate::buffer::ReadBuffer;
pub use crate::error::Error;
pub use crate::headers::HeaderTable;
pub use crate::request::{
    Request,
    RequestLine,
    RequestState,
};
pub use crate::response::{
    default_headers,
    ResponseWriter,
    StatusCode,
    WriterState,
};
pub use crate::server::{
    handle_connection,
    Handler,
    Server,
};

// This is the character sequence corresponding to a carriage return (CR)
// followed by a line feed (LF), which officially delimits each
// line of an HTTP request.
const CRLF: &str = "\r\n";

/// Whether a parse call finished the element it was working on, or needs
/// more input first.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseStatus {
    Complete,
    Incomplete,
}

fn find_crlf<T>(message: T) -> Option<usize>
    where T: AsRef<[u8]>
{
    message.as_ref()
        .windows(CRLF.len())
        .position(|window| window == CRLF.as_bytes())
}
