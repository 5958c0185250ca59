use std::io::Write;
use super::{
    error::Error,
    headers::HeaderTable,
    CRLF,
};

/// The status code of a response.  Only the codes which have constants here
/// are known to [`ResponseWriter`](struct.ResponseWriter.html).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    #[must_use]
    pub fn reason_phrase(self) -> Option<&'static str> {
        match self {
            Self::OK => Some("OK"),
            Self::BAD_REQUEST => Some("Bad Request"),
            Self::INTERNAL_SERVER_ERROR => Some("Internal Server Error"),
            _ => None,
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Build the header set most responses start from: `Content-Length` for a
/// body of `content_length` bytes, `Connection: close` and
/// `Content-Type: text/plain`.
#[must_use]
pub fn default_headers(content_length: usize) -> HeaderTable {
    let mut headers = HeaderTable::new();
    headers.set("Content-Length", content_length.to_string());
    headers.set("Connection", "close");
    headers.set("Content-Type", "text/plain");
    headers
}

/// Which part of the response the writer will accept next.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriterState {
    StatusLine,
    Headers,
    Body,
    Trailers,
    Complete,
}

impl WriterState {
    fn name(self) -> &'static str {
        match self {
            WriterState::StatusLine => "StatusLine",
            WriterState::Headers => "Headers",
            WriterState::Body => "Body",
            WriterState::Trailers => "Trailers",
            WriterState::Complete => "Complete",
        }
    }
}

/// Writes a response onto a byte sink, one part at a time, refusing any call
/// made out of order.
///
/// The order is status line, headers, then either a body written whole or a
/// series of chunks ended by [`write_chunked_body_done`] and
/// [`write_trailers`].  A refused call writes nothing.
///
/// [`write_chunked_body_done`]: #method.write_chunked_body_done
/// [`write_trailers`]: #method.write_trailers
#[derive(Debug)]
pub struct ResponseWriter<W> {
    sink: W,
    state: WriterState,
}

impl<W> ResponseWriter<W>
    where W: Write
{
    fn expect_state(
        &self,
        expected: WriterState,
        operation: &'static str
    ) -> Result<(), Error> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::OutOfOrderWrite{
                operation,
                state: self.state.name(),
            })
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    pub fn new(sink: W) -> Self {
        Self{
            sink,
            state: WriterState::StatusLine,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Write raw body bytes.  Nothing checks that they add up to the
    /// `Content-Length` sent with the headers.
    pub fn write_body<B>(&mut self, body: B) -> Result<(), Error>
        where B: AsRef<[u8]>
    {
        self.expect_state(WriterState::Body, "write_body")?;
        self.sink.write_all(body.as_ref())?;
        Ok(())
    }

    /// Write one chunk of a chunked body.  An empty chunk writes nothing,
    /// since a zero-length chunk would end the body.
    pub fn write_chunked_body<B>(&mut self, chunk: B) -> Result<(), Error>
        where B: AsRef<[u8]>
    {
        self.expect_state(WriterState::Body, "write_chunked_body")?;
        let chunk = chunk.as_ref();
        if chunk.is_empty() {
            return Ok(());
        }
        let mut output = format!("{:x}{}", chunk.len(), CRLF).into_bytes();
        output.extend_from_slice(chunk);
        output.extend_from_slice(CRLF.as_bytes());
        self.sink.write_all(&output)?;
        Ok(())
    }

    /// Write the zero-length chunk which ends a chunked body.  Trailers must
    /// follow.
    pub fn write_chunked_body_done(&mut self) -> Result<(), Error> {
        self.expect_state(WriterState::Body, "write_chunked_body_done")?;
        self.sink.write_all(format!("0{}", CRLF).as_bytes())?;
        self.state = WriterState::Trailers;
        Ok(())
    }

    pub fn write_headers(&mut self, headers: &HeaderTable) -> Result<(), Error> {
        self.expect_state(WriterState::Headers, "write_headers")?;
        headers.write_to(&mut self.sink)?;
        self.state = WriterState::Body;
        Ok(())
    }

    pub fn write_status_line(&mut self, status_code: StatusCode) -> Result<(), Error> {
        self.expect_state(WriterState::StatusLine, "write_status_line")?;
        let reason_phrase = status_code.reason_phrase()
            .ok_or(Error::UnsupportedStatusCode(status_code.0))?;
        let status_line = format!("HTTP/1.1 {} {}{}", status_code, reason_phrase, CRLF);
        self.sink.write_all(status_line.as_bytes())?;
        self.state = WriterState::Headers;
        Ok(())
    }

    /// Write the trailer fields after a chunked body.  This must be called
    /// even with an empty table, to end the message.
    pub fn write_trailers(&mut self, trailers: &HeaderTable) -> Result<(), Error> {
        self.expect_state(WriterState::Trailers, "write_trailers")?;
        trailers.write_to(&mut self.sink)?;
        self.state = WriterState::Complete;
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    // Records each call to `write` separately.
    #[derive(Default)]
    struct WriteLog {
        writes: Vec<Vec<u8>>,
    }

    impl Write for WriteLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.writes.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    // Concatenate the payloads of a chunked body, stopping at the
    // zero-length chunk.
    fn chunk_payloads(mut framed: &[u8]) -> Vec<u8> {
        let mut payloads = Vec::new();
        loop {
            let size_end = crate::find_crlf(framed).unwrap();
            let size = std::str::from_utf8(&framed[..size_end]).unwrap();
            let size = usize::from_str_radix(size, 16).unwrap();
            framed = &framed[size_end + CRLF.len()..];
            if size == 0 {
                return payloads;
            }
            payloads.extend_from_slice(&framed[..size]);
            assert_eq!(CRLF.as_bytes(), &framed[size..size + CRLF.len()]);
            framed = &framed[size + CRLF.len()..];
        }
    }

    #[test]
    fn write_plain_response() {
        let body = "Hello World! My payload includes a trailing CRLF.\r\n";
        let mut writer = ResponseWriter::new(Vec::new());
        writer.write_status_line(StatusCode::OK).unwrap();
        writer.write_headers(&default_headers(body.len())).unwrap();
        writer.write_body(body).unwrap();
        assert_eq!(WriterState::Body, writer.state());
        assert_eq!(
            format!(
                concat!(
                    "HTTP/1.1 200 OK\r\n",
                    "content-length: {}\r\n",
                    "connection: close\r\n",
                    "content-type: text/plain\r\n",
                    "\r\n",
                    "Hello World! My payload includes a trailing CRLF.\r\n",
                ),
                body.len()
            ).as_bytes(),
            &writer.into_inner()[..]
        );
    }

    #[test]
    fn status_lines() {
        for (status_code, expected) in [
            (StatusCode::OK, "HTTP/1.1 200 OK\r\n"),
            (StatusCode::BAD_REQUEST, "HTTP/1.1 400 Bad Request\r\n"),
            (StatusCode::INTERNAL_SERVER_ERROR, "HTTP/1.1 500 Internal Server Error\r\n"),
        ] {
            let mut writer = ResponseWriter::new(Vec::new());
            writer.write_status_line(status_code).unwrap();
            assert_eq!(expected.as_bytes(), &writer.into_inner()[..]);
        }
    }

    #[test]
    fn unknown_status_code_writes_nothing() {
        let mut writer = ResponseWriter::new(Vec::new());
        assert!(matches!(
            writer.write_status_line(StatusCode(404)),
            Err(Error::UnsupportedStatusCode(404))
        ));
        assert_eq!(WriterState::StatusLine, writer.state());
        assert!(writer.get_ref().is_empty());
    }

    #[test]
    fn write_chunked_response() {
        let mut writer = ResponseWriter::new(Vec::new());
        writer.write_status_line(StatusCode::OK).unwrap();
        let mut headers = default_headers(0);
        headers.delete("Content-Length");
        headers.set("Transfer-Encoding", "chunked");
        headers.set("Trailer", "X-Content-Length");
        writer.write_headers(&headers).unwrap();
        let head_length = writer.get_ref().len();
        writer.write_chunked_body("abc").unwrap();
        writer.write_chunked_body("").unwrap();
        writer.write_chunked_body("de").unwrap();
        writer.write_chunked_body_done().unwrap();
        assert_eq!(
            b"3\r\nabc\r\n2\r\nde\r\n0\r\n",
            &writer.get_ref()[head_length..]
        );
        let mut trailers = HeaderTable::new();
        trailers.set("X-Content-Length", "5");
        writer.write_trailers(&trailers).unwrap();
        assert_eq!(WriterState::Complete, writer.state());
        let output = writer.into_inner();
        assert!(output.ends_with(b"0\r\nx-content-length: 5\r\n\r\n"));
        assert_eq!(b"abcde", &chunk_payloads(&output[head_length..])[..]);
    }

    #[test]
    fn status_line_is_one_write() {
        let mut writer = ResponseWriter::new(WriteLog::default());
        writer.write_status_line(StatusCode::INTERNAL_SERVER_ERROR).unwrap();
        writer.write_headers(&default_headers(0)).unwrap();
        assert_eq!(
            vec![b"HTTP/1.1 500 Internal Server Error\r\n".to_vec()],
            writer.get_ref().writes[..1].to_vec()
        );
        assert_eq!(2, writer.get_ref().writes.len());
    }

    #[test]
    fn empty_trailers_still_end_message() {
        let mut writer = ResponseWriter::new(Vec::new());
        writer.write_status_line(StatusCode::OK).unwrap();
        writer.write_headers(&HeaderTable::new()).unwrap();
        writer.write_chunked_body_done().unwrap();
        writer.write_trailers(&HeaderTable::new()).unwrap();
        assert_eq!(
            b"HTTP/1.1 200 OK\r\n\r\n0\r\n\r\n",
            &writer.into_inner()[..]
        );
    }

    #[test]
    fn headers_before_status_line_is_refused() {
        let mut writer = ResponseWriter::new(Vec::new());
        assert!(matches!(
            writer.write_headers(&default_headers(0)),
            Err(Error::OutOfOrderWrite{operation: "write_headers", state: "StatusLine"})
        ));
        assert!(writer.get_ref().is_empty());
        assert_eq!(WriterState::StatusLine, writer.state());
    }

    #[test]
    fn body_before_headers_is_refused() {
        let mut writer = ResponseWriter::new(Vec::new());
        writer.write_status_line(StatusCode::OK).unwrap();
        let written = writer.get_ref().len();
        assert!(matches!(
            writer.write_body("hello"),
            Err(Error::OutOfOrderWrite{operation: "write_body", state: "Headers"})
        ));
        assert!(matches!(
            writer.write_chunked_body("hello"),
            Err(Error::OutOfOrderWrite{..})
        ));
        assert!(matches!(
            writer.write_chunked_body_done(),
            Err(Error::OutOfOrderWrite{..})
        ));
        assert_eq!(written, writer.get_ref().len());
    }

    #[test]
    fn trailers_only_after_chunked_body_done() {
        let mut writer = ResponseWriter::new(Vec::new());
        writer.write_status_line(StatusCode::OK).unwrap();
        writer.write_headers(&HeaderTable::new()).unwrap();
        writer.write_chunked_body("abc").unwrap();
        assert!(matches!(
            writer.write_trailers(&HeaderTable::new()),
            Err(Error::OutOfOrderWrite{operation: "write_trailers", state: "Body"})
        ));
        writer.write_chunked_body_done().unwrap();
        assert!(matches!(
            writer.write_chunked_body("more"),
            Err(Error::OutOfOrderWrite{..})
        ));
        writer.write_trailers(&HeaderTable::new()).unwrap();
        assert!(matches!(
            writer.write_trailers(&HeaderTable::new()),
            Err(Error::OutOfOrderWrite{state: "Complete", ..})
        ));
    }

    #[test]
    fn status_line_only_once() {
        let mut writer = ResponseWriter::new(Vec::new());
        writer.write_status_line(StatusCode::OK).unwrap();
        assert!(matches!(
            writer.write_status_line(StatusCode::OK),
            Err(Error::OutOfOrderWrite{..})
        ));
        assert_eq!(b"HTTP/1.1 200 OK\r\n", &writer.into_inner()[..]);
    }

}
