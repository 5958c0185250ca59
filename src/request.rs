use std::io::Read;
use super::{
    buffer::ReadBuffer,
    error::Error,
    find_crlf,
    headers::HeaderTable,
    ParseStatus,
    CRLF,
};

// The only protocol this parser understands.
const PROTOCOL: &str = "HTTP/1.1";

fn parse_request_line(request_line: &str) -> Result<RequestLine, Error> {
    let mut tokens = request_line.split(' ');
    match (tokens.next(), tokens.next(), tokens.next(), tokens.next()) {
        (Some(method), Some(target), Some(protocol), None)
            if !method.is_empty()
            && method.bytes().all(|c| c.is_ascii_uppercase())
            && !target.is_empty()
            && protocol == PROTOCOL
        => Ok(RequestLine{
            method: method.into(),
            target: target.into(),
            version: PROTOCOL["HTTP/".len()..].into(),
        }),
        _ => Err(Error::MalformedRequestLine(request_line.into())),
    }
}

/// The first line of a request.  `version` holds only the version digits,
/// e.g. `"1.1"`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    pub version: String,
}

/// Where the parser is within the request.  States only ever move forward.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RequestState {
    Initialized,
    ParsingHeaders,
    ParsingBody,
    Done,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Request {
    pub body: Vec<u8>,
    pub headers: HeaderTable,
    pub request_line: RequestLine,
    state: RequestState,
}

impl Request {
    /// Read from `reader` until one whole request has been parsed.
    ///
    /// Bytes are read into a small buffer which grows as needed and which
    /// is offered to [`parse`](#method.parse) after every read.  If the
    /// stream ends before the request is done,
    /// [`Error::IncompleteRequest`](enum.Error.html#variant.IncompleteRequest)
    /// is returned.  Any bytes which follow the request are discarded.
    pub fn from_reader<R>(mut reader: R) -> Result<Self, Error>
        where R: Read
    {
        let mut buffer = ReadBuffer::new();
        let mut request = Self::new();
        loop {
            if buffer.read_from(&mut reader)? == 0 {
                return Err(Error::IncompleteRequest);
            }
            let (status, consumed) = request.parse(buffer.filled())?;
            buffer.consume(consumed);
            if status == ParseStatus::Complete {
                return Ok(request);
            }
        }
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == RequestState::Done
    }

    #[must_use]
    pub fn new() -> Self {
        Self{
            body: Vec::new(),
            headers: HeaderTable::new(),
            request_line: RequestLine::default(),
            state: RequestState::Initialized,
        }
    }

    /// Parse as much of `raw_message` as possible, returning how many bytes
    /// were consumed and whether the request is now done.  Unconsumed bytes
    /// must be offered again, with more appended, on the next call.
    pub fn parse<T>(
        &mut self,
        raw_message: T
    ) -> Result<(ParseStatus, usize), Error>
        where T: AsRef<[u8]>
    {
        if self.is_done() {
            return Err(Error::ParseAfterDone);
        }
        let raw_message = raw_message.as_ref();
        let mut total_consumed = 0;
        loop {
            let consumed = self.parse_single(&raw_message[total_consumed..])?;
            total_consumed += consumed;
            if self.is_done() {
                return Ok((ParseStatus::Complete, total_consumed));
            }
            if consumed == 0 {
                return Ok((ParseStatus::Incomplete, total_consumed));
            }
        }
    }

    fn parse_message_for_body(
        &mut self,
        raw_message: &[u8]
    ) -> Result<usize, Error> {
        let declared = match self.headers.get("Content-Length") {
            Some(content_length) => content_length.parse::<usize>()
                .map_err(Error::ContentLengthMalformed)?,
            None => {
                self.state = RequestState::Done;
                return Ok(0);
            },
        };
        self.body.extend_from_slice(raw_message);
        if self.body.len() > declared {
            return Err(Error::ContentLengthMismatch{
                declared,
                received: self.body.len(),
            });
        }
        if self.body.len() == declared {
            self.state = RequestState::Done;
        }
        Ok(raw_message.len())
    }

    fn parse_message_for_headers(
        &mut self,
        raw_message: &[u8]
    ) -> Result<usize, Error> {
        let (status, consumed) = self.headers.parse(raw_message)?;
        if status == ParseStatus::Complete {
            self.state = RequestState::ParsingBody;
        }
        Ok(consumed)
    }

    fn parse_message_for_request_line(
        &mut self,
        raw_message: &[u8]
    ) -> Result<usize, Error> {
        match find_crlf(raw_message) {
            Some(request_line_end) => {
                let request_line = &raw_message[..request_line_end];
                let request_line = std::str::from_utf8(request_line)
                    .map_err(|_| Error::RequestLineNotValidText(request_line.to_vec()))?;
                self.request_line = parse_request_line(request_line)?;
                self.state = RequestState::ParsingHeaders;
                Ok(request_line_end + CRLF.len())
            },
            None => Ok(0),
        }
    }

    fn parse_single(
        &mut self,
        raw_message: &[u8]
    ) -> Result<usize, Error> {
        match self.state {
            RequestState::Initialized => {
                self.parse_message_for_request_line(raw_message)
            },
            RequestState::ParsingHeaders => {
                self.parse_message_for_headers(raw_message)
            },
            RequestState::ParsingBody => {
                self.parse_message_for_body(raw_message)
            },
            RequestState::Done => Err(Error::ParseAfterDone),
        }
    }

    #[must_use]
    pub fn state(&self) -> RequestState {
        self.state
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}
