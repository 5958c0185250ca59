//! This module turns accepted TCP connections into request/response
//! exchanges.  Each connection carries exactly one request and is closed
//! once the response has been written.
//!
//! Reads and writes have no timeouts, so a peer which stops sending holds
//! its connection thread until it goes away.

use std::{
    io::{
        Read,
        Write,
    },
    net::{
        Ipv4Addr,
        Ipv6Addr,
        SocketAddr,
        TcpListener,
        TcpStream,
        ToSocketAddrs,
    },
    sync::{
        atomic::{
            AtomicBool,
            Ordering,
        },
        Arc,
    },
    thread::JoinHandle,
};
use super::{
    error::Error,
    request::Request,
    response::{
        default_headers,
        ResponseWriter,
    },
};

/// The function a [`Server`](struct.Server.html) calls with each
/// successfully parsed request and a writer for the response.
pub type Handler = dyn Fn(&mut ResponseWriter<TcpStream>, &Request) + Send + Sync;

fn write_error_response<W>(
    mut writer: ResponseWriter<W>,
    error: &Error
) -> Result<(), Error>
    where W: Write
{
    let body = format!("Error parsing request: {}", error);
    writer.write_status_line(error.status_code())?;
    writer.write_headers(&default_headers(body.len()))?;
    writer.write_body(body)?;
    writer.into_inner().flush()?;
    Ok(())
}

/// Parse one request from `stream` and answer it.
///
/// If the request parses, `handler` is given the request and a writer bound
/// to `stream`.  Otherwise a 400 or 500 response describing the failure is
/// written instead and the parse error is returned.  Either way `stream` is
/// dropped, closing the connection, before this returns.
pub fn handle_connection<S, H>(
    mut stream: S,
    handler: &H
) -> Result<(), Error>
    where
        S: Read + Write,
        H: Fn(&mut ResponseWriter<S>, &Request) + ?Sized
{
    match Request::from_reader(&mut stream) {
        Ok(request) => {
            tracing::debug!(
                method = %request.request_line.method,
                target = %request.request_line.target,
                body_length = request.body.len(),
                "Request parsed"
            );
            let mut writer = ResponseWriter::new(stream);
            handler(&mut writer, &request);
            writer.into_inner().flush()?;
            Ok(())
        },
        Err(error) => {
            tracing::warn!(%error, "Rejecting request");
            if let Err(write_error) = write_error_response(ResponseWriter::new(stream), &error) {
                tracing::debug!(error = %write_error, "Unable to send error response");
            }
            Err(error)
        },
    }
}

fn accept_connections(
    listener: &TcpListener,
    closed: &AtomicBool,
    handler: &Arc<Handler>
) {
    loop {
        match listener.accept() {
            Ok((stream, peer)) => {
                if closed.load(Ordering::SeqCst) {
                    return;
                }
                tracing::debug!(%peer, "Connection accepted");
                let handler = handler.clone();
                let spawned = std::thread::Builder::new()
                    .name(format!("http-{}", peer))
                    .spawn(move || {
                        if let Err(error) = handle_connection(stream, handler.as_ref()) {
                            tracing::debug!(%peer, %error, "Connection failed");
                        }
                    });
                if let Err(error) = spawned {
                    tracing::error!(%peer, %error, "Unable to start connection thread");
                }
            },
            Err(error) => {
                if closed.load(Ordering::SeqCst) {
                    return;
                }
                tracing::error!(%error, "Couldn't accept connection");
            },
        }
    }
}

/// A running listener which hands every accepted connection to its own
/// thread.
///
/// Dropping the server closes it.  Connections already being handled are
/// left to finish on their own.
pub struct Server {
    acceptor: Option<JoinHandle<()>>,
    closed: Arc<AtomicBool>,
    local_addr: SocketAddr,
}

impl Server {
    /// Stop accepting connections and release the listening socket.
    ///
    /// The closed flag is raised first, and then the acceptor is woken with
    /// a connection of its own, which it sees as the signal to exit.  If the
    /// acceptor can't be reached, the flag is lowered again so that a later
    /// call can retry.
    pub fn close(&mut self) -> Result<(), Error> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let mut wake_addr = self.local_addr;
        if wake_addr.ip().is_unspecified() {
            wake_addr.set_ip(match wake_addr {
                SocketAddr::V4(_) => Ipv4Addr::LOCALHOST.into(),
                SocketAddr::V6(_) => Ipv6Addr::LOCALHOST.into(),
            });
        }
        if let Err(error) = TcpStream::connect(wake_addr) {
            self.closed.store(false, Ordering::SeqCst);
            return Err(error.into());
        }
        if let Some(acceptor) = self.acceptor.take() {
            if acceptor.join().is_err() {
                tracing::error!("Acceptor thread panicked");
            }
        }
        tracing::info!(address = %self.local_addr, "Server closed");
        Ok(())
    }

    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Listen on `port` of every local interface.  Port 0 picks a free port,
    /// which [`local_addr`](#method.local_addr) reports.
    pub fn serve<H>(port: u16, handler: H) -> Result<Self, Error>
        where H: Fn(&mut ResponseWriter<TcpStream>, &Request) + Send + Sync + 'static
    {
        Self::serve_on((Ipv4Addr::UNSPECIFIED, port), handler)
    }

    pub fn serve_on<A, H>(address: A, handler: H) -> Result<Self, Error>
        where
            A: ToSocketAddrs,
            H: Fn(&mut ResponseWriter<TcpStream>, &Request) + Send + Sync + 'static
    {
        let listener = TcpListener::bind(address)?;
        let local_addr = listener.local_addr()?;
        let closed = Arc::new(AtomicBool::new(false));
        let handler: Arc<Handler> = Arc::new(handler);
        let acceptor = {
            let closed = closed.clone();
            std::thread::Builder::new()
                .name(format!("http-accept-{}", local_addr))
                .spawn(move || accept_connections(&listener, &closed, &handler))?
        };
        tracing::info!(address = %local_addr, "Listening for connections");
        Ok(Self{
            acceptor: Some(acceptor),
            closed,
            local_addr,
        })
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            tracing::error!(%error, "Unable to close server");
        }
    }
}
