//! Minimal server which answers every request with a plain-text summary of
//! what it received.  It runs until standard input is closed or a line is
//! entered.

use clap::Parser;
use std::net::TcpStream;
use tracing_subscriber::{
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use wirehttp::{
    default_headers,
    Request,
    ResponseWriter,
    Server,
    StatusCode,
};

#[derive(Parser)]
#[command(name = "httpserver")]
#[command(about = "Serve HTTP/1.1 requests straight off TCP connections", long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value_t = 42069)]
    port: u16,

    /// Address of the interface to listen on
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,
}

fn summarize(request: &Request) -> String {
    let mut summary = format!(
        "{} {} HTTP/{}\n",
        request.request_line.method,
        request.request_line.target,
        request.request_line.version
    );
    for (name, value) in request.headers.iter() {
        summary.push_str(&format!("{}: {}\n", name, value));
    }
    summary.push_str(&format!("body: {} bytes\n", request.body.len()));
    summary
}

fn respond(
    writer: &mut ResponseWriter<TcpStream>,
    request: &Request
) -> Result<(), wirehttp::Error> {
    let body = summarize(request);
    writer.write_status_line(StatusCode::OK)?;
    writer.write_headers(&default_headers(body.len()))?;
    writer.write_body(body)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wirehttp=info,httpserver=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut server = Server::serve_on((cli.bind.as_str(), cli.port), |writer, request| {
        if let Err(error) = respond(writer, request) {
            tracing::warn!(%error, "Unable to write response");
        }
    })?;
    tracing::info!(address = %server.local_addr(), "Server started; press Enter to stop");

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    server.close()?;
    Ok(())
}
