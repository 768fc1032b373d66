//! HTTP server for the sales dashboard UI
//! Builds the report bundle once at start-up and serves it read-only as JSON.

use anyhow::Result;
use clap::Parser;
use sales_dashboard::config::{ConfigOverrides, DashboardConfig};
use sales_dashboard::observability::init_tracing;
use sales_dashboard::{DashboardBuilder, IngestionFormat, ReportBundle, Table};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

const MAX_REQUEST_BYTES: usize = 1_000_000;

#[derive(Parser)]
#[command(name = "server")]
#[command(about = "Serve the sales dashboard reports over HTTP")]
#[command(version)]
struct Args {
    /// Source file (default: SALES_DASHBOARD_INPUT or datasets/Financials.csv)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Ingestion format: csv, json or xml (default: from the file extension)
    #[arg(short, long)]
    format: Option<IngestionFormat>,

    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,
}

impl Args {
    fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            input: self.input,
            format: self.format,
            reports: None,
            host: self.host,
            port: self.port,
        }
    }
}

/// Immutable state shared by every connection
struct ServerState {
    bundle: ReportBundle,
    raw: Table,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = DashboardConfig::load(args.into_overrides())?;
    init_tracing(&config.log_level);

    info!("Building dashboard from {}", config.input.display());
    let dashboard = DashboardBuilder::from_config(&config).build()?;
    let state = Arc::new(ServerState {
        bundle: dashboard.bundle()?,
        raw: dashboard.raw().clone(),
    });

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Server listening on http://{}", address);

    loop {
        let (stream, addr) = listener.accept().await?;
        debug!("New connection from: {}", addr);
        tokio::spawn(handle_connection(stream, Arc::clone(&state)));
    }
}

async fn handle_connection(mut stream: TcpStream, state: Arc<ServerState>) {
    use tokio::time::{timeout, Duration};

    let mut buffer = Vec::new();
    let mut temp_buf = [0; 8192];

    let read_result = timeout(Duration::from_secs(5), async {
        loop {
            match stream.read(&mut temp_buf).await {
                Ok(0) => break,
                Ok(n) => {
                    buffer.extend_from_slice(&temp_buf[..n]);
                    // GET requests carry no body; the header terminator ends the read
                    if buffer.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                    if buffer.len() > MAX_REQUEST_BYTES {
                        break;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    })
    .await;

    match read_result {
        Err(_) => {
            warn!("Request read timeout");
            return;
        }
        Ok(Err(e)) => {
            warn!("Failed to read from stream: {}", e);
            return;
        }
        Ok(Ok(())) => {}
    }

    if buffer.is_empty() {
        return;
    }

    let response = match String::from_utf8(buffer) {
        Ok(request) => handle_request(&request, &state),
        Err(_) => create_response(400, "Bad Request", r#"{"error":"request is not UTF-8"}"#),
    };
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        warn!("Failed to write response: {}", e);
    }
}

fn handle_request(request: &str, state: &ServerState) -> String {
    let request_line = request.lines().next().unwrap_or_default();
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 {
        return create_response(400, "Bad Request", r#"{"error":"malformed request line"}"#);
    }

    let method = parts[0];
    let (path_str, query_string) = match parts[1].split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (parts[1], None),
    };

    let mut path = path_str.trim_end_matches('/');
    if path.is_empty() {
        path = "/";
    }
    info!("Request: {} {}", method, path);

    if method != "GET" {
        return create_response(405, "Method Not Allowed", r#"{"error":"only GET is supported"}"#);
    }

    match path {
        "/api/health" => create_response(200, "OK", r#"{"status":"ok","service":"sales-dashboard"}"#),
        "/api/reports" => json_response(&state.bundle),
        "/api/table" => {
            let selected = query_string
                .and_then(|q| query_param(q, "columns"))
                .map(parse_column_list);
            let table = match selected {
                Some(columns) => state.raw.select_visible(&columns),
                None => state.raw.clone(),
            };
            match table.to_records() {
                Ok(records) => json_response(&json!({
                    "columns": table.column_names(),
                    "records": records,
                })),
                Err(e) => error_response(500, "Internal Server Error", &e.to_string()),
            }
        }
        _ => match path.strip_prefix("/api/reports/") {
            Some(id) => match state.bundle.report(id) {
                Some(report) => json_response(report),
                None => error_response(404, "Not Found", &format!("unknown report '{}'", id)),
            },
            None => error_response(404, "Not Found", &format!("no route for {}", path)),
        },
    }
}

/// Raw (still encoded) value of `key` in a query string.
fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Split on literal commas first so an encoded `%2C` stays inside a name.
fn parse_column_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|c| percent_decode(c).trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let decoded = std::str::from_utf8(&bytes[i + 1..i + 3])
                    .ok()
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());
                match decoded {
                    Some(byte) => {
                        out.push(byte);
                        i += 2;
                    }
                    None => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn json_response<T: serde::Serialize>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(body) => create_response(200, "OK", &body),
        Err(e) => error_response(500, "Internal Server Error", &e.to_string()),
    }
}

fn error_response(status: u16, status_text: &str, message: &str) -> String {
    create_response(status, status_text, &json!({ "error": message }).to_string())
}

fn create_response(status: u16, status_text: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: application/json\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Access-Control-Allow-Methods: GET\r\n\
         Access-Control-Allow-Headers: Content-Type\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {}",
        status,
        status_text,
        body.len(),
        body
    )
}
