//! TCP server for the graph engine.
//!
//! Accepts line-based connections: each newline-terminated line is run as
//! one query and answered with one JSON response line. The engine is
//! single-writer, so all queries serialize through one mutex.

use anyhow::Result;
use clap::Parser;
use common::EngineConfig;
use engine::Engine;
use protocol::Response;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio::sync::Mutex;
use tracing::{error, info};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 7474;
const DEFAULT_DATABASE: &str = "./kite.db";

#[derive(Parser, Debug)]
#[command(name = "kitedb-server", about = "TCP server for the KiteDB graph engine")]
struct Args {
    /// Host address to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Database file to open or create
    #[arg(long, default_value = DEFAULT_DATABASE)]
    database: PathBuf,

    /// Page size in bytes for a newly created file
    #[arg(long, default_value_t = 4096)]
    page_size: usize,

    /// Maximum number of pages held in the buffer pool
    #[arg(long, default_value_t = 100)]
    buffer_pages: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = EngineConfig::builder()
        .page_size(args.page_size)
        .buffer_pages(args.buffer_pages)
        .build();
    let engine = Arc::new(Mutex::new(Engine::open(&args.database, config)?));

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, database = %args.database.display(), "listening");

    let server = tokio::spawn(run_server(listener, engine.clone()));

    signal::ctrl_c().await?;
    info!("shutdown signal received");
    server.abort();

    // Flush the file before exiting.
    engine.lock().await.sync()?;
    Ok(())
}

/// Accept connections and spawn a handler per client.
async fn run_server(listener: TcpListener, engine: Arc<Mutex<Engine>>) {
    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                info!(%peer, "client connected");
                let engine = engine.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_client(socket, engine).await {
                        error!(%peer, error = %e, "client handler failed");
                    }
                });
            }
            Err(e) => error!(error = %e, "accept failed"),
        }
    }
}

/// Read queries line by line and answer each with one JSON line.
async fn handle_client(socket: TcpStream, engine: Arc<Mutex<Engine>>) -> Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let query = line.trim();
        if query.is_empty() {
            continue;
        }

        let response = {
            let mut engine = engine.lock().await;
            match engine.execute(query) {
                Ok(rows) => Response::success(format!("{} row(s)", rows.len()), rows),
                Err(e) => Response::error(e.to_string()),
            }
        };

        let mut payload = response.encode()?;
        payload.push('\n');
        writer.write_all(payload.as_bytes()).await?;
    }

    Ok(())
}
