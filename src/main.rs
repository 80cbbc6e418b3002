// Line-oriented front end over the in-memory cache and store
//
// stdin:  {"op":"book","hotelId":"1","checkIn":"2015-04-09","checkOut":"2015-04-10","customerName":"Cornell_1","roomCount":1}
//         {"op":"check","hotelIds":["1","2"],"checkIn":"2015-04-09","checkOut":"2015-04-10","roomCount":1}
// stdout: {"hotelIds":["1"]} or {"error":"..."}, one line per command

use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use hotel_reservation::config::ENV_CAPACITY_FILE;
use hotel_reservation::service::SERVICE_NAME;
use hotel_reservation::{
    AvailabilityRequest, BookingRequest, CapacityRecord, MemoryCache, MemoryStore,
    ReservationApi, ReservationService, ServiceConfig,
};

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum Command {
    Book(BookingRequest),
    Check(AvailabilityRequest),
}

fn load_capacities(path: &str) -> Result<Vec<CapacityRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading capacity file {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing capacity file {}", path))
}

async fn handle(service: &ReservationService, line: &str) -> serde_json::Value {
    let command: Command = match serde_json::from_str(line) {
        Ok(command) => command,
        Err(e) => return serde_json::json!({ "error": format!("bad command: {}", e) }),
    };

    let result = match command {
        Command::Book(request) => service.make_reservation(request).await,
        Command::Check(request) => service.check_availability(request).await,
    };

    match result {
        Ok(result) => serde_json::json!(result),
        Err(e) => serde_json::json!({ "error": e.to_string() }),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let config = ServiceConfig::from_env()?;
    let store = match std::env::var(ENV_CAPACITY_FILE) {
        Ok(path) => MemoryStore::with_capacities(load_capacities(&path)?),
        Err(_) => MemoryStore::new(),
    };

    let cache = Arc::new(MemoryCache::new(config.cache.clone()));
    let service = ReservationService::new(cache.clone(), Arc::new(store), &config);
    info!(
        "{} ready: consistency {:?}, cache max entries {}",
        SERVICE_NAME, config.consistency, config.cache.max_entries
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle(&service, &line).await;
        stdout.write_all(response.to_string().as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    info!("stdin closed, stats: {:?}", service.stats());
    info!("cache stats: {:?}", cache.stats());
    Ok(())
}
