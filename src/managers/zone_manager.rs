//! Seeds the zone table from a CSV of `city,localNameOfCity,province` lines.

use std::path::Path;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::state::Store;

/// Parse zone rows, skipping blank and malformed lines
pub fn parse_zones_csv(content: &str) -> Vec<(String, String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            match fields.as_slice() {
                [city, local, province] if !city.is_empty() && !province.is_empty() => {
                    Some((city.to_string(), local.to_string(), province.to_string()))
                }
                _ => {
                    warn!("Skipping malformed zone line: {}", line);
                    None
                }
            }
        })
        .collect()
}

/// Import zones from `csv_path` when the store has none yet.
/// Returns the number of zones imported.
pub async fn init_zones(store: &Store, csv_path: &Path) -> Result<usize> {
    if store.read(|db| !db.zones.is_empty()).await {
        return Ok(0);
    }

    let content = match tokio::fs::read_to_string(csv_path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("No zones file at {}, starting without zones", csv_path.display());
            return Ok(0);
        }
        Err(e) => {
            return Err(AppError::StateLoad {
                path: csv_path.display().to_string(),
                source: e,
            })
        }
    };

    let rows = parse_zones_csv(&content);
    let count = store
        .transaction(|db| {
            for (city, local, province) in &rows {
                db.insert_zone(city, local, province);
            }
            Ok(db.zones.len())
        })
        .await?;

    info!("Imported {} zones from {}", count, csv_path.display());
    Ok(count)
}
