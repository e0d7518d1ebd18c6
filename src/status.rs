// System status display: DB size, stored post counts, recent runs.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::db::PostStore;
use crate::output::terminal;

/// Display system status to the terminal.
pub async fn show(store: &Arc<dyn PostStore>, config: &Config) -> Result<()> {
    let db_path = &config.db_path;
    if !Path::new(db_path).exists() {
        println!("Database: not initialized");
        println!("\nRun `coastwatch init` to set up the database.");
        return Ok(());
    }

    let file_size = std::fs::metadata(db_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_path, file_size);

    match config.rules_path {
        Some(ref path) => println!("Rule table: {}", path.display()),
        None => println!("Rule table: built-in"),
    }
    println!("Default profile: {}", config.profile);

    let total = store.post_count().await?;
    let categories = store.category_counts().await?;
    let hazards: i64 = categories
        .iter()
        .filter(|c| c.label != crate::classify::GENERAL_CATEGORY)
        .map(|c| c.count)
        .sum();
    println!("Stored posts: {} total, {} hazard-related", total, hazards);

    let urgency = store.urgency_counts().await?;
    let high = urgency
        .iter()
        .find(|c| c.label == "high")
        .map(|c| c.count)
        .unwrap_or(0);
    if high > 0 {
        println!("High urgency: {}", high);
    }

    let runs = store.get_recent_runs(5).await?;
    terminal::display_runs(&runs);
    if runs.is_empty() {
        println!("  Run `coastwatch extract <FILE> --store` to record one");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
