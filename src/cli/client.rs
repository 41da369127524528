// CLI client commands: submit, status, clear. Each talks to a running
// daemon over its HTTP API.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;

use super::{base_url, connection_error_message};

/// Helper to handle reqwest errors and produce a user-friendly connection error.
fn handle_request_error(err: reqwest::Error, host: &str, port: u16) -> anyhow::Error {
    if err.is_connect() || err.is_timeout() {
        anyhow::anyhow!("{}", connection_error_message(host, port))
    } else {
        anyhow::anyhow!("Request failed: {}", err)
    }
}

/// mbc submit
pub async fn cmd_submit(host: &str, port: u16, patterns: &[String]) -> anyhow::Result<()> {
    let client = Client::new();
    let url = format!("{}/convert", base_url(host, port));

    let response = client
        .post(&url)
        .json(&serde_json::json!({ "paths": patterns }))
        .send()
        .await
        .map_err(|e| handle_request_error(e, host, port))?;

    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to parse response: {}", e))?;

    if !status.is_success() || body["success"] != true {
        eprintln!("Error: submission rejected ({})", status);
        std::process::exit(1);
    }

    let queued = body["queued"].as_u64().unwrap_or(0);
    println!("Queued {} file(s) for conversion.", queued);
    if let Some(files) = body["files"].as_array() {
        for file in files {
            println!("  {}", file.as_str().unwrap_or("?"));
        }
    }
    if let Some(unmatched) = body["unmatched_patterns"].as_array() {
        if !unmatched.is_empty() {
            println!("Patterns that matched nothing:");
            for pattern in unmatched {
                println!("  {}", pattern.as_str().unwrap_or("?"));
            }
        }
    }

    Ok(())
}

/// mbc status
pub async fn cmd_status(host: &str, port: u16, json: bool) -> anyhow::Result<()> {
    let client = Client::new();
    let url = format!("{}/status", base_url(host, port));

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| handle_request_error(e, host, port))?;

    let body: Value = response
        .json()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to parse response: {}", e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let map = match body.as_object() {
        Some(map) if !map.is_empty() => map,
        _ => {
            println!("No conversions yet.");
            return Ok(());
        }
    };

    // Newest first, matching what a polling UI would show.
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by_key(|(_, record)| {
        std::cmp::Reverse(
            record["timestamp"]
                .as_str()
                .and_then(|ts| ts.parse::<DateTime<Utc>>().ok())
                .unwrap_or_default(),
        )
    });

    for (file, record) in entries {
        let status = record["status"].as_str().unwrap_or("?");
        let message = record["message"].as_str().unwrap_or("");
        if message.is_empty() {
            println!("[{:<10}] {}", status, file);
        } else {
            println!("[{:<10}] {} - {}", status, file, message);
        }
    }

    Ok(())
}

/// mbc clear
pub async fn cmd_clear(host: &str, port: u16) -> anyhow::Result<()> {
    let client = Client::new();
    let url = format!("{}/clear", base_url(host, port));

    let response = client
        .post(&url)
        .send()
        .await
        .map_err(|e| handle_request_error(e, host, port))?;

    if response.status().is_success() {
        println!("Job records cleared.");
    } else {
        eprintln!("Error: clear failed ({})", response.status());
        std::process::exit(1);
    }

    Ok(())
}
