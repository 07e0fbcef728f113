//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{NotifierConfig, StoreType, TransportType};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::ensure_config_exists;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    app: AppInfo,
    store: StoreInfo,
    transport: TransportInfo,
    dispatch: DispatchInfo,
}

#[derive(Serialize)]
struct AppInfo {
    name: String,
    expected_kind: String,
}

#[derive(Serialize)]
struct StoreInfo {
    store_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot_path: Option<String>,
    page_size: u32,
}

#[derive(Serialize)]
struct TransportInfo {
    transport_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
    batch_size: usize,
    max_in_flight: usize,
}

#[derive(Serialize)]
struct DispatchInfo {
    max_concurrent_events: usize,
    channel_capacity: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_timeout_ms: Option<u64>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    ensure_config_exists(&args.config)?;

    let notifier = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&notifier);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&notifier);
    }

    Ok(())
}

fn build_config_info(notifier: &NotifierConfig) -> ConfigInfo {
    let store = &notifier.store;
    let transport = &notifier.transport;
    let is_firestore = store.store_type == StoreType::Firestore;
    let is_fcm = transport.transport_type == TransportType::Fcm;

    ConfigInfo {
        version: format!("{:?}", notifier.version),
        app: AppInfo {
            name: notifier.app.name.clone(),
            expected_kind: notifier.app.expected_kind.clone(),
        },
        store: StoreInfo {
            store_type: format!("{:?}", store.store_type),
            project_id: store.project_id.clone(),
            endpoint: is_firestore.then(|| store.base_url.clone()),
            snapshot_path: store
                .snapshot_path
                .as_ref()
                .map(|p| p.display().to_string()),
            page_size: store.page_size,
        },
        transport: TransportInfo {
            transport_type: format!("{:?}", transport.transport_type),
            project_id: transport.project_id.clone(),
            endpoint: is_fcm.then(|| transport.base_url.clone()),
            batch_size: transport.batch_size,
            max_in_flight: transport.max_in_flight,
        },
        dispatch: DispatchInfo {
            max_concurrent_events: notifier.dispatch.max_concurrent_events,
            channel_capacity: notifier.dispatch.channel_capacity,
            event_timeout_ms: (notifier.dispatch.event_timeout_ms > 0)
                .then_some(notifier.dispatch.event_timeout_ms),
        },
    }
}

fn print_config_info(notifier: &NotifierConfig) {
    let info = build_config_info(notifier);
    let unset = || "(unset)".to_string();

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              SplitNest Notifier Configuration                ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🏷  App");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Name: {}", info.app.name);
    println!("   └─ Notifies on kind: {}", info.app.expected_kind);

    println!("\n🗄  Store ({})", info.store.store_type);
    println!("   ├─ Project: {}", info.store.project_id.unwrap_or_else(unset));
    if let Some(endpoint) = info.store.endpoint {
        println!("   ├─ Endpoint: {}", endpoint);
    }
    if let Some(snapshot) = info.store.snapshot_path {
        println!("   ├─ Snapshot: {}", snapshot);
    }
    println!("   └─ Page size: {}", info.store.page_size);

    println!("\n📤 Transport ({})", info.transport.transport_type);
    println!("   ├─ Project: {}", info.transport.project_id.unwrap_or_else(unset));
    if let Some(endpoint) = info.transport.endpoint {
        println!("   ├─ Endpoint: {}", endpoint);
    }
    println!("   ├─ Batch size: {}", info.transport.batch_size);
    println!("   └─ Requests in flight: {}", info.transport.max_in_flight);

    println!("\n⚙️  Dispatch");
    println!("   ├─ Concurrent events: {}", info.dispatch.max_concurrent_events);
    println!("   ├─ Channel capacity: {}", info.dispatch.channel_capacity);
    match info.dispatch.event_timeout_ms {
        Some(ms) => println!("   └─ Event deadline: {} ms", ms),
        None => println!("   └─ Event deadline: none"),
    }

    println!();
}
