//! Replays host events from stdin through a capture service
//!
//! Each input line is one JSON `HostEvent`. Replies to UI messages are
//! written to stdout as JSON lines. The active tab is whichever tab was last
//! activated.
//!
//! ```text
//! authtap [config.json] < events.jsonl
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use authtap_lib::storage::MemorySessionStorage;
use authtap_lib::tabs::TabDirectory;
use authtap_lib::{CaptureConfig, CaptureService, HostEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    authtap_lib::init_tracing();

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => CaptureConfig::load_from(&path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => CaptureConfig::load(),
    };

    let storage = Arc::new(MemorySessionStorage::new());
    let tabs = Arc::new(TabDirectory::new());
    let service = CaptureService::with_config(config, storage, tabs.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let event: HostEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Skipping line {}: {}", line_no, e);
                continue;
            }
        };

        match &event {
            HostEvent::TabUpdated {
                tab_id,
                url: Some(url),
                ..
            } => tabs.set_url(*tab_id, url.clone()),
            HostEvent::TabActivated { tab_id } => tabs.set_active(*tab_id),
            HostEvent::TabRemoved { tab_id } => tabs.remove(*tab_id),
            _ => {}
        }

        if let Some(response) = service.handle_event(event).await {
            let mut out = serde_json::to_vec(&response)?;
            out.push(b'\n');
            stdout.write_all(&out).await?;
            stdout.flush().await?;
        }
    }

    service.flush().await;
    tracing::info!("Replayed {} lines", line_no);
    Ok(())
}
