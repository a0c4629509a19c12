//! Status command implementation.

use anyhow::{Result, bail};
use bugsplit_core::{GameMemory, IntrospectorConfig};
use serde_json::json;

use super::describe_snapshot;

/// Run the status command
pub fn run(config: IntrospectorConfig, json: bool) -> Result<()> {
    let process_name = config.process_name.clone();
    let mut memory = GameMemory::system(config);
    memory.poll_attachment();

    let Some(attachment) = memory.attachment() else {
        bail!("{} is not running or could not be opened", process_name);
    };
    let detection = attachment.detection();
    let pid = attachment.pid();
    let Some(snapshot) = memory.snapshot() else {
        bail!("Lost {} while reading", process_name);
    };

    if json {
        let status = json!({
            "pid": pid,
            "detection": detection,
            "profile": detection.profile(),
            "snapshot": snapshot,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("bugsplit {} - Status", env!("CARGO_PKG_VERSION"));
    println!("Process: {} (PID {})", process_name, pid);
    println!(
        "Layout: {}{}",
        detection.version,
        if detection.fallback { " (assumed)" } else { "" }
    );
    println!("{}", describe_snapshot(&snapshot));
    Ok(())
}
