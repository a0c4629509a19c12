//! Watch mode: poll the game and report changes until Ctrl+C.

use std::time::Duration;

use anyhow::Result;
use bugsplit_core::{AttachmentChange, GameMemory, GameSnapshot, IntrospectorConfig};
use tracing::{info, warn};

use super::describe_snapshot;
use crate::shutdown::ShutdownSignal;

/// Run the watch loop
pub fn run(config: IntrospectorConfig, interval_ms: u64, json: bool) -> Result<()> {
    let shutdown = ShutdownSignal::install()?;
    let interval = Duration::from_millis(interval_ms.max(1));

    info!("bugsplit v{}", env!("CARGO_PKG_VERSION"));
    info!("Waiting for {}... (Ctrl+C to quit)", config.process_name);

    let mut memory = GameMemory::system(config);
    let mut previous: Option<GameSnapshot> = None;

    while !shutdown.is_shutdown() {
        if memory.poll_attachment() == AttachmentChange::Detached {
            previous = None;
            info!("Waiting for {}...", memory.config().process_name);
        }

        if let Some(snapshot) = memory.snapshot() {
            match render(&snapshot, previous.as_ref(), json) {
                Ok(lines) => lines.iter().for_each(|line| emit(line, json)),
                Err(e) => warn!("Failed to render snapshot: {}", e),
            }
            previous = Some(snapshot);
        }

        if shutdown.wait(interval) {
            break;
        }
    }

    info!("Shutdown complete");
    Ok(())
}

fn emit(line: &str, json: bool) {
    if json {
        println!("{}", line);
    } else {
        info!("{}", line);
    }
}

/// Lines to report for `current`.
///
/// The first snapshot after an attach is reported in full. After that, text
/// mode reports each change and JSON mode re-emits the whole snapshot once
/// per changed tick.
fn render(
    current: &GameSnapshot,
    previous: Option<&GameSnapshot>,
    json: bool,
) -> bugsplit_core::Result<Vec<String>> {
    let Some(previous) = previous else {
        return Ok(vec![if json {
            current.to_json()?
        } else {
            describe_snapshot(current)
        }]);
    };

    let changes = current.changes_since(previous);
    if json {
        if changes.is_empty() {
            return Ok(Vec::new());
        }
        return Ok(vec![current.to_json()?]);
    }
    Ok(changes.iter().map(ToString::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bugsplit_core::{FlagSet, GameVersion};

    fn snapshot(room: i32) -> GameSnapshot {
        GameSnapshot {
            pid: 9,
            version: GameVersion::V113MonoBleedingEdge,
            room_id: Some(room),
            first_music_id: Some(1),
            music_coroutine: Some(0),
            battle_pointer: Some(0),
            flags: Some(FlagSet::new(vec![0; 4])),
            encounters: None,
        }
    }

    #[test]
    fn test_first_snapshot_is_reported_in_full() {
        let lines = render(&snapshot(3), None, false).unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("room 3, music 1"));
    }

    #[test]
    fn test_text_reports_changes() {
        let lines = render(&snapshot(4), Some(&snapshot(3)), false).unwrap();
        assert_eq!(lines, vec!["room 3 -> 4".to_string()]);

        assert!(render(&snapshot(3), Some(&snapshot(3)), false).unwrap().is_empty());
    }

    #[test]
    fn test_json_emits_snapshot_on_change() {
        let lines = render(&snapshot(4), Some(&snapshot(3)), true).unwrap();
        assert_eq!(lines.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["room_id"], 4);

        assert!(render(&snapshot(4), Some(&snapshot(4)), true).unwrap().is_empty());
    }
}
