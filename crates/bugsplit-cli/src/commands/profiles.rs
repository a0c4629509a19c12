//! Profiles command implementation.

use anyhow::Result;
use bugsplit_core::{VersionProfile, profiles};

/// Run the profiles command
pub fn run(json: bool) -> Result<()> {
    let all: Vec<&VersionProfile> = profiles().collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&all)?);
        return Ok(());
    }

    for profile in all {
        println!("{}", format_profile(profile));
    }
    Ok(())
}

fn format_profile(profile: &VersionProfile) -> String {
    let prefix: Vec<String> = profile
        .static_offset_prefix
        .iter()
        .map(|o| format!("0x{:X}", o))
        .collect();
    format!(
        "{:<28} {:<20} base 0x{:08X}  prefix [{}]  flags {}",
        profile.version.to_string(),
        profile.runtime_module,
        profile.static_base_address,
        prefix.join(", "),
        profile.flags_len
    )
}
