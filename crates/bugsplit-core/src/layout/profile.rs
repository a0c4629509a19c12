use serde::Serialize;
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

/// Known builds of the game, one per distinct memory layout
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    EnumIter,
    IntoStaticStr,
    strum::Display,
)]
pub enum GameVersion {
    /// 1.1.0, running on the legacy Mono runtime
    #[strum(serialize = "v1.1.0")]
    V110,
    /// 1.1.3 and later, running on MonoBleedingEdge
    #[strum(serialize = "v1.1.3 (MonoBleedingEdge)")]
    V113MonoBleedingEdge,
}

impl GameVersion {
    /// Layout assumed when no known runtime module is loaded
    pub const NEWEST: GameVersion = GameVersion::V113MonoBleedingEdge;

    pub fn profile(self) -> &'static VersionProfile {
        match self {
            GameVersion::V110 => &V110_PROFILE,
            GameVersion::V113MonoBleedingEdge => &V113_PROFILE,
        }
    }
}

/// How to reach the MainManager statics in one build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionProfile {
    pub version: GameVersion,
    /// Module hosting the managed runtime
    pub runtime_module: &'static str,
    /// Short runtime name used in diagnostics
    pub runtime_label: &'static str,
    /// Offset from the runtime module base to the static root pointer
    pub static_base_address: u64,
    /// Hops from the static root to the MainManager statics
    pub static_offset_prefix: &'static [u64],
    /// Length of the story flag array in bytes
    pub flags_len: usize,
}

static V110_PROFILE: VersionProfile = VersionProfile {
    version: GameVersion::V110,
    runtime_module: "mono.dll",
    runtime_label: "Mono",
    static_base_address: 0x0050_1AC8,
    static_offset_prefix: &[0x20, 0x150],
    flags_len: 750,
};

static V113_PROFILE: VersionProfile = VersionProfile {
    version: GameVersion::V113MonoBleedingEdge,
    runtime_module: "mono-2.0-bdwgc.dll",
    runtime_label: "MonoBleedingEdge",
    static_base_address: 0x0048_FA90,
    static_offset_prefix: &[0xBD0, 0x0, 0x60],
    flags_len: 750,
};

/// Outcome of version detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub version: GameVersion,
    /// `true` when no known runtime module was loaded and the newest layout was assumed
    pub fallback: bool,
}

impl Detection {
    pub fn profile(&self) -> &'static VersionProfile {
        self.version.profile()
    }

    /// Line recorded in the diagnostic log
    pub fn message(&self) -> String {
        let label = self.profile().runtime_label;
        if self.fallback {
            format!("Couldn't find the runtime module, assuming {}", label)
        } else {
            format!("Detected {}", label)
        }
    }
}

/// Pick the layout for a process from its loaded module names.
///
/// Modules are checked in load order against every known runtime module with
/// exact string comparison; the first hit wins. With no hit the newest layout
/// is assumed, so detection never prevents attaching.
pub fn detect_version<'a>(module_names: impl IntoIterator<Item = &'a str>) -> Detection {
    for name in module_names {
        if let Some(version) = GameVersion::iter().find(|v| v.profile().runtime_module == name) {
            return Detection {
                version,
                fallback: false,
            };
        }
    }

    Detection {
        version: GameVersion::NEWEST,
        fallback: true,
    }
}

/// All known profiles, oldest first
pub fn profiles() -> impl Iterator<Item = &'static VersionProfile> {
    GameVersion::iter().map(GameVersion::profile)
}
