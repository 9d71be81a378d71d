use std::str::FromStr;

use crate::limits::PER_PACKET_PIPE_LIMIT;

/// Layout of the header written at the start of every destination file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderFormat {
    /// Container header followed by the archive header; close time is
    /// rewritten in place.
    #[default]
    Structured,
    /// 48-byte fixed-width text header; stop time and size are rewritten in
    /// place, and time-based names use packet time instead of the clock.
    FixedWidthText,
}

impl FromStr for HeaderFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "structured" | "cfe" => Ok(Self::Structured),
            "text" | "gpm" => Ok(Self::FixedWidthText),
            other => Err(format!("unknown header format: {other}")),
        }
    }
}

/// Run-time engine settings.
///
/// ```text
/// DS_HEADER_FORMAT      structured | text         (default: structured)
/// DS_MOVE_FILES         relocate closed files     (default: false)
/// DS_CDS_ENABLE_STATE   restore app enable state  (default: true)
/// DS_DEF_ENABLE_STATE   app enable at startup     (default: true)
/// DS_SECS_PER_HK_CYCLE  housekeeping period, secs (default: 4)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub header_format: HeaderFormat,
    /// Move closed files into their destination's `movename` directory.
    pub move_files: bool,
    /// Adopt the persisted app enable state on restart.
    pub restore_enable_state: bool,
    pub default_enable_state: bool,
    /// Seconds between housekeeping requests; also the age increment.
    pub secs_per_hk_cycle: u32,
    pub cmd_mid: u32,
    pub send_hk_mid: u32,
    /// Queue depth requested for each subscribed message id.
    pub pipe_depth: u16,
    /// Key of the persisted counters record.
    pub cds_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            header_format: HeaderFormat::Structured,
            move_files: false,
            restore_enable_state: true,
            default_enable_state: true,
            secs_per_hk_cycle: 4,
            cmd_mid: 0x18BB,
            send_hk_mid: 0x18BC,
            pipe_depth: PER_PACKET_PIPE_LIMIT,
            cds_key: "DS_CDS".to_string(),
        }
    }
}

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl EngineConfig {
    /// Builds a config from `DS_*` environment variables. Missing or
    /// unparsable values fall back to the defaults one key at a time.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            header_format: env_or("DS_HEADER_FORMAT", "structured")
                .parse()
                .unwrap_or(d.header_format),
            move_files: env_or("DS_MOVE_FILES", "false")
                .parse()
                .unwrap_or(d.move_files),
            restore_enable_state: env_or("DS_CDS_ENABLE_STATE", "true")
                .parse()
                .unwrap_or(d.restore_enable_state),
            default_enable_state: env_or("DS_DEF_ENABLE_STATE", "true")
                .parse()
                .unwrap_or(d.default_enable_state),
            secs_per_hk_cycle: env_or("DS_SECS_PER_HK_CYCLE", "4")
                .parse()
                .ok()
                .filter(|&s| s > 0)
                .unwrap_or(d.secs_per_hk_cycle),
            ..d
        }
    }
}
