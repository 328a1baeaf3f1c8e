use std::path::Path;

use crate::foundation::error::{StitchkitError, StitchkitResult};

/// Source of the "available memory" figure the batch estimate budgets against.
pub trait MemoryProbe {
    /// Bytes available right now. Sampled once per call; nothing is cached.
    fn available_bytes(&self) -> StitchkitResult<u64>;
}

/// Constant figure, used for `--available-memory` and in tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedMemory(pub u64);

impl MemoryProbe for FixedMemory {
    fn available_bytes(&self) -> StitchkitResult<u64> {
        Ok(self.0)
    }
}

/// Reads the operating system's view of available memory.
///
/// On Linux this is `MemAvailable` from `/proc/meminfo`; elsewhere it comes from `sysinfo`.
/// Either figure is capped by the cgroup v2 headroom (`memory.max - memory.current`) when the
/// process runs under a limit.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemMemory;

impl MemoryProbe for SystemMemory {
    fn available_bytes(&self) -> StitchkitResult<u64> {
        let host = std::fs::read_to_string("/proc/meminfo")
            .ok()
            .and_then(|txt| parse_meminfo_available(&txt))
            .or_else(sysinfo_available_bytes);
        let cgroup = detect_cgroup_headroom_bytes(Path::new("/sys/fs/cgroup"));

        let available = match (host, cgroup) {
            (Some(h), Some(c)) => h.min(c),
            (Some(h), None) => h,
            (None, Some(c)) => c,
            (None, None) => {
                return Err(StitchkitError::memory(
                    "available memory could not be determined on this platform",
                ));
            }
        };
        tracing::debug!(available, "sampled available memory");
        Ok(available)
    }
}

fn sysinfo_available_bytes() -> Option<u64> {
    let mut sys = sysinfo::System::new();
    sys.refresh_memory();
    Some(sys.available_memory()).filter(|&n| n > 0)
}

/// Extract `MemAvailable` (reported in KiB) from `/proc/meminfo` text, in bytes.
pub fn parse_meminfo_available(txt: &str) -> Option<u64> {
    for line in txt.lines() {
        if let Some(rest) = line.strip_prefix("MemAvailable:") {
            let kib = rest.split_whitespace().next()?.parse::<u64>().ok()?;
            return kib.checked_mul(1024);
        }
    }
    None
}

fn detect_cgroup_headroom_bytes(root: &Path) -> Option<u64> {
    let max = std::fs::read_to_string(root.join("memory.max")).ok()?;
    let max = max.trim();
    if max.eq_ignore_ascii_case("max") {
        return None;
    }
    let max = max.parse::<u64>().ok()?;
    if max == 0 || max >= u64::MAX / 2 {
        return None;
    }

    let current = std::fs::read_to_string(root.join("memory.current"))
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(0);
    Some(max.saturating_sub(current))
}
