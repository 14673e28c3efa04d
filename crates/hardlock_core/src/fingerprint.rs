use std::sync::OnceLock;

use crate::hash::multi_layer_hash;

/// Raw hardware identifiers for the current machine.
///
/// Every field degrades to `"unknown"` when the OS cannot supply it, so
/// collection always succeeds and is deterministic for a given hardware
/// state. Only the derived fingerprint ever leaves the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareInfo {
    pub cpu: String,
    pub disk: String,
    pub motherboard: String,
}

impl Default for HardwareInfo {
    fn default() -> Self {
        Self {
            cpu: "unknown".to_string(),
            disk: "unknown".to_string(),
            motherboard: "unknown".to_string(),
        }
    }
}

static FINGERPRINT: OnceLock<String> = OnceLock::new();

/// Compute the machine fingerprint, memoized for the process lifetime.
///
/// The fingerprint is the multi-layer hash of `cpu|disk|motherboard`,
/// a 96-character lowercase hex string.
pub fn machine_fingerprint() -> String {
    FINGERPRINT
        .get_or_init(|| fingerprint_of(&collect_hardware_info()))
        .clone()
}

/// Derive the fingerprint for a given set of hardware identifiers.
pub fn fingerprint_of(info: &HardwareInfo) -> String {
    let combined = format!("{}|{}|{}", info.cpu, info.disk, info.motherboard);
    multi_layer_hash(&combined)
}

/// Read the hardware identifiers fresh from the OS.
///
/// Each of the three queries falls back to `"unknown"` independently.
pub fn collect_hardware_info() -> HardwareInfo {
    let mut info = HardwareInfo::default();

    match query_cpu_id() {
        Some(cpu) => info.cpu = cpu,
        None => log::warn!("Could not read CPU id, using \"unknown\""),
    }
    match query_disk_serial() {
        Some(disk) => info.disk = disk,
        None => log::warn!("Could not read disk serial, using \"unknown\""),
    }
    match query_board_serial() {
        Some(board) => info.motherboard = board,
        None => log::warn!("Could not read motherboard serial, using \"unknown\""),
    }

    info
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

// ---- Platform-specific implementations ----

#[cfg(target_os = "windows")]
mod windows_wmi {
    use serde::Deserialize;
    use wmi::{COMLibrary, WMIConnection};

    #[derive(Deserialize)]
    #[serde(rename = "Win32_Processor")]
    #[serde(rename_all = "PascalCase")]
    struct Processor {
        processor_id: Option<String>,
    }

    #[derive(Deserialize)]
    #[serde(rename = "Win32_DiskDrive")]
    #[serde(rename_all = "PascalCase")]
    struct DiskDrive {
        serial_number: Option<String>,
    }

    #[derive(Deserialize)]
    #[serde(rename = "Win32_BaseBoard")]
    #[serde(rename_all = "PascalCase")]
    struct BaseBoard {
        serial_number: Option<String>,
    }

    fn connection() -> Option<WMIConnection> {
        let com = COMLibrary::new()
            .map_err(|e| log::warn!("COM init failed: {}", e))
            .ok()?;
        WMIConnection::new(com)
            .map_err(|e| log::warn!("WMI connection failed: {}", e))
            .ok()
    }

    fn first_value(values: impl IntoIterator<Item = Option<String>>) -> Option<String> {
        values.into_iter().flatten().find_map(super::non_empty)
    }

    pub fn cpu_id() -> Option<String> {
        let con = connection()?;
        let rows: Vec<Processor> = con.query().ok()?;
        first_value(rows.into_iter().map(|r| r.processor_id))
    }

    pub fn disk_serial() -> Option<String> {
        let con = connection()?;
        let rows: Vec<DiskDrive> = con.query().ok()?;
        first_value(rows.into_iter().map(|r| r.serial_number))
    }

    pub fn board_serial() -> Option<String> {
        let con = connection()?;
        let rows: Vec<BaseBoard> = con.query().ok()?;
        first_value(rows.into_iter().map(|r| r.serial_number))
    }
}

#[cfg(target_os = "windows")]
fn query_cpu_id() -> Option<String> {
    windows_wmi::cpu_id()
}

#[cfg(target_os = "windows")]
fn query_disk_serial() -> Option<String> {
    windows_wmi::disk_serial()
}

#[cfg(target_os = "windows")]
fn query_board_serial() -> Option<String> {
    windows_wmi::board_serial()
}

#[cfg(target_os = "linux")]
fn query_cpu_id() -> Option<String> {
    // Present on ARM SoCs; x86 kernels do not expose a CPU serial.
    let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").ok()?;
    cpuinfo
        .lines()
        .find(|line| line.starts_with("Serial"))
        .and_then(|line| line.split(':').nth(1))
        .and_then(|value| non_empty(value.to_string()))
}

#[cfg(target_os = "linux")]
fn query_disk_serial() -> Option<String> {
    let entries = std::fs::read_dir("/sys/block").ok()?;
    let mut names: Vec<String> = entries
        .flatten()
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| {
            !name.starts_with("loop")
                && !name.starts_with("ram")
                && !name.starts_with("zram")
                && !name.starts_with("dm-")
                && !name.starts_with("md")
        })
        .collect();
    // Sort so "first disk" is stable across enumeration order
    names.sort();

    names.into_iter().find_map(|name| {
        std::fs::read_to_string(format!("/sys/block/{}/device/serial", name))
            .ok()
            .and_then(non_empty)
    })
}

#[cfg(target_os = "linux")]
fn query_board_serial() -> Option<String> {
    std::fs::read_to_string("/sys/class/dmi/id/board_serial")
        .ok()
        .and_then(non_empty)
}

// Fallback for other platforms (e.g. macOS during development)
#[cfg(not(any(target_os = "windows", target_os = "linux")))]
fn query_cpu_id() -> Option<String> {
    None
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
fn query_disk_serial() -> Option<String> {
    None
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
fn query_board_serial() -> Option<String> {
    None
}
