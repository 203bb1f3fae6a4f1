//! Machine identity detection for `init`.

use std::process::Command;

use gk_core::Machine;

const MACHINE_ID_FILES: [&str; 2] = ["/etc/machine-id", "/var/lib/dbus/machine-id"];

/// Detect the current machine.
///
/// The id comes from the platform's stable hardware/installation id when one
/// is readable and falls back to the host name; the host name falls back to
/// `"unknown"`.
#[must_use]
pub fn detect() -> Machine {
    let name = host_name().unwrap_or_else(|| "unknown".to_string());
    let id = machine_id().unwrap_or_else(|| format!("host-{name}"));
    Machine {
        id,
        name,
        os: std::env::consts::OS.to_string(),
        os_version: command_output("uname", &["-r"]),
    }
}

fn machine_id() -> Option<String> {
    for path in MACHINE_ID_FILES {
        if let Ok(text) = std::fs::read_to_string(path) {
            let id = text.trim();
            if !id.is_empty() {
                return Some(id.to_string());
            }
        }
    }
    if cfg!(target_os = "macos") {
        let out = command_output("ioreg", &["-rd1", "-c", "IOPlatformExpertDevice"])?;
        return parse_ioreg_uuid(&out);
    }
    None
}

fn host_name() -> Option<String> {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.trim().is_empty())
        .or_else(|| command_output("hostname", &[]))
        .map(|h| h.trim().to_string())
}

fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Pull `IOPlatformUUID` out of `ioreg` output.
fn parse_ioreg_uuid(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.contains("IOPlatformUUID"))
        .and_then(|line| line.split('"').nth(3))
        .map(str::to_string)
}
