pub(crate) mod base62;

pub(crate) use base62::encode as base62_encode;
use std::path::Path;
use std::{fs, io};

#[cfg(target_os = "linux")]
mod libc;
#[cfg(target_os = "linux")]
pub(crate) use libc::detect_libc;

const RELEASE_ARCH_X86_64: &[&str] = &["x86_64", "amd64", "x64"];
const RELEASE_ARCH_ARM64: &[&str] = &["arm64", "aarch64"];

/// Normalized architecture name (e.g. `aarch64` -> `arm64`) for matching
/// against the asset names of GitHub/go/cargo release-based installs.
pub(crate) fn current_arch() -> String {
    match std::env::consts::ARCH {
        "aarch64" => "arm64".to_string(),
        other => other.to_string(),
    }
}

/// Normalized OS name (e.g. `macos` -> `darwin`) for matching against the
/// asset names of GitHub/go/cargo release-based installs.
pub(crate) fn current_os() -> String {
    match std::env::consts::OS {
        "macos" => "darwin".to_string(),
        other => other.to_string(),
    }
}

/// All architecture spellings accepted as equivalent to the current one.
pub(crate) fn compatible_release_arch() -> Vec<String> {
    match current_arch().as_str() {
        "x86_64" => RELEASE_ARCH_X86_64.iter().map(|s| s.to_string()).collect(),
        "arm64" => RELEASE_ARCH_ARM64.iter().map(|s| s.to_string()).collect(),
        other => vec![other.to_string()],
    }
}

/// All OS spellings accepted as equivalent to the current one.
pub(crate) fn compatible_release_os() -> Vec<String> {
    if current_os() == "darwin" {
        vec!["darwin".to_string(), "macos".to_string(), "osx".to_string()]
    } else {
        vec![current_os()]
    }
}

pub(crate) fn safe_rename<P: AsRef<Path>, Q: AsRef<Path>>(from: P, to: Q) -> io::Result<()> {
    if fs::rename(from.as_ref(), to.as_ref()).is_ok() {
        return Ok(());
    }
    // Fall back to copy-and-delete
    if from.as_ref().is_dir() {
        copy_dir_all(from.as_ref(), to.as_ref())?;
        fs::remove_dir_all(from)?;
    } else {
        fs::copy(from.as_ref(), to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}

fn copy_dir_all(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> io::Result<()> {
    fs::create_dir_all(&dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let ty = entry.file_type()?;
        if ty.is_dir() {
            copy_dir_all(entry.path(), dst.as_ref().join(entry.file_name()))?;
        } else {
            fs::copy(entry.path(), dst.as_ref().join(entry.file_name()))?;
        }
    }
    Ok(())
}
