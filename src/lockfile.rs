//! Keeps `Move.lock` in step with the registry after an upgrade
//!
//! Only the `[env.<network>]` section is touched, and inside it only the
//! `latest-published-id` and `published-version` lines. Everything else is
//! copied through byte for byte, so this is a line scanner rather than a TOML
//! round trip.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use tracing::info;

use crate::{
    error::{RegistryError, Result},
    object::Network,
};

pub const LOCK_FILE_NAME: &str = "Move.lock";

const LATEST_PUBLISHED_ID: &str = "latest-published-id";
const PUBLISHED_VERSION: &str = "published-version";

static VERSION_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"=\s*"?(\d+)"?"#).expect("valid version pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockPatch {
    pub document: String,
    pub previous_version: u64,
    pub published_version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Outside,
    InTarget,
    InOther,
}

pub fn section_header(network: Network) -> String {
    format!("[env.{network}]")
}

pub fn lock_file_path<P: AsRef<Path>>(package_path: P) -> PathBuf {
    package_path.as_ref().join(LOCK_FILE_NAME)
}

fn transition(state: Scan, trimmed: &str, header: &str) -> Scan {
    if trimmed == header {
        Scan::InTarget
    } else if trimmed.starts_with('[') {
        Scan::InOther
    } else {
        state
    }
}

fn field_key(trimmed: &str) -> Option<&str> {
    trimmed.split_once('=').map(|(key, _)| key.trim())
}

fn field_value(trimmed: &str) -> &str {
    trimmed
        .split_once('=')
        .map_or("", |(_, value)| value.trim().trim_matches('"'))
}

/// The version recorded in the first target section, `1` when it has none
///
/// A `published-version` line whose value is not a `u64` is an error rather
/// than a reset to `1`.
pub fn current_version(document: &str, network: Network) -> Result<u64> {
    let header = section_header(network);
    let mut state = Scan::Outside;
    for line in document.split('\n') {
        let trimmed = line.trim();
        let next = transition(state, trimmed, &header);
        if state == Scan::InTarget && next != Scan::InTarget {
            break;
        }
        state = next;
        if state != Scan::InTarget || field_key(trimmed) != Some(PUBLISHED_VERSION) {
            continue;
        }
        return VERSION_VALUE
            .captures(trimmed)
            .and_then(|caps| caps[1].parse().ok())
            .ok_or_else(|| RegistryError::InvalidLockVersion {
                network,
                value: field_value(trimmed).to_string(),
            });
    }
    Ok(1)
}

/// Point the network's lock section at `new_package_id` and bump its version by one
pub fn sync_after_upgrade(
    document: &str,
    network: Network,
    new_package_id: &str,
) -> Result<LockPatch> {
    let previous_version = current_version(document, network)?;
    let published_version =
        previous_version
            .checked_add(1)
            .ok_or_else(|| RegistryError::InvalidLockVersion {
                network,
                value: previous_version.to_string(),
            })?;
    let header = section_header(network);

    let mut state = Scan::Outside;
    let lines = document
        .split('\n')
        .map(|line| {
            let trimmed = line.trim();
            state = transition(state, trimmed, &header);
            if state != Scan::InTarget {
                return line.to_string();
            }
            let value = match field_key(trimmed) {
                Some(LATEST_PUBLISHED_ID) => format!("\"{new_package_id}\""),
                Some(PUBLISHED_VERSION) => format!("\"{published_version}\""),
                _ => return line.to_string(),
            };
            rewrite_field(line, value)
        })
        .collect::<Vec<_>>();

    Ok(LockPatch {
        document: lines.join("\n"),
        previous_version,
        published_version,
    })
}

fn rewrite_field(line: &str, value: String) -> String {
    let indent = &line[..line.len() - line.trim_start().len()];
    let key = line.trim().split_once('=').map_or("", |(key, _)| key.trim());
    let line_end = if line.ends_with('\r') { "\r" } else { "" };
    format!("{indent}{key} = {value}{line_end}")
}

/// Patch the lock file on disk, see [`sync_after_upgrade`]
pub fn sync_file<P: AsRef<Path>>(path: P, network: Network, new_package_id: &str) -> Result<LockPatch> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RegistryError::LockFileMissing(path.to_path_buf()));
    }
    let document = fs::read_to_string(path).map_err(|e| RegistryError::io(path, e))?;
    let patch = sync_after_upgrade(&document, network, new_package_id)?;
    fs::write(path, &patch.document).map_err(|e| RegistryError::io(path, e))?;
    info!(
        "Updated {}: version {}, package {new_package_id}",
        path.display(),
        patch.published_version
    );
    Ok(patch)
}
