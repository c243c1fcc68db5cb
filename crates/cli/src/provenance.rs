//! Provenance sidecars: `<artifact>.provenance.json` next to every output.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Environment override for the recorded code revision.
const REV_ENV: &str = "SFC_CODE_REV";

/// What produced an artifact: the subcommand, its parameters, and the files it read.
pub struct Payload {
    pub cmd: &'static str,
    pub params: Value,
    pub inputs: Vec<PathBuf>,
}

impl Payload {
    pub fn new(cmd: &'static str, params: Value) -> Self {
        Self {
            cmd,
            params,
            inputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }
}

/// `out/plan.json` -> `out/plan.provenance.json`; a bare directory-like name
/// gets `artifact.provenance.json`.
pub fn sidecar_path(artifact: &Path) -> PathBuf {
    let stem = artifact
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_owned());
    artifact.with_file_name(format!("{stem}.provenance.json"))
}

#[track_caller]
pub fn write_sidecar(artifact: &Path, payload: Payload) -> Result<PathBuf> {
    let path = sidecar_path(artifact);
    let callsite = Location::caller();
    let doc = json!({
        "cmd": payload.cmd,
        "code_rev": code_rev(),
        "sfc_version": sfc::VERSION,
        "callsite": format!("{}:{}", callsite.file(), callsite.line()),
        "inputs": payload.inputs.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
        "params": payload.params,
        "output": artifact.display().to_string(),
    });
    crate::io::write_json(&path, &doc)
        .with_context(|| format!("provenance for {}", artifact.display()))?;
    tracing::debug!(path = %path.display(), "provenance sidecar");
    Ok(path)
}

/// `SFC_CODE_REV` if set, else the checkout's short commit, else `unknown`.
pub fn code_rev() -> String {
    if let Some(rev) = std::env::var(REV_ENV).ok().filter(|r| !r.is_empty()) {
        return rev;
    }
    Command::new("git")
        .args(["rev-parse", "--short=12", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_owned())
}
