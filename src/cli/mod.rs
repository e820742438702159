//! CLI subcommand implementations for the dinescout binary.

pub mod discover_cmd;
pub mod doctor;
pub mod scan_cmd;

/// Whether `--json` output was requested (set in `main`).
pub fn is_json() -> bool {
    std::env::var("DINESCOUT_JSON").is_ok()
}

/// Whether `--quiet` was requested (set in `main`).
pub fn is_quiet() -> bool {
    std::env::var("DINESCOUT_QUIET").is_ok()
}
