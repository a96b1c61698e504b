/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub lookup: LookupConfig,
}

#[derive(Clone, Copy, Debug)]
pub struct TimingConfig {
    /// Interval between background static updates.
    pub noise_tick_ms: u64,
    /// Fraction of the grid touched per static update.
    pub churn_fraction: f64,
    /// Window within which inserted characters materialize; also the
    /// fixed duration of overlay completion signals.
    pub reveal_window_ms: u64,
    /// Delay before a noise-corrupted overlay cell is restored.
    pub restore_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct LookupConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
    /// Append-only log of every query title attempted.
    pub query_log: PathBuf,
    /// Append-only log of every query that yielded a usable sentence.
    pub success_log: PathBuf,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    lookup: TomlLookup,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_noise_tick")]
    noise_tick_ms: u64,
    #[serde(default = "default_churn_fraction")]
    churn_fraction: f64,
    #[serde(default = "default_reveal_window")]
    reveal_window_ms: u64,
    #[serde(default = "default_restore_delay")]
    restore_delay_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlLookup {
    #[serde(default = "default_endpoint")]
    endpoint: String,
    #[serde(default = "default_timeout")]
    timeout_ms: u64,
    #[serde(default = "default_query_log")]
    query_log: String,
    #[serde(default = "default_success_log")]
    success_log: String,
}

// ── Defaults ──

fn default_noise_tick() -> u64 { 300 }
fn default_churn_fraction() -> f64 { 0.002 }
fn default_reveal_window() -> u64 { 1000 }
fn default_restore_delay() -> u64 { 300 }

fn default_endpoint() -> String { "https://en.wikipedia.org/w/api.php".into() }
fn default_timeout() -> u64 { 8000 }
fn default_query_log() -> String { "all_queries.txt".into() }
fn default_success_log() -> String { "successful_queries.txt".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            noise_tick_ms: default_noise_tick(),
            churn_fraction: default_churn_fraction(),
            reveal_window_ms: default_reveal_window(),
            restore_delay_ms: default_restore_delay(),
        }
    }
}

impl Default for TomlLookup {
    fn default() -> Self {
        TomlLookup {
            endpoint: default_endpoint(),
            timeout_ms: default_timeout(),
            query_log: default_query_log(),
            success_log: default_success_log(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            noise_tick_ms: default_noise_tick(),
            churn_fraction: default_churn_fraction(),
            reveal_window_ms: default_reveal_window(),
            restore_delay_ms: default_restore_delay(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        // Relative log paths resolve against the first candidate dir;
        // absolute paths pass through untouched.
        let resolve = |p: &str| -> PathBuf {
            let path = PathBuf::from(p);
            if path.is_absolute() {
                path
            } else {
                search_dirs.first().map(|d| d.join(p)).unwrap_or(path)
            }
        };

        GameConfig {
            timing: TimingConfig {
                noise_tick_ms: toml_cfg.timing.noise_tick_ms,
                churn_fraction: toml_cfg.timing.churn_fraction,
                reveal_window_ms: toml_cfg.timing.reveal_window_ms,
                restore_delay_ms: toml_cfg.timing.restore_delay_ms,
            },
            lookup: LookupConfig {
                endpoint: toml_cfg.lookup.endpoint,
                timeout_ms: toml_cfg.lookup.timeout_ms,
                query_log: resolve(&toml_cfg.lookup.query_log),
                success_log: resolve(&toml_cfg.lookup.success_log),
            },
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.timing.noise_tick_ms, 300);
        assert_eq!(cfg.timing.churn_fraction, 0.002);
        assert_eq!(cfg.lookup.timeout_ms, 8000);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg: TomlConfig = toml::from_str("[timing]\nnoise_tick_ms = 100\n").unwrap();
        assert_eq!(cfg.timing.noise_tick_ms, 100);
        assert_eq!(cfg.timing.reveal_window_ms, 1000);
        assert_eq!(cfg.lookup.query_log, "all_queries.txt");
    }
}
