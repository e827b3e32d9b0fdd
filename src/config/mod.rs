mod company;
mod state;

pub use company::{
    ApiSettings, Company, Config, DocumentSettings, TipSettings, DEFAULT_COMPANY_NAME,
    DEFAULT_COMPANY_TAGLINE,
};
pub use state::{Counter, RecordedTip, SettlementRecord, State};

use crate::error::{Result, ShopError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (platform config dir, else ~/.timax/)
pub fn config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "timax") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    let home = dirs_home().ok_or_else(|| {
        ShopError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".timax"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve the document output directory; relative paths hang off the config dir.
pub fn resolve_output_dir(output_dir: &str, cfg_dir: &Path) -> PathBuf {
    let expanded = expand_path(output_dir);
    if expanded.is_absolute() {
        expanded
    } else {
        cfg_dir.join(expanded)
    }
}

/// Fail early when `timax init` has not been run.
pub fn ensure_initialized(cfg_dir: &Path) -> Result<()> {
    if cfg_dir.exists() {
        Ok(())
    } else {
        Err(ShopError::ConfigNotFound(cfg_dir.to_path_buf()))
    }
}

/// Load the main config.toml
pub fn load_config(cfg_dir: &Path) -> Result<Config> {
    let path = cfg_dir.join("config.toml");
    if !path.exists() {
        return Err(ShopError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| ShopError::ConfigParse { path, source: e })
}

/// Load state.toml (empty journal if missing)
pub fn load_state(cfg_dir: &Path) -> Result<State> {
    let path = cfg_dir.join("state.toml");
    if !path.exists() {
        return Ok(State::default());
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| ShopError::ConfigParse { path, source: e })
}

/// Save state.toml
pub fn save_state(cfg_dir: &Path, state: &State) -> Result<()> {
    let path = cfg_dir.join("state.toml");
    let content =
        toml::to_string_pretty(state).map_err(|e| ShopError::StateWrite(e.to_string()))?;
    fs::write(path, content)?;
    Ok(())
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[company]
name = "Timax Auto Garage"            # TIMAX_COMPANY_NAME overrides
tagline = "Quality service, every time"  # TIMAX_COMPANY_TAGLINE overrides
# address = "Mombasa Road, Nairobi"   # optional
# phone = "+254 700 000 000"          # optional
# email = "service@example.com"       # optional

[api]
base_url = "http://localhost:8000/api/v1"
# token = "..."                       # or set TIMAX_API_TOKEN
timeout_secs = 15
retries = 1                           # at most one retry; 401/403 never retried

[tips]
# How leftover cents of an even tip split are handled:
# "unallocated" (reported, not assigned), "first-employee", "round-robin"
remainder = "unallocated"

[documents]
output_dir = "output"                 # relative to this directory, ~ allowed
currency_symbol = "KSh "
# phone_country_code = "254"          # used for WhatsApp share links
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses() {
        let config: Config = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8000/api/v1");
        assert_eq!(config.company.name, DEFAULT_COMPANY_NAME);
    }

    #[test]
    fn relative_output_dir_resolves_against_config_dir() {
        let cfg = Path::new("/srv/timax");
        assert_eq!(resolve_output_dir("output", cfg), PathBuf::from("/srv/timax/output"));
        assert_eq!(resolve_output_dir("/tmp/pdfs", cfg), PathBuf::from("/tmp/pdfs"));
    }

    #[test]
    fn state_round_trips_through_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut state = State::default();
        let id = state.next_settlement_id(chrono::Utc::now());
        save_state(dir.path(), &state).unwrap();

        let loaded = load_state(dir.path()).unwrap();
        assert_eq!(loaded.counter.last_number, 1);
        assert!(id.starts_with("SET-"));
    }
}
