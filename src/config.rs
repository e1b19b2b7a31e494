use std::io::ErrorKind;
use std::path::PathBuf;
use std::{env, fs, io};

use serde::Deserialize;

const CFG_FILE_NAME: &str = "chronicle.toml";

#[derive(Deserialize)]
pub struct Paths {
    pub posts_dir: PathBuf,
    pub images_dir: PathBuf,
}

#[derive(Deserialize)]
pub struct Server {
    pub address: String,
    pub port: u16,
}

/// Admin write operations are disabled until a secret is configured.
#[derive(Deserialize, Default)]
pub struct Admin {
    pub secret: Option<String>,
}

/// Remote fallback store. Both fields are required for the fallback path to
/// be usable; `repo` is an `owner/name` pair.
#[derive(Deserialize, Default)]
pub struct Remote {
    pub token: Option<String>,
    pub repo: Option<String>,
}

#[derive(Deserialize)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize)]
pub struct Config {
    pub paths: Paths,
    pub server: Server,
    #[serde(default)]
    pub admin: Admin,
    #[serde(default)]
    pub remote: Remote,
    pub log: Option<Log>,
}

impl Config {
    pub fn admin_secret(&self) -> Option<&str> {
        match self.admin.secret.as_deref() {
            Some(s) if !s.trim().is_empty() => Some(s),
            _ => None,
        }
    }

    /// Returns `(token, repo)` only when both halves of the remote fallback
    /// are present.
    pub fn remote_credentials(&self) -> Option<(&str, &str)> {
        let token = self.remote.token.as_deref()?;
        let repo = self.remote.repo.as_deref().map(str::trim)?;
        if token.is_empty() || repo.is_empty() {
            return None;
        }
        Some((token, repo))
    }
}

fn parse_path(path: PathBuf) -> PathBuf {
    if path.starts_with("${exe_dir}") {
        let cur_exe = env::current_exe().unwrap();
        let exe_dir = cur_exe.parent().unwrap().to_str().unwrap();
        let str_path = path.to_str().unwrap();
        PathBuf::from(str_path.replace("${exe_dir}", exe_dir))
    } else {
        path
    }
}

/// The secret and the remote credentials may come from the environment
/// instead of the config file. Environment wins, matching how deploy
/// platforms inject them.
fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(secret) = env::var("CHRONICLE_SECRET") {
        cfg.admin.secret = Some(secret);
    }
    if let Ok(token) = env::var("GITHUB_TOKEN") {
        cfg.remote.token = Some(token);
    }
    if let Ok(repo) = env::var("GITHUB_REPO") {
        cfg.remote.repo = Some(repo.trim().to_string());
    }
}

pub fn read_config(cfg_path: &PathBuf) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.to_str().unwrap(), e))),
    };

    let mut cfg: Config = match toml::from_str::<Config>(cfg_content.as_str()) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    cfg.paths = Paths {
        posts_dir: parse_path(cfg.paths.posts_dir),
        images_dir: parse_path(cfg.paths.images_dir),
    };

    apply_env_overrides(&mut cfg);

    Ok(cfg)
}

fn get_config_path() -> Option<PathBuf> {
    let exe_path = env::current_exe().unwrap();
    let exe_dir = exe_path.parent().unwrap();
    let cur_dir = env::current_dir().unwrap();

    if exe_dir.join(CFG_FILE_NAME).exists() {
        return Some(exe_dir.join(CFG_FILE_NAME));
    }

    if cur_dir.join(CFG_FILE_NAME).exists() {
        return Some(cur_dir.join(CFG_FILE_NAME));
    }

    let cfg_dir = dirs::config_dir().expect("Could not find user config dir");
    if cfg_dir.join(CFG_FILE_NAME).exists() {
        return Some(cfg_dir.join(CFG_FILE_NAME));
    }

    None
}

pub fn open_config(cfg_path: Option<PathBuf>) -> Result<Config, String> {
    let config_path = cfg_path.unwrap_or(match get_config_path() {
        None => return Err("Could not find Chronicle configuration".to_string()),
        Some(x) => x,
    });

    let mut config = match read_config(&config_path) {
        Ok(config) => config,
        Err(e) => return Err(e.to_string()),
    };

    if let Some(mut log) = config.log {
        let location = log.location.unwrap_or_else(|| {
            dirs::cache_dir().unwrap().join("Chronicle").join("log").join("server.log")
        });
        log.location = Some(location);
        config.log = Some(log);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Config {
        toml::from_str::<Config>(toml_str).unwrap()
    }

    const BASE_CFG: &str = r##"
[paths]
posts_dir = "content/blog"
images_dir = "public/blog"

[server]
address = "0.0.0.0"
port = 8001
"##;

    #[test]
    fn test_minimal_config() {
        let cfg = parse(BASE_CFG);
        assert_eq!(cfg.paths.posts_dir, PathBuf::from("content/blog"));
        assert_eq!(cfg.server.port, 8001);
        assert!(cfg.admin_secret().is_none());
        assert!(cfg.remote_credentials().is_none());
        assert!(cfg.log.is_none());
    }

    #[test]
    fn test_admin_and_remote_sections() {
        let toml_str = format!("{}{}", BASE_CFG, r##"
[admin]
secret = "hunter2"

[remote]
token = "ghp_abc"
repo = " someone/blog "
"##);
        let cfg = parse(&toml_str);
        assert_eq!(cfg.admin_secret(), Some("hunter2"));
        assert_eq!(cfg.remote_credentials(), Some(("ghp_abc", "someone/blog")));
    }

    #[test]
    fn test_blank_secret_counts_as_unset() {
        let toml_str = format!("{}{}", BASE_CFG, r##"
[admin]
secret = "  "
"##);
        let cfg = parse(&toml_str);
        assert!(cfg.admin_secret().is_none());
    }

    #[test]
    fn test_remote_requires_both_fields() {
        let toml_str = format!("{}{}", BASE_CFG, r##"
[remote]
token = "ghp_abc"
"##);
        let cfg = parse(&toml_str);
        assert!(cfg.remote_credentials().is_none());
    }
}
