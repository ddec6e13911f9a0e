use serde::Deserialize;
use std::fs;
use std::io::{Error, ErrorKind};

/// Strategy for laying out the remote archive directory tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteLayout {
    /// Mirror the local directory tree below the watched root
    MirrorTree,
    /// Bucket all uploads under a single YYYY-MM-DD directory per day
    DateBucketed,
}

/// Uploader configuration parameters
///
/// Constructed once at startup from a JSON config file and passed
/// into every component; never read from ambient global state.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// FTP server IP/hostname
    pub host: String,
    /// FTP server port (typically 21)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Username for the FTP server
    pub login: String,
    /// Password for the FTP server
    pub password: String,
    /// Base directory on the FTP server under which uploads land
    pub remote_base: String,
    /// Local directory the camera records into (watched, non-recursive)
    pub video_dir: String,
    /// Optional local directory uploaded files are relocated into
    #[serde(default)]
    pub sent_dir: Option<String>,
    /// Minimum seconds since last modification before a file is
    /// considered fully written (default 3 hours)
    #[serde(default = "default_min_age")]
    pub min_age_seconds: u64,
    /// Seconds between drain cycles of the pending set
    #[serde(default = "default_cycle")]
    pub cycle_seconds: u64,
    /// FTP connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Video file extensions considered for upload (case-insensitive)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Remote directory layout strategy
    #[serde(default = "default_layout")]
    pub layout: RemoteLayout,
}

fn default_port() -> u16 {
    21
}

fn default_min_age() -> u64 {
    3 * 3600
}

fn default_cycle() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_extensions() -> Vec<String> {
    vec!["mp4".to_string(), "avi".to_string(), "mkv".to_string()]
}

fn default_layout() -> RemoteLayout {
    RemoteLayout::MirrorTree
}

/// Parses the configuration file into a Config struct
///
/// # Arguments
/// * `filename` - Path to a JSON configuration file
///
/// # Returns
/// * `Result<Config, Error>` - Parsed and validated config or error
///
/// # Errors
/// - File not found or unreadable
/// - Invalid JSON format
/// - Missing required fields
/// - Invalid values (empty host/login/video_dir, zero cycle interval,
///   empty extension list)
///
/// # File Format
/// A single JSON object with fields: host, port, login, password,
/// remote_base, video_dir, sent_dir, min_age_seconds, cycle_seconds,
/// connect_timeout_seconds, extensions, layout
pub fn parse_config(filename: &str) -> Result<Config, Error> {
    let raw = fs::read_to_string(filename)?;

    let mut config: Config = serde_json::from_str(&raw)
        .map_err(|e| Error::new(ErrorKind::InvalidInput, format!("invalid JSON config: {}", e)))?;

    if config.host.is_empty() {
        return Err(Error::new(ErrorKind::InvalidInput, "host must not be empty"));
    }
    if config.login.is_empty() {
        return Err(Error::new(ErrorKind::InvalidInput, "login must not be empty"));
    }
    if config.video_dir.is_empty() {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "video_dir must not be empty",
        ));
    }
    if config.cycle_seconds == 0 {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "cycle_seconds must be at least 1",
        ));
    }
    if config.extensions.is_empty() {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "extensions must not be empty",
        ));
    }

    // Extensions are matched case-insensitively; normalize once here.
    for ext in &mut config.extensions {
        *ext = ext.trim_start_matches('.').to_ascii_lowercase();
        if ext.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "extensions must not contain empty entries",
            ));
        }
    }

    Ok(config)
}
