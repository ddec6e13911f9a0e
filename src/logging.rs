use chrono::Local;
use once_cell::sync::Lazy;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

/// Global log file path protected by Mutex
///
/// Thread-safe storage for optional log file path.
/// When None, logs go to stdout.
pub static LOG_FILE: Lazy<Mutex<Option<String>>> = Lazy::new(|| Mutex::new(None));

/// Severity attached to every log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "INFO"),
            Level::Warning => write!(f, "WARNING"),
            Level::Error => write!(f, "ERROR"),
        }
    }
}

/// Logs a message with timestamp and severity to configured output
///
/// If a log file has been set (via set_log_file), the line is appended
/// there, otherwise it is printed to stdout.
///
/// # Arguments
/// * `level` - Severity of the message
/// * `message` - The message to log
///
/// # Returns
/// * `io::Result<()>` - Ok on success, Err if writing fails
pub fn log(level: Level, message: &str) -> io::Result<()> {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let log_message = format!("{} {} {}\n", timestamp, level, message);

    match &*LOG_FILE.lock().unwrap() {
        Some(log_file) => {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)?;
            file.write_all(log_message.as_bytes())?;
        }
        None => {
            print!("{}", log_message);
        }
    }

    Ok(())
}

/// Logs at Info level
pub fn info(message: &str) -> io::Result<()> {
    log(Level::Info, message)
}

/// Logs at Warning level
pub fn warn(message: &str) -> io::Result<()> {
    log(Level::Warning, message)
}

/// Logs at Error level
pub fn error(message: &str) -> io::Result<()> {
    log(Level::Error, message)
}

/// Sets the path for the log file
///
/// Subsequent calls to the log functions will append to this file.
///
/// # Arguments
/// * `path` - Location of the log file
pub fn set_log_file<P: AsRef<Path>>(path: P) {
    let path_str = path.as_ref().to_str().expect("Path is not valid UTF-8");
    *LOG_FILE.lock().unwrap() = Some(path_str.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn test_log_to_file() {
        // Reset LOG_FILE before test to ensure clean state
        *LOG_FILE.lock().unwrap() = None;

        let dir = tempdir().unwrap();
        let log_file_path = dir.path().join("test.log");

        set_log_file(&log_file_path);
        info("test message 1").unwrap();
        warn("test message 2").unwrap();
        error("test message 3").unwrap();

        let log_contents = fs::read_to_string(&log_file_path).unwrap();
        assert!(log_contents.contains("INFO test message 1"));
        assert!(log_contents.contains("WARNING test message 2"));
        assert!(log_contents.contains("ERROR test message 3"));

        // Reset LOG_FILE for other tests
        *LOG_FILE.lock().unwrap() = None;
    }

    #[test]
    #[serial]
    fn test_log_to_stdout() {
        // Reset LOG_FILE before test to ensure clean state
        *LOG_FILE.lock().unwrap() = None;

        // Just ensure stdout logging does not panic or error.
        info("test stdout message").unwrap();
        log(Level::Error, "test stdout message 2").unwrap();
    }

    #[test]
    fn test_level_display() {
        assert_eq!(Level::Info.to_string(), "INFO");
        assert_eq!(Level::Warning.to_string(), "WARNING");
        assert_eq!(Level::Error.to_string(), "ERROR");
    }
}
