use std::env;
use std::process;

/// Prints usage instructions for the program.
pub fn print_usage() {
    println!(
        "Usage: {} [-h] [-v] [-l logfile] [-1] config_file",
        crate::PROGRAM_NAME
    );
}

/// Parses command line arguments and returns runtime options
///
/// # Returns
/// A tuple containing:
/// - `Option<String>`: Path to log file (None for stdout).
/// - `Option<String>`: Path to config file.
/// - `bool`: Run a single drain cycle and exit (`-1`).
///
/// # Exits
/// - With usage on `-h`, version on `-v`
/// - With an error message if the config file argument is missing
pub fn parse_args() -> (Option<String>, Option<String>, bool) {
    let mut log_file = None;
    let mut config_file = None;
    let mut oneshot = false;

    let mut args = env::args();
    args.next(); // Skip program name

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" => {
                print_usage();
                process::exit(0);
            }
            "-v" => {
                println!("{} version {}", crate::PROGRAM_NAME, crate::PROGRAM_VERSION);
                process::exit(0);
            }
            "-l" => {
                log_file = Some(args.next().unwrap_or_else(|| {
                    eprintln!("Error: Missing log file argument");
                    print_usage();
                    process::exit(1);
                }))
            }
            "-1" => oneshot = true,
            _ => {
                if config_file.is_none() {
                    config_file = Some(arg);
                } else {
                    eprintln!("Unexpected argument: {}", arg);
                    print_usage();
                    process::exit(1);
                }
            }
        }
    }

    if config_file.is_none() {
        eprintln!("Missing config file argument");
        print_usage();
        process::exit(1);
    }

    (log_file, config_file, oneshot)
}
