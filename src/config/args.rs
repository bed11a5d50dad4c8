//! Command-line argument parsing
//!
//! The binary understands only a handful of arguments, so they are parsed by
//! hand:
//! - `-c PATH` / `--config PATH` / `-c=PATH` / `--config=PATH`
//! - `generate-config [PATH]`
//! - anything else (or nothing) starts the server

/// What the binary was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Serve,
    GenerateConfig { output: Option<String> },
}

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub config_path: Option<String>,
    pub command: Command,
}

/// Parse arguments (index 0 is the program name)
///
/// # Examples
/// ```
/// use plugin_metrics::config::args::{parse_args, Command};
/// let args = vec!["plugin-metrics".to_string(), "-c".to_string(), "prod.toml".to_string()];
/// let parsed = parse_args(&args);
/// assert_eq!(parsed.config_path.as_deref(), Some("prod.toml"));
/// assert_eq!(parsed.command, Command::Serve);
/// ```
pub fn parse_args(args: &[String]) -> CliArgs {
    let mut config_path = None;
    let mut positional: Vec<&str> = Vec::new();

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "-c" || arg == "--config" {
            if let Some(path) = iter.next() {
                config_path = Some(path.clone());
            }
            continue;
        }

        if let Some(path) = arg
            .strip_prefix("-c=")
            .or_else(|| arg.strip_prefix("--config="))
        {
            config_path = Some(path.to_string());
            continue;
        }

        positional.push(arg.as_str());
    }

    let command = match positional.as_slice() {
        ["generate-config", rest @ ..] => Command::GenerateConfig {
            output: rest.first().map(|s| s.to_string()),
        },
        _ => Command::Serve,
    };

    CliArgs {
        config_path,
        command,
    }
}
