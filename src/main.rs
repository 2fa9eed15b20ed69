use clap::Parser;
use clap::error::ErrorKind;
use log::{LevelFilter, debug};
use rzup_install::application::{BootstrapOptions, bootstrap};
use std::io::Write;
use std::process::ExitCode;

/// rzup-install - bootstrap installer for rzup
///
/// Downloads the prebuilt rzup binary for this machine into ~/.risc0/bin and
/// adds that directory to PATH in your shell's startup file.
#[derive(Parser, Debug)]
#[command(author, about)]
struct Cli {
    /// Suppress informational messages
    #[arg(short, long)]
    quiet: bool,

    /// Accepted for compatibility; has no effect
    #[arg(short, long)]
    verbose: bool,

    /// Artifact host base URL
    #[arg(long, env = "RZUP_BASE_URL", value_name = "URL", hide = true)]
    base_url: Option<String>,

    /// Artifact environment path segment (e.g. prod)
    #[arg(long, env = "RZUP_ENV", value_name = "ENV", hide = true)]
    env_path: Option<String>,
}

const SWITCHES: &[&str] = &["-h", "--help", "-q", "--quiet", "-v", "--verbose"];
const OPTIONS: &[&str] = &["--base-url", "--env-path"];

/// Splits the command line into the arguments [`Cli`] understands and the
/// ones to ignore. The program name is kept as the first recognised entry.
fn split_args<I>(args: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut known: Vec<String> = args.next().into_iter().collect();
    let mut ignored = Vec::new();

    while let Some(arg) = args.next() {
        let is_switch = SWITCHES.contains(&arg.as_str())
            || (arg.len() > 2
                && arg.starts_with('-')
                && !arg.starts_with("--")
                && arg[1..].chars().all(|c| matches!(c, 'h' | 'q' | 'v')));
        let is_inline_option = OPTIONS.iter().any(|opt| {
            arg.strip_prefix(opt)
                .is_some_and(|rest| rest.starts_with('='))
        });

        if is_switch || is_inline_option {
            known.push(arg);
        } else if OPTIONS.contains(&arg.as_str()) {
            match args.next() {
                Some(value) => {
                    known.push(arg);
                    known.push(value);
                }
                None => ignored.push(arg),
            }
        } else {
            ignored.push(arg);
        }
    }

    (known, ignored)
}

fn init_logging(quiet: bool) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,rzup_install=info"),
    )
    .format(|buf, record| {
        writeln!(
            buf,
            "{}: {}",
            record.level().as_str().to_ascii_lowercase(),
            record.args()
        )
    })
    .init();

    // RUST_LOG can narrow output further but never re-enables info under --quiet
    if quiet {
        log::set_max_level(log::max_level().min(LevelFilter::Warn));
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let (known, ignored) = split_args(std::env::args());
    let cli = match Cli::try_parse_from(known) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };
    init_logging(cli.quiet);
    debug!("rzup-install {}", env!("RZUP_INSTALL_VERSION"));
    if !ignored.is_empty() {
        debug!("Ignoring arguments: {:?}", ignored);
    }

    let runtime = rzup_install::runtime::RealRuntime;
    let options = BootstrapOptions {
        base_url: cli.base_url,
        env_path: cli.env_path,
    };

    match bootstrap(&runtime, &options).await {
        Ok(report) => {
            print!("{}", report.instructions());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn parse(list: &[&str]) -> (Result<Cli, clap::Error>, Vec<String>) {
        let (known, ignored) = split_args(args(list));
        (Cli::try_parse_from(known), ignored)
    }

    #[test]
    fn test_cli_defaults() {
        let (cli, ignored) = parse(&["rzup-install"]);
        let cli = cli.unwrap();
        assert!(!cli.quiet);
        assert!(!cli.verbose);
        assert!(ignored.is_empty());
    }

    #[test]
    fn test_cli_short_and_long_flags() {
        let (cli, _) = parse(&["rzup-install", "-q", "-v"]);
        let cli = cli.unwrap();
        assert!(cli.quiet);
        assert!(cli.verbose);

        let (cli, _) = parse(&["rzup-install", "--quiet", "--verbose"]);
        let cli = cli.unwrap();
        assert!(cli.quiet);
        assert!(cli.verbose);

        let (cli, _) = parse(&["rzup-install", "-qv"]);
        let cli = cli.unwrap();
        assert!(cli.quiet);
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_ignores_unknown_arguments() {
        let (cli, ignored) = parse(&["rzup-install", "--quiet", "--unknown-flag"]);
        assert!(cli.unwrap().quiet);
        assert_eq!(ignored, args(&["--unknown-flag"]));

        let (cli, ignored) = parse(&["rzup-install", "stray"]);
        assert!(!cli.unwrap().quiet);
        assert_eq!(ignored, args(&["stray"]));
    }

    #[test]
    fn test_known_flags_after_unknown_arguments_still_apply() {
        let (cli, ignored) = parse(&["rzup-install", "stray", "--quiet"]);
        assert!(cli.unwrap().quiet);
        assert_eq!(ignored, args(&["stray"]));

        let (cli, ignored) = parse(&["rzup-install", "--frobnicate", "-x", "-v"]);
        assert!(cli.unwrap().verbose);
        assert_eq!(ignored, args(&["--frobnicate", "-x"]));
    }

    #[test]
    fn test_help_after_unknown_argument_is_a_display_request() {
        let (cli, ignored) = parse(&["rzup-install", "--frobnicate", "--help"]);
        assert_eq!(cli.unwrap_err().kind(), ErrorKind::DisplayHelp);
        assert_eq!(ignored, args(&["--frobnicate"]));

        let (cli, _) = parse(&["rzup-install", "-h"]);
        assert_eq!(cli.unwrap_err().kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_and_malformed_flags_are_ignored() {
        let (cli, ignored) = parse(&["rzup-install", "--version", "-V", "--quiet=yes"]);
        assert!(!cli.unwrap().quiet);
        assert_eq!(ignored, args(&["--version", "-V", "--quiet=yes"]));
    }

    #[test]
    fn test_cli_base_url_override() {
        let (cli, _) = parse(&[
            "rzup-install",
            "stray",
            "--base-url",
            "http://localhost:9000",
            "--env-path=staging",
        ]);
        let cli = cli.unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(cli.env_path.as_deref(), Some("staging"));
    }

    #[test]
    fn test_option_without_value_is_ignored() {
        let (cli, ignored) = parse(&["rzup-install", "--env-path"]);
        assert!(cli.is_ok());
        assert_eq!(ignored, args(&["--env-path"]));
    }

    #[test]
    fn test_parse_errors_are_not_display_requests() {
        let err = Cli::try_parse_from(args(&["rzup-install", "--base-url", "--quiet"])).unwrap_err();
        assert_ne!(err.kind(), ErrorKind::DisplayHelp);
    }
}
