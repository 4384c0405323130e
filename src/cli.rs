use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::lighting::{Color, Mode};

/// RGB lighting daemon for NVIDIA graphics cards
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// YAML config file path
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Detach from the terminal when serving
    #[arg(short = 'd', long = "daemonize")]
    pub daemonize: bool,

    /// Use the session bus instead of the system bus
    #[arg(long, global = true)]
    pub session: bool,

    /// Talk to the hardware in-process instead of through the daemon
    #[arg(long, global = true)]
    pub direct: bool,

    /// Log debug messages
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the daemon (default)
    Serve,
    /// Check that the daemon is reachable
    Ping,
    /// Print the current color as #rrggbb
    GetColor,
    /// Set the color, e.g. "#ff8000"
    SetColor { color: Color },
    /// Print the current effect
    GetMode,
    /// Set the effect: static, breathing, blink or demo
    SetMode { mode: Mode },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_serves() {
        let cli = Cli::try_parse_from(["aurad", "-d", "-c", "/etc/aura.yml"]).unwrap();
        assert_eq!(cli.command(), Command::Serve);
        assert!(cli.daemonize);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/aura.yml")));
    }

    #[test]
    fn set_color_parses_hex() {
        let cli = Cli::try_parse_from(["aurad", "set-color", "#112233"]).unwrap();
        assert_eq!(
            cli.command(),
            Command::SetColor {
                color: Color::from_rgb(0x11, 0x22, 0x33)
            }
        );
    }

    #[test]
    fn set_mode_rejects_unknown_names() {
        assert!(Cli::try_parse_from(["aurad", "set-mode", "rainbow"]).is_err());
        let cli = Cli::try_parse_from(["aurad", "--direct", "set-mode", "demo"]).unwrap();
        assert_eq!(cli.command(), Command::SetMode { mode: Mode::Demo });
        assert!(cli.direct);
    }
}
