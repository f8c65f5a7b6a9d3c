use clap::{Parser, Subcommand};

const HELP_EPILOG: &str = r#"Server options can also be provided via environment variables:
  CONFIG_PATH (default: ./config.yaml)
  DB_PATH     (default: data/app.db)
  PORT        (default: 5151 or config.listen_port)
  RUST_LOG    (default: info)

The `promote` command grants or revokes the admin role for an existing
account without starting the server.
"#;

#[derive(Debug, Parser)]
#[command(
    name = "journey-server",
    version,
    about = "Onboarding journey server",
    long_about = None,
    after_long_help = HELP_EPILOG,
)]
pub struct Cli {
    /// Optional subcommand. Without one, runs the server.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Grant the admin role to a registered user (uses DB_PATH)
    Promote {
        /// Email address of the account
        #[arg(long)]
        email: String,
        /// Demote back to a regular user instead
        #[arg(long)]
        revoke: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_promote_subcommand() {
        let cli = Cli::try_parse_from(["journey-server", "promote", "--email", "a@b.co"]).unwrap();
        match cli.command {
            Some(Command::Promote { email, revoke }) => {
                assert_eq!(email, "a@b.co");
                assert!(!revoke);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_runs_server() {
        let cli = Cli::try_parse_from(["journey-server"]).unwrap();
        assert!(cli.command.is_none());
    }
}
