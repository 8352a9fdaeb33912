use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::address::{Address, Kind};
use crate::manifest::DEFAULT_MANIFEST;

#[derive(Parser)]
#[command(name = "landscape-provider")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative management of Landscape scripts and attachments", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Manifest declaring scripts and attachments
    #[arg(short = 'f', long, global = true, default_value = DEFAULT_MANIFEST)]
    pub manifest: PathBuf,

    /// State file (defaults to landscape.state.json next to the manifest)
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would change
    Plan,

    /// Make remote scripts match the manifest
    Apply(ApplyArgs),

    /// Re-read every managed instance and record drift
    Refresh,

    /// Delete every managed instance
    Destroy(DestroyArgs),

    /// Bring an existing remote object under management
    Import {
        /// Address to record it under, e.g. script_v2.deploy
        #[arg(value_parser = parse_address)]
        address: Address,

        /// Script id, or <script_id>/<filename> for attachments
        id: String,
    },

    /// Look up remote objects without managing them
    #[command(subcommand)]
    Data(DataCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Apply / Destroy
// ============================================================================

#[derive(Parser)]
pub struct ApplyArgs {
    /// Number of parallel jobs
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,

    /// Dry run - show the plan without changing anything
    #[arg(short, long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser)]
pub struct DestroyArgs {
    /// Number of parallel jobs
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

// ============================================================================
// Data
// ============================================================================

#[derive(Subcommand)]
pub enum DataCommand {
    /// Read a script by id
    Script {
        /// Script id
        id: i64,

        /// Data source to read with
        #[arg(short, long, value_enum, default_value = "script")]
        kind: ScriptKind,
    },

    /// Read an attachment of a V2 script
    Attachment {
        /// Owning script id
        script_id: i64,

        /// Attachment id
        attachment_id: i64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ScriptKind {
    /// Either generation
    #[value(name = "script")]
    Script,
    /// V1 scripts only
    #[value(name = "script_v1")]
    ScriptV1,
    /// V2 scripts only
    #[value(name = "script_v2")]
    ScriptV2,
}

impl From<ScriptKind> for Kind {
    fn from(kind: ScriptKind) -> Self {
        match kind {
            ScriptKind::Script => Kind::Script,
            ScriptKind::ScriptV1 => Kind::ScriptV1,
            ScriptKind::ScriptV2 => Kind::ScriptV2,
        }
    }
}

fn parse_address(s: &str) -> Result<Address, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_and_apply() {
        let cli = Cli::try_parse_from([
            "landscape-provider",
            "-vv",
            "apply",
            "-f",
            "ops/landscape.toml",
            "--jobs",
            "8",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.manifest, PathBuf::from("ops/landscape.toml"));
        assert!(cli.state.is_none());
        match cli.command {
            Command::Apply(args) => {
                assert_eq!(args.jobs, 8);
                assert!(args.dry_run);
                assert!(!args.yes);
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn test_import_parses_address() {
        let cli =
            Cli::try_parse_from(["landscape-provider", "import", "script_attachment.env", "7/env.txt"])
                .unwrap();
        match cli.command {
            Command::Import { address, id } => {
                assert_eq!(address, Address::new(Kind::ScriptAttachment, "env"));
                assert_eq!(id, "7/env.txt");
            }
            _ => panic!("expected import"),
        }

        assert!(Cli::try_parse_from(["landscape-provider", "import", "job.x", "1"]).is_err());
    }

    #[test]
    fn test_data_script_kind() {
        let cli = Cli::try_parse_from([
            "landscape-provider",
            "data",
            "script",
            "42",
            "--kind",
            "script_v1",
        ])
        .unwrap();
        match cli.command {
            Command::Data(DataCommand::Script { id, kind }) => {
                assert_eq!(id, 42);
                assert_eq!(Kind::from(kind), Kind::ScriptV1);
            }
            _ => panic!("expected data script"),
        }
    }
}
