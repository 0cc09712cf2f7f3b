//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "chaussee",
    version,
    about = "Check pavement structures against NF P98-086",
    long_about = "Create, check and normalise pavement design projects (.chs files).\n\n\
                  Layer thickness, modulus and Poisson ratio are checked against the\n\
                  ranges of NF P98-086, interfaces are set per §8.5.1.3 and the\n\
                  composition rules of the structure type are reported."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a new project with the default flexible structure
    New(NewArgs),

    /// Load a project, re-validate it and print a compliance report
    Check(CheckArgs),

    /// Show the GNT category and parameters for a platform modulus
    Gnt(GntArgs),

    /// Compute cumulative heavy traffic
    Traffic(TrafficArgs),
}

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Path of the project file to create
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Project name
    #[arg(long, default_value = "New project")]
    pub name: String,

    /// Responsible engineer
    #[arg(long, default_value = "")]
    pub author: String,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Project file to check
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Switch every course to Automatic mode before checking
    #[arg(long)]
    pub automatic: bool,

    /// Print the report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Save the normalised project back to PATH
    #[arg(long)]
    pub save: bool,

    /// User name written to the lock file when saving
    #[arg(long, default_value = "chaussee")]
    pub user: String,
}

#[derive(Args, Debug)]
pub struct GntArgs {
    /// Platform modulus (MPa)
    #[arg(value_name = "MPA")]
    pub platform_modulus: f64,

    /// Use the thick bituminous table
    #[arg(long)]
    pub thick_bituminous: bool,
}

#[derive(Args, Debug)]
pub struct TrafficArgs {
    /// Heavy vehicles per day on the design lane
    #[arg(long)]
    pub mja: f64,

    /// Yearly growth rate (%)
    #[arg(long, default_value_t = 2.0)]
    pub rate: f64,

    /// Service life (years)
    #[arg(long, default_value_t = 20)]
    pub years: u32,

    /// Geometric growth instead of arithmetic
    #[arg(long)]
    pub geometric: bool,

    /// Mean aggressiveness coefficient; prints NE when given
    #[arg(long)]
    pub cam: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_check_flags() {
        let cli = Cli::parse_from(["chaussee", "-v", "check", "rd12.chs", "--automatic", "--json"]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Check(args) => {
                assert!(args.automatic && args.json);
                assert!(!args.save);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_traffic_defaults() {
        let cli = Cli::parse_from(["chaussee", "traffic", "--mja", "150"]);
        match cli.command {
            Command::Traffic(args) => {
                assert_eq!(args.rate, 2.0);
                assert_eq!(args.years, 20);
                assert!(!args.geometric);
                assert!(args.cam.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
