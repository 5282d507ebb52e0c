//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hubble")]
#[command(
    author,
    version,
    about = "USB recovery tool for Exynos devices in download mode",
    long_about = None
)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// BL tar from the stock firmware (.tar or .tar.md5)
    #[arg(short = 'b', long, required_unless_present = "list_socs")]
    pub bl_tar: Option<PathBuf>,

    /// Extra SoC profiles (RON list) merged with the built-in table
    #[arg(long)]
    pub profiles: Option<PathBuf>,

    /// Print the supported SoCs and exit
    #[arg(long)]
    pub list_socs: bool,

    /// Directory the BL tar members are staged in
    #[arg(long, default_value = ".")]
    pub work_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bl_tar_required() {
        assert!(Cli::try_parse_from(["hubble"]).is_err());

        let cli = Cli::try_parse_from(["hubble", "-b", "BL.tar.md5", "-vv"]).unwrap();
        assert_eq!(cli.bl_tar, Some(PathBuf::from("BL.tar.md5")));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.work_dir, PathBuf::from("."));
    }

    #[test]
    fn test_list_socs_needs_no_tar() {
        let cli = Cli::try_parse_from(["hubble", "--list-socs"]).unwrap();
        assert!(cli.list_socs);
        assert!(cli.bl_tar.is_none());
    }
}
