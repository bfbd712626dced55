use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ttg-dl")]
#[command(about = "The Tech Game DL: archives every item of a download category")]
#[command(version)]
pub struct Args {
    /// The ID of the category to download
    pub id: String,

    /// Your username
    #[arg(short, long)]
    pub username: String,

    /// Your password
    #[arg(short, long)]
    pub password: String,

    /// JSON configuration file (site addresses, selectors, timeouts)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// WebDriver server to drive the browser through
    #[arg(long, env = "WEBDRIVER_URL")]
    pub webdriver_url: Option<String>,

    /// Show the browser window (PDF snapshots are skipped in this mode)
    #[arg(long)]
    pub headful: bool,

    /// Seconds to wait for each triggered download to finish (0 = don't wait)
    #[arg(long)]
    pub download_wait: Option<u64>,

    /// Directory the category directory is created in
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_required_arguments() {
        let args = Args::try_parse_from(["ttg-dl", "42", "-u", "alice", "--password", "secret"])
            .unwrap();
        assert_eq!(args.id, "42");
        assert_eq!(args.username, "alice");
        assert_eq!(args.password, "secret");
        assert!(!args.headful);
        assert_eq!(args.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_missing_credentials_are_rejected() {
        assert!(Args::try_parse_from(["ttg-dl", "42", "-u", "alice"]).is_err());
        assert!(Args::try_parse_from(["ttg-dl", "-u", "alice", "-p", "secret"]).is_err());
    }
}
