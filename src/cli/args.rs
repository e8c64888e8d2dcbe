use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "webexsync")]
#[command(about = "Keep meetings, recordings and users in step with a WebEx site", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Update meeting status from the sessions open on the site
    Sessions,
    /// Fetch recording metadata from the site
    Recordings(RecordingsCliArgs),
    /// Erase recordings that have been in the trash past the retention period
    Reap,
    /// Run sessions, recordings and reap in one pass
    Run,
    /// Find or create the WebEx account for a local user
    Provision(ProvisionCliArgs),
    /// Move a recording to the trash
    DeleteRecording(RecordingIdArgs),
    /// Show what the site knows about one recording
    RecordingDetail(RecordingIdArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct RecordingsCliArgs {
    /// Only list recordings of this session key
    #[arg(long)]
    pub meeting_key: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct ProvisionCliArgs {
    /// Id of the user in the local application
    #[arg(long)]
    pub user_id: i64,
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub email: String,
    /// Verify stored credentials against the site and replace them if rejected
    #[arg(long)]
    pub check_auth: bool,
}

#[derive(ClapArgs, Debug)]
pub struct RecordingIdArgs {
    /// Remote recording id
    pub recording_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provision() {
        let cli = Cli::parse_from([
            "webexsync",
            "provision",
            "--user-id",
            "7",
            "--username",
            "jdoe",
            "--first-name",
            "Jane",
            "--last-name",
            "Doe",
            "--email",
            "jane@example.com",
            "--check-auth",
        ]);

        match cli.command {
            CliCommand::Provision(args) => {
                assert_eq!(args.user_id, 7);
                assert_eq!(args.username, "jdoe");
                assert!(args.check_auth);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_recordings_with_key() {
        let cli = Cli::parse_from(["webexsync", "-v", "recordings", "--meeting-key", "123"]);
        assert!(cli.verbose);
        match cli.command {
            CliCommand::Recordings(args) => assert_eq!(args.meeting_key.as_deref(), Some("123")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_recording_id_commands() {
        let cli = Cli::parse_from(["webexsync", "delete-recording", "r1"]);
        assert!(matches!(cli.command, CliCommand::DeleteRecording(ref a) if a.recording_id == "r1"));

        let cli = Cli::parse_from(["webexsync", "recording-detail", "r2"]);
        assert!(matches!(cli.command, CliCommand::RecordingDetail(ref a) if a.recording_id == "r2"));
    }
}
