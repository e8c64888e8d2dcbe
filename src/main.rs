use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use webexsync::cli::{
    handle_delete_recording_command, handle_provision_command, handle_reap_command,
    handle_recording_detail_command, handle_recordings_command, handle_run_command,
    handle_sessions_command, Cli, CliCommand,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        CliCommand::Version => {
            println!("webexsync {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliCommand::Sessions => handle_sessions_command().await,
        CliCommand::Recordings(args) => handle_recordings_command(args).await,
        CliCommand::Reap => handle_reap_command(),
        CliCommand::Run => handle_run_command().await,
        CliCommand::Provision(args) => handle_provision_command(args).await,
        CliCommand::DeleteRecording(args) => handle_delete_recording_command(args),
        CliCommand::RecordingDetail(args) => handle_recording_detail_command(args).await,
    }
}
