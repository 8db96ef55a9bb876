use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::backend::MAX_PAGE_SIZE;
use crate::catalog::MeetingCategory;

#[derive(Parser, Debug)]
#[command(name = "meetsync")]
#[command(about = "Sync conferencing meetings into a local record", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Run the API server (default when no command is given)
    Serve,
    /// Check, connect or disconnect the provider account
    Auth(AuthCliArgs),
    /// List meetings on the provider that can be synced
    Remote {
        #[arg(value_enum, default_value_t = MeetingCategory::Past)]
        category: MeetingCategory,
    },
    /// Browse meetings that are already synced
    Meetings(MeetingsCliArgs),
    /// Sync a meeting from the provider and verify it landed
    Sync {
        /// Provider meeting id
        id: String,
    },
    /// Re-sync participants of a synced meeting
    Participants {
        /// Provider meeting id
        id: String,
    },
    /// Sync or download recordings of a synced meeting
    Recordings(RecordingsCliArgs),
    /// Show attendance statistics for a synced meeting
    Stats {
        /// Provider meeting id
        id: String,
        /// Also show the figures the backend computes itself
        #[arg(long)]
        backend: bool,
    },
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct AuthCliArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Show whether the provider account is connected
    Status,
    /// Print the authorization URL to open in a browser
    Connect,
    /// Revoke the stored provider credentials
    Disconnect {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Poll the connection status and report changes until Ctrl+C
    Watch,
}

#[derive(ClapArgs, Debug)]
pub struct MeetingsCliArgs {
    #[command(subcommand)]
    pub command: MeetingsCommand,
}

#[derive(Subcommand, Debug)]
pub enum MeetingsCommand {
    /// List synced meetings
    List {
        /// Maximum number of meetings to show
        #[arg(short, long, default_value_t = MAX_PAGE_SIZE)]
        limit: u32,
        /// Number of meetings to skip
        #[arg(short, long, default_value_t = 0)]
        offset: u32,
    },
    /// Show one synced meeting with participants and recordings
    Show {
        /// Provider meeting id
        id: String,
    },
}

#[derive(ClapArgs, Debug)]
pub struct RecordingsCliArgs {
    #[command(subcommand)]
    pub command: RecordingsCommand,
}

#[derive(Subcommand, Debug)]
pub enum RecordingsCommand {
    /// Sync the recording list of a synced meeting
    Sync {
        /// Provider meeting id
        id: String,
    },
    /// Have the backend download one recording
    Download {
        /// Provider meeting id
        id: String,
        /// Recording id as listed by `recordings sync`
        recording_id: String,
    },
}
