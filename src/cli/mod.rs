pub mod args;
pub mod meetings;
pub mod session;

pub use args::{Cli, CliCommand};
pub use meetings::{
    handle_meetings_command, handle_participants_command, handle_recordings_command,
    handle_remote_command, handle_stats_command, handle_sync_command,
};
pub use session::handle_auth_command;
