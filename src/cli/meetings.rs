//! CLI handlers for catalog, meeting, sync and stats commands.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;

use crate::backend::{RemoteId, SyncedMeeting};
use crate::catalog::{CatalogOutcome, MeetingCategory};
use crate::cli::args::{MeetingsCliArgs, MeetingsCommand, RecordingsCliArgs, RecordingsCommand};
use crate::engine::Engine;
use crate::stats::format_duration;
use crate::sync::SyncError;

pub async fn handle_remote_command(engine: &Engine, category: MeetingCategory) -> Result<()> {
    match engine.list_remote(category).await {
        CatalogOutcome::Results { meetings } => {
            println!("{} {} meeting(s):", meetings.len(), category);
            println!();
            for meeting in meetings {
                println!(
                    "  {:<14} {:<20} {:>9}  {}",
                    meeting.remote_id,
                    fmt_time(meeting.start_time),
                    meeting
                        .duration_seconds
                        .map(format_duration)
                        .unwrap_or_else(|| "-".to_string()),
                    meeting.topic.as_deref().unwrap_or("(no topic)")
                );
            }
            println!();
            println!("Sync one with `meetsync sync <id>`.");
            Ok(())
        }
        CatalogOutcome::Empty { message } | CatalogOutcome::Invalid { message } => {
            println!("{}", message);
            Ok(())
        }
        CatalogOutcome::Error { message } => anyhow::bail!(message),
    }
}

pub async fn handle_meetings_command(engine: &Engine, args: MeetingsCliArgs) -> Result<()> {
    match args.command {
        MeetingsCommand::List { limit, offset } => list_meetings(engine, limit, offset).await,
        MeetingsCommand::Show { id } => show_meeting(engine, &RemoteId::from(id)).await,
    }
}

async fn list_meetings(engine: &Engine, limit: u32, offset: u32) -> Result<()> {
    let meetings = engine
        .list_meetings(limit, offset)
        .await
        .context("Failed to load meetings")?;

    if meetings.is_empty() {
        println!("No meetings synced yet. Browse with `meetsync remote past`.");
        return Ok(());
    }

    for meeting in &meetings {
        println!(
            "  {:<14} {:<20} {:>9}  {:>3} participant(s)  {}",
            meeting.remote_id,
            fmt_time(meeting.start_time),
            meeting
                .duration_seconds
                .map(format_duration)
                .unwrap_or_else(|| "-".to_string()),
            meeting.participant_count.unwrap_or(0),
            meeting.topic.as_deref().unwrap_or("(no topic)")
        );
    }
    Ok(())
}

async fn show_meeting(engine: &Engine, remote_id: &RemoteId) -> Result<()> {
    let meeting = engine.get_meeting(remote_id).await?;
    print_meeting(&meeting);
    Ok(())
}

pub async fn handle_sync_command(engine: &Engine, id: String) -> Result<()> {
    let remote_id = RemoteId::from(id);
    let result = with_spinner(
        format!("Syncing meeting {}...", remote_id),
        engine.sync_meeting(&remote_id),
    )
    .await;

    match result {
        Ok(meeting) => {
            println!("Meeting synced.");
            println!();
            print_meeting(&meeting);
            Ok(())
        }
        Err(e) => Err(reload_hint(e)),
    }
}

pub async fn handle_participants_command(engine: &Engine, id: String) -> Result<()> {
    let remote_id = RemoteId::from(id);
    let result = with_spinner(
        format!("Syncing participants for {}...", remote_id),
        engine.sync_participants(&remote_id),
    )
    .await
    .map_err(reload_hint)?;

    println!("{}", result.summary());
    for participant in &result.participants {
        println!(
            "  {:<30} {:>9}  {}",
            participant.display_name(),
            participant
                .duration_seconds
                .map(format_duration)
                .unwrap_or_else(|| "-".to_string()),
            participant.user_email.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

pub async fn handle_recordings_command(engine: &Engine, args: RecordingsCliArgs) -> Result<()> {
    match args.command {
        RecordingsCommand::Sync { id } => {
            let remote_id = RemoteId::from(id);
            let result = with_spinner(
                format!("Syncing recordings for {}...", remote_id),
                engine.sync_recordings(&remote_id),
            )
            .await
            .map_err(reload_hint)?;

            println!("{}", result.summary());
            for recording in &result.recordings {
                println!(
                    "  {:<24} {:<6} {:>10}  {}",
                    recording.recording_id.as_deref().unwrap_or("-"),
                    recording.file_type.as_deref().unwrap_or("-"),
                    recording
                        .file_size_bytes
                        .map(fmt_bytes)
                        .unwrap_or_else(|| "-".to_string()),
                    recording.status
                );
            }
            Ok(())
        }
        RecordingsCommand::Download { id, recording_id } => {
            let remote_id = RemoteId::from(id);
            let path = with_spinner(
                format!("Downloading recording {}...", recording_id),
                engine.download_recording(&remote_id, &recording_id),
            )
            .await
            .context("Failed to download recording")?;
            println!("Recording saved to {}", path);
            Ok(())
        }
    }
}

pub async fn handle_stats_command(engine: &Engine, id: String, backend: bool) -> Result<()> {
    let remote_id = RemoteId::from(id);
    let stats = engine.stats(&remote_id).await?;

    println!("Participants:       {}", stats.total_participants);
    match (
        stats.avg_duration_seconds,
        stats.min_duration_seconds,
        stats.max_duration_seconds,
        stats.total_duration_seconds,
    ) {
        (Some(avg), Some(min), Some(max), Some(total)) => {
            println!("Average attendance: {}", format_duration(avg.round() as i64));
            println!("Shortest:           {}", format_duration(min));
            println!("Longest:            {}", format_duration(max));
            println!("Total:              {}", format_duration(total));
        }
        _ => println!("Attendance:         N/A (no participant durations recorded)"),
    }

    if backend {
        let reported = engine
            .backend_stats(&remote_id)
            .await
            .context("Failed to load backend stats")?;
        println!();
        println!("Backend reports:");
        println!("  participants {}", reported.total_participants);
        println!(
            "  avg {:.0}s  min {}s  max {}s  total {}s",
            reported.avg_duration,
            reported.min_duration,
            reported.max_duration,
            reported.total_duration
        );
    }
    Ok(())
}

fn print_meeting(meeting: &SyncedMeeting) {
    println!("Meeting:      {}", meeting.remote_id);
    println!("Topic:        {}", meeting.topic.as_deref().unwrap_or("(no topic)"));
    if let Some(host) = &meeting.host_email {
        println!("Host:         {}", host);
    }
    println!("Start:        {}", fmt_time(meeting.start_time));
    println!("End:          {}", fmt_time(meeting.end_time));
    if let Some(duration) = meeting.duration_seconds {
        println!("Duration:     {}", format_duration(duration));
    }
    println!("Participants: {}", meeting.participants.len());
    println!("Recordings:   {}", meeting.recordings.len());
}

/// Run `work` behind a spinner that covers the settle wait.
async fn with_spinner<T, E>(
    message: String,
    work: impl Future<Output = Result<T, E>>,
) -> Result<T, E> {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = work.await;
    spinner.finish_and_clear();
    result
}

fn reload_hint(err: SyncError) -> anyhow::Error {
    if err.requires_reload() {
        anyhow::anyhow!(
            "{}. Local meeting data may be out of date; reload with `meetsync meetings list`.",
            err
        )
    } else {
        err.into()
    }
}

fn fmt_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn fmt_bytes(bytes: i64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    if bytes as f64 >= MB {
        format!("{:.1} MB", bytes as f64 / MB)
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}
