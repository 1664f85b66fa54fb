//! Playlist track auto-provisioning.

use tracing::{info, warn};

use crate::commands::Command;
use crate::events;
use crate::project::ProjectApi;

/// Highest playlist track index any command in the batch writes to.
pub fn max_track_index(commands: &[Command]) -> Option<usize> {
    commands
        .iter()
        .filter_map(Command::playlist_track)
        .filter_map(|i| usize::try_from(i).ok())
        .max()
}

/// Append playlist tracks until every referenced index exists, never growing
/// the playlist past `cap` tracks. Returns the indices created.
///
/// Indices beyond the cap are left for the step's own track validation to
/// reject. A failing collaborator stops provisioning without failing the batch.
pub fn provision(commands: &[Command], project: &mut dyn ProjectApi, cap: usize) -> Vec<usize> {
    let Some(max_index) = max_track_index(commands) else {
        return Vec::new();
    };
    let needed = max_index.saturating_add(1).min(cap);
    let mut created = Vec::new();
    while project.playlist_track_count() < needed {
        match project.add_playlist_track(None) {
            Ok(index) => {
                info!(
                    event = events::TRACK_PROVISIONED,
                    track_index = index,
                    "Auto-created playlist track"
                );
                created.push(index);
            }
            Err(e) => {
                warn!(
                    event = events::TRACK_PROVISIONED,
                    error = %e,
                    "Playlist track provisioning failed"
                );
                break;
            }
        }
    }
    created
}
