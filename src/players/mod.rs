//! Media players
//!
//! This module defines the interface for handing a resolved stream to an
//! external player process, with implementations for mpv, VLC and any other
//! command the user configures.

mod custom;
mod mpv;
mod vlc;

pub use custom::CustomPlayer;
pub use mpv::Mpv;
pub use vlc::Vlc;

use crate::media::Media;
use crate::platform::Platform;
use std::process::{Child, Command, Stdio};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while launching a player
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The player binary could not be started
    #[error(
        "The player '{player}' was not found! Are you sure you have it installed and in your PATH? Error: {source}"
    )]
    NotFound {
        player: String,
        source: std::io::Error,
    },

    /// The player can't play media that needs a referrer on this platform
    #[error("The {player} player on {platform} does not support passing referrers, so this media cannot be played.")]
    ReferrerNotSupported { player: String, platform: Platform },

    /// The player has no way of running on this platform
    #[error("The player '{player}' is not supported on this platform ({platform}).")]
    UnsupportedPlatform { player: String, platform: Platform },
}

/// An external program that plays media
pub trait Player {
    /// Name shown to the user
    fn display_name(&self) -> &str;

    /// Starts playback
    ///
    /// Returns the spawned process, or `None` if playback was handed off
    /// without a process to wait on.
    fn play(&self, media: &Media) -> Result<Option<Child>, PlayerError>;
}

/// Picks the player implementation for the configured player name
///
/// # Arguments
///
/// * `name` - The `player` config value, `mpv`, `vlc` or any other binary
/// * `platform` - The platform we're running on
/// * `debug` - Let the player print to the terminal
pub fn player_for(name: &str, platform: Platform, debug: bool) -> Box<dyn Player> {
    match name.trim().to_lowercase().as_str() {
        "mpv" => Box::new(Mpv::new(platform, debug)),
        "vlc" => Box::new(Vlc::new(platform, debug)),
        _ => Box::new(CustomPlayer::new(name.trim())),
    }
}

/// Spawns `program` with `args`, mapping a missing binary to [`PlayerError::NotFound`]
fn spawn(player: &str, program: &str, args: &[String]) -> Result<Child, PlayerError> {
    debug!("Launching '{}' with {} argument(s)", program, args.len());

    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .spawn()
        .map_err(|e| PlayerError::NotFound {
            player: player.to_string(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_for_known_names() {
        assert_eq!(player_for("mpv", Platform::Linux, false).display_name(), "MPV");
        assert_eq!(player_for(" VLC ", Platform::Linux, false).display_name(), "VLC");
        assert_eq!(player_for("celluloid", Platform::Linux, false).display_name(), "celluloid");
    }
}
