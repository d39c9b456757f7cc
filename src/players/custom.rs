//! User supplied player command

use super::{Player, PlayerError, spawn};
use crate::media::Media;
use std::process::Child;

/// Launches any configured command with the stream url as its first argument
///
/// The command may carry its own arguments, e.g. `celluloid --new-window`.
pub struct CustomPlayer {
    command: String,
}

impl CustomPlayer {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
        }
    }

    fn program_and_args(&self, media: &Media) -> (&str, Vec<String>) {
        let mut parts = self.command.split_whitespace();
        let program = parts.next().unwrap_or(self.command.as_str());

        let mut args = vec![media.url.clone()];
        args.extend(parts.map(str::to_string));

        (program, args)
    }
}

impl Player for CustomPlayer {
    fn display_name(&self) -> &str {
        &self.command
    }

    fn play(&self, media: &Media) -> Result<Option<Child>, PlayerError> {
        let (program, args) = self.program_and_args(media);
        spawn(&self.command, program, &args).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_with_arguments() {
        let player = CustomPlayer::new("celluloid --new-window");
        let media = Media::single("https://example.com/movie.mp4", "Sintel", None);

        let (program, args) = player.program_and_args(&media);

        assert_eq!(program, "celluloid");
        assert_eq!(args, vec!["https://example.com/movie.mp4", "--new-window"]);
    }

    #[test]
    fn test_missing_binary() {
        let player = CustomPlayer::new("playscout-no-such-player");
        let media = Media::single("https://example.com/movie.mp4", "Sintel", None);

        assert!(matches!(player.play(&media), Err(PlayerError::NotFound { .. })));
    }
}
