//! VLC player

use super::{Player, PlayerError, spawn};
use crate::media::Media;
use crate::platform::Platform;
use std::process::Child;

/// Plays media with VLC, or the VLC app on Android
pub struct Vlc {
    platform: Platform,
    debug: bool,
}

impl Vlc {
    pub fn new(platform: Platform, debug: bool) -> Self {
        Self { platform, debug }
    }

    fn args(&self, media: &Media) -> Vec<String> {
        let mut args = vec![media.url.clone()];

        if let Some(audio_url) = &media.audio_url {
            args.push(format!("--input-slave={}", audio_url));
        }

        args.push(format!("--meta-title={}", media.display_name()));

        if let Some(referrer) = &media.referrer {
            args.push(format!("--http-referrer={}", referrer));
        }

        args.extend(
            media
                .subtitles
                .iter()
                .map(|subtitle| format!("--sub-file={}", subtitle.url)),
        );

        if !self.debug {
            args.push("--quiet".to_string());
        }

        args
    }
}

impl Player for Vlc {
    fn display_name(&self) -> &str {
        "VLC"
    }

    fn play(&self, media: &Media) -> Result<Option<Child>, PlayerError> {
        let referrer_unsupported = || PlayerError::ReferrerNotSupported {
            player: self.display_name().to_string(),
            platform: self.platform,
        };

        match self.platform {
            Platform::Android => {
                if media.referrer.is_some() {
                    return Err(referrer_unsupported());
                }

                let title = media.display_name();
                let args = [
                    "start",
                    "-n",
                    "org.videolan.vlc/org.videolan.vlc.gui.video.VideoPlayerActivity",
                    "-e",
                    "title",
                    title.as_str(),
                    media.url.as_str(),
                ]
                .map(str::to_string);

                spawn(self.display_name(), "am", &args).map(Some)
            }
            Platform::Linux | Platform::Windows => {
                spawn(self.display_name(), "vlc", &self.args(media)).map(Some)
            }
            Platform::Darwin | Platform::Ios => Err(PlayerError::UnsupportedPlatform {
                player: self.display_name().to_string(),
                platform: self.platform,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let mut media = Media::single("https://example.com/movie.mp4", "Sintel", Some(2010));
        media.audio_url = Some("https://example.com/audio.m4a".to_string());

        let args = Vlc::new(Platform::Linux, true).args(&media);

        assert_eq!(
            args,
            vec![
                "https://example.com/movie.mp4",
                "--input-slave=https://example.com/audio.m4a",
                "--meta-title=Sintel (2010)",
            ]
        );
    }

    #[test]
    fn test_unsupported_platform() {
        let media = Media::single("https://example.com/movie.mp4", "Sintel", None);

        assert!(matches!(
            Vlc::new(Platform::Darwin, false).play(&media),
            Err(PlayerError::UnsupportedPlatform { .. })
        ));
    }
}
