//! mpv player

use super::{Player, PlayerError, spawn};
use crate::media::Media;
use crate::platform::Platform;
use std::process::Child;

/// Plays media with mpv, or the mpv app through the activity manager on
/// Android
pub struct Mpv {
    platform: Platform,
    debug: bool,
}

impl Mpv {
    pub fn new(platform: Platform, debug: bool) -> Self {
        Self { platform, debug }
    }

    fn args(&self, media: &Media) -> Vec<String> {
        let mut args = vec![
            media.url.clone(),
            format!("--force-media-title={}", media.display_name()),
        ];

        if let Some(referrer) = &media.referrer {
            args.push(format!("--referrer={}", referrer));
        }

        args.extend(
            media
                .subtitles
                .iter()
                .map(|subtitle| format!("--sub-file={}", subtitle.url)),
        );

        if let Some(audio_url) = &media.audio_url {
            args.push(format!("--audio-file={}", audio_url));
        }

        if !self.debug {
            args.push("--no-terminal".to_string());
        }

        args
    }
}

impl Player for Mpv {
    fn display_name(&self) -> &str {
        "MPV"
    }

    fn play(&self, media: &Media) -> Result<Option<Child>, PlayerError> {
        match self.platform {
            Platform::Android => {
                if media.referrer.is_some() {
                    return Err(PlayerError::ReferrerNotSupported {
                        player: self.display_name().to_string(),
                        platform: self.platform,
                    });
                }

                let args = [
                    "start",
                    "-n",
                    "is.xyz.mpv/is.xyz.mpv.MPVActivity",
                    "-e",
                    "filepath",
                    media.url.as_str(),
                ]
                .map(str::to_string);

                spawn(self.display_name(), "am", &args).map(Some)
            }
            Platform::Linux | Platform::Windows | Platform::Darwin => {
                spawn(self.display_name(), "mpv", &self.args(media)).map(Some)
            }
            Platform::Ios => Err(PlayerError::UnsupportedPlatform {
                player: self.display_name().to_string(),
                platform: self.platform,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{EpisodeSelector, Subtitle};

    #[test]
    fn test_args() {
        let mut media = Media::multi("https://example.com/ep.m3u8", "Show", EpisodeSelector::new(3, 2))
            .with_referrer("https://example.com");
        media.subtitles.push(Subtitle {
            url: "https://example.com/en.vtt".to_string(),
            language: Some("en".to_string()),
        });

        let args = Mpv::new(Platform::Linux, false).args(&media);

        assert_eq!(
            args,
            vec![
                "https://example.com/ep.m3u8",
                "--force-media-title=Show - S2 EP3",
                "--referrer=https://example.com",
                "--sub-file=https://example.com/en.vtt",
                "--no-terminal",
            ]
        );
    }

    #[test]
    fn test_android_rejects_referrer() {
        let media = Media::single("https://example.com/movie.mp4", "Movie", None)
            .with_referrer("https://example.com");

        assert!(matches!(
            Mpv::new(Platform::Android, false).play(&media),
            Err(PlayerError::ReferrerNotSupported { .. })
        ));
    }
}
