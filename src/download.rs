//! Downloads
//!
//! Saves media with yt-dlp when it is installed and enabled, otherwise with
//! ffmpeg. Both run as child processes the caller can wait on.

use crate::media::Media;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while starting a download
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The download tool could not be started
    #[error("Failed to start {tool}: {source}")]
    SpawnFailed {
        tool: &'static str,
        source: std::io::Error,
    },

    /// The target directory doesn't exist
    #[error("Download directory does not exist: {0}")]
    MissingDirectory(PathBuf),
}

/// Which program performs the download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadTool {
    YtDlp,
    Ffmpeg,
}

impl DownloadTool {
    fn binary(&self) -> &'static str {
        match self {
            DownloadTool::YtDlp => "yt-dlp",
            DownloadTool::Ffmpeg => "ffmpeg",
        }
    }
}

/// Starts downloads into a fixed directory
pub struct Downloader {
    save_path: PathBuf,
    prefer_yt_dlp: bool,
    debug: bool,
}

impl Downloader {
    /// # Arguments
    ///
    /// * `save_path` - Directory downloads are written to
    /// * `prefer_yt_dlp` - Use yt-dlp when it is installed
    /// * `debug` - Let the tool print its progress
    pub fn new(save_path: PathBuf, prefer_yt_dlp: bool, debug: bool) -> Self {
        Self {
            save_path,
            prefer_yt_dlp,
            debug,
        }
    }

    /// Checks if yt-dlp is installed and available
    fn is_yt_dlp_installed() -> bool {
        Command::new("yt-dlp")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Where `media` will be saved
    pub fn target_path(&self, media: &Media) -> PathBuf {
        self.save_path
            .join(format!("{}.mp4", sanitize_filename(&media.display_name())))
    }

    /// Picks the download tool for `media`
    ///
    /// yt-dlp can't merge a separate audio stream, so such media always goes
    /// through ffmpeg.
    pub fn tool_for(&self, media: &Media, yt_dlp_installed: bool) -> DownloadTool {
        if !self.prefer_yt_dlp {
            return DownloadTool::Ffmpeg;
        }

        if !yt_dlp_installed {
            warn!("yt-dlp was not found, defaulting to ffmpeg!");
            return DownloadTool::Ffmpeg;
        }

        if media.audio_url.is_some() {
            warn!("Can't use yt-dlp as this media contains an audio url, defaulting to ffmpeg!");
            return DownloadTool::Ffmpeg;
        }

        DownloadTool::YtDlp
    }

    /// Starts downloading `media`
    pub fn download(&self, media: &Media) -> Result<Child, DownloadError> {
        if !self.save_path.is_dir() {
            return Err(DownloadError::MissingDirectory(self.save_path.clone()));
        }

        let yt_dlp_installed = self.prefer_yt_dlp && Self::is_yt_dlp_installed();
        let tool = self.tool_for(media, yt_dlp_installed);
        let target = self.target_path(media);

        info!("Downloading via {} to '{}'...", tool.binary(), target.display());

        let args = match tool {
            DownloadTool::YtDlp => self.yt_dlp_args(media, &target),
            DownloadTool::Ffmpeg => ffmpeg_args(media, &target),
        };
        debug!("{} arguments: {:?}", tool.binary(), args);

        Command::new(tool.binary())
            .args(&args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| DownloadError::SpawnFailed {
                tool: tool.binary(),
                source: e,
            })
    }

    fn yt_dlp_args(&self, media: &Media, target: &Path) -> Vec<String> {
        let mut args = vec![
            media.url.clone(),
            "-o".to_string(),
            target.display().to_string(),
            "--downloader".to_string(),
            "ffmpeg".to_string(),
            "--hls-use-mpegts".to_string(),
        ];

        if !self.debug {
            args.push("--quiet".to_string());
        }

        if let Some(referrer) = &media.referrer {
            args.push("--add-header".to_string());
            args.push(format!("Referer:{}", referrer));
        }

        args
    }
}

fn ffmpeg_args(media: &Media, target: &Path) -> Vec<String> {
    // -n: never overwrite an existing file
    let mut args = vec!["-n".to_string()];

    if let Some(referrer) = &media.referrer {
        args.push("-headers".to_string());
        args.push(format!("Referer: {}", referrer));
    }

    args.push("-i".to_string());
    args.push(media.url.clone());

    if let Some(audio_url) = &media.audio_url {
        args.push("-i".to_string());
        args.push(audio_url.clone());
    }

    args.extend(["-c".to_string(), "copy".to_string()]);
    args.push(target.display().to_string());

    args
}

/// Sanitizes a string for use as a filename
///
/// Replaces characters that are invalid in filenames on common filesystems
/// and trims leading/trailing dots and whitespace.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();

    sanitized
        .trim_matches(|c: char| c.is_whitespace() || c == '.')
        .to_string()
}
