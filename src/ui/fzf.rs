//! fzf based chooser
//!
//! Items are piped to fzf as `index<TAB>label` lines; only the label is shown
//! and the index of the picked line is read back from stdout.

use super::{Chooser, DialoguerChooser};
use crate::logging::LogHandle;
use std::io::Write;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, error, warn};

/// Errors that can occur while running fzf
#[derive(Debug, Error)]
pub enum ChooserError {
    /// fzf could not be started
    #[error("Failed to spawn fzf: {0}")]
    SpawnFailed(std::io::Error),

    /// Writing the items or reading the selection failed
    #[error("Failed to communicate with fzf: {0}")]
    Io(std::io::Error),

    /// fzf printed something that isn't one of our lines
    #[error("Unexpected fzf output: '{0}'")]
    UnexpectedOutput(String),
}

/// Chooser that delegates to the `fzf` binary
pub struct FzfChooser {
    log: Option<LogHandle>,
}

impl FzfChooser {
    pub fn new(log: Option<LogHandle>) -> Self {
        Self { log }
    }

    /// Checks if fzf is installed and available
    pub fn is_installed() -> bool {
        Command::new("fzf")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn run(&self, prompt: &str, items: &[String]) -> Result<Option<usize>, ChooserError> {
        let mut child = Command::new("fzf")
            .arg("--reverse")
            .arg("--delimiter")
            .arg("\t")
            .arg("--with-nth")
            .arg("2..")
            .arg("--prompt")
            .arg(format!("{}: ", prompt))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(ChooserError::SpawnFailed)?;

        if let Some(mut stdin) = child.stdin.take() {
            let lines: String = items
                .iter()
                .enumerate()
                .map(|(index, item)| format!("{}\t{}\n", index, item.replace('\n', " ")))
                .collect();

            stdin
                .write_all(lines.as_bytes())
                .map_err(ChooserError::Io)?;
        }

        let output = child.wait_with_output().map_err(ChooserError::Io)?;

        // fzf exits with 1 on no match and 130 when escaped
        if !output.status.success() {
            debug!("fzf exited with {:?}", output.status.code());
            return Ok(None);
        }

        parse_selection(&String::from_utf8_lossy(&output.stdout), items.len()).map(Some)
    }
}

impl Chooser for FzfChooser {
    fn choose(&self, prompt: &str, items: &[String]) -> Option<usize> {
        if items.is_empty() {
            return None;
        }

        if !Self::is_installed() {
            warn!("fzf is not installed, falling back to the built-in prompt");
            return DialoguerChooser::new(self.log.clone()).choose(prompt, items);
        }

        let result = {
            let _quiet = self.log.as_ref().map(LogHandle::quiet);
            self.run(prompt, items)
        };

        match result {
            Ok(selection) => selection,
            Err(e) => {
                error!("{}", e);
                None
            }
        }
    }
}

/// Reads the index back out of the line fzf printed
fn parse_selection(output: &str, item_count: usize) -> Result<usize, ChooserError> {
    let line = output.trim_end_matches(['\r', '\n']);

    line.split('\t')
        .next()
        .and_then(|index| index.parse::<usize>().ok())
        .filter(|index| *index < item_count)
        .ok_or_else(|| ChooserError::UnexpectedOutput(line.to_string()))
}
