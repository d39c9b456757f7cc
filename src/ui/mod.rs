//! Interactive selection
//!
//! The pipeline only ever asks "pick one of these"; how the question is
//! presented is up to the [`Chooser`] implementation.

mod fzf;

pub use fzf::{ChooserError, FzfChooser};

use crate::logging::LogHandle;
use dialoguer::FuzzySelect;
use dialoguer::theme::ColorfulTheme;
use tracing::{debug, error};

/// Asks the user to pick one item out of a list
pub trait Chooser {
    /// Returns the index of the picked item, or `None` if the user
    /// cancelled or there was nothing to pick.
    fn choose(&self, prompt: &str, items: &[String]) -> Option<usize>;
}

impl<C: Chooser + ?Sized> Chooser for Box<C> {
    fn choose(&self, prompt: &str, items: &[String]) -> Option<usize> {
        (**self).choose(prompt, items)
    }
}

/// Terminal prompt built on dialoguer's fuzzy select
pub struct DialoguerChooser {
    log: Option<LogHandle>,
}

impl DialoguerChooser {
    /// Creates a chooser that silences logging through `log` while prompting
    pub fn new(log: Option<LogHandle>) -> Self {
        Self { log }
    }
}

impl Chooser for DialoguerChooser {
    fn choose(&self, prompt: &str, items: &[String]) -> Option<usize> {
        if items.is_empty() {
            return None;
        }

        debug!("Launching dialoguer prompt...");
        let _quiet = self.log.as_ref().map(LogHandle::quiet);

        let result = FuzzySelect::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact_opt();

        match result {
            Ok(selection) => selection,
            Err(e) => {
                drop(_quiet);
                error!("Prompt failed: {}", e);
                None
            }
        }
    }
}

/// Picks the chooser to use: fzf when enabled (or, if unset, when it is
/// installed), dialoguer otherwise.
pub fn chooser_for(fzf: Option<bool>, log: Option<LogHandle>) -> Box<dyn Chooser> {
    let use_fzf = fzf.unwrap_or_else(FzfChooser::is_installed);

    if use_fzf {
        Box::new(FzfChooser::new(log))
    } else {
        Box::new(DialoguerChooser::new(log))
    }
}
