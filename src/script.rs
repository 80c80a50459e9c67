//! Line-oriented command scripts for driving a session from the CLI.
//!
//! One command per line; blank lines and `#` comments are skipped.
//!
//! ```text
//! part nose        switch part
//! next | prev      step the gallery
//! choose           choose the face on screen
//! zoom             open the comparison overlay
//! upper | lower    select an overlay slot
//! page-next | page-prev
//! commit | close   leave the overlay, choosing or not
//! photo <path>     supply the user photo
//! swap             submit the swap
//! download <dir>   save the displayed result
//! show             print the session
//! wait             block until background work has finished
//! quit
//! ```

use crate::overlay::SlotKind;
use crate::ring::Direction;
use crate::session::UiAction;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("line {line}: unknown command '{command}'")]
    UnknownCommand { line: usize, command: String },
    #[error("line {line}: '{command}' needs an argument")]
    MissingArgument { line: usize, command: String },
    #[error("line {line}: '{command}' takes no argument")]
    UnexpectedArgument { line: usize, command: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    Action(UiAction),
    /// Read a photo file; the session sees the resulting `SupplyPhoto`.
    Photo(PathBuf),
    Download(PathBuf),
    Show,
    Wait,
    Quit,
}

/// Parse one script line. `line` is 1-based and only used in errors.
pub fn parse_line(line: usize, text: &str) -> Result<Option<ScriptCommand>, ScriptError> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(None);
    }
    let (command, argument) = match text.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, Some(rest.trim())),
        None => (text, None),
    };
    let needs = || {
        argument.map(str::to_string).ok_or(ScriptError::MissingArgument {
            line,
            command: command.to_string(),
        })
    };
    let bare = |cmd: ScriptCommand| match argument {
        Some(_) => Err(ScriptError::UnexpectedArgument {
            line,
            command: command.to_string(),
        }),
        None => Ok(cmd),
    };
    let action = |action: UiAction| bare(ScriptCommand::Action(action));

    let parsed = match command {
        "part" => ScriptCommand::Action(UiAction::SwitchPart {
            part: needs()?,
        }),
        "next" => action(UiAction::Navigate {
            direction: Direction::Next,
        })?,
        "prev" => action(UiAction::Navigate {
            direction: Direction::Previous,
        })?,
        "choose" => action(UiAction::ChooseCurrent)?,
        "zoom" => action(UiAction::OpenOverlay)?,
        "upper" => action(UiAction::SelectSlot {
            which: SlotKind::Upper,
        })?,
        "lower" => action(UiAction::SelectSlot {
            which: SlotKind::Lower,
        })?,
        "page-next" => action(UiAction::PageOverlay {
            direction: Direction::Next,
        })?,
        "page-prev" => action(UiAction::PageOverlay {
            direction: Direction::Previous,
        })?,
        "commit" => action(UiAction::CommitSelection)?,
        "close" => action(UiAction::CloseOverlay)?,
        "swap" => action(UiAction::SubmitSwap)?,
        "photo" => ScriptCommand::Photo(PathBuf::from(needs()?)),
        "download" => ScriptCommand::Download(PathBuf::from(needs()?)),
        "show" => bare(ScriptCommand::Show)?,
        "wait" => bare(ScriptCommand::Wait)?,
        "quit" => bare(ScriptCommand::Quit)?,
        other => {
            return Err(ScriptError::UnknownCommand {
                line,
                command: other.to_string(),
            });
        }
    };
    Ok(Some(parsed))
}
