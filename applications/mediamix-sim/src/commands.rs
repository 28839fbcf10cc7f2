/// Interactive command language
use crate::error::{Result, SimError};
use mediamix_engine::{ElementId, MediaKind};

pub const HELP: &str = "\
commands:
  volume <v>            set the shared volume (>= 0)
  pan <v>               set the stereo pan (-1 .. 1)
  speed <v>             set the playback speed (0 .. 16)
  get                   read the current settings
  ping                  check the engine answers
  send <json>           send a raw message
  add <audio|video>     add a media element to the page
  frame <audio|video>   add a same-origin frame holding one element
  remove <id>           remove an element from the page
  refresh               attach new elements without a request
  status                show every element of the page
  help                  show this text
  quit                  exit";

/// One parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Volume(String),
    Pan(String),
    Speed(String),
    Get,
    Ping,
    Send(String),
    Add(MediaKind),
    Frame(MediaKind),
    Remove(ElementId),
    Refresh,
    Status,
    Help,
    Quit,
}

impl Command {
    /// Parse a line, `Ok(None)` for a blank line
    ///
    /// Setting values are passed through untouched so the engine's own
    /// normalization can be exercised (`pan abc` is a valid command).
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(word, rest)| (word, rest.trim()));

        let command = match word.to_ascii_lowercase().as_str() {
            "" => return Ok(None),
            "volume" => Self::Volume(required(word, rest)?),
            "pan" => Self::Pan(required(word, rest)?),
            "speed" => Self::Speed(required(word, rest)?),
            "get" => Self::Get,
            "ping" => Self::Ping,
            "send" => Self::Send(required(word, rest)?),
            "add" => Self::Add(media_kind(rest)?),
            "frame" => Self::Frame(media_kind(rest)?),
            "remove" => Self::Remove(element_id(rest)?),
            "refresh" => Self::Refresh,
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(SimError::Command(format!("unknown command `{}`", other))),
        };

        Ok(Some(command))
    }
}

fn required(word: &str, rest: &str) -> Result<String> {
    if rest.is_empty() {
        return Err(SimError::Command(format!("`{}` needs a value", word)));
    }
    Ok(rest.to_string())
}

fn media_kind(rest: &str) -> Result<MediaKind> {
    match rest.to_ascii_lowercase().as_str() {
        "audio" => Ok(MediaKind::Audio),
        "video" => Ok(MediaKind::Video),
        other => Err(SimError::Command(format!(
            "expected `audio` or `video`, got `{}`",
            other
        ))),
    }
}

fn element_id(rest: &str) -> Result<ElementId> {
    rest.trim_start_matches('#')
        .parse()
        .map(ElementId)
        .map_err(|_| SimError::Command(format!("invalid element id `{}`", rest)))
}
