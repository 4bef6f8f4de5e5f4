use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Something the user asked the live session to do.
///
/// Commands are applied between ticks, in the order they arrive.
#[derive(Clone, Debug, PartialEq)]
pub enum UserCommand {
    StartCamera,
    StopCamera,
    ToggleCamera,
    /// Position in the list of discovered cameras, not a device index.
    SwitchCamera(usize),
    ToggleRecording,
    Snapshot,
    SetColor([u8; 3]),
    SetThickness(u32),
    SetZoom(f64),
    ToggleCoordinates,
    ToggleFps,
    ToggleGrayscale,
    SetSavePath(PathBuf),
    ShowStats,
    ListCameras,
    Help,
    Quit,
}

pub const COMMAND_HELP: &str = "\
Commands:
  start            start the camera
  stop             stop the camera
  camera           start or stop the camera
  cam <n>          switch to camera <n> (see `list`)
  rec              start or stop recording
  snap             save a snapshot
  color <r,g,b>    box color, e.g. `color 255,0,0`
  thickness <n>    box thickness, 1-10
  zoom <f>         zoom factor, 0.1-2.0
  coords           toggle box coordinates
  fps              toggle the FPS counter
  gray             toggle the grayscale filter
  path <dir>       directory for recordings and snapshots
  stats            show photo and video counters
  list             list cameras
  help             show this help
  quit             exit";

#[derive(Error, Debug, PartialEq)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}' (try `help`)")]
    Unknown(String),
    #[error("'{verb}' expects {expected}")]
    BadArgument {
        verb: &'static str,
        expected: &'static str,
    },
}

impl FromStr for UserCommand {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "" => return Err(ParseCommandError::Empty),
            "start" => UserCommand::StartCamera,
            "stop" => UserCommand::StopCamera,
            "camera" => UserCommand::ToggleCamera,
            "cam" => UserCommand::SwitchCamera(parse_arg(rest, "cam", "a camera number")?),
            "rec" => UserCommand::ToggleRecording,
            "snap" => UserCommand::Snapshot,
            "color" => UserCommand::SetColor(parse_color(rest)?),
            "thickness" => {
                UserCommand::SetThickness(parse_arg(rest, "thickness", "a whole number")?)
            }
            "zoom" => UserCommand::SetZoom(parse_zoom(rest)?),
            "coords" => UserCommand::ToggleCoordinates,
            "fps" => UserCommand::ToggleFps,
            "gray" => UserCommand::ToggleGrayscale,
            "path" => {
                if rest.is_empty() {
                    return Err(ParseCommandError::BadArgument {
                        verb: "path",
                        expected: "a directory",
                    });
                }
                UserCommand::SetSavePath(PathBuf::from(rest))
            }
            "stats" => UserCommand::ShowStats,
            "list" => UserCommand::ListCameras,
            "help" => UserCommand::Help,
            "quit" | "exit" => UserCommand::Quit,
            _ => return Err(ParseCommandError::Unknown(verb.to_string())),
        };
        Ok(command)
    }
}

fn parse_arg<T: FromStr>(
    arg: &str,
    verb: &'static str,
    expected: &'static str,
) -> Result<T, ParseCommandError> {
    arg.parse()
        .map_err(|_| ParseCommandError::BadArgument { verb, expected })
}

fn parse_zoom(arg: &str) -> Result<f64, ParseCommandError> {
    let zoom: f64 = parse_arg(arg, "zoom", "a number")?;
    if !zoom.is_finite() {
        return Err(ParseCommandError::BadArgument {
            verb: "zoom",
            expected: "a number",
        });
    }
    Ok(zoom)
}

/// `r,g,b` with each channel 0-255; spaces around the commas are allowed.
pub fn parse_color(arg: &str) -> Result<[u8; 3], ParseCommandError> {
    let bad = || ParseCommandError::BadArgument {
        verb: "color",
        expected: "three values 0-255 as r,g,b",
    };
    let channels: Vec<u8> = arg
        .split(',')
        .map(|c| c.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .map_err(|_| bad())?;
    <[u8; 3]>::try_from(channels).map_err(|_| bad())
}
