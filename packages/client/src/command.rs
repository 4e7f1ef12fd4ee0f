//! Line commands accepted by the interactive client.

use std::str::FromStr;

use tegaki_shared::protocol::{Color, Point};
use thiserror::Error;

use crate::engine::parse_color;

pub const HELP: &str = "\
Commands:
  down X Y               press the pointer at (X, Y)
  move X Y               drag the pointer to (X, Y)
  up                     release the pointer
  line X1 Y1 X2 Y2       draw one straight stroke
  color #RRGGBB          set the stroke color
  clear                  clear the surface for everyone
  show                   print the local surface
  help                   show this help
  quit                   leave the session";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Down(Point),
    Move(Point),
    Up,
    Line(Point, Point),
    Color(Color),
    Clear,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command '{0}' (type 'help')")]
    Unknown(String),

    #[error("'{command}' expects {expected} argument(s), got {actual}")]
    Arity {
        command: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("'{0}' is not a number")]
    InvalidNumber(String),

    #[error("'{0}' is not a #rgb or #rrggbb color")]
    InvalidColor(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CommandError::Unknown(String::new()));
        };
        let args: Vec<&str> = words.collect();

        match name.to_ascii_lowercase().as_str() {
            "down" => Ok(Command::Down(point(expect(&args, "down", 2)?)?)),
            "move" => Ok(Command::Move(point(expect(&args, "move", 2)?)?)),
            "up" => expect(&args, "up", 0).map(|_| Command::Up),
            "line" => {
                let args = expect(&args, "line", 4)?;
                Ok(Command::Line(point(&args[..2])?, point(&args[2..])?))
            }
            "color" => {
                let raw = expect(&args, "color", 1)?[0];
                let color = Color::new(raw);
                match parse_color(&color) {
                    Some(_) => Ok(Command::Color(color)),
                    None => Err(CommandError::InvalidColor(raw.to_string())),
                }
            }
            "clear" => expect(&args, "clear", 0).map(|_| Command::Clear),
            "show" => expect(&args, "show", 0).map(|_| Command::Show),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            _ => Err(CommandError::Unknown(name.to_string())),
        }
    }
}

fn expect<'a, 'b>(
    args: &'b [&'a str],
    command: &'static str,
    expected: usize,
) -> Result<&'b [&'a str], CommandError> {
    if args.len() == expected {
        Ok(args)
    } else {
        Err(CommandError::Arity {
            command,
            expected,
            actual: args.len(),
        })
    }
}

fn point(args: &[&str]) -> Result<Point, CommandError> {
    Ok(Point::new(number(args[0])?, number(args[1])?))
}

fn number(raw: &str) -> Result<f64, CommandError> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| CommandError::InvalidNumber(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pointer_commands() {
        assert_eq!(
            "down 10 20".parse::<Command>(),
            Ok(Command::Down(Point::new(10.0, 20.0)))
        );
        assert_eq!(
            "  MOVE 1.5 -2 ".parse::<Command>(),
            Ok(Command::Move(Point::new(1.5, -2.0)))
        );
        assert_eq!("up".parse::<Command>(), Ok(Command::Up));
    }

    #[test]
    fn test_parse_line_and_color() {
        assert_eq!(
            "line 0 0 10 10".parse::<Command>(),
            Ok(Command::Line(Point::new(0.0, 0.0), Point::new(10.0, 10.0)))
        );
        assert_eq!(
            "color #ff0000".parse::<Command>(),
            Ok(Command::Color(Color::new("#ff0000")))
        );
    }

    #[test]
    fn test_parse_errors() {
        // テスト項目: 不正な入力はそれぞれのエラーになる
        assert_eq!(
            "paint".parse::<Command>(),
            Err(CommandError::Unknown("paint".to_string()))
        );
        assert_eq!(
            "down 1".parse::<Command>(),
            Err(CommandError::Arity {
                command: "down",
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            "move x 1".parse::<Command>(),
            Err(CommandError::InvalidNumber("x".to_string()))
        );
        assert_eq!(
            "move NaN 1".parse::<Command>(),
            Err(CommandError::InvalidNumber("NaN".to_string()))
        );
        assert_eq!(
            "color red".parse::<Command>(),
            Err(CommandError::InvalidColor("red".to_string()))
        );
    }
}
