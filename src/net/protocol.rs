//! Line protocol message definitions
//! These are the wire types for client-server communication

use std::fmt;

use crate::game::visibility::LookReply;

/// Compass direction of a MOVE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "N" => Some(Self::North),
            "S" => Some(Self::South),
            "E" => Some(Self::East),
            "W" => Some(Self::West),
            _ => None,
        }
    }

    /// Unit vector as (row delta, column delta)
    pub fn delta(self) -> (isize, isize) {
        match self {
            Self::North => (-1, 0),
            Self::South => (1, 0),
            Self::East => (0, 1),
            Self::West => (0, -1),
        }
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMsg {
    Look,
    Move(Direction),
    Pickup,
    Quit,
    /// Reserved by clients; the server does not relay chat
    Chat(String),
}

/// Reasons a command line could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("{0} requires a direction (N, S, E or W)")]
    MissingDirection(&'static str),

    #[error("invalid direction: {0}")]
    BadDirection(String),

    #[error("{0} takes no arguments")]
    UnexpectedArgument(&'static str),
}

impl ClientMsg {
    /// Parse one inbound line. Tokens are case-sensitive.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let no_args = |msg: Self, name: &'static str| {
            if rest.is_empty() {
                Ok(msg)
            } else {
                Err(ParseError::UnexpectedArgument(name))
            }
        };

        match verb {
            "" => Err(ParseError::Empty),
            "LOOK" => no_args(Self::Look, "LOOK"),
            "PICKUP" => no_args(Self::Pickup, "PICKUP"),
            "QUIT" => no_args(Self::Quit, "QUIT"),
            "CHAT" => Ok(Self::Chat(rest.to_string())),
            "MOVE" => {
                if rest.is_empty() {
                    return Err(ParseError::MissingDirection("MOVE"));
                }
                Direction::from_token(rest)
                    .map(Self::Move)
                    .ok_or_else(|| ParseError::BadDirection(rest.to_string()))
            }
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMsg {
    /// 7x7 view around the player, sent as eight lines
    LookReply(LookReply),
    /// Player may now submit a mutating command
    StartTurn,
    /// Player's turn is over
    EndTurn,
    /// Player joined behind someone else and must wait
    Waiting,
    /// World mutated, recipient should LOOK again
    Change,
    /// Player's gold changed by this amount
    TreasureMod(i64),
    /// Last command was rejected
    Fail(String),
    Win,
    Lose,
}

impl fmt::Display for ServerMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LookReply(grid) => write!(f, "LOOKREPLY\n{grid}"),
            Self::StartTurn => f.write_str("STARTTURN"),
            Self::EndTurn => f.write_str("ENDTURN"),
            Self::Waiting => f.write_str("WAITING"),
            Self::Change => f.write_str("CHANGE"),
            Self::TreasureMod(amount) => write!(f, "TREASUREMOD {amount}"),
            Self::Fail(reason) => write!(f, "FAIL {reason}"),
            Self::Win => f.write_str("WIN"),
            Self::Lose => f.write_str("LOSE"),
        }
    }
}

impl ServerMsg {
    pub fn fail(reason: impl fmt::Display) -> Self {
        Self::Fail(reason.to_string())
    }

    /// Wire encoding, newline terminated
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(ClientMsg::parse("LOOK"), Ok(ClientMsg::Look));
        assert_eq!(ClientMsg::parse("  PICKUP\r"), Ok(ClientMsg::Pickup));
        assert_eq!(ClientMsg::parse("QUIT"), Ok(ClientMsg::Quit));
        assert_eq!(
            ClientMsg::parse("MOVE N"),
            Ok(ClientMsg::Move(Direction::North))
        );
        assert_eq!(
            ClientMsg::parse("MOVE   W"),
            Ok(ClientMsg::Move(Direction::West))
        );
        assert_eq!(
            ClientMsg::parse("CHAT hello there"),
            Ok(ClientMsg::Chat("hello there".to_string()))
        );
    }

    #[test]
    fn rejects_malformed_commands() {
        assert_eq!(ClientMsg::parse(""), Err(ParseError::Empty));
        assert_eq!(
            ClientMsg::parse("look"),
            Err(ParseError::Unknown("look".to_string()))
        );
        assert_eq!(
            ClientMsg::parse("MOVE"),
            Err(ParseError::MissingDirection("MOVE"))
        );
        assert_eq!(
            ClientMsg::parse("MOVE n"),
            Err(ParseError::BadDirection("n".to_string()))
        );
        assert_eq!(
            ClientMsg::parse("MOVE N S"),
            Err(ParseError::BadDirection("N S".to_string()))
        );
        assert_eq!(
            ClientMsg::parse("LOOK around"),
            Err(ParseError::UnexpectedArgument("LOOK"))
        );
    }

    #[test]
    fn encodes_server_lines() {
        assert_eq!(ServerMsg::StartTurn.to_line(), "STARTTURN\n");
        assert_eq!(ServerMsg::TreasureMod(1).to_line(), "TREASUREMOD 1\n");
        assert_eq!(
            ServerMsg::fail("not your turn").to_line(),
            "FAIL not your turn\n"
        );
    }
}
