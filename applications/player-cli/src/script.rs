/// Scripted listener actions
///
/// A session script is a list of `kind[:arg]` words, e.g.
/// `tick:30 seek:90 tick:10 next volume:0.4`.
use crate::error::PlayerError;
use orpheon_core::TrackId;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Let seconds of playback elapse
    Tick(f64),
    /// Seek to a position in seconds
    Seek(f64),
    /// Play/pause
    Toggle,
    Next,
    Previous,
    Volume(f64),
    /// Add a catalog track to the explicit queue
    Queue(TrackId),
}

impl FromStr for Action {
    type Err = PlayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PlayerError::InvalidAction(s.to_string());
        let (kind, arg) = match s.trim().split_once(':') {
            Some((kind, arg)) => (kind, Some(arg.trim())),
            None => (s.trim(), None),
        };

        let seconds = |arg: Option<&str>| -> Result<f64, PlayerError> {
            arg.and_then(|a| a.parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .ok_or_else(invalid)
        };

        match (kind.to_ascii_lowercase().as_str(), arg) {
            ("tick", arg) => {
                let secs = seconds(arg)?;
                if secs < 0.0 {
                    return Err(invalid());
                }
                Ok(Action::Tick(secs))
            }
            ("seek", arg) => Ok(Action::Seek(seconds(arg)?)),
            ("volume", arg) => Ok(Action::Volume(seconds(arg)?)),
            ("queue", Some(id)) => TrackId::parse(id).map(Action::Queue).map_err(|_| invalid()),
            ("toggle", None) => Ok(Action::Toggle),
            ("next", None) => Ok(Action::Next),
            ("prev" | "previous", None) => Ok(Action::Previous),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Tick(secs) => write!(f, "tick:{secs}"),
            Action::Seek(secs) => write!(f, "seek:{secs}"),
            Action::Toggle => write!(f, "toggle"),
            Action::Next => write!(f, "next"),
            Action::Previous => write!(f, "prev"),
            Action::Volume(volume) => write!(f, "volume:{volume}"),
            Action::Queue(id) => write!(f, "queue:{id}"),
        }
    }
}

/// Parse a whole script, stopping at the first bad word
pub fn parse_script<'a>(words: impl IntoIterator<Item = &'a str>) -> Result<Vec<Action>, PlayerError> {
    words.into_iter().map(str::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_kind() {
        let actions = parse_script([
            "tick:30", "seek:90.5", "toggle", "next", "prev", "previous", "volume:0.4", "queue:t7",
        ])
        .unwrap();

        assert_eq!(
            actions,
            vec![
                Action::Tick(30.0),
                Action::Seek(90.5),
                Action::Toggle,
                Action::Next,
                Action::Previous,
                Action::Previous,
                Action::Volume(0.4),
                Action::Queue(TrackId::new("t7")),
            ]
        );
    }

    #[test]
    fn kinds_are_case_insensitive() {
        assert_eq!("NEXT".parse::<Action>().unwrap(), Action::Next);
        assert_eq!("Tick:5".parse::<Action>().unwrap(), Action::Tick(5.0));
    }

    #[test]
    fn rejects_malformed_words() {
        for word in ["", "tick", "tick:abc", "tick:-1", "seek:NaN", "queue:", "next:1", "jump:3"] {
            assert!(
                matches!(word.parse::<Action>(), Err(PlayerError::InvalidAction(_))),
                "{word:?} should be rejected"
            );
        }
    }

    #[test]
    fn display_parses_back() {
        for action in [Action::Seek(12.0), Action::Queue(TrackId::new("x")), Action::Previous] {
            assert_eq!(action.to_string().parse::<Action>().unwrap(), action);
        }
    }
}
