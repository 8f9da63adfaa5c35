//! Wire-level classification of domain errors.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Error kinds reported to clients. Every variant maps to exactly one
/// kernel error; transport failures are never encoded here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    InvalidName,
    PathNotFound,
    NotADirectory,
    NotAFile,
    DuplicateName,
    LockedContent,
    InvalidOperation,
    InvalidCommand,
    AlreadyConnected,
    InvalidSession,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_on_wire() {
        let json = serde_json::to_string(&ErrorKind::NotADirectory).unwrap();
        assert_eq!(json, "\"not_a_directory\"");
        assert_eq!(ErrorKind::LockedContent.to_string(), "locked_content");
    }
}
