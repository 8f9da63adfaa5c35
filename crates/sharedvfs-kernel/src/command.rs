//! Command line parsing.
//!
//! A command line is a keyword followed by whitespace-separated parameters.
//! The keyword is matched case-insensitively against a closed set of codes;
//! anything else is kept as [`CommandCode::Unrecognized`] with the raw
//! keyword, so a front-end can forward it verbatim to the next dispatcher.
//!
//! Two code sets exist: [`ConsoleCode`] for the client front-end
//! (`connect`, `disconnect`, `exit`) and [`FsCommandCode`] for the tree
//! commands the server executes.

use std::str::FromStr;

use strum::{Display, EnumIter, EnumString};

use crate::error::{VfsError, VfsResult};

/// Recognized code, or the raw keyword when none matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandCode<C> {
    Known(C),
    Unrecognized(String),
}

impl<C: Copy> CommandCode<C> {
    pub fn known(&self) -> Option<C> {
        match self {
            Self::Known(code) => Some(*code),
            Self::Unrecognized(_) => None,
        }
    }
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<C> {
    command_line: String,
    keyword: String,
    parameters: Vec<String>,
    code: CommandCode<C>,
}

impl<C: FromStr> Command<C> {
    /// Parse a raw line. Fails only when the line is blank.
    pub fn parse(command_line: &str) -> VfsResult<Self> {
        let trimmed = command_line.trim();
        let mut tokens = trimmed.split_whitespace();
        let Some(keyword) = tokens.next() else {
            return Err(VfsError::invalid_command("Command line is empty."));
        };
        let parameters = tokens.map(str::to_string).collect();
        let code = match keyword.parse::<C>() {
            Ok(code) => CommandCode::Known(code),
            Err(_) => CommandCode::Unrecognized(keyword.to_string()),
        };

        Ok(Self {
            command_line: trimmed.to_string(),
            keyword: keyword.to_string(),
            parameters,
            code,
        })
    }
}

impl<C> Command<C> {
    /// The trimmed command line.
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn code(&self) -> &CommandCode<C> {
        &self.code
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.parameters.get(index).map(String::as_str)
    }

    /// Parameter `index`, or `InvalidCommand` naming what is missing.
    pub fn required(&self, index: usize, what: &str) -> VfsResult<&str> {
        self.param(index).ok_or_else(|| {
            VfsError::invalid_command(format!("{what} not specified for '{}'.", self.keyword))
        })
    }
}

/// Front-end commands handled by the client itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum ConsoleCode {
    #[strum(to_string = "exit", serialize = "quit")]
    Exit,
    #[strum(to_string = "connect")]
    Connect,
    #[strum(to_string = "disconnect")]
    Disconnect,
}

/// Tree commands executed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum FsCommandCode {
    #[strum(to_string = "md", serialize = "mkdir")]
    MakeDirectory,
    #[strum(to_string = "cd", serialize = "chdir")]
    ChangeDirectory,
    #[strum(to_string = "rd", serialize = "rmdir")]
    RemoveDirectory,
    #[strum(to_string = "deltree")]
    DeleteTree,
    #[strum(to_string = "mf", serialize = "mkfile")]
    MakeFile,
    #[strum(to_string = "del", serialize = "delfile")]
    DeleteFile,
    #[strum(to_string = "lock")]
    Lock,
    #[strum(to_string = "unlock")]
    Unlock,
    #[strum(to_string = "copy")]
    Copy,
    #[strum(to_string = "move")]
    Move,
    #[strum(to_string = "print", serialize = "tree")]
    Print,
}

impl FsCommandCode {
    /// Commands that change the tree and are announced to other sessions.
    pub fn is_mutating(self) -> bool {
        !matches!(self, Self::ChangeDirectory | Self::Print)
    }
}

/// A console line.
pub type ConsoleCommand = Command<ConsoleCode>;

/// A tree command line.
pub type FsCommand = Command<FsCommandCode>;
