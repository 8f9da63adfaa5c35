//! Line-oriented console front-end.
//!
//! `connect`, `disconnect`, and `exit`/`quit` are handled here; any other
//! line is sent to the server verbatim as a tree command.

use sharedvfs_kernel::{CommandCode, ConsoleCode, ConsoleCommand};
use sharedvfs_types::ChangeEvent;

use crate::connection::VfsClient;
use crate::error::ClientError;

/// What the caller should do after a line has been handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print these lines and keep reading.
    Continue(Vec<String>),
    /// Print these lines and stop.
    Exit(Vec<String>),
}

pub struct Console {
    client: VfsClient,
}

impl Console {
    pub fn new(client: VfsClient) -> Self {
        Self { client }
    }

    pub fn banner() -> Vec<String> {
        vec![
            "Virtual File System Client".to_string(),
            format!(
                "Connect to the host and send commands to the file system, or type '{}' or 'quit' to exit.",
                ConsoleCode::Exit
            ),
            format!("Type '{} UserName'...", ConsoleCode::Connect),
        ]
    }

    /// How a change made by another user is shown.
    pub fn render_event(event: &ChangeEvent) -> String {
        format!(
            "User '{}' performs command: {}",
            event.user_name, event.command_line
        )
    }

    pub async fn handle_line(&self, line: &str) -> Outcome {
        let Ok(command) = ConsoleCommand::parse(line) else {
            return Outcome::Continue(Vec::new());
        };

        match command.code() {
            CommandCode::Known(ConsoleCode::Exit) => Outcome::Exit(self.leave().await),
            CommandCode::Known(ConsoleCode::Connect) => {
                Outcome::Continue(self.connect(command.param(0)).await)
            }
            CommandCode::Known(ConsoleCode::Disconnect) => Outcome::Continue(self.disconnect().await),
            CommandCode::Unrecognized(_) => {
                Outcome::Continue(self.forward(command.command_line()).await)
            }
        }
    }

    async fn connect(&self, user_name: Option<&str>) -> Vec<String> {
        let Some(user_name) = user_name else {
            return vec!["User name not specified.".to_string()];
        };
        match self.client.connect(user_name).await {
            Ok(info) => vec![
                format!("User '{}' connected successfully.", info.user_name),
                format!("Total users: {}.", info.total_sessions),
            ],
            Err(ClientError::SwitchUser { current }) => vec![format!(
                "Please disconnect current user ('{current}') before connecting a new user."
            )],
            Err(e) => vec![describe(e)],
        }
    }

    async fn disconnect(&self) -> Vec<String> {
        match self.client.disconnect().await {
            Ok(user_name) => vec![format!("User '{user_name}' disconnected.")],
            Err(ClientError::NotConnected) => vec!["Current user is undefined.".to_string()],
            Err(e) => vec![describe(e)],
        }
    }

    async fn forward(&self, command_line: &str) -> Vec<String> {
        match self.client.execute(command_line).await {
            Ok(message) => vec![message],
            Err(ClientError::NotConnected) => vec![
                "Please connect to the host before sending to it any other commands.".to_string(),
            ],
            Err(e) => vec![describe(e)],
        }
    }

    /// Close the session on the way out, if there is one.
    async fn leave(&self) -> Vec<String> {
        if self.client.credentials().is_none() {
            return Vec::new();
        }
        self.disconnect().await
    }
}

fn describe(e: ClientError) -> String {
    match e {
        ClientError::Server { message, .. } => message,
        e if e.is_transport() => format!("The server could not be reached ({e})."),
        e => e.to_string(),
    }
}
