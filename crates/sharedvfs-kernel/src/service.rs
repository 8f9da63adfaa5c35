//! The request-facing facade: connect, disconnect, execute.
//!
//! `VfsService` owns the namespace tree behind one `RwLock`, the session
//! registry, and the broadcaster. Handlers may call it from any number of
//! threads at once.
//!
//! Ordering for a mutating command:
//! 1. authenticate (session map only)
//! 2. parse, then apply under the tree's write lock
//! 3. take the publish-order lock, then release the tree lock
//! 4. publish the change event to the other sessions
//!
//! Step 3 makes every session observe change events in commit order.
//! Publishing never waits on a consumer, so the order lock is short-lived.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use sharedvfs_types::{ChangeEvent, SessionToken};

use crate::command::{CommandCode, FsCommand, FsCommandCode};
use crate::config::VfsConfig;
use crate::error::{VfsError, VfsResult};
use crate::flows::NotificationBroadcaster;
use crate::session::{Connection, SessionManager};
use crate::tree::NamespaceTree;

/// Shared handle used by transports.
pub type SharedVfsService = Arc<VfsService>;

/// Build a service and wrap it for sharing.
pub fn shared_vfs_service(config: &VfsConfig) -> SharedVfsService {
    Arc::new(VfsService::new(config))
}

#[derive(Debug)]
pub struct VfsService {
    tree: RwLock<NamespaceTree>,
    sessions: Arc<SessionManager>,
    broadcaster: NotificationBroadcaster,
    /// Held from the end of a commit until its event is published.
    publish_order: Mutex<()>,
}

impl Default for VfsService {
    fn default() -> Self {
        Self::new(&VfsConfig::default())
    }
}

impl VfsService {
    pub fn new(config: &VfsConfig) -> Self {
        let tree = NamespaceTree::new(config);
        let sessions = Arc::new(
            SessionManager::new(tree.default_volume())
                .with_outbox_capacity(config.notification_capacity),
        );
        let broadcaster = NotificationBroadcaster::new(sessions.clone());
        Self {
            tree: RwLock::new(tree),
            sessions,
            broadcaster,
            publish_order: Mutex::new(()),
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn connect(&self, user_name: &str) -> VfsResult<Connection> {
        self.sessions.connect(user_name)
    }

    /// Close a session. Returns the user name on success.
    pub fn disconnect(&self, user_name: &str, token: &SessionToken) -> VfsResult<String> {
        self.sessions.disconnect(user_name, token)?;
        Ok(user_name.to_string())
    }

    /// Drop a session whose transport is gone.
    pub fn invalidate(&self, user_name: &str, token: &SessionToken) -> bool {
        self.sessions.invalidate(user_name, token)
    }

    /// Authenticate, run one command line, and announce it if it mutated
    /// the tree. Returns the human-readable result.
    pub fn execute_command(
        &self,
        user_name: &str,
        token: &SessionToken,
        command_line: &str,
    ) -> VfsResult<String> {
        self.sessions.authenticate(user_name, token)?;
        let cwd = self.sessions.current_directory(user_name, token)?;

        let command = FsCommand::parse(command_line)?;
        let code = match command.code() {
            CommandCode::Known(code) => *code,
            CommandCode::Unrecognized(keyword) => {
                return Err(VfsError::invalid_command(format!(
                    "Unknown command '{keyword}'."
                )));
            }
        };
        tracing::debug!(
            user = %user_name,
            %code,
            cwd = %cwd,
            mutating = code.is_mutating(),
            "dispatch"
        );

        let cwd = cwd.as_str();

        match code {
            FsCommandCode::ChangeDirectory => {
                expect_arity(&command, 1)?;
                let dir = self
                    .tree
                    .read()
                    .change_directory(cwd, command.required(0, "Directory path")?)?;
                self.sessions.set_current_directory(user_name, token, dir.clone())?;
                Ok(format!("Current directory is '{dir}'."))
            }
            FsCommandCode::Print => {
                expect_arity(&command, 0)?;
                Ok(self.tree.read().print_tree())
            }
            FsCommandCode::MakeDirectory => {
                expect_arity(&command, 1)?;
                let path = command.required(0, "Directory path")?;
                self.commit(user_name, command_line, &|tree| {
                    let path = tree.make_directory(cwd, path)?;
                    Ok(format!("Directory '{path}' created."))
                })
            }
            FsCommandCode::RemoveDirectory => {
                expect_arity(&command, 1)?;
                let path = command.required(0, "Directory path")?;
                self.commit(user_name, command_line, &|tree| {
                    let path = tree.remove_directory(cwd, path)?;
                    Ok(format!("Directory '{path}' removed."))
                })
            }
            FsCommandCode::DeleteTree => {
                expect_arity(&command, 1)?;
                let path = command.required(0, "Directory path")?;
                self.commit(user_name, command_line, &|tree| {
                    let path = tree.delete_tree(cwd, path)?;
                    Ok(format!("Directory '{path}' removed."))
                })
            }
            FsCommandCode::MakeFile => {
                expect_arity(&command, 1)?;
                let path = command.required(0, "File path")?;
                self.commit(user_name, command_line, &|tree| {
                    let path = tree.make_file(cwd, path)?;
                    Ok(format!("File '{path}' created."))
                })
            }
            FsCommandCode::DeleteFile => {
                expect_arity(&command, 1)?;
                let path = command.required(0, "File path")?;
                self.commit(user_name, command_line, &|tree| {
                    let path = tree.delete_file(cwd, path)?;
                    Ok(format!("File '{path}' deleted."))
                })
            }
            FsCommandCode::Lock => {
                expect_arity(&command, 1)?;
                let path = command.required(0, "File path")?;
                self.commit(user_name, command_line, &|tree| {
                    let path = tree.lock_file(user_name, cwd, path)?;
                    Ok(format!("File '{path}' locked."))
                })
            }
            FsCommandCode::Unlock => {
                expect_arity(&command, 1)?;
                let path = command.required(0, "File path")?;
                self.commit(user_name, command_line, &|tree| {
                    let path = tree.unlock_file(user_name, cwd, path)?;
                    Ok(format!("File '{path}' unlocked."))
                })
            }
            FsCommandCode::Copy => {
                expect_arity(&command, 2)?;
                let source = command.required(0, "Source path")?;
                let destination = command.required(1, "Destination path")?;
                self.commit(user_name, command_line, &|tree| {
                    let copied = tree.copy(cwd, source, destination)?;
                    Ok(format!("'{}' copied to '{}'.", copied.source, copied.destination))
                })
            }
            FsCommandCode::Move => {
                expect_arity(&command, 2)?;
                let source = command.required(0, "Source path")?;
                let destination = command.required(1, "Destination path")?;
                self.commit(user_name, command_line, &|tree| {
                    let moved = tree.move_node(cwd, source, destination)?;
                    Ok(format!("'{}' moved to '{}'.", moved.source, moved.destination))
                })
            }
        }
    }

    /// Render the whole tree.
    pub fn print_tree(&self) -> String {
        self.tree.read().print_tree()
    }

    /// True if `path` resolves from the default volume.
    pub fn exists(&self, path: &str) -> bool {
        let tree = self.tree.read();
        tree.exists(tree.default_volume(), path)
    }

    /// Apply a mutation under the write lock and announce it on success.
    fn commit(
        &self,
        user_name: &str,
        command_line: &str,
        apply: &dyn Fn(&mut NamespaceTree) -> VfsResult<String>,
    ) -> VfsResult<String> {
        let mut tree = self.tree.write();
        let message = apply(&mut *tree)?;
        let order = self.publish_order.lock();
        drop(tree);
        self.broadcaster
            .publish(ChangeEvent::new(user_name, command_line));
        drop(order);
        Ok(message)
    }
}

/// Reject extra parameters. Missing ones are reported by `Command::required`.
fn expect_arity(command: &FsCommand, max: usize) -> VfsResult<()> {
    if command.parameters().len() > max {
        return Err(VfsError::invalid_command(format!(
            "Too many parameters for '{}': expected {max}, got {}.",
            command.keyword(),
            command.parameters().len()
        )));
    }
    Ok(())
}
