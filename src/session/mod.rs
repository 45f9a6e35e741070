// SSHE — Session Module
//
// The remote-shell collaborator used by `sshe link`.

mod error;
mod ssh;

pub use error::SessionError;
#[cfg(test)]
pub use ssh::mock;
pub use ssh::{ShellLauncher, ShellTarget, Ssh2Launcher, DEFAULT_PORT};
