// SSHE — SSH Shell Launcher
//
// Opens an interactive shell on a stored node:
//   1. dial the host (10 s connect timeout)
//   2. handshake and authenticate with the decrypted password
//   3. request a pty sized like the local terminal and start a shell
//   4. put the local terminal in raw mode and relay stdio until the remote
//      side closes the channel
//
// Host keys are not verified, matching the behaviour of earlier releases.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::terminal;
use ssh2::{Channel, Session};

use super::SessionError;

// ─── Constants ───────────────────────────────────────────────────────────────

pub const DEFAULT_PORT: u16 = 22;

/// Terminal type requested when `$TERM` is unset.
const DEFAULT_TERM: &str = "vt100";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Poll interval of the relay loop while neither side has data.
const RELAY_IDLE: Duration = Duration::from_millis(10);

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Where to connect and as whom.
#[derive(Clone, Copy)]
pub struct ShellTarget<'a> {
    pub host: &'a str,
    pub port: u16,
    pub username: &'a str,
    pub password: &'a str,
}

impl ShellTarget<'_> {
    /// `host:port`, with IPv6 hosts bracketed.
    pub fn addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Runs an interactive remote shell; returns when the session ends.
pub trait ShellLauncher {
    fn launch(&self, target: &ShellTarget<'_>) -> Result<(), SessionError>;
}

// ─── ssh2 Implementation ─────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Ssh2Launcher;

impl Ssh2Launcher {
    fn dial(target: &ShellTarget<'_>) -> Result<TcpStream, SessionError> {
        let addr = target.addr();
        let connect_err = |source| SessionError::Connect {
            addr: addr.clone(),
            source,
        };

        let mut last_err =
            io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses");
        for socket in (target.host, target.port)
            .to_socket_addrs()
            .map_err(connect_err)?
        {
            match TcpStream::connect_timeout(&socket, CONNECT_TIMEOUT) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = e,
            }
        }
        Err(connect_err(last_err))
    }

    fn authenticate(tcp: TcpStream, target: &ShellTarget<'_>) -> Result<Session, SessionError> {
        let addr = target.addr();
        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.set_timeout(CONNECT_TIMEOUT.as_millis() as u32);
        session
            .handshake()
            .map_err(|source| SessionError::Handshake {
                addr: addr.clone(),
                source,
            })?;

        if session
            .userauth_password(target.username, target.password)
            .is_err()
            || !session.authenticated()
        {
            return Err(SessionError::Auth {
                username: target.username.to_string(),
                addr,
            });
        }

        // No timeout once interactive: the shell may sit idle indefinitely.
        session.set_timeout(0);
        tracing::debug!(addr = %addr, username = %target.username, "SSH authentication succeeded");
        Ok(session)
    }

    fn open_shell(session: &Session, term: &str, cols: u16, rows: u16) -> Result<Channel, SessionError> {
        let mut channel = session.channel_session()?;
        channel.request_pty(term, None, Some((u32::from(cols), u32::from(rows), 0, 0)))?;
        channel.shell()?;
        Ok(channel)
    }

    fn relay_stdio(session: &Session, channel: &mut Channel) -> Result<(), SessionError> {
        let (tx, rx) = mpsc::channel::<Vec<u8>>();
        thread::spawn(move || {
            let mut stdin = io::stdin();
            let mut buf = [0u8; 1024];
            loop {
                match stdin.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        session.set_blocking(false);
        let mut stdout = io::stdout();
        let mut stderr = io::stderr();
        let mut buf = [0u8; 8192];

        loop {
            let mut busy = false;

            let n = read_available(channel, &mut buf)?;
            if n > 0 {
                stdout.write_all(&buf[..n]).map_err(SessionError::Relay)?;
                stdout.flush().map_err(SessionError::Relay)?;
                busy = true;
            }

            let n = read_available(&mut channel.stderr(), &mut buf)?;
            if n > 0 {
                stderr.write_all(&buf[..n]).map_err(SessionError::Relay)?;
                busy = true;
            }

            while let Ok(input) = rx.try_recv() {
                write_all_nonblocking(channel, &input)?;
                busy = true;
            }

            if channel.eof() {
                break;
            }
            if !busy {
                thread::sleep(RELAY_IDLE);
            }
        }

        session.set_blocking(true);
        channel.wait_close()?;
        let status = channel.exit_status()?;
        tracing::debug!(status, "Remote shell exited");
        Ok(())
    }
}

impl ShellLauncher for Ssh2Launcher {
    fn launch(&self, target: &ShellTarget<'_>) -> Result<(), SessionError> {
        let tcp = Self::dial(target)?;
        let session = Self::authenticate(tcp, target)?;

        let (cols, rows) = terminal::size().map_err(SessionError::Terminal)?;
        let term = std::env::var("TERM").unwrap_or_else(|_| DEFAULT_TERM.to_string());
        let mut channel = Self::open_shell(&session, &term, cols, rows)?;

        tracing::info!(addr = %target.addr(), username = %target.username, "Interactive shell opened");

        let _raw = RawModeGuard::enable()?;
        Self::relay_stdio(&session, &mut channel)
    }
}

/// Raw mode for the local terminal, restored on drop.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self, SessionError> {
        terminal::enable_raw_mode().map_err(SessionError::Terminal)?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::warn!(error = %e, "Failed to restore terminal mode");
        }
    }
}

/// Read whatever is ready; 0 when nothing is.
fn read_available(stream: &mut impl Read, buf: &mut [u8]) -> Result<usize, SessionError> {
    match stream.read(buf) {
        Ok(n) => Ok(n),
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
        Err(e) => Err(SessionError::Relay(e)),
    }
}

fn write_all_nonblocking(channel: &mut Channel, mut data: &[u8]) -> Result<(), SessionError> {
    while !data.is_empty() {
        match channel.write(data) {
            Ok(n) => data = &data[n..],
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(Duration::from_millis(1)),
            Err(e) => return Err(SessionError::Relay(e)),
        }
    }
    Ok(())
}

// ─── Recording Mock for Testing ──────────────────────────────────────────────

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::cell::RefCell;

    /// One recorded launch; the password is kept so tests can check decryption.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Launch {
        pub host: String,
        pub port: u16,
        pub username: String,
        pub password: String,
    }

    #[derive(Default)]
    pub struct RecordingLauncher {
        pub launches: RefCell<Vec<Launch>>,
    }

    impl ShellLauncher for RecordingLauncher {
        fn launch(&self, target: &ShellTarget<'_>) -> Result<(), SessionError> {
            self.launches.borrow_mut().push(Launch {
                host: target.host.to_string(),
                port: target.port,
                username: target.username.to_string(),
                password: target.password.to_string(),
            });
            Ok(())
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn target(host: &'static str) -> ShellTarget<'static> {
        ShellTarget {
            host,
            port: DEFAULT_PORT,
            username: "root",
            password: "pw",
        }
    }

    #[test]
    fn test_addr_formats_ipv4_and_ipv6() {
        assert_eq!(target("10.0.0.1").addr(), "10.0.0.1:22");
        assert_eq!(target("fe80::1").addr(), "[fe80::1]:22");
    }

    #[test]
    fn test_dial_refused_port_is_connect_error() {
        // Bind then drop a listener to get a local port nobody listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let target = ShellTarget {
            host: "127.0.0.1",
            port,
            username: "root",
            password: "pw",
        };

        let err = Ssh2Launcher.launch(&target).unwrap_err();
        assert!(matches!(err, SessionError::Connect { .. }), "got {:?}", err);
    }
}
