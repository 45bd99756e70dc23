//! Blocking `ssh2` session against the rescue-mode server. There is exactly
//! one command to run per build, so this module stays a thin connect +
//! exec pair rather than a general-purpose SSH client.

use std::io::Read;
use std::net::TcpStream;
use std::time::Duration;

use ssh2::Session;
use thiserror::Error;
use tracing::debug;

const CONNECT_RETRY_INTERVAL: Duration = Duration::from_secs(5);
const CONNECT_MAX_ATTEMPTS: u32 = 30;

#[derive(Debug, Error)]
pub enum SshError {
    #[error("could not reach {0} over ssh after {1} attempts: {2}")]
    ConnectExhausted(String, u32, String),
    #[error("ssh transport error: {0}")]
    Transport(#[from] std::io::Error),
    #[error("ssh protocol error: {0}")]
    Protocol(#[from] ssh2::Error),
    #[error("remote command exited {0}: {1}")]
    CommandFailed(i32, String),
}

fn try_connect(addr: &str, username: &str, private_key_pem: &str) -> Result<Session, SshError> {
    let tcp = TcpStream::connect(addr)?;
    let mut session = Session::new()?;
    session.set_tcp_stream(tcp);
    session.handshake()?;
    session.userauth_pubkey_memory(username, None, private_key_pem, None)?;
    Ok(session)
}

/// Connects to `host:22` as `username`, retrying on its own — the rescue
/// server is mid-boot when the first attempts land.
pub fn connect_with_retry(
    host: &str,
    username: &str,
    private_key_pem: &str,
) -> Result<Session, SshError> {
    let addr = format!("{host}:22");
    let mut last_err = String::new();
    for attempt in 1..=CONNECT_MAX_ATTEMPTS {
        match try_connect(&addr, username, private_key_pem) {
            Ok(session) => return Ok(session),
            Err(err) => {
                debug!(attempt, host, error = %err, "ssh connect attempt failed");
                last_err = err.to_string();
                std::thread::sleep(CONNECT_RETRY_INTERVAL);
            }
        }
    }
    Err(SshError::ConnectExhausted(
        host.to_string(),
        CONNECT_MAX_ATTEMPTS,
        last_err,
    ))
}

/// Runs `command` through a single exec channel and returns combined
/// stdout. Exec channels don't multiplex multiple commands, which is why
/// the install step is one semicolon-joined shell line rather than several
/// calls to this function.
pub fn run_command(session: &Session, command: &str) -> Result<String, SshError> {
    let mut channel = session.channel_session()?;
    channel.exec(command)?;
    let mut output = String::new();
    channel.read_to_string(&mut output)?;
    channel.wait_close()?;
    let status = channel.exit_status()?;
    if status != 0 {
        return Err(SshError::CommandFailed(status, output));
    }
    Ok(output)
}

/// Capability to run one command on a rescue-mode host. [`build::run_build`]
/// takes this as an injected dependency rather than calling `connect_with_retry`
/// and `run_command` directly, so the build protocol can be exercised without
/// a live SSH-reachable server.
pub trait SshExecutor: Send + Sync {
    fn run(
        &self,
        host: &str,
        username: &str,
        private_key_pem: &str,
        command: &str,
    ) -> Result<String, SshError>;
}

/// Production [`SshExecutor`]: connects over real `ssh2`, retrying until the
/// rescue server comes up.
pub struct Ssh2Executor;

impl SshExecutor for Ssh2Executor {
    fn run(
        &self,
        host: &str,
        username: &str,
        private_key_pem: &str,
        command: &str,
    ) -> Result<String, SshError> {
        let session = connect_with_retry(host, username, private_key_pem)?;
        run_command(&session, command)
    }
}
