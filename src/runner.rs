//! Executing a CGI program for one request.

use {
    crate::{invocation::Invocation, response::{frame_output, HttpResponse}},
    std::{
        io,
        os::unix::process::CommandExt,
        path::{Path, PathBuf},
        process::{Command as StdCommand, Stdio},
        time::Duration,
    },
    tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        process::Command,
        runtime::Builder,
        time,
    },
};

/// How long output is still collected once the program itself has exited.
const EXIT_DRAIN: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("script path has no file name: {}", .0.display())]
    InvalidScript(PathBuf),

    #[error("I/O error while running CGI program: {0}")]
    Io(#[from] io::Error),
}

/// Blocking wrapper around [`execute`].
pub fn run(invocation: &Invocation) -> Result<HttpResponse, RunError> {
    Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(execute(invocation))
}

/// Runs the program described by `invocation` and frames its output.
///
/// Failing to start the program is answered with a 500 response, running
/// past the timeout with a 504 after the program's whole process group has
/// been killed.
pub async fn execute(invocation: &Invocation) -> Result<HttpResponse, RunError> {
    let script = &invocation.script;
    let file_name = script
        .file_name()
        .ok_or_else(|| RunError::InvalidScript(script.clone()))?;
    let dir = script
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut command = StdCommand::new(&invocation.program);
    command
        .arg(file_name)
        .current_dir(dir)
        .env_clear()
        .envs(invocation.environment())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0);
    let mut command = Command::from(command);
    command.kill_on_drop(true);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            tracing::error!(
                program = %invocation.program.display(),
                error = %e,
                "unable to start CGI program"
            );
            return Ok(HttpResponse::internal_server_error());
        }
    };
    let pid = child.id();
    tracing::debug!(?pid, script = %script.display(), "started CGI program");

    let mut stdin = child.stdin.take();
    let mut stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
    let mut stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

    let body: &[u8] = if invocation.is_post() {
        &invocation.body
    } else {
        &[]
    };

    let finish = async {
        let mut output = Vec::new();
        let mut errors = Vec::new();
        let status = {
            let feed = async {
                if let Some(mut stdin) = stdin.take() {
                    // a program that exits without reading its body is not an error
                    if let Err(e) = stdin.write_all(body).await {
                        tracing::debug!(error = %e, "CGI program did not read its body");
                    }
                }
            };
            let collect = async {
                let ((), read_output, read_errors) = tokio::join!(
                    feed,
                    stdout.read_to_end(&mut output),
                    stderr.read_to_end(&mut errors)
                );
                read_output?;
                read_errors?;
                Ok::<_, io::Error>(())
            };
            tokio::pin!(collect);

            let exited = tokio::select! {
                collected = &mut collect => {
                    collected?;
                    None
                }
                status = child.wait() => Some(status?),
            };
            match exited {
                None => child.wait().await?,
                // a background helper may still hold the pipes open
                Some(status) => {
                    match time::timeout(EXIT_DRAIN, &mut collect).await {
                        Ok(collected) => collected?,
                        Err(_) => tracing::debug!("output pipes still open after exit"),
                    }
                    status
                }
            }
        };
        Ok::<_, io::Error>((status, output, errors))
    };

    let outcome = time::timeout(invocation.timeout, finish).await;
    match outcome {
        Ok(finished) => {
            let (status, output, errors) = finished?;
            if !errors.is_empty() {
                tracing::warn!(
                    stderr = %String::from_utf8_lossy(&errors),
                    "CGI program wrote to stderr"
                );
            }
            if !status.success() {
                tracing::warn!(%status, "CGI program exited unsuccessfully");
            }
            Ok(frame_output(&output))
        }
        Err(_) => {
            tracing::error!(
                timeout = ?invocation.timeout,
                script = %script.display(),
                "CGI script timed out"
            );
            if let Some(pid) = pid {
                kill_group(pid);
            }
            child.kill().await?;
            Ok(HttpResponse::gateway_timeout(invocation.timeout))
        }
    }
}

fn missing_pipe(name: &str) -> io::Error {
    io::Error::other(format!("child {name} was not captured"))
}

/// Kills every process in the group led by `pid`, so helpers a script spawned
/// do not outlive it.
fn kill_group(pid: u32) {
    if -1 == unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) } {
        tracing::warn!(pid, errno = %errno::errno(), "killpg failed");
    }
}
