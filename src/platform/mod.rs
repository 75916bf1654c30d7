use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use wait_timeout::ChildExt;

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

pub fn run_command(cmd: &str, args: &[&str], timeout: Duration) -> Result<CommandOutput> {
    let mut child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to start process: {cmd}"))?;

    // Drained concurrently so a chatty child cannot fill a pipe and stall.
    let stdout_reader = child.stdout.take().map(drain);
    let stderr_reader = child.stderr.take().map(drain);

    let status = match child
        .wait_timeout(timeout)
        .with_context(|| format!("failed to wait for process: {cmd}"))?
    {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(anyhow!("timed out after {timeout:?}: {cmd}"));
        }
    };

    Ok(CommandOutput {
        exit_code: status.code().unwrap_or(-1),
        stdout: collect(stdout_reader),
        stderr: collect(stderr_reader),
    })
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(reader: Option<JoinHandle<String>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

pub fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|p| is_executable(p))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_not_found() {
        assert!(find_program("diagreport-no-such-tool-xyz").is_none());
        assert!(find_program("/definitely/not/here/tool").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn run_command_captures_exit_code_and_output() {
        let out = run_command(
            "sh",
            &["-c", "echo hi; echo oops >&2; exit 3"],
            Duration::from_secs(5),
        )
        .expect("run sh");
        assert_eq!(out.exit_code, 3);
        assert_eq!(out.stdout.trim(), "hi");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[cfg(unix)]
    #[test]
    fn run_command_reads_output_larger_than_a_pipe_buffer() {
        let out = run_command(
            "sh",
            &["-c", "head -c 300000 /dev/zero | tr '\\0' x; head -c 200000 /dev/zero >&2"],
            Duration::from_secs(10),
        )
        .expect("run sh");
        assert_eq!(out.exit_code, 0);
        assert_eq!(out.stdout.len(), 300_000);
        assert!(out.stdout.bytes().all(|b| b == b'x'));
        assert_eq!(out.stderr.len(), 200_000);
    }

    #[cfg(unix)]
    #[test]
    fn run_command_times_out() {
        let err = run_command("sh", &["-c", "sleep 5"], Duration::from_millis(200))
            .expect_err("should time out");
        assert!(err.to_string().contains("timed out"), "err={err}");
    }
}
