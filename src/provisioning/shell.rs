/// Provisioning backend that shells out to the host's user management tools
use crate::{
    config::ProvisioningConfig,
    error::{BotError, BotResult},
    provisioning::{NewUser, ProvisioningBackend},
};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Runs `useradd`, `chage`, `usermod`, `deluser` and `mkpasswd`
pub struct ShellBackend {
    dry_run: bool,
}

impl ShellBackend {
    pub fn new(config: &ProvisioningConfig) -> Self {
        if config.dry_run {
            warn!("Provisioning dry run enabled, OS accounts will not be modified");
        }
        Self {
            dry_run: config.dry_run,
        }
    }

    /// Run a program and return its combined stdout and stderr.
    ///
    /// Arguments are passed directly to the process, never through a shell.
    async fn exec(&self, program: &str, args: &[&str]) -> BotResult<String> {
        self.exec_with_input(program, args, None).await
    }

    /// Like [`exec`](Self::exec), writing `input` to the child's stdin.
    /// Secrets go through here so they never appear in the process list.
    async fn exec_with_input(&self, program: &str, args: &[&str], input: Option<&str>) -> BotResult<String> {
        let rendered = render_command(program, args);

        if self.dry_run {
            info!("[dry run] {}", rendered);
            return Ok(String::new());
        }

        debug!("Executing {}", rendered);
        let spawn_error = |e: std::io::Error| BotError::Provisioning {
            command: rendered.clone(),
            output: e.to_string(),
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
            stdin.write_all(input.as_bytes()).await.map_err(spawn_error)?;
            stdin.write_all(b"\n").await.map_err(spawn_error)?;
            // Dropping stdin closes it so the child sees EOF
        }

        let output = child.wait_with_output().await.map_err(spawn_error)?;

        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        if !output.status.success() {
            return Err(BotError::Provisioning {
                command: rendered,
                output: combined,
            });
        }

        Ok(combined)
    }
}

/// Render a command line for logs and errors, hiding password material
fn render_command(program: &str, args: &[&str]) -> String {
    let mut parts = vec![program.to_string()];
    let mut redact_next = false;
    for arg in args {
        if redact_next {
            parts.push("<redacted>".to_string());
            redact_next = false;
            continue;
        }
        redact_next = *arg == "-p";
        parts.push(arg.to_string());
    }
    parts.join(" ")
}

#[async_trait]
impl ProvisioningBackend for ShellBackend {
    async fn hash_password(&self, plaintext: &str) -> BotResult<String> {
        if self.dry_run {
            return Ok("!dry-run".to_string());
        }
        let hashed = self
            .exec_with_input("mkpasswd", &["--method=sha-512", "--stdin"], Some(plaintext))
            .await?;
        Ok(hashed.trim().to_string())
    }

    async fn create_user(&self, user: NewUser<'_>) -> BotResult<()> {
        let home = user.home_dir.to_string_lossy().into_owned();
        self.exec(
            "useradd",
            &[
                "-m",
                "-p",
                user.password_hash,
                "-c",
                user.comment,
                "-s",
                user.shell,
                "-d",
                home.as_str(),
                user.username,
            ],
        )
        .await?;
        Ok(())
    }

    async fn expire_password(&self, username: &str) -> BotResult<()> {
        self.exec("chage", &["-d0", username]).await?;
        Ok(())
    }

    async fn lock_user(&self, username: &str) -> BotResult<()> {
        self.exec("usermod", &["--lock", "--expiredate", "1", username])
            .await?;
        Ok(())
    }

    async fn unlock_user(&self, username: &str) -> BotResult<()> {
        self.exec("usermod", &["--unlock", "--expiredate", "", username])
            .await?;
        Ok(())
    }

    async fn delete_user(&self, username: &str, home_dir: &Path, backup_target: &Path) -> BotResult<()> {
        let backup = backup_target.to_string_lossy().into_owned();
        self.exec(
            "deluser",
            &[username, "--remove-home", "--backup-to", backup.as_str()],
        )
        .await?;

        if self.dry_run {
            return Ok(());
        }

        // deluser leaves homes outside /home behind
        match tokio::fs::remove_dir_all(home_dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BotError::Provisioning {
                command: format!("remove {}", home_dir.display()),
                output: e.to_string(),
            }),
        }
    }

    async fn set_password(&self, username: &str, password_hash: &str) -> BotResult<()> {
        self.exec("usermod", &["-p", password_hash, username]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_redacts_password_hash() {
        let rendered = render_command("useradd", &["-m", "-p", "$6$secret", "alice"]);
        assert_eq!(rendered, "useradd -m -p <redacted> alice");

        let rendered = render_command("usermod", &["-p", "$6$secret", "alice"]);
        assert_eq!(rendered, "usermod -p <redacted> alice");
    }

    #[tokio::test]
    async fn test_secret_input_goes_through_stdin() {
        let backend = ShellBackend { dry_run: false };
        let output = backend
            .exec_with_input("cat", &[], Some("hunter2"))
            .await
            .unwrap();
        assert_eq!(output.trim(), "hunter2");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_provisioning_error() {
        let backend = ShellBackend { dry_run: false };
        let err = backend.exec("false", &[]).await.unwrap_err();
        assert!(matches!(err, BotError::Provisioning { ref command, .. } if command == "false"));
    }

    #[tokio::test]
    async fn test_exec_captures_output() {
        let backend = ShellBackend { dry_run: false };
        let output = backend.exec("echo", &["hello"]).await.unwrap();
        assert_eq!(output.trim(), "hello");
    }

    #[tokio::test]
    async fn test_dry_run_skips_execution() {
        let backend = ShellBackend::new(&ProvisioningConfig {
            dry_run: true,
            ..ProvisioningConfig::default()
        });
        backend.lock_user("alice").await.unwrap();
        assert_eq!(backend.hash_password("pw").await.unwrap(), "!dry-run");
    }
}
