//! External collaborators gating and serving the gateway.
//!
//! - [`Authorizer`]: allow/deny in front of update and capture
//! - [`Capturer`]: fetches a rendered page for a URL

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

use crate::error::SyncError;

/// Who is asking. Built from the request's `Authorization` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor {
    pub bearer_token: Option<String>,
}

impl Actor {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            bearer_token: Some(token.into()),
        }
    }

    /// Parse an `Authorization: Bearer <token>` header value.
    pub fn from_authorization(header: Option<&str>) -> Self {
        let bearer_token = header
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        Self { bearer_token }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

#[async_trait]
pub trait Authorizer: Send + Sync {
    /// `Err` means the authorizer itself failed, not that access was denied.
    async fn authorize(&self, actor: &Actor) -> Result<Decision, SyncError>;
}

/// Lets everyone through.
#[derive(Debug, Default, Clone)]
pub struct AllowAll;

#[async_trait]
impl Authorizer for AllowAll {
    async fn authorize(&self, _actor: &Actor) -> Result<Decision, SyncError> {
        Ok(Decision::Allow)
    }
}

/// Allows only callers presenting one shared bearer token.
#[derive(Debug, Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl Authorizer for StaticToken {
    async fn authorize(&self, actor: &Actor) -> Result<Decision, SyncError> {
        match &actor.bearer_token {
            Some(t) if *t == self.token => Ok(Decision::Allow),
            _ => Ok(Decision::Deny),
        }
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture is not configured")]
    Unavailable,
    #[error("capture failed: {0}")]
    Failed(String),
    #[error("capture timed out after {0:?}")]
    TimedOut(Duration),
    #[error("capture I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CaptureError> for SyncError {
    fn from(e: CaptureError) -> Self {
        SyncError::Collaborator(e.to_string())
    }
}

#[async_trait]
pub trait Capturer: Send + Sync {
    async fn capture(&self, url: &str) -> Result<Vec<u8>, CaptureError>;
}

/// Always fails with [`CaptureError::Unavailable`].
#[derive(Debug, Default, Clone)]
pub struct DisabledCapture;

#[async_trait]
impl Capturer for DisabledCapture {
    async fn capture(&self, _url: &str) -> Result<Vec<u8>, CaptureError> {
        Err(CaptureError::Unavailable)
    }
}

/// Runs an external program (e.g. a headless browser) with the URL as its
/// last argument and returns its stdout.
#[derive(Debug, Clone)]
pub struct CommandCapture {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandCapture {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Split a whitespace-separated command line. `None` if it is blank.
    pub fn from_command_line(line: &str, timeout: Duration) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect(), timeout))
    }
}

#[async_trait]
impl Capturer for CommandCapture {
    async fn capture(&self, url: &str) -> Result<Vec<u8>, CaptureError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg(url).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| CaptureError::TimedOut(self.timeout))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CaptureError::Failed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_from_header() {
        assert_eq!(
            Actor::from_authorization(Some("Bearer abc")),
            Actor::with_token("abc")
        );
        assert_eq!(Actor::from_authorization(Some("Basic abc")), Actor::anonymous());
        assert_eq!(Actor::from_authorization(Some("Bearer   ")), Actor::anonymous());
        assert_eq!(Actor::from_authorization(None), Actor::anonymous());
    }

    #[tokio::test]
    async fn test_static_token() {
        let auth = StaticToken::new("s3cret");
        assert_eq!(
            auth.authorize(&Actor::with_token("s3cret")).await.unwrap(),
            Decision::Allow
        );
        assert_eq!(
            auth.authorize(&Actor::with_token("nope")).await.unwrap(),
            Decision::Deny
        );
        assert_eq!(auth.authorize(&Actor::anonymous()).await.unwrap(), Decision::Deny);
        assert_eq!(
            AllowAll.authorize(&Actor::anonymous()).await.unwrap(),
            Decision::Allow
        );
    }

    #[tokio::test]
    async fn test_disabled_capture() {
        let err = DisabledCapture.capture("http://example.com").await.unwrap_err();
        assert!(matches!(err, CaptureError::Unavailable));
        assert!(matches!(SyncError::from(err), SyncError::Collaborator(_)));
    }

    #[test]
    fn test_command_line_parsing() {
        assert!(CommandCapture::from_command_line("   ", Duration::from_secs(1)).is_none());
        let cmd =
            CommandCapture::from_command_line("chromium --headless --dump-dom", Duration::from_secs(1))
                .unwrap();
        assert_eq!(cmd.program, "chromium");
        assert_eq!(cmd.args, vec!["--headless", "--dump-dom"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_capture_stdout() {
        let cmd = CommandCapture::new("echo", vec!["-n".into()], Duration::from_secs(5));
        let bytes = cmd.capture("http://example.com").await.unwrap();
        assert_eq!(bytes, b"http://example.com");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_capture_failure() {
        let cmd = CommandCapture::new("false", Vec::new(), Duration::from_secs(5));
        assert!(matches!(
            cmd.capture("http://example.com").await,
            Err(CaptureError::Failed(_))
        ));

        let missing = CommandCapture::new("/nonexistent/capture-bin", Vec::new(), Duration::from_secs(5));
        assert!(matches!(
            missing.capture("http://example.com").await,
            Err(CaptureError::Io(_))
        ));
    }
}
