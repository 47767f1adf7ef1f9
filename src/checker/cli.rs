//! CLI-based policy checker using an external binary

use super::PolicyChecker;
use super::parser::parse_verdict;
use crate::config::CheckerConfig;
use crate::error::{Error, Result};
use crate::types::{Outcome, SkipReason};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Binary searched for in PATH when no explicit path is configured
const DEFAULT_CHECKER_BINARY: &str = "cargo";

/// Policy checker that shells out to an external binary
///
/// The binary is spawned once per item with the unpacked package root as its
/// working directory, no stdin, stdout captured, stderr discarded. The policy
/// configuration file is copied into the package root first — the checker
/// expects it co-located with the sources it inspects.
#[derive(Debug)]
pub struct CliPolicyChecker {
    binary_path: PathBuf,
    args: Vec<String>,
    policy_config: PathBuf,
}

impl CliPolicyChecker {
    /// Create a checker with an explicit binary path
    ///
    /// # Arguments
    ///
    /// * `binary_path` - Path to the checker binary
    /// * `args` - Arguments passed on every invocation
    /// * `policy_config` - Policy file copied next to each unpacked package
    #[must_use]
    pub fn new(binary_path: PathBuf, args: Vec<String>, policy_config: PathBuf) -> Self {
        Self {
            binary_path,
            args,
            policy_config,
        }
    }

    /// Build a checker from configuration, discovering the binary if needed
    ///
    /// Uses the explicit `binary_path` when set; otherwise searches PATH for
    /// the default binary via the `which` crate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExternalTool`] if no binary can be located, or
    /// [`Error::Config`] if PATH search is disabled and no path was given.
    pub fn from_config(config: &CheckerConfig) -> Result<Self> {
        let binary_path = match &config.binary_path {
            Some(path) => path.clone(),
            None if config.search_path => {
                which::which(DEFAULT_CHECKER_BINARY).map_err(|e| {
                    Error::ExternalTool(format!(
                        "checker binary '{DEFAULT_CHECKER_BINARY}' not found in PATH: {e}"
                    ))
                })?
            }
            None => {
                return Err(Error::Config {
                    message: "no checker binary path configured and PATH search is disabled"
                        .to_string(),
                    key: Some("checker.binary_path".to_string()),
                });
            }
        };

        Ok(Self::new(
            binary_path,
            config.args.clone(),
            config.policy_config.clone(),
        ))
    }
}

#[async_trait]
impl PolicyChecker for CliPolicyChecker {
    async fn check(&self, package_dir: &Path) -> Outcome {
        let config_name = self
            .policy_config
            .file_name()
            .unwrap_or_else(|| OsStr::new("deny.toml"));
        if let Err(e) = tokio::fs::copy(&self.policy_config, package_dir.join(config_name)).await {
            return Outcome::Skipped(SkipReason::CheckerFailed {
                message: format!(
                    "failed to copy policy config '{}': {}",
                    self.policy_config.display(),
                    e
                ),
            });
        }

        let output = match Command::new(&self.binary_path)
            .args(&self.args)
            .current_dir(package_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                return Outcome::Skipped(SkipReason::CheckerFailed {
                    message: format!(
                        "failed to execute {}: {}",
                        self.binary_path.display(),
                        e
                    ),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let trimmed = stdout.trim();
        if trimmed.is_empty() {
            return Outcome::Skipped(SkipReason::EmptyCheckerOutput);
        }

        match parse_verdict(trimmed) {
            Ok(verdict) => Outcome::Verdict(verdict),
            Err(e) => {
                tracing::debug!(error = %e, "checker output did not match the protocol");
                Outcome::Skipped(SkipReason::MalformedCheckerOutput {
                    output: trimmed.to_string(),
                })
            }
        }
    }

    fn name(&self) -> &'static str {
        "cli-cargo-deny"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_uses_explicit_path_without_searching() {
        let config = CheckerConfig {
            binary_path: Some(PathBuf::from("/opt/tools/checker")),
            ..CheckerConfig::default()
        };

        let checker = CliPolicyChecker::from_config(&config).unwrap();
        assert_eq!(checker.binary_path, PathBuf::from("/opt/tools/checker"));
    }

    #[test]
    fn from_config_without_path_or_search_is_a_config_error() {
        let config = CheckerConfig {
            binary_path: None,
            search_path: false,
            ..CheckerConfig::default()
        };

        let err = CliPolicyChecker::from_config(&config).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn missing_policy_config_skips_the_item() {
        let package = tempfile::tempdir().unwrap();
        let checker = CliPolicyChecker::new(
            PathBuf::from("/bin/true"),
            Vec::new(),
            PathBuf::from("/nonexistent/deny.toml"),
        );

        let outcome = checker.check(package.path()).await;
        match outcome {
            Outcome::Skipped(SkipReason::CheckerFailed { message }) => {
                assert!(message.contains("policy config"));
            }
            other => panic!("expected CheckerFailed skip, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unspawnable_binary_skips_the_item() {
        let package = tempfile::tempdir().unwrap();
        let policy = package.path().join("deny.toml");
        std::fs::write(&policy, "[licenses]\n").unwrap();

        let checker = CliPolicyChecker::new(
            PathBuf::from("/nonexistent/path/to/checker"),
            Vec::new(),
            policy,
        );

        let outcome = checker.check(package.path()).await;
        assert!(matches!(
            outcome,
            Outcome::Skipped(SkipReason::CheckerFailed { .. })
        ));
    }

    // Script-backed tests exercising the full spawn/capture/parse path
    #[cfg(unix)]
    mod scripted {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// Write an executable shell script that prints `stdout_line`
        fn script_checker(dir: &Path, stdout_line: &str) -> CliPolicyChecker {
            let script = dir.join("fake-checker.sh");
            std::fs::write(&script, format!("#!/bin/sh\nprintf '%s' \"{stdout_line}\"\n")).unwrap();
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

            let policy = dir.join("deny.toml");
            std::fs::write(&policy, "[licenses]\n").unwrap();

            CliPolicyChecker::new(script, Vec::new(), policy)
        }

        #[tokio::test]
        async fn well_formed_stdout_becomes_a_verdict() {
            let dir = tempfile::tempdir().unwrap();
            let package = tempfile::tempdir().unwrap();
            let checker = script_checker(
                dir.path(),
                "advisories ok, bans error, licenses ok, sources ok",
            );

            let outcome = checker.check(package.path()).await;
            match outcome {
                Outcome::Verdict(verdict) => {
                    assert!(verdict.advisories);
                    assert!(!verdict.bans);
                    assert!(verdict.licenses);
                    assert!(verdict.sources);
                }
                other => panic!("expected a verdict, got: {other:?}"),
            }
            // the policy config was copied next to the package sources
            assert!(package.path().join("deny.toml").is_file());
        }

        #[tokio::test]
        async fn empty_stdout_is_a_skip_never_an_all_false_verdict() {
            let dir = tempfile::tempdir().unwrap();
            let package = tempfile::tempdir().unwrap();
            let checker = script_checker(dir.path(), "");

            let outcome = checker.check(package.path()).await;
            assert!(matches!(
                outcome,
                Outcome::Skipped(SkipReason::EmptyCheckerOutput)
            ));
        }

        #[tokio::test]
        async fn malformed_stdout_is_a_skip_with_the_text_retained() {
            let dir = tempfile::tempdir().unwrap();
            let package = tempfile::tempdir().unwrap();
            let checker = script_checker(dir.path(), "error: could not parse manifest");

            let outcome = checker.check(package.path()).await;
            match outcome {
                Outcome::Skipped(SkipReason::MalformedCheckerOutput { output }) => {
                    assert!(output.contains("could not parse manifest"));
                }
                other => panic!("expected MalformedCheckerOutput skip, got: {other:?}"),
            }
        }
    }
}
