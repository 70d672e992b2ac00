// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster credential bootstrap for both execution modes

use crate::config::{Config, RunMode};
use crate::error::{Result, StevedoreError};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Config as KConfig;
use std::path::Path;
use tracing::{debug, info};

/// Resolve cluster credentials for the configured execution mode.
///
/// Production mode reads the in-cluster service account (token, CA bundle,
/// API server address from the pod environment). Development mode reads a
/// local kubeconfig, either the file named in the configuration or the
/// standard discovery locations.
pub async fn load_credentials(config: &Config) -> Result<KConfig> {
    match config.run_mode {
        RunMode::Production => {
            info!("Loading Kubernetes credentials from in-cluster environment");
            KConfig::incluster().map_err(|e| {
                StevedoreError::CredentialsError(format!(
                    "in-cluster configuration unavailable: {}",
                    e
                ))
            })
        }
        RunMode::Development => match &config.kubeconfig {
            Some(path) => {
                info!("Loading Kubernetes credentials from {}", path.display());
                let raw = read_kubeconfig_file(path)?;
                config_from_kubeconfig(&raw, config.kube_context.as_deref()).await
            }
            None => {
                info!("Loading Kubernetes credentials from default kubeconfig locations");
                KConfig::infer().await.map_err(|e| {
                    StevedoreError::CredentialsError(format!("failed to infer config: {}", e))
                })
            }
        },
    }
}

fn read_kubeconfig_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        StevedoreError::CredentialsError(format!(
            "failed to read kubeconfig {}: {}",
            path.display(),
            e
        ))
    })
}

/// Build a client config from kubeconfig text, selecting the named context
/// or the file's current-context when no override is given
async fn config_from_kubeconfig(raw: &str, context: Option<&str>) -> Result<KConfig> {
    let kubeconfig_parsed: Kubeconfig = serde_yaml::from_str(raw).map_err(|e| {
        StevedoreError::CredentialsError(format!("failed to parse kubeconfig: {}", e))
    })?;

    debug!(
        context = context.unwrap_or("current-context"),
        "Resolving kubeconfig context"
    );

    let options = KubeConfigOptions {
        context: context.map(String::from),
        ..KubeConfigOptions::default()
    };

    KConfig::from_custom_kubeconfig(kubeconfig_parsed, &options)
        .await
        .map_err(|e| StevedoreError::CredentialsError(format!("failed to create config: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KUBECONFIG_YAML: &str = r#"
apiVersion: v1
kind: Config
clusters:
  - name: dev
    cluster:
      server: https://127.0.0.1:6443
  - name: staging
    cluster:
      server: https://10.0.0.1:6443
contexts:
  - name: dev
    context:
      cluster: dev
      user: dev-user
  - name: staging
    context:
      cluster: staging
      user: staging-user
current-context: dev
users:
  - name: dev-user
    user:
      token: dev-token
  - name: staging-user
    user:
      token: staging-token
"#;

    #[tokio::test]
    async fn test_kubeconfig_uses_current_context() {
        let config = config_from_kubeconfig(KUBECONFIG_YAML, None).await.unwrap();
        assert!(config
            .cluster_url
            .to_string()
            .starts_with("https://127.0.0.1:6443"));
    }

    #[tokio::test]
    async fn test_kubeconfig_context_override() {
        let config = config_from_kubeconfig(KUBECONFIG_YAML, Some("staging"))
            .await
            .unwrap();
        assert!(config
            .cluster_url
            .to_string()
            .starts_with("https://10.0.0.1:6443"));
    }

    #[tokio::test]
    async fn test_kubeconfig_unknown_context_fails() {
        let err = config_from_kubeconfig(KUBECONFIG_YAML, Some("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, StevedoreError::CredentialsError(_)));
    }

    #[tokio::test]
    async fn test_malformed_kubeconfig_fails() {
        let err = config_from_kubeconfig("clusters: [not, a, kubeconfig", None)
            .await
            .unwrap_err();
        assert!(matches!(err, StevedoreError::CredentialsError(_)));
    }

    #[test]
    fn test_missing_kubeconfig_file_fails() {
        let err = read_kubeconfig_file(Path::new("/nonexistent/kubeconfig")).unwrap_err();
        assert!(matches!(err, StevedoreError::CredentialsError(_)));
    }
}
