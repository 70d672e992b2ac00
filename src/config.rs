// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::env as env_keys;
use std::env;
use std::path::PathBuf;

/// Execution mode, controls how cluster credentials are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Running inside the cluster, use the mounted service account
    Production,
    /// Running locally, use a kubeconfig file
    Development,
}

impl RunMode {
    pub fn from_value(value: &str) -> Self {
        if value.eq_ignore_ascii_case("production") {
            RunMode::Production
        } else {
            RunMode::Development
        }
    }
}

/// Process configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub run_mode: RunMode,
    /// Explicit kubeconfig path; when unset, development mode falls back to
    /// the standard discovery locations
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context override; when unset, current-context is used
    pub kube_context: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let run_mode = env::var(env_keys::RUN_MODE)
            .map(|v| RunMode::from_value(&v))
            .unwrap_or(RunMode::Development);
        let kubeconfig = env::var_os(env_keys::KUBECONFIG).map(PathBuf::from);
        let kube_context = env::var(env_keys::KUBE_CONTEXT).ok();

        Config {
            run_mode,
            kubeconfig,
            kube_context,
        }
    }
}
