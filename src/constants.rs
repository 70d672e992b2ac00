// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Namespace used when a caller does not specify one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Environment variable names read at startup
pub mod env {
    /// Execution mode: "production" selects in-cluster credentials,
    /// anything else selects a local kubeconfig
    pub const RUN_MODE: &str = "RUN_MODE";
    /// Path to a local kubeconfig file (development mode only)
    pub const KUBECONFIG: &str = "KUBECONFIG";
    /// Context name to select from the kubeconfig instead of current-context
    pub const KUBE_CONTEXT: &str = "KUBE_CONTEXT";
}
