// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StevedoreError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to load cluster credentials: {0}")]
    CredentialsError(String),

    #[error("Kubernetes client not initialized")]
    NotConnected,
}

pub type Result<T> = std::result::Result<T, StevedoreError>;
