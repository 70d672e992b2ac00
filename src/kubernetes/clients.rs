// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed API handles over the shared cluster connection

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Pod, Secret, Service};
use k8s_openapi::api::networking::v1::Ingress;
use kube::{Api, Client};

/// Per-API-group accessors built from one bootstrapped client.
///
/// The underlying client multiplexes every API group over a single
/// connection; constructing an `Api` handle is pure and makes no network
/// call. The set is built once at startup and shared immutably, the client
/// itself is safe for concurrent use.
#[derive(Clone)]
pub struct ClientSet {
    client: Client,
}

impl ClientSet {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    // core/v1

    pub fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub fn services(&self, namespace: &str) -> Api<Service> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Namespaces are cluster-scoped
    pub fn namespaces(&self) -> Api<Namespace> {
        Api::all(self.client.clone())
    }

    // apps/v1

    pub fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }

    // networking.k8s.io/v1

    pub fn ingresses(&self, namespace: &str) -> Api<Ingress> {
        Api::namespaced(self.client.clone(), namespace)
    }
}
