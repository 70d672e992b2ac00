// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Uniform CRUD facade over the managed resource kinds.
//!
//! Every operation takes an optional namespace (falling back to
//! [`DEFAULT_NAMESPACE`]), runs one call against the cluster API, and emits
//! exactly one structured log record with the outcome. Failures carry the
//! underlying [`kube::Error`] unchanged, there is no retry and no result
//! substitution.

use crate::config::Config;
use crate::constants::DEFAULT_NAMESPACE;
use crate::error::{Result, StevedoreError};
use crate::kubernetes::clients::ClientSet;
use crate::kubernetes::credentials::load_credentials;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Pod, Secret, Service};
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::{Client, ResourceExt};
use std::future::Future;
use tracing::{error, info, warn};

/// Facade over the cluster resource API.
///
/// Constructed once per process via [`ResourceManager::bootstrap`]. When the
/// credential bootstrap fails the manager is still returned, with no client
/// set, so the process keeps serving; every resource call then fails with
/// [`StevedoreError::NotConnected`] and the connectivity probe reports
/// `false`. The manager never transitions back to the uninitialized state.
pub struct ResourceManager {
    clients: Option<ClientSet>,
}

impl ResourceManager {
    /// Load credentials for the configured execution mode and build the
    /// client set. Bootstrap failures are logged, not propagated.
    pub async fn bootstrap(config: &Config) -> Self {
        let clients = match load_credentials(config).await {
            Ok(credentials) => match Client::try_from(credentials) {
                Ok(client) => {
                    info!("Kubernetes client initialized");
                    Some(ClientSet::new(client))
                }
                Err(e) => {
                    error!("Failed to build Kubernetes client: {}", e);
                    None
                }
            },
            Err(e) => {
                error!("Failed to load cluster credentials: {}", e);
                None
            }
        };

        Self { clients }
    }

    /// Build a manager around an existing client, bypassing credential
    /// bootstrap. Used by callers that already hold a connection.
    pub fn from_client(client: Client) -> Self {
        Self {
            clients: Some(ClientSet::new(client)),
        }
    }

    fn clients(&self) -> Result<&ClientSet> {
        self.clients.as_ref().ok_or(StevedoreError::NotConnected)
    }

    /// Run one cluster call and emit the single log record for it.
    ///
    /// All operations funnel through here so the one-record-per-call
    /// contract holds for every verb, including calls rejected because the
    /// client was never initialized.
    async fn invoke<T, F>(
        &self,
        kind: &str,
        verb: &str,
        namespace: Option<&str>,
        name: Option<&str>,
        call: F,
    ) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let namespace = namespace.unwrap_or("-");
        let name = name.unwrap_or("-");

        match call.await {
            Ok(value) => {
                info!(
                    kind,
                    verb,
                    namespace,
                    name,
                    outcome = "success",
                    "Kubernetes operation completed"
                );
                Ok(value)
            }
            Err(e) => {
                error!(
                    kind,
                    verb,
                    namespace,
                    name,
                    outcome = "failure",
                    error = %e,
                    "Kubernetes operation failed"
                );
                Err(e)
            }
        }
    }

    // Pod operations

    pub async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<Pod>> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.invoke("Pod", "list", Some(ns), None, async {
            Ok(self.clients()?.pods(ns).list(&ListParams::default()).await?.items)
        })
        .await
    }

    pub async fn get_pod(&self, name: &str, namespace: Option<&str>) -> Result<Pod> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.invoke("Pod", "get", Some(ns), Some(name), async {
            Ok(self.clients()?.pods(ns).get(name).await?)
        })
        .await
    }

    pub async fn delete_pod(&self, name: &str, namespace: Option<&str>) -> Result<()> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.invoke("Pod", "delete", Some(ns), Some(name), async {
            self.clients()?
                .pods(ns)
                .delete(name, &DeleteParams::default())
                .await?;
            Ok(())
        })
        .await
    }

    // Deployment operations

    pub async fn list_deployments(&self, namespace: Option<&str>) -> Result<Vec<Deployment>> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.invoke("Deployment", "list", Some(ns), None, async {
            Ok(self
                .clients()?
                .deployments(ns)
                .list(&ListParams::default())
                .await?
                .items)
        })
        .await
    }

    pub async fn get_deployment(&self, name: &str, namespace: Option<&str>) -> Result<Deployment> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.invoke("Deployment", "get", Some(ns), Some(name), async {
            Ok(self.clients()?.deployments(ns).get(name).await?)
        })
        .await
    }

    pub async fn create_deployment(
        &self,
        manifest: &Deployment,
        namespace: Option<&str>,
    ) -> Result<Deployment> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        let name = manifest.name_any();
        self.invoke("Deployment", "create", Some(ns), Some(&name), async {
            Ok(self
                .clients()?
                .deployments(ns)
                .create(&PostParams::default(), manifest)
                .await?)
        })
        .await
    }

    pub async fn replace_deployment(
        &self,
        name: &str,
        manifest: &Deployment,
        namespace: Option<&str>,
    ) -> Result<Deployment> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.invoke("Deployment", "replace", Some(ns), Some(name), async {
            Ok(self
                .clients()?
                .deployments(ns)
                .replace(name, &PostParams::default(), manifest)
                .await?)
        })
        .await
    }

    pub async fn delete_deployment(&self, name: &str, namespace: Option<&str>) -> Result<()> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.invoke("Deployment", "delete", Some(ns), Some(name), async {
            self.clients()?
                .deployments(ns)
                .delete(name, &DeleteParams::default())
                .await?;
            Ok(())
        })
        .await
    }

    /// Scale a deployment by merge-patching only `spec.replicas`.
    ///
    /// The patch body carries nothing but the replica count, so concurrent
    /// changes to other spec fields (image, env, labels) are never clobbered
    /// by a scaling action.
    pub async fn scale_deployment(
        &self,
        name: &str,
        replicas: i32,
        namespace: Option<&str>,
    ) -> Result<Deployment> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        let patch = replica_patch(replicas);
        self.invoke("Deployment", "scale", Some(ns), Some(name), async {
            Ok(self
                .clients()?
                .deployments(ns)
                .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
                .await?)
        })
        .await
    }

    // Service operations

    pub async fn list_services(&self, namespace: Option<&str>) -> Result<Vec<Service>> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.invoke("Service", "list", Some(ns), None, async {
            Ok(self
                .clients()?
                .services(ns)
                .list(&ListParams::default())
                .await?
                .items)
        })
        .await
    }

    pub async fn get_service(&self, name: &str, namespace: Option<&str>) -> Result<Service> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.invoke("Service", "get", Some(ns), Some(name), async {
            Ok(self.clients()?.services(ns).get(name).await?)
        })
        .await
    }

    pub async fn create_service(
        &self,
        manifest: &Service,
        namespace: Option<&str>,
    ) -> Result<Service> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        let name = manifest.name_any();
        self.invoke("Service", "create", Some(ns), Some(&name), async {
            Ok(self
                .clients()?
                .services(ns)
                .create(&PostParams::default(), manifest)
                .await?)
        })
        .await
    }

    pub async fn replace_service(
        &self,
        name: &str,
        manifest: &Service,
        namespace: Option<&str>,
    ) -> Result<Service> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.invoke("Service", "replace", Some(ns), Some(name), async {
            Ok(self
                .clients()?
                .services(ns)
                .replace(name, &PostParams::default(), manifest)
                .await?)
        })
        .await
    }

    pub async fn delete_service(&self, name: &str, namespace: Option<&str>) -> Result<()> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.invoke("Service", "delete", Some(ns), Some(name), async {
            self.clients()?
                .services(ns)
                .delete(name, &DeleteParams::default())
                .await?;
            Ok(())
        })
        .await
    }

    // Ingress operations

    pub async fn list_ingresses(&self, namespace: Option<&str>) -> Result<Vec<Ingress>> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.invoke("Ingress", "list", Some(ns), None, async {
            Ok(self
                .clients()?
                .ingresses(ns)
                .list(&ListParams::default())
                .await?
                .items)
        })
        .await
    }

    pub async fn get_ingress(&self, name: &str, namespace: Option<&str>) -> Result<Ingress> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.invoke("Ingress", "get", Some(ns), Some(name), async {
            Ok(self.clients()?.ingresses(ns).get(name).await?)
        })
        .await
    }

    pub async fn create_ingress(
        &self,
        manifest: &Ingress,
        namespace: Option<&str>,
    ) -> Result<Ingress> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        let name = manifest.name_any();
        self.invoke("Ingress", "create", Some(ns), Some(&name), async {
            Ok(self
                .clients()?
                .ingresses(ns)
                .create(&PostParams::default(), manifest)
                .await?)
        })
        .await
    }

    pub async fn replace_ingress(
        &self,
        name: &str,
        manifest: &Ingress,
        namespace: Option<&str>,
    ) -> Result<Ingress> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.invoke("Ingress", "replace", Some(ns), Some(name), async {
            Ok(self
                .clients()?
                .ingresses(ns)
                .replace(name, &PostParams::default(), manifest)
                .await?)
        })
        .await
    }

    pub async fn delete_ingress(&self, name: &str, namespace: Option<&str>) -> Result<()> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.invoke("Ingress", "delete", Some(ns), Some(name), async {
            self.clients()?
                .ingresses(ns)
                .delete(name, &DeleteParams::default())
                .await?;
            Ok(())
        })
        .await
    }

    // Secret operations

    pub async fn list_secrets(&self, namespace: Option<&str>) -> Result<Vec<Secret>> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.invoke("Secret", "list", Some(ns), None, async {
            Ok(self
                .clients()?
                .secrets(ns)
                .list(&ListParams::default())
                .await?
                .items)
        })
        .await
    }

    pub async fn get_secret(&self, name: &str, namespace: Option<&str>) -> Result<Secret> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.invoke("Secret", "get", Some(ns), Some(name), async {
            Ok(self.clients()?.secrets(ns).get(name).await?)
        })
        .await
    }

    pub async fn create_secret(
        &self,
        manifest: &Secret,
        namespace: Option<&str>,
    ) -> Result<Secret> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        let name = manifest.name_any();
        self.invoke("Secret", "create", Some(ns), Some(&name), async {
            Ok(self
                .clients()?
                .secrets(ns)
                .create(&PostParams::default(), manifest)
                .await?)
        })
        .await
    }

    pub async fn replace_secret(
        &self,
        name: &str,
        manifest: &Secret,
        namespace: Option<&str>,
    ) -> Result<Secret> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.invoke("Secret", "replace", Some(ns), Some(name), async {
            Ok(self
                .clients()?
                .secrets(ns)
                .replace(name, &PostParams::default(), manifest)
                .await?)
        })
        .await
    }

    pub async fn delete_secret(&self, name: &str, namespace: Option<&str>) -> Result<()> {
        let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.invoke("Secret", "delete", Some(ns), Some(name), async {
            self.clients()?
                .secrets(ns)
                .delete(name, &DeleteParams::default())
                .await?;
            Ok(())
        })
        .await
    }

    // Namespace operations

    pub async fn list_namespaces(&self) -> Result<Vec<Namespace>> {
        self.invoke("Namespace", "list", None, None, async {
            Ok(self
                .clients()?
                .namespaces()
                .list(&ListParams::default())
                .await?
                .items)
        })
        .await
    }

    /// Connectivity probe: lists namespaces and reports whether the call
    /// succeeded. Every failure is swallowed here, the caller only needs a
    /// health signal, not a cause.
    pub async fn is_connected(&self) -> bool {
        match self.list_namespaces().await {
            Ok(_) => true,
            Err(e) => {
                warn!("Kubernetes connection check failed: {}", e);
                false
            }
        }
    }
}

/// Merge-patch body for scaling: `{"spec": {"replicas": N}}` and nothing else
fn replica_patch(replicas: i32) -> serde_json::Value {
    serde_json::json!({ "spec": { "replicas": replicas } })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        deployment_json, error_json, list_json, namespace_json, pod_json, secret_json,
        service_json, status_json, MockService,
    };

    fn manager(mock: &MockService) -> ResourceManager {
        ResourceManager::from_client(mock.clone().into_client())
    }

    fn disconnected_manager() -> ResourceManager {
        ResourceManager { clients: None }
    }

    #[test]
    fn test_replica_patch_carries_only_replicas() {
        for replicas in [0, 1, 5, 2_000_000] {
            let patch = replica_patch(replicas);
            let top = patch.as_object().unwrap();
            assert_eq!(top.len(), 1);
            let spec = top.get("spec").unwrap().as_object().unwrap();
            assert_eq!(spec.len(), 1);
            assert_eq!(spec.get("replicas").unwrap(), replicas);
        }
    }

    #[tokio::test]
    async fn test_list_pods_defaults_to_default_namespace() {
        let mock = MockService::new().on_get(
            "/api/v1/namespaces/default/pods",
            200,
            &list_json("PodList", &[pod_json("p1", "default")]),
        );
        let manager = manager(&mock);

        let pods = manager.list_pods(None).await.unwrap();

        assert_eq!(pods.len(), 1);
        assert_eq!(pods[0].name_any(), "p1");
        assert_eq!(mock.requests()[0].path, "/api/v1/namespaces/default/pods");
    }

    #[tokio::test]
    async fn test_omitted_namespace_equals_explicit_default() {
        let mock = MockService::new().on_get(
            "/api/v1/namespaces/default/pods",
            200,
            &list_json("PodList", &[]),
        );
        let manager = manager(&mock);

        manager.list_pods(None).await.unwrap();
        manager.list_pods(Some("default")).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests[0].path, requests[1].path);
    }

    #[tokio::test]
    async fn test_get_pod_in_named_namespace() {
        let mock = MockService::new().on_get(
            "/api/v1/namespaces/ns/pods/p1",
            200,
            &pod_json("p1", "ns").to_string(),
        );
        let manager = manager(&mock);

        let pod = manager.get_pod("p1", Some("ns")).await.unwrap();

        assert_eq!(pod.name_any(), "p1");
        assert_eq!(pod.namespace().as_deref(), Some("ns"));
    }

    #[tokio::test]
    async fn test_delete_pod_then_get_fails() {
        let mock = MockService::new().on_delete(
            "/api/v1/namespaces/ns/pods/p1",
            200,
            &status_json().to_string(),
        );
        let manager = manager(&mock);

        manager.delete_pod("p1", Some("ns")).await.unwrap();

        // No GET response registered, the mock answers 404 like the cluster
        // would after the delete
        let err = manager.get_pod("p1", Some("ns")).await.unwrap_err();
        match err {
            StevedoreError::KubeError(kube::Error::Api(e)) => assert_eq!(e.code, 404),
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_on_empty_collection_returns_empty_vec() {
        let mock = MockService::new().on_get(
            "/api/v1/namespaces/default/services",
            200,
            &list_json("ServiceList", &[]),
        );
        let manager = manager(&mock);

        let services = manager.list_services(None).await.unwrap();

        assert!(services.is_empty());
    }

    #[tokio::test]
    async fn test_create_deployment_returns_canonical_manifest() {
        let mock = MockService::new().on_post(
            "/apis/apps/v1/namespaces/payments/deployments",
            201,
            &deployment_json("web", "payments", 3, "app:1.0").to_string(),
        );
        let manager = manager(&mock);

        let manifest: Deployment =
            serde_json::from_value(deployment_json("web", "payments", 3, "app:1.0")).unwrap();
        let created = manager
            .create_deployment(&manifest, Some("payments"))
            .await
            .unwrap();

        assert_eq!(created.name_any(), "web");
        assert_eq!(created.spec.as_ref().unwrap().replicas, Some(3));
    }

    #[tokio::test]
    async fn test_scale_deployment_sends_replicas_only_merge_patch() {
        let mock = MockService::new().on_patch(
            "/apis/apps/v1/namespaces/payments/deployments/web",
            200,
            &deployment_json("web", "payments", 5, "app:1.0").to_string(),
        );
        let manager = manager(&mock);

        let scaled = manager
            .scale_deployment("web", 5, Some("payments"))
            .await
            .unwrap();

        // The cluster reports the new replica count, other spec fields are
        // untouched
        let spec = scaled.spec.as_ref().unwrap();
        assert_eq!(spec.replicas, Some(5));
        assert_eq!(
            spec.template.spec.as_ref().unwrap().containers[0].image.as_deref(),
            Some("app:1.0")
        );

        // The outgoing patch carried nothing but the replica count
        let request = &mock.requests()[0];
        assert_eq!(request.method, "PATCH");
        assert_eq!(request.content_type, "application/merge-patch+json");
        let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body, serde_json::json!({"spec": {"replicas": 5}}));
    }

    #[tokio::test]
    async fn test_scale_to_zero_patch_body() {
        let mock = MockService::new().on_patch(
            "/apis/apps/v1/namespaces/default/deployments/web",
            200,
            &deployment_json("web", "default", 0, "app:1.0").to_string(),
        );
        let manager = manager(&mock);

        manager.scale_deployment("web", 0, None).await.unwrap();

        let body: serde_json::Value = serde_json::from_str(&mock.requests()[0].body).unwrap();
        assert_eq!(body, serde_json::json!({"spec": {"replicas": 0}}));
    }

    #[tokio::test]
    async fn test_replace_service() {
        let mock = MockService::new().on_put(
            "/api/v1/namespaces/default/services/api",
            200,
            &service_json("api", "default").to_string(),
        );
        let manager = manager(&mock);

        let manifest: Service =
            serde_json::from_value(service_json("api", "default")).unwrap();
        let replaced = manager.replace_service("api", &manifest, None).await.unwrap();

        assert_eq!(replaced.name_any(), "api");
        assert_eq!(mock.requests()[0].method, "PUT");
    }

    #[tokio::test]
    async fn test_list_ingresses_uses_networking_group() {
        let mock = MockService::new().on_get(
            "/apis/networking.k8s.io/v1/namespaces/default/ingresses",
            200,
            &list_json("IngressList", &[]),
        );
        let manager = manager(&mock);

        let ingresses = manager.list_ingresses(None).await.unwrap();

        assert!(ingresses.is_empty());
        assert_eq!(
            mock.requests()[0].path,
            "/apis/networking.k8s.io/v1/namespaces/default/ingresses"
        );
    }

    #[tokio::test]
    async fn test_create_secret() {
        let mock = MockService::new().on_post(
            "/api/v1/namespaces/vault/secrets",
            201,
            &secret_json("token", "vault").to_string(),
        );
        let manager = manager(&mock);

        let manifest: Secret = serde_json::from_value(secret_json("token", "vault")).unwrap();
        let created = manager.create_secret(&manifest, Some("vault")).await.unwrap();

        assert_eq!(created.name_any(), "token");
    }

    #[tokio::test]
    async fn test_upstream_error_propagates_with_cause() {
        let mock = MockService::new().on_get(
            "/api/v1/namespaces/default/secrets/locked",
            403,
            &error_json(403, "Forbidden", "secrets \"locked\" is forbidden").to_string(),
        );
        let manager = manager(&mock);

        let err = manager.get_secret("locked", None).await.unwrap_err();

        match err {
            StevedoreError::KubeError(kube::Error::Api(e)) => {
                assert_eq!(e.code, 403);
                assert_eq!(e.reason, "Forbidden");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_namespaces() {
        let mock = MockService::new().on_get(
            "/api/v1/namespaces",
            200,
            &list_json(
                "NamespaceList",
                &[namespace_json("default"), namespace_json("payments")],
            ),
        );
        let manager = manager(&mock);

        let namespaces = manager.list_namespaces().await.unwrap();

        assert_eq!(namespaces.len(), 2);
        assert_eq!(namespaces[1].name_any(), "payments");
    }

    #[tokio::test]
    async fn test_calls_fail_immediately_when_not_initialized() {
        let manager = disconnected_manager();

        let err = manager.get_pod("p1", None).await.unwrap_err();

        assert!(matches!(err, StevedoreError::NotConnected));
    }

    #[tokio::test]
    async fn test_is_connected_true_on_probe_success() {
        let mock = MockService::new().on_get(
            "/api/v1/namespaces",
            200,
            &list_json("NamespaceList", &[namespace_json("default")]),
        );
        let manager = manager(&mock);

        assert!(manager.is_connected().await);
    }

    #[tokio::test]
    async fn test_is_connected_false_on_server_error() {
        let mock = MockService::new().on_get(
            "/api/v1/namespaces",
            500,
            &error_json(500, "InternalError", "etcd unavailable").to_string(),
        );
        let manager = manager(&mock);

        assert!(!manager.is_connected().await);
    }

    #[tokio::test]
    async fn test_is_connected_false_when_not_initialized() {
        let manager = disconnected_manager();

        assert!(!manager.is_connected().await);
    }
}
