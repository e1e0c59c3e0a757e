//! Server-side apply of synthesized role resources

use futures::future::try_join_all;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, instrument};

use super::resources::RoleResources;
use crate::error::Result;

/// Field manager recorded on every applied object
pub const FIELD_MANAGER: &str = "coherence-operator";

/// Apply the resources of a role in dependency order
///
/// The fluentd ConfigMap and the headless Service go first because the
/// StatefulSet references both. Port Services are applied concurrently last.
#[instrument(skip(client, resources), fields(statefulset = %resources.stateful_set.name_any()))]
pub async fn apply_role_resources(
    client: &Client,
    namespace: &str,
    resources: &RoleResources,
) -> Result<()> {
    if let Some(config_map) = &resources.config_map {
        apply::<ConfigMap>(client, namespace, config_map).await?;
    }
    apply::<Service>(client, namespace, &resources.headless_service).await?;
    apply::<StatefulSet>(client, namespace, &resources.stateful_set).await?;

    try_join_all(
        resources
            .services
            .iter()
            .map(|service| apply::<Service>(client, namespace, service)),
    )
    .await?;

    info!(
        services = resources.services.len(),
        "Applied role resources"
    );
    Ok(())
}

async fn apply<K>(client: &Client, namespace: &str, object: &K) -> Result<()>
where
    K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>
        + Clone
        + std::fmt::Debug
        + Serialize
        + DeserializeOwned,
    <K as kube::Resource>::DynamicType: Default,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    let name = object.name_any();

    api.patch(
        &name,
        &PatchParams::apply(FIELD_MANAGER).force(),
        &Patch::Apply(object),
    )
    .await?;

    info!("Applied {} {}", K::kind(&Default::default()), name);
    Ok(())
}
