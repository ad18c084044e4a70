use std::sync::Arc;

use tracing::warn;

use super::domain::{
    Application, ApplicationId, Granularity, Lease, LeaseId, PropertyId, ResourceRef,
};
use super::error::HousingError;
use super::inventory::{self, AvailabilityFilter};
use super::notify::{HousingNotice, NotificationPublisher};
use super::store::HousingStore;

/// Facade composing the store and the notification hook.
///
/// All mutating operations run their read-check-write sequence inside a
/// single store transaction; notifications go out only after the commit.
pub struct HousingService<N> {
    store: Arc<HousingStore>,
    notifier: Arc<N>,
}

impl<N> HousingService<N>
where
    N: NotificationPublisher + 'static,
{
    pub fn new(store: Arc<HousingStore>, notifier: Arc<N>) -> Self {
        Self { store, notifier }
    }

    pub(crate) fn store_ref(&self) -> &HousingStore {
        &self.store
    }

    /// Fire-and-forget dispatch; a failed send is logged and dropped so it
    /// can never roll back the state change that triggered it.
    pub(crate) fn notify(&self, notice: HousingNotice) {
        let template = notice.template.clone();
        if let Err(err) = self.notifier.publish(notice) {
            warn!(%template, error = %err, "notification dropped");
        }
    }

    /// Fixed lease granularity of a property.
    pub fn resolve_granularity(
        &self,
        property_id: &PropertyId,
    ) -> Result<Granularity, HousingError> {
        self.store
            .read(|tables| inventory::resolve_granularity(tables, property_id))
    }

    /// Check a resource reference against a property's granularity without
    /// touching any lease state.
    pub fn validate_resource_ref(
        &self,
        property_id: &PropertyId,
        resource: &ResourceRef,
    ) -> Result<(), HousingError> {
        self.store.read(|tables| {
            inventory::validate_resource_ref(tables, property_id, resource).map(|_| ())
        })
    }

    /// Fetch an application by id.
    pub fn application(&self, id: &ApplicationId) -> Result<Application, HousingError> {
        self.store.read(|tables| tables.application(id).cloned())
    }

    /// Fetch a lease by id.
    pub fn lease(&self, id: &LeaseId) -> Result<Lease, HousingError> {
        self.store.read(|tables| tables.lease(id).cloned())
    }

    /// Resources of the property with no overlapping non-terminal lease,
    /// deterministically ordered. Read-only snapshot; allocation re-checks
    /// inside its own transaction.
    pub fn availability(
        &self,
        property_id: &PropertyId,
        filter: &AvailabilityFilter,
    ) -> Result<Vec<ResourceRef>, HousingError> {
        self.store
            .read(|tables| inventory::available_resources(tables, property_id, filter))
    }
}
