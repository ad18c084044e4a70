//! Lease allocation and lifecycle: binding an approved application to one
//! resource, signature collection, and staff-driven status moves.

use chrono::NaiveDate;

use super::domain::{
    ApplicationId, ApplicationStatus, Lease, LeaseId, LeaseStatus, Occupant, OccupantRole,
    ResourceRef, UserId,
};
use super::error::HousingError;
use super::inventory;
use super::notify::{HousingNotice, NotificationPublisher};
use super::service::HousingService;

impl<N> HousingService<N>
where
    N: NotificationPublisher + 'static,
{
    /// Staff operation binding an approved application to a concrete
    /// resource. Granularity validation, the availability re-check, the
    /// lease insert, and the lease-holder roster row are one indivisible
    /// transaction: of two racing calls for the same resource exactly one
    /// succeeds, the other observes `ResourceUnavailable`.
    pub fn allocate(
        &self,
        application_id: &ApplicationId,
        resource: ResourceRef,
        start_date: NaiveDate,
        end_date: NaiveDate,
        total_due: u32,
        due_this_month: u32,
    ) -> Result<Lease, HousingError> {
        let lease_id = self.store_ref().next_lease_id();
        let occupant_id = self.store_ref().next_occupant_id();
        let lease = self.store_ref().write(|tables| {
            let application = tables.application(application_id)?.clone();
            if application.is_invitation() || application.status != ApplicationStatus::Approved {
                return Err(HousingError::InvalidTransition {
                    from: application.status.label(),
                    to: LeaseStatus::PendingSignature.label(),
                });
            }
            if tables
                .leases
                .values()
                .any(|lease| lease.application_id == *application_id)
            {
                return Err(HousingError::DuplicateLease {
                    user: application.user_id.clone(),
                    term: application.term.clone(),
                });
            }
            // One non-terminal lease per holder and term.
            if tables.leases.values().any(|lease| {
                lease.lease_holder_user_id == application.user_id
                    && lease.term == application.term
                    && !lease.status.is_terminal()
            }) {
                return Err(HousingError::DuplicateLease {
                    user: application.user_id.clone(),
                    term: application.term.clone(),
                });
            }

            let context = inventory::resource_context(tables, &resource)?;
            if context.property.granularity != resource.granularity() {
                return Err(HousingError::GranularityMismatch {
                    property: context.property.id.clone(),
                    expected: context.property.granularity,
                    found: resource.granularity(),
                });
            }
            if !inventory::is_resource_free(tables, &resource) {
                return Err(HousingError::ResourceUnavailable { resource });
            }

            let lease = Lease {
                id: lease_id.clone(),
                application_id: application_id.clone(),
                lease_holder_user_id: application.user_id.clone(),
                property_id: context.property.id.clone(),
                term: application.term.clone(),
                granularity: resource.granularity(),
                resource,
                start_date,
                end_date,
                status: LeaseStatus::PendingSignature,
                signed_on: None,
                total_due,
                due_this_month,
            };
            let holder = Occupant {
                id: occupant_id.clone(),
                lease_id: lease.id.clone(),
                user_id: application.user_id.clone(),
                role: OccupantRole::LeaseHolder,
                move_in_date: start_date,
                move_out_date: None,
            };
            tables.leases.insert(lease.id.clone(), lease.clone());
            tables.occupants.insert(holder.id.clone(), holder);
            Ok(lease)
        })?;

        self.notify(
            HousingNotice::new("lease_ready_for_signature", lease.lease_holder_user_id.clone())
                .detail("lease_id", lease.id.0.clone())
                .detail("resource", lease.resource.to_string()),
        );
        Ok(lease)
    }

    /// Lease-holder signature; permitted only while the offer is pending.
    pub fn sign(
        &self,
        lease_id: &LeaseId,
        user_id: &UserId,
        signed_on: NaiveDate,
    ) -> Result<Lease, HousingError> {
        self.store_ref().write(|tables| {
            let lease = tables.lease(lease_id)?;
            if lease.lease_holder_user_id != *user_id {
                return Err(HousingError::NotLeaseHolder {
                    lease: lease_id.clone(),
                    user: user_id.clone(),
                });
            }
            if lease.status != LeaseStatus::PendingSignature {
                return Err(HousingError::InvalidTransition {
                    from: lease.status.label(),
                    to: LeaseStatus::Signed.label(),
                });
            }
            let lease = tables.lease_mut(lease_id)?;
            lease.status = LeaseStatus::Signed;
            lease.signed_on = Some(signed_on);
            Ok(lease.clone())
        })
    }

    /// Staff lifecycle move. Entering Completed or Terminated closes the
    /// active roster (stamping `move_out_date = effective_on`) and releases
    /// the resource; occupant history rows are kept.
    pub fn set_lease_status(
        &self,
        lease_id: &LeaseId,
        new_status: LeaseStatus,
        effective_on: NaiveDate,
    ) -> Result<Lease, HousingError> {
        self.store_ref().write(|tables| {
            let lease = tables.lease(lease_id)?;
            if !lease.status.staff_may_transition(new_status) {
                return Err(HousingError::InvalidTransition {
                    from: lease.status.label(),
                    to: new_status.label(),
                });
            }

            if new_status.is_terminal() {
                let closing: Vec<_> = tables
                    .occupants_of(lease_id)
                    .filter(|occupant| occupant.is_active())
                    .map(|occupant| occupant.id.clone())
                    .collect();
                for occupant_id in closing {
                    let occupant = tables.occupant_mut(&occupant_id)?;
                    occupant.move_out_date = Some(effective_on);
                }
            }

            let lease = tables.lease_mut(lease_id)?;
            lease.status = new_status;
            Ok(lease.clone())
        })
    }
}
