//! Occupant roster maintenance under the capacity, uniqueness, and
//! single-lease-holder invariants.

use chrono::NaiveDate;

use super::domain::{LeaseId, LeaseStatus, Occupant, OccupantId, OccupantRole, UserId};
use super::error::HousingError;
use super::inventory;
use super::notify::NotificationPublisher;
use super::service::HousingService;

impl<N> HousingService<N>
where
    N: NotificationPublisher + 'static,
{
    /// Staff-only direct roster addition, bypassing the invitation protocol
    /// (used for corrections).
    pub fn add_occupant(
        &self,
        lease_id: &LeaseId,
        user_id: UserId,
        role: OccupantRole,
        move_in_date: NaiveDate,
    ) -> Result<Occupant, HousingError> {
        let occupant_id = self.store_ref().next_occupant_id();
        self.store_ref().write(|tables| {
            let lease = tables.lease(lease_id)?.clone();
            if lease.status.is_terminal() {
                return Err(HousingError::InvalidTransition {
                    from: lease.status.label(),
                    to: LeaseStatus::Active.label(),
                });
            }
            let unit = inventory::resource_context(tables, &lease.resource)?.unit;
            if tables.active_occupant_count(lease_id) >= unit.max_occupancy {
                return Err(HousingError::LeaseFull {
                    lease: lease_id.clone(),
                    max_occupancy: unit.max_occupancy,
                });
            }
            if tables
                .occupants_of(lease_id)
                .any(|occupant| occupant.is_active() && occupant.user_id == user_id)
            {
                return Err(HousingError::DuplicateOccupant {
                    lease: lease_id.clone(),
                    user: user_id.clone(),
                });
            }
            if role == OccupantRole::LeaseHolder
                && tables
                    .occupants_of(lease_id)
                    .any(|occupant| occupant.is_active() && occupant.role == OccupantRole::LeaseHolder)
            {
                return Err(HousingError::InvalidRole {
                    lease: lease_id.clone(),
                });
            }

            let occupant = Occupant {
                id: occupant_id.clone(),
                lease_id: lease_id.clone(),
                user_id: user_id.clone(),
                role,
                move_in_date,
                move_out_date: None,
            };
            tables.occupants.insert(occupant.id.clone(), occupant.clone());
            Ok(occupant)
        })
    }

    /// Soft removal: stamps `move_out_date` and keeps the row for history.
    /// The sole active lease holder cannot leave while other occupants
    /// remain on the roster.
    pub fn remove_occupant(
        &self,
        occupant_id: &OccupantId,
        move_out_date: NaiveDate,
    ) -> Result<Occupant, HousingError> {
        self.store_ref().write(|tables| {
            let occupant = tables
                .occupants
                .get(occupant_id)
                .ok_or_else(|| HousingError::NotFound {
                    entity: "occupant",
                    id: occupant_id.0.clone(),
                })?
                .clone();
            if !occupant.is_active() {
                return Err(HousingError::InvalidTransition {
                    from: "moved_out",
                    to: "moved_out",
                });
            }

            if occupant.role == OccupantRole::LeaseHolder {
                let others_remain = tables.occupants_of(&occupant.lease_id).any(|other| {
                    other.id != occupant.id && other.is_active()
                });
                let sole_holder = !tables.occupants_of(&occupant.lease_id).any(|other| {
                    other.id != occupant.id
                        && other.is_active()
                        && other.role == OccupantRole::LeaseHolder
                });
                if sole_holder && others_remain {
                    return Err(HousingError::CannotRemoveLastLeaseHolder {
                        lease: occupant.lease_id.clone(),
                    });
                }
            }

            let occupant = tables.occupant_mut(occupant_id)?;
            occupant.move_out_date = Some(move_out_date);
            Ok(occupant.clone())
        })
    }

    /// Roster of a lease, lease holder first, then by move-in date.
    /// Moved-out rows are included; history is never dropped.
    pub fn list_occupants(&self, lease_id: &LeaseId) -> Result<Vec<Occupant>, HousingError> {
        self.store_ref().read(|tables| {
            tables.lease(lease_id)?;
            let mut roster: Vec<Occupant> = tables.occupants_of(lease_id).cloned().collect();
            roster.sort_by(|a, b| {
                a.role
                    .rank()
                    .cmp(&b.role.rank())
                    .then(a.move_in_date.cmp(&b.move_in_date))
                    .then(a.id.cmp(&b.id))
            });
            Ok(roster)
        })
    }
}
