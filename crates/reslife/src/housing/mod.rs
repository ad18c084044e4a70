//! Housing allocation and lease lifecycle engine.
//!
//! The inventory hierarchy (Property → Unit → Room → Bed), the availability
//! query, and the Application/Lease/Occupant state machines live here. All
//! mutating operations run inside a single store transaction so the
//! no-double-booking and capacity invariants hold under concurrent callers.

pub mod applications;
pub mod domain;
pub mod error;
pub(crate) mod inventory;
pub mod leases;
pub mod notify;
pub mod occupancy;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    Application, ApplicationId, ApplicationStatus, Bed, BedId, Granularity, Lease, LeaseId,
    LeaseStatus, Occupant, OccupantId, OccupantRole, Property, PropertyId, PropertyType,
    ResourceRef, Room, RoomId, Term, Unit, UnitId, UserId,
};
pub use error::HousingError;
pub use inventory::AvailabilityFilter;
pub use notify::{HousingNotice, NotificationError, NotificationPublisher};
pub use router::{housing_router, ApplicationView, AvailabilityView, LeaseView, OccupantView};
pub use service::HousingService;
pub use store::{HousingStore, ProvisionError};
