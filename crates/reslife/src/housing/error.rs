use super::domain::{Granularity, LeaseId, PropertyId, ResourceRef, Term, UserId};

/// Expected, caller-recoverable outcomes of engine operations.
///
/// Every variant maps to one error kind of the engine contract; the API
/// layer translates kinds into client-facing statuses and never sees
/// infrastructure failures through this enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HousingError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("property {property} leases {expected} space, reference addresses {found}")]
    GranularityMismatch {
        property: PropertyId,
        expected: Granularity,
        found: Granularity,
    },
    #[error("{resource} is already bound to a non-terminal lease")]
    ResourceUnavailable { resource: ResourceRef },
    #[error("lease {lease} is at its maximum occupancy of {max_occupancy}")]
    LeaseFull { lease: LeaseId, max_occupancy: u32 },
    #[error("user {user} already has an open application for term {term}")]
    DuplicateApplication { user: UserId, term: Term },
    #[error("user {user} is already an occupant on lease {lease}")]
    DuplicateOccupant { lease: LeaseId, user: UserId },
    #[error("user {user} already holds a non-terminal lease for term {term}")]
    DuplicateLease { user: UserId, term: Term },
    #[error("user {user} is not the lease holder of lease {lease}")]
    NotLeaseHolder { lease: LeaseId, user: UserId },
    #[error("lease {lease} already has an active lease holder")]
    InvalidRole { lease: LeaseId },
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
    #[error("cannot remove the sole lease holder of {lease} while other occupants remain")]
    CannotRemoveLastLeaseHolder { lease: LeaseId },
}

impl HousingError {
    /// Stable machine-readable kind, surfaced alongside the human message so
    /// the API layer can translate without string-sniffing.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::GranularityMismatch { .. } => "granularity_mismatch",
            Self::ResourceUnavailable { .. } => "resource_unavailable",
            Self::LeaseFull { .. } => "lease_full",
            Self::DuplicateApplication { .. } => "duplicate_application",
            Self::DuplicateOccupant { .. } => "duplicate_occupant",
            Self::DuplicateLease { .. } => "duplicate_lease",
            Self::NotLeaseHolder { .. } => "not_lease_holder",
            Self::InvalidRole { .. } => "invalid_role",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::CannotRemoveLastLeaseHolder { .. } => "cannot_remove_last_lease_holder",
        }
    }
}
