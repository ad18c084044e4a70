use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($($(#[$doc:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
            pub struct $name(pub String);

            impl $name {
                pub fn new(value: impl Into<String>) -> Self {
                    Self(value.into())
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )+
    };
}

string_id! {
    /// Identifier for a property (residence hall or apartment building).
    PropertyId,
    /// Identifier for a leasable or structural unit within a property.
    UnitId,
    /// Identifier for a room within a unit.
    RoomId,
    /// Identifier for a bed within a room.
    BedId,
    /// Authenticated user identity supplied by the session layer.
    UserId,
    /// Identifier wrapper for housing applications.
    ApplicationId,
    /// Identifier wrapper for leases.
    LeaseId,
    /// Identifier wrapper for occupant roster rows.
    OccupantId,
    /// Academic term an application or lease belongs to (e.g. `2026-FALL`).
    Term,
}

/// Kind of property offered to students.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    ResidenceHall,
    Apartment,
}

impl PropertyType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ResidenceHall => "residence_hall",
            Self::Apartment => "apartment",
        }
    }
}

/// Level at which a property leases space. Fixed per property, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    ByUnit,
    ByRoom,
    ByBed,
}

impl Granularity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ByUnit => "by_unit",
            Self::ByRoom => "by_room",
            Self::ByBed => "by_bed",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reference to the single resource a lease binds, tagged by level.
///
/// Replaces the three-nullable-columns encoding: exactly one level is ever
/// addressed, and it must match the owning property's granularity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceRef {
    Unit(UnitId),
    Room(RoomId),
    Bed(BedId),
}

impl ResourceRef {
    /// The granularity level this reference addresses.
    pub const fn granularity(&self) -> Granularity {
        match self {
            Self::Unit(_) => Granularity::ByUnit,
            Self::Room(_) => Granularity::ByRoom,
            Self::Bed(_) => Granularity::ByBed,
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit(id) => write!(f, "unit {id}"),
            Self::Room(id) => write!(f, "room {id}"),
            Self::Bed(id) => write!(f, "bed {id}"),
        }
    }
}

/// Structural root of the inventory hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub name: String,
    pub property_type: PropertyType,
    pub granularity: Granularity,
}

/// Occupancy container under a property; the leasable resource for
/// by-unit properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub property_id: PropertyId,
    pub unit_number: String,
    pub max_occupancy: u32,
    pub requires_ada_access: bool,
}

/// Room under a unit; exists only for by-room and by-bed properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub unit_id: UnitId,
    pub room_label: String,
}

/// Bed under a room; exists only for by-bed properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bed {
    pub id: BedId,
    pub room_id: RoomId,
    pub bed_label: String,
}

/// Lifecycle status of a housing application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Approved and Rejected admit no further transitions.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Whether the state machine permits moving to `to`. Staff may jump any
    /// non-terminal state straight to Approved or Rejected; UnderReview is
    /// optional.
    pub fn may_transition(self, to: Self) -> bool {
        if self.is_terminal() || to == self {
            return false;
        }
        match to {
            Self::Approved | Self::Rejected => true,
            Self::Submitted => self == Self::Draft,
            Self::UnderReview => self == Self::Submitted,
            Self::Draft => false,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A student's request for housing, or a pending roommate invitation when
/// `invite_lease_id` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub term: Term,
    pub status: ApplicationStatus,
    pub preferred_property_id: Option<PropertyId>,
    pub invite_lease_id: Option<LeaseId>,
}

impl Application {
    pub fn is_invitation(&self) -> bool {
        self.invite_lease_id.is_some()
    }
}

/// Lifecycle status of a lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseStatus {
    Draft,
    PendingSignature,
    Signed,
    Active,
    Completed,
    Terminated,
}

impl LeaseStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingSignature => "pending_signature",
            Self::Signed => "signed",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Terminated => "terminated",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Terminated)
    }

    /// Whether a lease in this status keeps its resource off the market.
    pub const fn encumbers(self) -> bool {
        matches!(self, Self::PendingSignature | Self::Signed | Self::Active)
    }

    /// Transitions staff may perform through `set_lease_status`. Signature
    /// collection goes through `sign`, never through here; Completed is
    /// terminal and never re-opens.
    pub fn staff_may_transition(self, to: Self) -> bool {
        match (self, to) {
            (Self::Draft, Self::PendingSignature) => true,
            (Self::Signed, Self::Active) => true,
            (Self::Active, Self::Completed) => true,
            (from, Self::Terminated) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for LeaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Contract binding one student to exactly one resource for a term.
///
/// `total_due` and `due_this_month` are plain read fields for the payment
/// module; this engine performs no balance arithmetic on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub id: LeaseId,
    pub application_id: ApplicationId,
    pub lease_holder_user_id: UserId,
    pub property_id: PropertyId,
    pub term: Term,
    pub granularity: Granularity,
    pub resource: ResourceRef,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: LeaseStatus,
    pub signed_on: Option<NaiveDate>,
    pub total_due: u32,
    pub due_this_month: u32,
}

/// Role an occupant plays on a lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupantRole {
    LeaseHolder,
    Roommate,
    Occupant,
}

impl OccupantRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::LeaseHolder => "lease_holder",
            Self::Roommate => "roommate",
            Self::Occupant => "occupant",
        }
    }

    /// Sort rank for roster listings: lease holder first.
    pub(crate) const fn rank(self) -> u8 {
        match self {
            Self::LeaseHolder => 0,
            Self::Roommate => 1,
            Self::Occupant => 2,
        }
    }
}

impl fmt::Display for OccupantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One user assigned to a lease. Rows are never hard-deleted; moving out
/// stamps `move_out_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub id: OccupantId,
    pub lease_id: LeaseId,
    pub user_id: UserId,
    pub role: OccupantRole,
    pub move_in_date: NaiveDate,
    pub move_out_date: Option<NaiveDate>,
}

impl Occupant {
    /// Occupants count against capacity and uniqueness only while they have
    /// not moved out.
    pub fn is_active(&self) -> bool {
        self.move_out_date.is_none()
    }
}
