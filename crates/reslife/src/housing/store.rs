use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::domain::{
    Application, ApplicationId, Bed, BedId, Granularity, Lease, LeaseId, Occupant, OccupantId,
    Property, PropertyId, Room, RoomId, Unit, UnitId,
};
use super::error::HousingError;

/// Failures raised by the structural provisioning surface. Structural rows
/// come from admin tooling outside this engine; these checks keep the
/// hierarchy shape contract honest at the boundary.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("property {0} is not registered")]
    UnknownProperty(PropertyId),
    #[error("unit {0} is not registered")]
    UnknownUnit(UnitId),
    #[error("room {0} is not registered")]
    UnknownRoom(RoomId),
    #[error("{entity} {id} is already registered")]
    DuplicateId { entity: &'static str, id: String },
    #[error("property {property} leases {granularity} space and cannot contain {entity} rows")]
    StructureViolation {
        property: PropertyId,
        granularity: Granularity,
        entity: &'static str,
    },
}

/// All entity tables. Keyed with `BTreeMap` so iteration order is stable,
/// which keeps queries and demos deterministic.
#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) properties: BTreeMap<PropertyId, Property>,
    pub(crate) units: BTreeMap<UnitId, Unit>,
    pub(crate) rooms: BTreeMap<RoomId, Room>,
    pub(crate) beds: BTreeMap<BedId, Bed>,
    pub(crate) applications: BTreeMap<ApplicationId, Application>,
    pub(crate) leases: BTreeMap<LeaseId, Lease>,
    pub(crate) occupants: BTreeMap<OccupantId, Occupant>,
}

impl Tables {
    pub(crate) fn property(&self, id: &PropertyId) -> Result<&Property, HousingError> {
        self.properties.get(id).ok_or_else(|| HousingError::NotFound {
            entity: "property",
            id: id.0.clone(),
        })
    }

    pub(crate) fn unit(&self, id: &UnitId) -> Result<&Unit, HousingError> {
        self.units.get(id).ok_or_else(|| HousingError::NotFound {
            entity: "unit",
            id: id.0.clone(),
        })
    }

    pub(crate) fn room(&self, id: &RoomId) -> Result<&Room, HousingError> {
        self.rooms.get(id).ok_or_else(|| HousingError::NotFound {
            entity: "room",
            id: id.0.clone(),
        })
    }

    pub(crate) fn bed(&self, id: &BedId) -> Result<&Bed, HousingError> {
        self.beds.get(id).ok_or_else(|| HousingError::NotFound {
            entity: "bed",
            id: id.0.clone(),
        })
    }

    pub(crate) fn application(&self, id: &ApplicationId) -> Result<&Application, HousingError> {
        self.applications
            .get(id)
            .ok_or_else(|| HousingError::NotFound {
                entity: "application",
                id: id.0.clone(),
            })
    }

    pub(crate) fn application_mut(
        &mut self,
        id: &ApplicationId,
    ) -> Result<&mut Application, HousingError> {
        self.applications
            .get_mut(id)
            .ok_or_else(|| HousingError::NotFound {
                entity: "application",
                id: id.0.clone(),
            })
    }

    pub(crate) fn lease(&self, id: &LeaseId) -> Result<&Lease, HousingError> {
        self.leases.get(id).ok_or_else(|| HousingError::NotFound {
            entity: "lease",
            id: id.0.clone(),
        })
    }

    pub(crate) fn lease_mut(&mut self, id: &LeaseId) -> Result<&mut Lease, HousingError> {
        self.leases
            .get_mut(id)
            .ok_or_else(|| HousingError::NotFound {
                entity: "lease",
                id: id.0.clone(),
            })
    }

    pub(crate) fn occupant_mut(&mut self, id: &OccupantId) -> Result<&mut Occupant, HousingError> {
        self.occupants
            .get_mut(id)
            .ok_or_else(|| HousingError::NotFound {
                entity: "occupant",
                id: id.0.clone(),
            })
    }

    pub(crate) fn occupants_of<'a>(
        &'a self,
        lease_id: &'a LeaseId,
    ) -> impl Iterator<Item = &'a Occupant> + 'a {
        self.occupants
            .values()
            .filter(move |occupant| occupant.lease_id == *lease_id)
    }

    pub(crate) fn active_occupant_count(&self, lease_id: &LeaseId) -> u32 {
        self.occupants_of(lease_id)
            .filter(|occupant| occupant.is_active())
            .count() as u32
    }
}

/// Authoritative state for the engine.
///
/// A single mutex guards every table, so each `write` closure is a
/// serializable transaction: the read-check-write sequences of allocation,
/// invitation acceptance, and roster changes are atomic with respect to each
/// other. A caller that abandons an operation either committed the whole
/// closure or none of it, because the critical section is synchronous.
///
/// Closures passed to `write` must perform every check before the first
/// mutation; an `Err` return does not restore earlier writes.
#[derive(Debug, Default)]
pub struct HousingStore {
    tables: Mutex<Tables>,
    application_seq: AtomicU64,
    lease_seq: AtomicU64,
    occupant_seq: AtomicU64,
}

impl HousingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        let tables = self.tables.lock().expect("housing store mutex poisoned");
        f(&tables)
    }

    pub(crate) fn write<T>(
        &self,
        f: impl FnOnce(&mut Tables) -> Result<T, HousingError>,
    ) -> Result<T, HousingError> {
        let mut tables = self.tables.lock().expect("housing store mutex poisoned");
        f(&mut tables)
    }

    pub(crate) fn next_application_id(&self) -> ApplicationId {
        let id = self.application_seq.fetch_add(1, Ordering::Relaxed) + 1;
        ApplicationId(format!("app-{id:06}"))
    }

    pub(crate) fn next_lease_id(&self) -> LeaseId {
        let id = self.lease_seq.fetch_add(1, Ordering::Relaxed) + 1;
        LeaseId(format!("lease-{id:06}"))
    }

    pub(crate) fn next_occupant_id(&self) -> OccupantId {
        let id = self.occupant_seq.fetch_add(1, Ordering::Relaxed) + 1;
        OccupantId(format!("occ-{id:06}"))
    }

    /// Register a property. Structural rows are immutable once registered.
    pub fn register_property(&self, property: Property) -> Result<(), ProvisionError> {
        let mut tables = self.tables.lock().expect("housing store mutex poisoned");
        if tables.properties.contains_key(&property.id) {
            return Err(ProvisionError::DuplicateId {
                entity: "property",
                id: property.id.0.clone(),
            });
        }
        tables.properties.insert(property.id.clone(), property);
        Ok(())
    }

    pub fn register_unit(&self, unit: Unit) -> Result<(), ProvisionError> {
        let mut tables = self.tables.lock().expect("housing store mutex poisoned");
        if !tables.properties.contains_key(&unit.property_id) {
            return Err(ProvisionError::UnknownProperty(unit.property_id.clone()));
        }
        if tables.units.contains_key(&unit.id) {
            return Err(ProvisionError::DuplicateId {
                entity: "unit",
                id: unit.id.0.clone(),
            });
        }
        tables.units.insert(unit.id.clone(), unit);
        Ok(())
    }

    /// Register a room. Rooms exist only under by-room and by-bed properties.
    pub fn register_room(&self, room: Room) -> Result<(), ProvisionError> {
        let mut tables = self.tables.lock().expect("housing store mutex poisoned");
        let unit = tables
            .units
            .get(&room.unit_id)
            .ok_or_else(|| ProvisionError::UnknownUnit(room.unit_id.clone()))?;
        let property = tables
            .properties
            .get(&unit.property_id)
            .ok_or_else(|| ProvisionError::UnknownProperty(unit.property_id.clone()))?;
        if property.granularity == Granularity::ByUnit {
            return Err(ProvisionError::StructureViolation {
                property: property.id.clone(),
                granularity: property.granularity,
                entity: "room",
            });
        }
        if tables.rooms.contains_key(&room.id) {
            return Err(ProvisionError::DuplicateId {
                entity: "room",
                id: room.id.0.clone(),
            });
        }
        tables.rooms.insert(room.id.clone(), room);
        Ok(())
    }

    /// Register a bed. Beds exist only under by-bed properties.
    pub fn register_bed(&self, bed: Bed) -> Result<(), ProvisionError> {
        let mut tables = self.tables.lock().expect("housing store mutex poisoned");
        let room = tables
            .rooms
            .get(&bed.room_id)
            .ok_or_else(|| ProvisionError::UnknownRoom(bed.room_id.clone()))?;
        let unit = tables
            .units
            .get(&room.unit_id)
            .ok_or_else(|| ProvisionError::UnknownUnit(room.unit_id.clone()))?;
        let property = tables
            .properties
            .get(&unit.property_id)
            .ok_or_else(|| ProvisionError::UnknownProperty(unit.property_id.clone()))?;
        if property.granularity != Granularity::ByBed {
            return Err(ProvisionError::StructureViolation {
                property: property.id.clone(),
                granularity: property.granularity,
                entity: "bed",
            });
        }
        if tables.beds.contains_key(&bed.id) {
            return Err(ProvisionError::DuplicateId {
                entity: "bed",
                id: bed.id.0.clone(),
            });
        }
        tables.beds.insert(bed.id.clone(), bed);
        Ok(())
    }
}
