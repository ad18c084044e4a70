//! Inventory hierarchy queries: granularity resolution, resource-reference
//! validation, and the availability computation allocation re-runs inside
//! its own transaction.

use serde::{Deserialize, Serialize};

use super::domain::{Granularity, Property, PropertyId, ResourceRef, Unit, UnitId};
use super::error::HousingError;
use super::store::Tables;

/// Owning property and occupancy-container unit of a resource reference.
#[derive(Debug, Clone)]
pub(crate) struct ResourceContext {
    pub(crate) property: Property,
    pub(crate) unit: Unit,
}

/// Optional narrowing of an availability query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityFilter {
    /// Restrict to resources under one unit.
    pub unit_id: Option<UnitId>,
    /// Restrict to ADA-accessible units.
    #[serde(default)]
    pub ada_only: bool,
}

pub(crate) fn resolve_granularity(
    tables: &Tables,
    property_id: &PropertyId,
) -> Result<Granularity, HousingError> {
    Ok(tables.property(property_id)?.granularity)
}

/// Resolve the owning unit and property of a reference, walking
/// bed -> room -> unit -> property. Fails with `NotFound` when any link in
/// the chain is missing.
pub(crate) fn resource_context(
    tables: &Tables,
    resource: &ResourceRef,
) -> Result<ResourceContext, HousingError> {
    let unit = match resource {
        ResourceRef::Unit(unit_id) => tables.unit(unit_id)?.clone(),
        ResourceRef::Room(room_id) => {
            let room = tables.room(room_id)?;
            tables.unit(&room.unit_id)?.clone()
        }
        ResourceRef::Bed(bed_id) => {
            let bed = tables.bed(bed_id)?;
            let room = tables.room(&bed.room_id)?;
            tables.unit(&room.unit_id)?.clone()
        }
    };
    let property = tables.property(&unit.property_id)?.clone();
    Ok(ResourceContext { property, unit })
}

/// Check a reference against a property's declared granularity and ownership.
///
/// A reference addressing the wrong level is `GranularityMismatch`; one
/// addressing a resource of a different property is `NotFound` from this
/// property's point of view.
pub(crate) fn validate_resource_ref(
    tables: &Tables,
    property_id: &PropertyId,
    resource: &ResourceRef,
) -> Result<ResourceContext, HousingError> {
    let property = tables.property(property_id)?;
    if property.granularity != resource.granularity() {
        return Err(HousingError::GranularityMismatch {
            property: property.id.clone(),
            expected: property.granularity,
            found: resource.granularity(),
        });
    }
    let context = resource_context(tables, resource)?;
    if context.property.id != *property_id {
        return Err(HousingError::NotFound {
            entity: "resource",
            id: resource.to_string(),
        });
    }
    Ok(context)
}

/// Whether no lease in an encumbering status references the resource.
pub(crate) fn is_resource_free(tables: &Tables, resource: &ResourceRef) -> bool {
    !tables
        .leases
        .values()
        .any(|lease| lease.status.encumbers() && lease.resource == *resource)
}

/// Enumerate unencumbered resources at the property's granularity.
///
/// Ordering is deterministic — unit number, then room label, then bed
/// label — so repeated queries paginate stably.
pub(crate) fn available_resources(
    tables: &Tables,
    property_id: &PropertyId,
    filter: &AvailabilityFilter,
) -> Result<Vec<ResourceRef>, HousingError> {
    let property = tables.property(property_id)?;
    if let Some(unit_id) = &filter.unit_id {
        let unit = tables.unit(unit_id)?;
        if unit.property_id != *property_id {
            return Err(HousingError::NotFound {
                entity: "unit",
                id: unit_id.0.clone(),
            });
        }
    }

    let mut units: Vec<&Unit> = tables
        .units
        .values()
        .filter(|unit| unit.property_id == *property_id)
        .filter(|unit| filter.unit_id.as_ref().map_or(true, |id| unit.id == *id))
        .filter(|unit| !filter.ada_only || unit.requires_ada_access)
        .collect();
    units.sort_by(|a, b| a.unit_number.cmp(&b.unit_number).then(a.id.cmp(&b.id)));

    let mut resources = Vec::new();
    match property.granularity {
        Granularity::ByUnit => {
            for unit in units {
                resources.push(ResourceRef::Unit(unit.id.clone()));
            }
        }
        Granularity::ByRoom => {
            for unit in units {
                let mut rooms: Vec<_> = tables
                    .rooms
                    .values()
                    .filter(|room| room.unit_id == unit.id)
                    .collect();
                rooms.sort_by(|a, b| a.room_label.cmp(&b.room_label).then(a.id.cmp(&b.id)));
                for room in rooms {
                    resources.push(ResourceRef::Room(room.id.clone()));
                }
            }
        }
        Granularity::ByBed => {
            for unit in units {
                let mut rooms: Vec<_> = tables
                    .rooms
                    .values()
                    .filter(|room| room.unit_id == unit.id)
                    .collect();
                rooms.sort_by(|a, b| a.room_label.cmp(&b.room_label).then(a.id.cmp(&b.id)));
                for room in rooms {
                    let mut beds: Vec<_> = tables
                        .beds
                        .values()
                        .filter(|bed| bed.room_id == room.id)
                        .collect();
                    beds.sort_by(|a, b| a.bed_label.cmp(&b.bed_label).then(a.id.cmp(&b.id)));
                    for bed in beds {
                        resources.push(ResourceRef::Bed(bed.id.clone()));
                    }
                }
            }
        }
    }

    resources.retain(|resource| is_resource_free(tables, resource));
    Ok(resources)
}
