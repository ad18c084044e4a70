use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::housing::domain::{
    Application, ApplicationStatus, Bed, BedId, Granularity, Lease, Property, PropertyId,
    PropertyType, ResourceRef, Room, RoomId, Term, Unit, UnitId, UserId,
};
use crate::housing::notify::{HousingNotice, NotificationError, NotificationPublisher};
use crate::housing::service::HousingService;
use crate::housing::store::HousingStore;

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    events: Arc<Mutex<Vec<HousingNotice>>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<HousingNotice> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifier {
    fn publish(&self, notice: HousingNotice) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

/// Notifier whose transport always fails, for fire-and-forget coverage.
pub(super) struct FailingNotifier;

impl NotificationPublisher for FailingNotifier {
    fn publish(&self, _notice: HousingNotice) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp offline".to_string()))
    }
}

pub(super) fn build_service() -> (
    HousingService<MemoryNotifier>,
    Arc<HousingStore>,
    Arc<MemoryNotifier>,
) {
    let store = Arc::new(HousingStore::new());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = HousingService::new(store.clone(), notifier.clone());
    (service, store, notifier)
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn fall_term() -> Term {
    Term::new("2026-FALL")
}

pub(super) fn user(name: &str) -> UserId {
    UserId::new(name)
}

/// By-bed residence hall: unit 101 (cap 4) with room A holding two beds,
/// unit 102 (cap 2, ADA) with room A holding one bed.
pub(super) fn seed_by_bed(store: &HousingStore) -> PropertyId {
    let property_id = PropertyId::new("prop-birch");
    store
        .register_property(Property {
            id: property_id.clone(),
            name: "Birch Hall".to_string(),
            property_type: PropertyType::ResidenceHall,
            granularity: Granularity::ByBed,
        })
        .expect("property registers");
    store
        .register_unit(Unit {
            id: UnitId::new("unit-101"),
            property_id: property_id.clone(),
            unit_number: "101".to_string(),
            max_occupancy: 4,
            requires_ada_access: false,
        })
        .expect("unit registers");
    store
        .register_unit(Unit {
            id: UnitId::new("unit-102"),
            property_id: property_id.clone(),
            unit_number: "102".to_string(),
            max_occupancy: 2,
            requires_ada_access: true,
        })
        .expect("unit registers");
    store
        .register_room(Room {
            id: RoomId::new("room-101a"),
            unit_id: UnitId::new("unit-101"),
            room_label: "A".to_string(),
        })
        .expect("room registers");
    store
        .register_room(Room {
            id: RoomId::new("room-102a"),
            unit_id: UnitId::new("unit-102"),
            room_label: "A".to_string(),
        })
        .expect("room registers");
    store
        .register_bed(Bed {
            id: BedId::new("bed-101a-1"),
            room_id: RoomId::new("room-101a"),
            bed_label: "1".to_string(),
        })
        .expect("bed registers");
    store
        .register_bed(Bed {
            id: BedId::new("bed-101a-2"),
            room_id: RoomId::new("room-101a"),
            bed_label: "2".to_string(),
        })
        .expect("bed registers");
    store
        .register_bed(Bed {
            id: BedId::new("bed-102a-1"),
            room_id: RoomId::new("room-102a"),
            bed_label: "1".to_string(),
        })
        .expect("bed registers");
    property_id
}

/// By-room property: unit 201 (cap 4) with rooms A and B.
pub(super) fn seed_by_room(store: &HousingStore) -> PropertyId {
    let property_id = PropertyId::new("prop-cedar");
    store
        .register_property(Property {
            id: property_id.clone(),
            name: "Cedar Court".to_string(),
            property_type: PropertyType::Apartment,
            granularity: Granularity::ByRoom,
        })
        .expect("property registers");
    store
        .register_unit(Unit {
            id: UnitId::new("unit-201"),
            property_id: property_id.clone(),
            unit_number: "201".to_string(),
            max_occupancy: 4,
            requires_ada_access: false,
        })
        .expect("unit registers");
    store
        .register_room(Room {
            id: RoomId::new("room-201a"),
            unit_id: UnitId::new("unit-201"),
            room_label: "A".to_string(),
        })
        .expect("room registers");
    store
        .register_room(Room {
            id: RoomId::new("room-201b"),
            unit_id: UnitId::new("unit-201"),
            room_label: "B".to_string(),
        })
        .expect("room registers");
    property_id
}

/// By-unit apartments: unit 301 (cap 4) and unit 302 (cap 2, ADA).
pub(super) fn seed_by_unit(store: &HousingStore) -> PropertyId {
    let property_id = PropertyId::new("prop-aspen");
    store
        .register_property(Property {
            id: property_id.clone(),
            name: "Aspen Flats".to_string(),
            property_type: PropertyType::Apartment,
            granularity: Granularity::ByUnit,
        })
        .expect("property registers");
    store
        .register_unit(Unit {
            id: UnitId::new("unit-301"),
            property_id: property_id.clone(),
            unit_number: "301".to_string(),
            max_occupancy: 4,
            requires_ada_access: false,
        })
        .expect("unit registers");
    store
        .register_unit(Unit {
            id: UnitId::new("unit-302"),
            property_id: property_id.clone(),
            unit_number: "302".to_string(),
            max_occupancy: 2,
            requires_ada_access: true,
        })
        .expect("unit registers");
    property_id
}

pub(super) fn approved_application(
    service: &HousingService<MemoryNotifier>,
    user_id: &UserId,
    preferred: Option<PropertyId>,
) -> Application {
    let application = service
        .submit(user_id.clone(), fall_term(), preferred)
        .expect("application submits");
    service
        .set_application_status(&application.id, ApplicationStatus::Approved, date(2026, 8, 1))
        .expect("application approves")
}

/// Approve and allocate `user` onto unit 301 of the by-unit property.
pub(super) fn by_unit_lease(
    service: &HousingService<MemoryNotifier>,
    user_id: &UserId,
) -> Lease {
    let application = approved_application(service, user_id, None);
    service
        .allocate(
            &application.id,
            ResourceRef::Unit(UnitId::new("unit-301")),
            date(2026, 8, 15),
            date(2027, 5, 15),
            9000,
            750,
        )
        .expect("lease allocates")
}
