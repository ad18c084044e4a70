use crate::infra::LoggingNotificationPublisher;
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use reslife::error::AppError;
use reslife::housing::{
    ApplicationStatus, AvailabilityFilter, Bed, BedId, Granularity, HousingService, HousingStore,
    LeaseStatus, Property, PropertyId, PropertyType, ResourceRef, Room, RoomId, Term, Unit, UnitId,
    UserId,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Move-in date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) move_in: Option<NaiveDate>,
    /// Academic term used for the demo applications.
    #[arg(long, default_value = "2026-FALL")]
    pub(crate) term: String,
}

/// Seed a small campus and walk the full lifecycle: application intake,
/// staff approval, bed allocation, signature, the roommate-invitation
/// protocol on a by-unit lease, and termination.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let move_in = args.move_in.unwrap_or_else(|| Local::now().date_naive());
    let move_out = move_in + Duration::days(270);
    let term = Term::new(args.term.clone());

    let store = Arc::new(HousingStore::new());
    seed_demo_campus(&store)?;
    let service = HousingService::new(store, Arc::new(LoggingNotificationPublisher));

    println!("Housing allocation demo (term {})", args.term);

    let hall = PropertyId::new("prop-birch");
    let open_beds = service.availability(&hall, &AvailabilityFilter::default())?;
    println!("\nOpen beds in Birch Hall:");
    for bed in &open_beds {
        println!("- {bed}");
    }

    let applicant = UserId::new("stu-1001");
    let application = service.submit(applicant.clone(), term.clone(), Some(hall.clone()))?;
    println!(
        "\nApplication {} submitted by {} ({})",
        application.id,
        applicant,
        application.status.label()
    );

    let application =
        service.set_application_status(&application.id, ApplicationStatus::Approved, move_in)?;
    println!("Application {} approved by staff", application.id);

    let lease = service.allocate(
        &application.id,
        ResourceRef::Bed(BedId::new("bed-1a-1")),
        move_in,
        move_out,
        6400,
        550,
    )?;
    println!(
        "Lease {} created for {} ({})",
        lease.id,
        lease.resource,
        lease.status.label()
    );

    let lease = service.sign(&lease.id, &applicant, move_in)?;
    let lease = service.set_lease_status(&lease.id, LeaseStatus::Active, move_in)?;
    println!("Lease {} signed and active", lease.id);

    // Roommate invitations only exist at unit granularity.
    let holder = UserId::new("stu-2001");
    let flat_application = service.submit(holder.clone(), term.clone(), None)?;
    service.set_application_status(&flat_application.id, ApplicationStatus::Approved, move_in)?;
    let flat_lease = service.allocate(
        &flat_application.id,
        ResourceRef::Unit(UnitId::new("unit-41")),
        move_in,
        move_out,
        9000,
        750,
    )?;
    println!(
        "\nLease {} created for {} held by {}",
        flat_lease.id, flat_lease.resource, holder
    );

    let invitee = UserId::new("stu-2002");
    let invitation = service.invite_occupant(&flat_lease.id, &holder, invitee.clone())?;
    println!("Invitation {} sent to {}", invitation.id, invitee);
    service.respond_to_invitation(&invitation.id, &invitee, true, move_in)?;

    println!("Roster for lease {}:", flat_lease.id);
    for occupant in service.list_occupants(&flat_lease.id)? {
        println!(
            "- {} as {} (moved in {})",
            occupant.user_id,
            occupant.role.label(),
            occupant.move_in_date
        );
    }

    service.set_lease_status(&lease.id, LeaseStatus::Terminated, move_out)?;
    let open_beds = service.availability(&hall, &AvailabilityFilter::default())?;
    println!(
        "\nLease {} terminated; Birch Hall has {} open beds again",
        lease.id,
        open_beds.len()
    );

    Ok(())
}

/// A by-bed hall and a by-unit apartment building, enough to exercise every
/// granularity the engine supports.
fn seed_demo_campus(store: &HousingStore) -> Result<(), AppError> {
    store.register_property(Property {
        id: PropertyId::new("prop-birch"),
        name: "Birch Hall".to_string(),
        property_type: PropertyType::ResidenceHall,
        granularity: Granularity::ByBed,
    })?;
    store.register_unit(Unit {
        id: UnitId::new("unit-1"),
        property_id: PropertyId::new("prop-birch"),
        unit_number: "1".to_string(),
        max_occupancy: 2,
        requires_ada_access: false,
    })?;
    store.register_room(Room {
        id: RoomId::new("room-1a"),
        unit_id: UnitId::new("unit-1"),
        room_label: "A".to_string(),
    })?;
    store.register_bed(Bed {
        id: BedId::new("bed-1a-1"),
        room_id: RoomId::new("room-1a"),
        bed_label: "1".to_string(),
    })?;
    store.register_bed(Bed {
        id: BedId::new("bed-1a-2"),
        room_id: RoomId::new("room-1a"),
        bed_label: "2".to_string(),
    })?;

    store.register_property(Property {
        id: PropertyId::new("prop-aspen"),
        name: "Aspen Flats".to_string(),
        property_type: PropertyType::Apartment,
        granularity: Granularity::ByUnit,
    })?;
    store.register_unit(Unit {
        id: UnitId::new("unit-41"),
        property_id: PropertyId::new("prop-aspen"),
        unit_number: "41".to_string(),
        max_occupancy: 4,
        requires_ada_access: false,
    })?;
    store.register_unit(Unit {
        id: UnitId::new("unit-42"),
        property_id: PropertyId::new("prop-aspen"),
        unit_number: "42".to_string(),
        max_occupancy: 2,
        requires_ada_access: true,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_walks_the_full_lifecycle() {
        let args = DemoArgs {
            move_in: Some(NaiveDate::from_ymd_opt(2026, 8, 15).expect("valid date")),
            term: "2026-FALL".to_string(),
        };
        run_demo(args).expect("demo completes");
    }
}
