use std::sync::Arc;
use std::thread;

use super::common::*;
use crate::housing::domain::{
    ApplicationStatus, BedId, LeaseStatus, OccupantRole, ResourceRef, UnitId,
};
use crate::housing::error::HousingError;
use crate::housing::inventory::AvailabilityFilter;

#[test]
fn allocation_creates_pending_lease_with_holder_row() {
    let (service, store, _) = build_service();
    seed_by_bed(&store);
    let application = approved_application(&service, &user("stu-100"), None);

    let lease = service
        .allocate(
            &application.id,
            ResourceRef::Bed(BedId::new("bed-101a-1")),
            date(2026, 8, 15),
            date(2027, 5, 15),
            6400,
            550,
        )
        .expect("lease allocates");

    assert_eq!(lease.status, LeaseStatus::PendingSignature);
    assert_eq!(lease.application_id, application.id);
    assert_eq!(lease.lease_holder_user_id, user("stu-100"));
    assert_eq!(lease.total_due, 6400);
    assert!(lease.signed_on.is_none());

    let roster = service.list_occupants(&lease.id).expect("roster lists");
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].role, OccupantRole::LeaseHolder);
    assert_eq!(roster[0].move_in_date, date(2026, 8, 15));
}

#[test]
fn allocation_requires_an_approved_application() {
    let (service, store, _) = build_service();
    seed_by_bed(&store);
    let application = service
        .submit(user("stu-100"), fall_term(), None)
        .expect("submits");

    match service.allocate(
        &application.id,
        ResourceRef::Bed(BedId::new("bed-101a-1")),
        date(2026, 8, 15),
        date(2027, 5, 15),
        6400,
        550,
    ) {
        Err(HousingError::InvalidTransition { from, .. }) => assert_eq!(from, "submitted"),
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn invitations_never_receive_their_own_lease() {
    let (service, store, _) = build_service();
    seed_by_unit(&store);
    let lease = by_unit_lease(&service, &user("stu-100"));
    let invitation = service
        .invite_occupant(&lease.id, &user("stu-100"), user("stu-200"))
        .expect("invitation creates");
    service
        .respond_to_invitation(&invitation.id, &user("stu-200"), true, date(2026, 9, 1))
        .expect("invitation accepts");

    match service.allocate(
        &invitation.id,
        ResourceRef::Unit(UnitId::new("unit-302")),
        date(2026, 9, 1),
        date(2027, 5, 15),
        8000,
        650,
    ) {
        Err(HousingError::InvalidTransition { .. }) => {}
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn wrong_granularity_reference_is_rejected() {
    let (service, store, _) = build_service();
    seed_by_bed(&store);
    let application = approved_application(&service, &user("stu-100"), None);

    // Scenario: by-bed property addressed at unit level.
    match service.allocate(
        &application.id,
        ResourceRef::Unit(UnitId::new("unit-101")),
        date(2026, 8, 15),
        date(2027, 5, 15),
        6400,
        550,
    ) {
        Err(HousingError::GranularityMismatch {
            expected, found, ..
        }) => {
            assert_eq!(expected.label(), "by_bed");
            assert_eq!(found.label(), "by_unit");
        }
        other => panic!("expected granularity mismatch, got {other:?}"),
    }
}

#[test]
fn occupied_bed_rejects_allocation_until_terminated() {
    let (service, store, _) = build_service();
    let property_id = seed_by_bed(&store);
    let first = approved_application(&service, &user("stu-100"), None);
    let bed = ResourceRef::Bed(BedId::new("bed-101a-1"));

    let lease = service
        .allocate(
            &first.id,
            bed.clone(),
            date(2026, 8, 15),
            date(2027, 5, 15),
            6400,
            550,
        )
        .expect("first allocation");
    service
        .sign(&lease.id, &user("stu-100"), date(2026, 8, 16))
        .expect("signs");

    let second = approved_application(&service, &user("stu-200"), None);
    match service.allocate(
        &second.id,
        bed.clone(),
        date(2026, 8, 20),
        date(2027, 5, 15),
        6400,
        550,
    ) {
        Err(HousingError::ResourceUnavailable { .. }) => {}
        other => panic!("expected resource unavailable, got {other:?}"),
    }

    service
        .set_lease_status(&lease.id, LeaseStatus::Terminated, date(2026, 9, 1))
        .expect("terminates");

    let available = service
        .availability(&property_id, &AvailabilityFilter::default())
        .expect("availability");
    assert!(available.contains(&bed));

    service
        .allocate(
            &second.id,
            bed,
            date(2026, 9, 2),
            date(2027, 5, 15),
            6400,
            550,
        )
        .expect("bed is allocatable again after termination");
}

#[test]
fn racing_allocations_for_one_bed_admit_exactly_one_winner() {
    let (service, store, _) = build_service();
    seed_by_bed(&store);
    let first = approved_application(&service, &user("stu-100"), None);
    let second = approved_application(&service, &user("stu-200"), None);

    let service = Arc::new(service);
    let handles: Vec<_> = [first.id.clone(), second.id.clone()]
        .into_iter()
        .map(|application_id| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                service.allocate(
                    &application_id,
                    ResourceRef::Bed(BedId::new("bed-101a-1")),
                    date(2026, 8, 15),
                    date(2027, 5, 15),
                    6400,
                    550,
                )
            })
        })
        .collect();

    let outcomes: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("allocation thread joins"))
        .collect();

    let winners = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    let losers = outcomes
        .iter()
        .filter(|outcome| {
            matches!(outcome, Err(HousingError::ResourceUnavailable { .. }))
        })
        .count();
    assert_eq!(winners, 1, "exactly one allocation must win");
    assert_eq!(losers, 1, "the other must observe resource unavailable");

    let bed = ResourceRef::Bed(BedId::new("bed-101a-1"));
    let encumbering = store.read(|tables| {
        tables
            .leases
            .values()
            .filter(|lease| lease.status.encumbers() && lease.resource == bed)
            .count()
    });
    assert_eq!(encumbering, 1);
}

#[test]
fn holder_cannot_hold_two_leases_for_one_term() {
    let (service, store, _) = build_service();
    seed_by_bed(&store);
    let first = approved_application(&service, &user("stu-100"), None);
    service
        .allocate(
            &first.id,
            ResourceRef::Bed(BedId::new("bed-101a-1")),
            date(2026, 8, 15),
            date(2027, 5, 15),
            6400,
            550,
        )
        .expect("first lease");

    // Approved is terminal, so a second application for the term can exist.
    let second = approved_application(&service, &user("stu-100"), None);
    match service.allocate(
        &second.id,
        ResourceRef::Bed(BedId::new("bed-101a-2")),
        date(2026, 8, 15),
        date(2027, 5, 15),
        6400,
        550,
    ) {
        Err(HousingError::DuplicateLease { .. }) => {}
        other => panic!("expected duplicate lease, got {other:?}"),
    }
}

#[test]
fn allocating_the_same_application_twice_is_rejected() {
    let (service, store, _) = build_service();
    seed_by_bed(&store);
    let application = approved_application(&service, &user("stu-100"), None);
    let lease = service
        .allocate(
            &application.id,
            ResourceRef::Bed(BedId::new("bed-101a-1")),
            date(2026, 8, 15),
            date(2027, 5, 15),
            6400,
            550,
        )
        .expect("first allocation");
    service
        .set_lease_status(&lease.id, LeaseStatus::Terminated, date(2026, 9, 1))
        .expect("terminates");

    // Even with the first lease terminated, the application is spent.
    match service.allocate(
        &application.id,
        ResourceRef::Bed(BedId::new("bed-101a-2")),
        date(2026, 9, 2),
        date(2027, 5, 15),
        6400,
        550,
    ) {
        Err(HousingError::DuplicateLease { .. }) => {}
        other => panic!("expected duplicate lease, got {other:?}"),
    }
}

#[test]
fn signature_is_reserved_for_the_lease_holder() {
    let (service, store, _) = build_service();
    seed_by_unit(&store);
    let lease = by_unit_lease(&service, &user("stu-100"));

    match service.sign(&lease.id, &user("stu-200"), date(2026, 8, 16)) {
        Err(HousingError::NotLeaseHolder { .. }) => {}
        other => panic!("expected not lease holder, got {other:?}"),
    }

    let signed = service
        .sign(&lease.id, &user("stu-100"), date(2026, 8, 16))
        .expect("holder signs");
    assert_eq!(signed.status, LeaseStatus::Signed);
    assert_eq!(signed.signed_on, Some(date(2026, 8, 16)));

    match service.sign(&lease.id, &user("stu-100"), date(2026, 8, 17)) {
        Err(HousingError::InvalidTransition { from, to }) => {
            assert_eq!(from, "signed");
            assert_eq!(to, "signed");
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn staff_lifecycle_walks_signed_active_completed() {
    let (service, store, _) = build_service();
    seed_by_unit(&store);
    let lease = by_unit_lease(&service, &user("stu-100"));
    service
        .sign(&lease.id, &user("stu-100"), date(2026, 8, 16))
        .expect("signs");

    let active = service
        .set_lease_status(&lease.id, LeaseStatus::Active, date(2026, 8, 17))
        .expect("activates");
    assert_eq!(active.status, LeaseStatus::Active);

    let completed = service
        .set_lease_status(&lease.id, LeaseStatus::Completed, date(2027, 5, 15))
        .expect("completes");
    assert_eq!(completed.status, LeaseStatus::Completed);

    // Completed is terminal: no reopening, not even into Terminated.
    match service.set_lease_status(&lease.id, LeaseStatus::Terminated, date(2027, 5, 16)) {
        Err(HousingError::InvalidTransition { from, to }) => {
            assert_eq!(from, "completed");
            assert_eq!(to, "terminated");
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn skipping_signature_collection_is_rejected() {
    let (service, store, _) = build_service();
    seed_by_unit(&store);
    let lease = by_unit_lease(&service, &user("stu-100"));

    match service.set_lease_status(&lease.id, LeaseStatus::Active, date(2026, 8, 17)) {
        Err(HousingError::InvalidTransition { from, to }) => {
            assert_eq!(from, "pending_signature");
            assert_eq!(to, "active");
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn termination_stamps_move_out_but_keeps_history() {
    let (service, store, _) = build_service();
    seed_by_unit(&store);
    let lease = by_unit_lease(&service, &user("stu-100"));
    let invitation = service
        .invite_occupant(&lease.id, &user("stu-100"), user("stu-200"))
        .expect("invitation creates");
    service
        .respond_to_invitation(&invitation.id, &user("stu-200"), true, date(2026, 9, 1))
        .expect("invitation accepts");

    service
        .set_lease_status(&lease.id, LeaseStatus::Terminated, date(2026, 10, 1))
        .expect("terminates");

    let roster = service.list_occupants(&lease.id).expect("roster lists");
    assert_eq!(roster.len(), 2, "history rows are preserved");
    assert!(roster
        .iter()
        .all(|occupant| occupant.move_out_date == Some(date(2026, 10, 1))));

    let pending_invite = service
        .set_application_status(&invitation.id, ApplicationStatus::Approved, date(2026, 10, 2));
    assert!(
        pending_invite.is_err(),
        "terminal invitation cannot be re-approved"
    );
}
