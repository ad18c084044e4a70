//! Application lifecycle: draft and submission intake, staff review
//! transitions, and the roommate-invitation sub-protocol.

use chrono::NaiveDate;

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Granularity, LeaseId, Occupant, OccupantId,
    OccupantRole, PropertyId, Term, UserId,
};
use super::error::HousingError;
use super::inventory;
use super::notify::{HousingNotice, NotificationPublisher};
use super::service::HousingService;
use super::store::Tables;

impl<N> HousingService<N>
where
    N: NotificationPublisher + 'static,
{
    /// Save a housing request without submitting it for review.
    pub fn save_draft(
        &self,
        user_id: UserId,
        term: Term,
        preferred_property_id: Option<PropertyId>,
    ) -> Result<Application, HousingError> {
        let id = self.store_ref().next_application_id();
        self.store_ref().write(|tables| {
            ensure_no_open_application(tables, &user_id, &term)?;
            validate_preferred_property(tables, preferred_property_id.as_ref())?;
            let application = Application {
                id: id.clone(),
                user_id: user_id.clone(),
                term: term.clone(),
                status: ApplicationStatus::Draft,
                preferred_property_id: preferred_property_id.clone(),
                invite_lease_id: None,
            };
            tables
                .applications
                .insert(application.id.clone(), application.clone());
            Ok(application)
        })
    }

    /// Submit a fresh housing request, or promote the user's existing draft
    /// for the term.
    pub fn submit(
        &self,
        user_id: UserId,
        term: Term,
        preferred_property_id: Option<PropertyId>,
    ) -> Result<Application, HousingError> {
        let id = self.store_ref().next_application_id();
        let application = self.store_ref().write(|tables| {
            validate_preferred_property(tables, preferred_property_id.as_ref())?;

            let draft_id = tables
                .applications
                .values()
                .find(|application| {
                    application.user_id == user_id
                        && application.term == term
                        && application.status == ApplicationStatus::Draft
                        && !application.is_invitation()
                })
                .map(|application| application.id.clone());

            if let Some(draft_id) = draft_id {
                let application = tables.application_mut(&draft_id)?;
                application.status = ApplicationStatus::Submitted;
                if preferred_property_id.is_some() {
                    application.preferred_property_id = preferred_property_id.clone();
                }
                return Ok(application.clone());
            }

            ensure_no_open_application(tables, &user_id, &term)?;
            let application = Application {
                id: id.clone(),
                user_id: user_id.clone(),
                term: term.clone(),
                status: ApplicationStatus::Submitted,
                preferred_property_id: preferred_property_id.clone(),
                invite_lease_id: None,
            };
            tables
                .applications
                .insert(application.id.clone(), application.clone());
            Ok(application)
        })?;

        self.notify(
            HousingNotice::new("application_submitted", application.user_id.clone())
                .detail("application_id", application.id.0.clone())
                .detail("term", application.term.0.clone()),
        );
        Ok(application)
    }

    /// Staff-only status transition. Approving a roommate invitation
    /// re-checks the target lease inside the same transaction and enrolls
    /// the invitee as a roommate; `LeaseFull` leaves the invitation pending.
    pub fn set_application_status(
        &self,
        application_id: &ApplicationId,
        new_status: ApplicationStatus,
        effective_on: NaiveDate,
    ) -> Result<Application, HousingError> {
        let occupant_id = self.store_ref().next_occupant_id();
        let application = self.store_ref().write(|tables| {
            let application = tables.application(application_id)?.clone();
            if !application.status.may_transition(new_status) {
                return Err(HousingError::InvalidTransition {
                    from: application.status.label(),
                    to: new_status.label(),
                });
            }

            if new_status == ApplicationStatus::Approved {
                if let Some(lease_id) = &application.invite_lease_id {
                    enroll_invitee(
                        tables,
                        lease_id,
                        &application.user_id,
                        effective_on,
                        occupant_id.clone(),
                        application.status.label(),
                    )?;
                }
            }

            let application = tables.application_mut(application_id)?;
            application.status = new_status;
            Ok(application.clone())
        })?;

        self.notify(
            HousingNotice::new("application_status_changed", application.user_id.clone())
                .detail("application_id", application.id.0.clone())
                .detail("status", application.status.label().to_string()),
        );
        Ok(application)
    }

    /// Lease-holder-initiated roommate invitation, permitted only on by-unit
    /// leases with spare capacity. Creates a pending invite-application for
    /// the invitee rather than touching the roster directly.
    pub fn invite_occupant(
        &self,
        lease_id: &LeaseId,
        inviter_user_id: &UserId,
        invitee_user_id: UserId,
    ) -> Result<Application, HousingError> {
        let id = self.store_ref().next_application_id();
        let application = self.store_ref().write(|tables| {
            let lease = tables.lease(lease_id)?.clone();
            if lease.granularity != Granularity::ByUnit {
                return Err(HousingError::GranularityMismatch {
                    property: lease.property_id.clone(),
                    expected: Granularity::ByUnit,
                    found: lease.granularity,
                });
            }
            if lease.lease_holder_user_id != *inviter_user_id {
                return Err(HousingError::NotLeaseHolder {
                    lease: lease_id.clone(),
                    user: inviter_user_id.clone(),
                });
            }
            invitation_target(
                tables,
                lease_id,
                HousingError::InvalidTransition {
                    from: lease.status.label(),
                    to: ApplicationStatus::Submitted.label(),
                },
            )?;

            if tables
                .occupants_of(lease_id)
                .any(|occupant| occupant.is_active() && occupant.user_id == invitee_user_id)
            {
                return Err(HousingError::DuplicateOccupant {
                    lease: lease_id.clone(),
                    user: invitee_user_id.clone(),
                });
            }
            if tables.applications.values().any(|application| {
                application.invite_lease_id.as_ref() == Some(lease_id)
                    && application.user_id == invitee_user_id
                    && !application.status.is_terminal()
            }) {
                return Err(HousingError::DuplicateApplication {
                    user: invitee_user_id.clone(),
                    term: lease.term.clone(),
                });
            }

            let application = Application {
                id: id.clone(),
                user_id: invitee_user_id.clone(),
                term: lease.term.clone(),
                status: ApplicationStatus::Submitted,
                preferred_property_id: Some(lease.property_id.clone()),
                invite_lease_id: Some(lease_id.clone()),
            };
            tables
                .applications
                .insert(application.id.clone(), application.clone());
            Ok(application)
        })?;

        self.notify(
            HousingNotice::new("roommate_invitation", application.user_id.clone())
                .detail("application_id", application.id.0.clone())
                .detail("lease_id", lease_id.0.clone())
                .detail("inviter", inviter_user_id.0.clone()),
        );
        Ok(application)
    }

    /// Invitee's answer to a pending roommate invitation. Accepting enrolls
    /// the invitee as a roommate after re-checking capacity; declining marks
    /// the invitation rejected and leaves the lease untouched.
    pub fn respond_to_invitation(
        &self,
        application_id: &ApplicationId,
        user_id: &UserId,
        accept: bool,
        effective_on: NaiveDate,
    ) -> Result<Application, HousingError> {
        let occupant_id = self.store_ref().next_occupant_id();
        let (application, holder) = self.store_ref().write(|tables| {
            let application = tables.application(application_id)?.clone();
            // Another student's invitation is invisible to this responder.
            if application.user_id != *user_id {
                return Err(HousingError::NotFound {
                    entity: "application",
                    id: application_id.0.clone(),
                });
            }
            let target = if accept {
                ApplicationStatus::Approved
            } else {
                ApplicationStatus::Rejected
            };
            let lease_id = application.invite_lease_id.clone().ok_or_else(|| {
                HousingError::InvalidTransition {
                    from: application.status.label(),
                    to: target.label(),
                }
            })?;
            if !application.status.may_transition(target) {
                return Err(HousingError::InvalidTransition {
                    from: application.status.label(),
                    to: target.label(),
                });
            }

            let holder = tables.lease(&lease_id)?.lease_holder_user_id.clone();
            if accept {
                enroll_invitee(
                    tables,
                    &lease_id,
                    &application.user_id,
                    effective_on,
                    occupant_id.clone(),
                    application.status.label(),
                )?;
            }

            let application = tables.application_mut(application_id)?;
            application.status = target;
            Ok((application.clone(), holder))
        })?;

        let template = if accept {
            "invitation_accepted"
        } else {
            "invitation_declined"
        };
        self.notify(
            HousingNotice::new(template, holder)
                .detail("application_id", application.id.0.clone())
                .detail("invitee", application.user_id.0.clone()),
        );
        Ok(application)
    }
}

/// Duplicate check for fresh submissions: one open non-invitation
/// application per user and term. A pending roommate invitation does not
/// block the invitee's own request.
fn ensure_no_open_application(
    tables: &Tables,
    user_id: &UserId,
    term: &Term,
) -> Result<(), HousingError> {
    let open = tables.applications.values().any(|application| {
        application.user_id == *user_id
            && application.term == *term
            && !application.status.is_terminal()
            && !application.is_invitation()
    });
    if open {
        return Err(HousingError::DuplicateApplication {
            user: user_id.clone(),
            term: term.clone(),
        });
    }
    Ok(())
}

fn validate_preferred_property(
    tables: &Tables,
    preferred: Option<&PropertyId>,
) -> Result<(), HousingError> {
    if let Some(property_id) = preferred {
        tables.property(property_id)?;
    }
    Ok(())
}

/// Invariant gate shared by invitation creation and acceptance: the target
/// lease must be non-terminal and below its unit's capacity. `on_terminal`
/// names the transition the caller was attempting.
fn invitation_target(
    tables: &Tables,
    lease_id: &LeaseId,
    on_terminal: HousingError,
) -> Result<(), HousingError> {
    let lease = tables.lease(lease_id)?;
    if lease.status.is_terminal() {
        return Err(on_terminal);
    }
    let unit = inventory::resource_context(tables, &lease.resource)?.unit;
    if tables.active_occupant_count(lease_id) >= unit.max_occupancy {
        return Err(HousingError::LeaseFull {
            lease: lease_id.clone(),
            max_occupancy: unit.max_occupancy,
        });
    }
    Ok(())
}

/// Add the invitee to the roster as a roommate. Runs inside the same
/// transaction as the application status flip so the capacity re-check and
/// the insert are indivisible.
fn enroll_invitee(
    tables: &mut Tables,
    lease_id: &LeaseId,
    user_id: &UserId,
    move_in_date: NaiveDate,
    occupant_id: OccupantId,
    attempted_from: &'static str,
) -> Result<(), HousingError> {
    invitation_target(
        tables,
        lease_id,
        HousingError::InvalidTransition {
            from: attempted_from,
            to: ApplicationStatus::Approved.label(),
        },
    )?;
    if tables
        .occupants_of(lease_id)
        .any(|occupant| occupant.is_active() && occupant.user_id == *user_id)
    {
        return Err(HousingError::DuplicateOccupant {
            lease: lease_id.clone(),
            user: user_id.clone(),
        });
    }
    let occupant = Occupant {
        id: occupant_id,
        lease_id: lease_id.clone(),
        user_id: user_id.clone(),
        role: OccupantRole::Roommate,
        move_in_date,
        move_out_date: None,
    };
    tables.occupants.insert(occupant.id.clone(), occupant);
    Ok(())
}
