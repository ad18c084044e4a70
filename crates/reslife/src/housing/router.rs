use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Lease, LeaseId, LeaseStatus, Occupant,
    OccupantId, OccupantRole, PropertyId, ResourceRef, Term, UnitId, UserId,
};
use super::error::HousingError;
use super::inventory::AvailabilityFilter;
use super::notify::NotificationPublisher;
use super::service::HousingService;

/// Router builder exposing the engine operations over HTTP.
pub fn housing_router<N>(service: Arc<HousingService<N>>) -> Router
where
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/housing/applications",
            post(submit_application::<N>),
        )
        .route(
            "/api/v1/housing/applications/:application_id",
            get(get_application::<N>),
        )
        .route(
            "/api/v1/housing/applications/:application_id/status",
            post(set_application_status::<N>),
        )
        .route(
            "/api/v1/housing/applications/:application_id/response",
            post(respond_to_invitation::<N>),
        )
        .route("/api/v1/housing/leases", post(allocate_lease::<N>))
        .route("/api/v1/housing/leases/:lease_id", get(get_lease::<N>))
        .route("/api/v1/housing/leases/:lease_id/sign", post(sign_lease::<N>))
        .route(
            "/api/v1/housing/leases/:lease_id/status",
            post(set_lease_status::<N>),
        )
        .route(
            "/api/v1/housing/leases/:lease_id/invitations",
            post(invite_occupant::<N>),
        )
        .route(
            "/api/v1/housing/leases/:lease_id/occupants",
            get(list_occupants::<N>).post(add_occupant::<N>),
        )
        .route(
            "/api/v1/housing/occupants/:occupant_id/move-out",
            post(remove_occupant::<N>),
        )
        .route(
            "/api/v1/housing/properties/:property_id/availability",
            get(availability::<N>),
        )
        .with_state(service)
}

/// Map an engine error kind to the client-facing status the API layer owns.
fn error_status(error: &HousingError) -> StatusCode {
    match error {
        HousingError::NotFound { .. } => StatusCode::NOT_FOUND,
        HousingError::NotLeaseHolder { .. } => StatusCode::FORBIDDEN,
        HousingError::ResourceUnavailable { .. }
        | HousingError::DuplicateApplication { .. }
        | HousingError::DuplicateOccupant { .. }
        | HousingError::DuplicateLease { .. } => StatusCode::CONFLICT,
        HousingError::GranularityMismatch { .. }
        | HousingError::LeaseFull { .. }
        | HousingError::InvalidRole { .. }
        | HousingError::InvalidTransition { .. }
        | HousingError::CannotRemoveLastLeaseHolder { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn error_response(error: HousingError) -> Response {
    let payload = json!({
        "kind": error.kind(),
        "error": error.to_string(),
    });
    (error_status(&error), Json(payload)).into_response()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Sanitized representation of an application's exposed state.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub application_id: ApplicationId,
    pub user_id: UserId,
    pub term: Term,
    pub status: &'static str,
    pub invitation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_property_id: Option<PropertyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_lease_id: Option<LeaseId>,
}

impl From<Application> for ApplicationView {
    fn from(application: Application) -> Self {
        Self {
            application_id: application.id,
            user_id: application.user_id,
            term: application.term,
            status: application.status.label(),
            invitation: application.invite_lease_id.is_some(),
            preferred_property_id: application.preferred_property_id,
            invite_lease_id: application.invite_lease_id,
        }
    }
}

/// Lease fields exposed to the API, payment, and maintenance consumers.
#[derive(Debug, Clone, Serialize)]
pub struct LeaseView {
    pub lease_id: LeaseId,
    pub application_id: ApplicationId,
    pub lease_holder_user_id: UserId,
    pub property_id: PropertyId,
    pub term: Term,
    pub granularity: &'static str,
    pub resource: ResourceRef,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_on: Option<NaiveDate>,
    pub total_due: u32,
    pub due_this_month: u32,
}

impl From<Lease> for LeaseView {
    fn from(lease: Lease) -> Self {
        Self {
            lease_id: lease.id,
            application_id: lease.application_id,
            lease_holder_user_id: lease.lease_holder_user_id,
            property_id: lease.property_id,
            term: lease.term,
            granularity: lease.granularity.label(),
            resource: lease.resource,
            start_date: lease.start_date,
            end_date: lease.end_date,
            status: lease.status.label(),
            signed_on: lease.signed_on,
            total_due: lease.total_due,
            due_this_month: lease.due_this_month,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OccupantView {
    pub occupant_id: OccupantId,
    pub lease_id: LeaseId,
    pub user_id: UserId,
    pub role: &'static str,
    pub move_in_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_out_date: Option<NaiveDate>,
}

impl From<Occupant> for OccupantView {
    fn from(occupant: Occupant) -> Self {
        Self {
            occupant_id: occupant.id,
            lease_id: occupant.lease_id,
            user_id: occupant.user_id,
            role: occupant.role.label(),
            move_in_date: occupant.move_in_date,
            move_out_date: occupant.move_out_date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitApplicationRequest {
    pub(crate) user_id: UserId,
    pub(crate) term: Term,
    #[serde(default)]
    pub(crate) preferred_property_id: Option<PropertyId>,
    /// Save without submitting for review.
    #[serde(default)]
    pub(crate) draft: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SetApplicationStatusRequest {
    pub(crate) status: ApplicationStatus,
    #[serde(default)]
    pub(crate) effective_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InvitationResponseRequest {
    pub(crate) user_id: UserId,
    pub(crate) accept: bool,
    #[serde(default)]
    pub(crate) effective_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AllocateLeaseRequest {
    pub(crate) application_id: ApplicationId,
    pub(crate) resource: ResourceRef,
    pub(crate) start_date: NaiveDate,
    pub(crate) end_date: NaiveDate,
    pub(crate) total_due: u32,
    pub(crate) due_this_month: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignLeaseRequest {
    pub(crate) user_id: UserId,
    #[serde(default)]
    pub(crate) signed_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SetLeaseStatusRequest {
    pub(crate) status: LeaseStatus,
    #[serde(default)]
    pub(crate) effective_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InviteOccupantRequest {
    pub(crate) inviter_user_id: UserId,
    pub(crate) invitee_user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddOccupantRequest {
    pub(crate) user_id: UserId,
    pub(crate) role: OccupantRole,
    pub(crate) move_in_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MoveOutRequest {
    #[serde(default)]
    pub(crate) move_out_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AvailabilityParams {
    pub(crate) unit_id: Option<UnitId>,
    #[serde(default)]
    pub(crate) ada_only: bool,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityView {
    pub property_id: PropertyId,
    pub granularity: &'static str,
    pub resources: Vec<ResourceRef>,
}

async fn submit_application<N>(
    State(service): State<Arc<HousingService<N>>>,
    Json(request): Json<SubmitApplicationRequest>,
) -> Response
where
    N: NotificationPublisher + 'static,
{
    let result = if request.draft {
        service.save_draft(request.user_id, request.term, request.preferred_property_id)
    } else {
        service.submit(request.user_id, request.term, request.preferred_property_id)
    };
    match result {
        Ok(application) => (
            StatusCode::ACCEPTED,
            Json(ApplicationView::from(application)),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

async fn get_application<N>(
    State(service): State<Arc<HousingService<N>>>,
    Path(application_id): Path<String>,
) -> Response
where
    N: NotificationPublisher + 'static,
{
    match service.application(&ApplicationId(application_id)) {
        Ok(application) => (StatusCode::OK, Json(ApplicationView::from(application))).into_response(),
        Err(error) => error_response(error),
    }
}

async fn set_application_status<N>(
    State(service): State<Arc<HousingService<N>>>,
    Path(application_id): Path<String>,
    Json(request): Json<SetApplicationStatusRequest>,
) -> Response
where
    N: NotificationPublisher + 'static,
{
    let effective_on = request.effective_on.unwrap_or_else(today);
    match service.set_application_status(
        &ApplicationId(application_id),
        request.status,
        effective_on,
    ) {
        Ok(application) => (StatusCode::OK, Json(ApplicationView::from(application))).into_response(),
        Err(error) => error_response(error),
    }
}

async fn respond_to_invitation<N>(
    State(service): State<Arc<HousingService<N>>>,
    Path(application_id): Path<String>,
    Json(request): Json<InvitationResponseRequest>,
) -> Response
where
    N: NotificationPublisher + 'static,
{
    let effective_on = request.effective_on.unwrap_or_else(today);
    match service.respond_to_invitation(
        &ApplicationId(application_id),
        &request.user_id,
        request.accept,
        effective_on,
    ) {
        Ok(application) => (StatusCode::OK, Json(ApplicationView::from(application))).into_response(),
        Err(error) => error_response(error),
    }
}

async fn allocate_lease<N>(
    State(service): State<Arc<HousingService<N>>>,
    Json(request): Json<AllocateLeaseRequest>,
) -> Response
where
    N: NotificationPublisher + 'static,
{
    match service.allocate(
        &request.application_id,
        request.resource,
        request.start_date,
        request.end_date,
        request.total_due,
        request.due_this_month,
    ) {
        Ok(lease) => (StatusCode::CREATED, Json(LeaseView::from(lease))).into_response(),
        Err(error) => error_response(error),
    }
}

async fn get_lease<N>(
    State(service): State<Arc<HousingService<N>>>,
    Path(lease_id): Path<String>,
) -> Response
where
    N: NotificationPublisher + 'static,
{
    match service.lease(&LeaseId(lease_id)) {
        Ok(lease) => (StatusCode::OK, Json(LeaseView::from(lease))).into_response(),
        Err(error) => error_response(error),
    }
}

async fn sign_lease<N>(
    State(service): State<Arc<HousingService<N>>>,
    Path(lease_id): Path<String>,
    Json(request): Json<SignLeaseRequest>,
) -> Response
where
    N: NotificationPublisher + 'static,
{
    let signed_on = request.signed_on.unwrap_or_else(today);
    match service.sign(&LeaseId(lease_id), &request.user_id, signed_on) {
        Ok(lease) => (StatusCode::OK, Json(LeaseView::from(lease))).into_response(),
        Err(error) => error_response(error),
    }
}

async fn set_lease_status<N>(
    State(service): State<Arc<HousingService<N>>>,
    Path(lease_id): Path<String>,
    Json(request): Json<SetLeaseStatusRequest>,
) -> Response
where
    N: NotificationPublisher + 'static,
{
    let effective_on = request.effective_on.unwrap_or_else(today);
    match service.set_lease_status(&LeaseId(lease_id), request.status, effective_on) {
        Ok(lease) => (StatusCode::OK, Json(LeaseView::from(lease))).into_response(),
        Err(error) => error_response(error),
    }
}

async fn invite_occupant<N>(
    State(service): State<Arc<HousingService<N>>>,
    Path(lease_id): Path<String>,
    Json(request): Json<InviteOccupantRequest>,
) -> Response
where
    N: NotificationPublisher + 'static,
{
    match service.invite_occupant(
        &LeaseId(lease_id),
        &request.inviter_user_id,
        request.invitee_user_id,
    ) {
        Ok(application) => (
            StatusCode::ACCEPTED,
            Json(ApplicationView::from(application)),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

async fn list_occupants<N>(
    State(service): State<Arc<HousingService<N>>>,
    Path(lease_id): Path<String>,
) -> Response
where
    N: NotificationPublisher + 'static,
{
    match service.list_occupants(&LeaseId(lease_id)) {
        Ok(roster) => {
            let views: Vec<OccupantView> = roster.into_iter().map(OccupantView::from).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

async fn add_occupant<N>(
    State(service): State<Arc<HousingService<N>>>,
    Path(lease_id): Path<String>,
    Json(request): Json<AddOccupantRequest>,
) -> Response
where
    N: NotificationPublisher + 'static,
{
    match service.add_occupant(
        &LeaseId(lease_id),
        request.user_id,
        request.role,
        request.move_in_date,
    ) {
        Ok(occupant) => (StatusCode::CREATED, Json(OccupantView::from(occupant))).into_response(),
        Err(error) => error_response(error),
    }
}

async fn remove_occupant<N>(
    State(service): State<Arc<HousingService<N>>>,
    Path(occupant_id): Path<String>,
    Json(request): Json<MoveOutRequest>,
) -> Response
where
    N: NotificationPublisher + 'static,
{
    let move_out_date = request.move_out_date.unwrap_or_else(today);
    match service.remove_occupant(&OccupantId(occupant_id), move_out_date) {
        Ok(occupant) => (StatusCode::OK, Json(OccupantView::from(occupant))).into_response(),
        Err(error) => error_response(error),
    }
}

async fn availability<N>(
    State(service): State<Arc<HousingService<N>>>,
    Path(property_id): Path<String>,
    Query(params): Query<AvailabilityParams>,
) -> Response
where
    N: NotificationPublisher + 'static,
{
    let property_id = PropertyId(property_id);
    let filter = AvailabilityFilter {
        unit_id: params.unit_id,
        ada_only: params.ada_only,
    };
    let granularity = match service.resolve_granularity(&property_id) {
        Ok(granularity) => granularity,
        Err(error) => return error_response(error),
    };
    match service.availability(&property_id, &filter) {
        Ok(resources) => (
            StatusCode::OK,
            Json(AvailabilityView {
                property_id,
                granularity: granularity.label(),
                resources,
            }),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}
