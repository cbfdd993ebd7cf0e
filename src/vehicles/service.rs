use std::collections::HashMap;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::images;
use crate::state::AppState;
use crate::vehicles::dto::{
    validate_urls, CreateVehicleRequest, ImageReport, UpdateVehicleRequest, UpdateVehicleResponse,
    VehicleDetails, VehicleFilter, VehicleList,
};
use crate::vehicles::repo;

/// Ownership is checked by scoping every query to the caller; a vehicle
/// owned by someone else looks exactly like a missing one.
fn require_owned<T>(row: Option<T>) -> Result<T, AppError> {
    row.ok_or(AppError::NotFound("vehicle"))
}

/// Page and limit are caller-controlled; the product must not overflow.
fn page_offset(page: i64, limit: i64) -> i64 {
    page.saturating_mul(limit)
}

/// Create a vehicle with its initial image set in one transaction: a
/// half-created listing (vehicle without its submitted images) never
/// becomes visible.
pub async fn create_vehicle(
    st: &AppState,
    owner_id: Uuid,
    req: &CreateVehicleRequest,
) -> Result<VehicleDetails, AppError> {
    req.attrs.validate()?;
    validate_urls(&req.images)?;

    let mut tx = st.db.begin().await?;
    let row = repo::insert(&mut *tx, owner_id, &req.attrs).await?;
    let created =
        images::service::add_images(&mut tx, row.id, &row.brand, &row.model, &req.images).await?;
    tx.commit().await?;

    info!(vehicle_id = %row.id, owner_id = %owner_id, images = created.len(), "vehicle created");
    Ok(VehicleDetails::from_row(row, created))
}

pub async fn get_vehicle(
    st: &AppState,
    owner_id: Uuid,
    vehicle_id: Uuid,
) -> Result<VehicleDetails, AppError> {
    let row = require_owned(repo::find_owned(&st.db, vehicle_id, owner_id).await?)?;
    let images = images::repo::list_by_vehicle(&st.db, vehicle_id).await?;
    Ok(VehicleDetails::from_row(row, images))
}

pub async fn list_vehicles(
    st: &AppState,
    owner_id: Uuid,
    filter: &VehicleFilter,
) -> Result<VehicleList, AppError> {
    let limit = filter.limit.clamp(1, 100);
    let page = filter.page.max(0);
    let offset = page_offset(page, limit);

    let rows = repo::list_owned(&st.db, owner_id, filter, limit, offset).await?;
    let total = repo::count_owned(&st.db, owner_id, filter).await?;

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut by_vehicle: HashMap<Uuid, Vec<images::repo::ImageRow>> = HashMap::new();
    for image in images::repo::list_by_vehicles(&st.db, &ids).await? {
        by_vehicle.entry(image.vehicle_id).or_default().push(image);
    }

    let items = rows
        .into_iter()
        .map(|row| {
            let imgs = by_vehicle.remove(&row.id).unwrap_or_default();
            VehicleDetails::from_row(row, imgs)
        })
        .collect();

    Ok(VehicleList {
        items,
        page,
        limit,
        total,
        total_pages: (total + limit - 1) / limit,
    })
}

pub async fn delete_vehicle(
    st: &AppState,
    owner_id: Uuid,
    vehicle_id: Uuid,
) -> Result<(), AppError> {
    if !repo::delete_owned(&st.db, vehicle_id, owner_id).await? {
        return Err(AppError::NotFound("vehicle"));
    }
    info!(vehicle_id = %vehicle_id, owner_id = %owner_id, "vehicle deleted");
    Ok(())
}

/// Two-phase vehicle update.
///
/// Phase 1 updates the scalar attributes inside a transaction, scoped to the
/// owner; any failure rolls back and propagates, leaving the vehicle
/// untouched. Phase 2 reconciles the image set after the commit and outside
/// of it: an image failure can no longer undo the attribute update, and is
/// folded into the report instead of failing the call.
pub async fn update_vehicle(
    st: &AppState,
    owner_id: Uuid,
    vehicle_id: Uuid,
    req: &UpdateVehicleRequest,
) -> Result<UpdateVehicleResponse, AppError> {
    req.attrs.validate()?;
    validate_urls(&req.add_images)?;

    // Phase 1: transactional scalar update, all-or-nothing.
    let mut tx = st.db.begin().await?;
    require_owned(repo::find_owned(&mut *tx, vehicle_id, owner_id).await?)?;
    let updated =
        require_owned(repo::update_scalars(&mut *tx, vehicle_id, owner_id, &req.attrs).await?)?;
    tx.commit().await?;

    // Phase 2: best-effort image reconciliation. Failures live in the
    // report, never in the return type.
    let report = images::service::reconcile(
        &st.db,
        vehicle_id,
        &updated.brand,
        &updated.model,
        &req.add_images,
        &req.remove_images,
    )
    .await;
    if !report.errors.is_empty() {
        warn!(
            vehicle_id = %vehicle_id,
            summary = %report.summary(),
            errors = report.errors.len(),
            "image reconciliation incomplete"
        );
    }

    // Whatever image state was actually achieved; fall back to the images
    // this pass created if even the listing fails.
    let image_report = ImageReport::from(&report);
    let images = match images::repo::list_by_vehicle(&st.db, vehicle_id).await {
        Ok(list) => list,
        Err(e) => {
            error!(vehicle_id = %vehicle_id, error = %e, "image listing failed after update");
            report.created
        }
    };

    info!(vehicle_id = %vehicle_id, owner_id = %owner_id, "vehicle updated");
    Ok(UpdateVehicleResponse {
        vehicle: VehicleDetails::from_row(updated, images),
        image_report,
    })
}
