use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;
use crate::images::{repo::ImageRow, service::ReconcileReport};
use crate::vehicles::repo::VehicleRow;

/// Scalar attributes of a vehicle, shared by create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct VehicleAttrs {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub description: Option<String>,
}

impl VehicleAttrs {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.brand.trim().len() < 3 {
            return Err(AppError::InvalidInput("brand"));
        }
        if self.model.trim().len() < 2 {
            return Err(AppError::InvalidInput("model"));
        }
        let max_year = OffsetDateTime::now_utc().year() + 1;
        if self.year < 1900 || self.year > max_year {
            return Err(AppError::InvalidInput("year"));
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(AppError::InvalidInput("price"));
        }
        Ok(())
    }
}

pub(crate) fn validate_urls(urls: &[String]) -> Result<(), AppError> {
    for url in urls.iter().filter(|u| !u.trim().is_empty()) {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::InvalidInput("image url"));
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct CreateVehicleRequest {
    #[serde(flatten)]
    pub attrs: VehicleAttrs,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateVehicleRequest {
    #[serde(flatten)]
    pub attrs: VehicleAttrs,
    #[serde(default)]
    pub add_images: Vec<String>,
    #[serde(default)]
    pub remove_images: Vec<Uuid>,
}

/// Listing filters, all optional, always scoped to the authenticated owner.
#[derive(Debug, Default, Deserialize)]
pub struct VehicleFilter {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub keywords: Option<String>,
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageDto {
    pub id: Uuid,
    pub name: String,
    pub url: String,
}

impl From<ImageRow> for ImageDto {
    fn from(row: ImageRow) -> Self {
        Self { id: row.id, name: row.name, url: row.url }
    }
}

#[derive(Debug, Serialize)]
pub struct VehicleDetails {
    pub id: Uuid,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub description: Option<String>,
    pub images: Vec<ImageDto>,
}

impl VehicleDetails {
    pub fn from_row(row: VehicleRow, images: Vec<ImageRow>) -> Self {
        Self {
            id: row.id,
            brand: row.brand,
            model: row.model,
            year: row.year,
            price: row.price,
            description: row.description,
            images: images.into_iter().map(ImageDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VehicleList {
    pub items: Vec<VehicleDetails>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// Image-phase outcome attached to an otherwise successful update.
#[derive(Debug, Serialize)]
pub struct ImageReport {
    pub added: usize,
    pub deleted: usize,
    pub delete_requested: usize,
    pub summary: String,
    pub errors: Vec<String>,
}

impl From<&ReconcileReport> for ImageReport {
    fn from(report: &ReconcileReport) -> Self {
        Self {
            added: report.created.len(),
            deleted: report.deleted,
            delete_requested: report.delete_requested,
            summary: report.summary(),
            errors: report.errors.clone(),
        }
    }
}

/// Degraded-success shape for the two-phase update: the scalar attributes
/// are authoritative, the image report says how much of phase 2 happened.
#[derive(Debug, Serialize)]
pub struct UpdateVehicleResponse {
    pub vehicle: VehicleDetails,
    pub image_report: ImageReport,
}
