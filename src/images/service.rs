use sqlx::{PgConnection, PgPool};
use tracing::warn;
use uuid::Uuid;

use super::repo::{self, ImageRow};

/// Outcome of one reconciliation pass. Removal failures are collected per
/// item instead of aborting the batch; callers report them as a summary.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub created: Vec<ImageRow>,
    pub deleted: usize,
    pub delete_requested: usize,
    pub errors: Vec<String>,
}

impl ReconcileReport {
    pub fn summary(&self) -> String {
        format!("{} of {} images deleted", self.deleted, self.delete_requested)
    }

    /// Fold one removal outcome into the report. `Ok(false)` means the id
    /// did not belong to the vehicle or was already gone.
    fn record_removal(&mut self, vehicle_id: Uuid, id: Uuid, outcome: anyhow::Result<bool>) {
        match outcome {
            Ok(true) => self.deleted += 1,
            Ok(false) => {
                self.errors
                    .push(format!("image {id} not found for vehicle {vehicle_id}"));
            }
            Err(e) => {
                warn!(image_id = %id, vehicle_id = %vehicle_id, error = %e, "image delete failed");
                self.errors.push(format!("failed to delete image {id}: {e}"));
            }
        }
    }

    /// An insert failure ends the pass but must not erase what the removal
    /// phase already committed.
    fn record_insert_failure(&mut self, e: &anyhow::Error) {
        self.errors.push(format!("failed to add images: {e}"));
    }
}

/// Display name derived from the vehicle: brand and model with spaces
/// underscored, plus the last segment of the vehicle id.
pub fn display_name(brand: &str, model: &str, vehicle_id: Uuid) -> String {
    let id = vehicle_id.to_string();
    let tail = id.rsplit('-').next().unwrap_or("");
    format!(
        "{}-{}-{}",
        brand.replace(' ', "_"),
        model.replace(' ', "_"),
        tail
    )
}

/// Insert one image row per non-empty URL. Runs on whatever connection the
/// caller provides, so vehicle creation can call it inside its transaction.
pub async fn add_images(
    conn: &mut PgConnection,
    vehicle_id: Uuid,
    brand: &str,
    model: &str,
    urls: &[String],
) -> anyhow::Result<Vec<ImageRow>> {
    let name = display_name(brand, model, vehicle_id);
    let mut created = Vec::new();
    for url in urls.iter().filter(|u| !u.trim().is_empty()) {
        let image = repo::insert(&mut *conn, vehicle_id, &name, url).await?;
        created.push(image);
    }
    Ok(created)
}

/// One reconciliation pass: removals first, each scoped to the owning
/// vehicle and tolerant per item, then the inserts. Every failure ends up in
/// the report; removals already performed stay performed, so a later insert
/// failure never zeroes the deletion count.
pub async fn reconcile(
    db: &PgPool,
    vehicle_id: Uuid,
    brand: &str,
    model: &str,
    urls_to_add: &[String],
    ids_to_remove: &[Uuid],
) -> ReconcileReport {
    let mut report = ReconcileReport {
        delete_requested: ids_to_remove.len(),
        ..Default::default()
    };

    for &id in ids_to_remove {
        let outcome = repo::delete_scoped(db, id, vehicle_id).await;
        report.record_removal(vehicle_id, id, outcome);
    }

    if !urls_to_add.is_empty() {
        match insert_batch(db, vehicle_id, brand, model, urls_to_add).await {
            Ok(created) => report.created = created,
            Err(e) => {
                warn!(vehicle_id = %vehicle_id, error = %e, "image insert phase failed");
                report.record_insert_failure(&e);
            }
        }
    }

    report
}

async fn insert_batch(
    db: &PgPool,
    vehicle_id: Uuid,
    brand: &str,
    model: &str,
    urls: &[String],
) -> anyhow::Result<Vec<ImageRow>> {
    let mut conn = db.acquire().await?;
    add_images(&mut conn, vehicle_id, brand, model, urls).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_underscores_spaces_and_appends_id_tail() {
        let id = Uuid::parse_str("11111111-2222-3333-4444-555566667777").expect("uuid");
        assert_eq!(
            display_name("Land Rover", "Range Rover Sport", id),
            "Land_Rover-Range_Rover_Sport-555566667777"
        );
    }

    #[test]
    fn report_summary_counts_partial_failure() {
        let report = ReconcileReport {
            created: Vec::new(),
            deleted: 2,
            delete_requested: 3,
            errors: vec!["image x not found for vehicle y".into()],
        };
        assert_eq!(report.summary(), "2 of 3 images deleted");
    }

    #[test]
    fn removal_outcomes_fold_per_item() {
        let vehicle_id = Uuid::new_v4();
        let mut report = ReconcileReport {
            delete_requested: 3,
            ..Default::default()
        };

        report.record_removal(vehicle_id, Uuid::new_v4(), Ok(true));
        report.record_removal(vehicle_id, Uuid::new_v4(), Ok(true));
        report.record_removal(vehicle_id, Uuid::new_v4(), Err(anyhow::anyhow!("connection reset")));

        assert_eq!(report.deleted, 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.summary(), "2 of 3 images deleted");
    }

    #[test]
    fn missing_image_is_an_error_not_a_deletion() {
        let vehicle_id = Uuid::new_v4();
        let stray = Uuid::new_v4();
        let mut report = ReconcileReport {
            delete_requested: 1,
            ..Default::default()
        };

        report.record_removal(vehicle_id, stray, Ok(false));

        assert_eq!(report.deleted, 0);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains(&stray.to_string()));
    }

    #[test]
    fn insert_failure_keeps_removal_count() {
        let vehicle_id = Uuid::new_v4();
        let mut report = ReconcileReport {
            delete_requested: 3,
            ..Default::default()
        };
        report.record_removal(vehicle_id, Uuid::new_v4(), Ok(true));
        report.record_removal(vehicle_id, Uuid::new_v4(), Ok(true));

        report.record_insert_failure(&anyhow::anyhow!("connection reset"));

        assert_eq!(report.deleted, 2);
        assert_eq!(report.summary(), "2 of 3 images deleted");
        assert!(report.errors.iter().any(|e| e.contains("connection reset")));
    }
}
