use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

use crate::db;
use crate::error::AppError;
use crate::mailer::MailService;
use crate::models::{Customer, NotificationType, Trainer, TrainerAssignment, TrainerWorkload};

/// The trainer with the fewest active clients. On a tie the earliest entry wins, so
/// callers pass workloads in trainer id order.
pub fn pick_least_loaded(workloads: &[TrainerWorkload]) -> Option<i64> {
    let mut best: Option<&TrainerWorkload> = None;
    for workload in workloads {
        match best {
            Some(current) if workload.active_clients >= current.active_clients => {}
            _ => best = Some(workload),
        }
    }
    best.map(|w| w.trainer_id)
}

/// Assigns `trainer` to `customer`, replacing any current assignment, then tells both.
#[instrument(skip_all, fields(customer_id = customer.id, trainer_id = trainer.id))]
pub async fn assign_trainer(
    pool: &Pool<Sqlite>,
    mail: &MailService,
    customer: &Customer,
    trainer: &Trainer,
    notes: &str,
    now: DateTime<Utc>,
) -> Result<TrainerAssignment, AppError> {
    if !trainer.is_verified {
        return Err(AppError::Validation(
            "Only verified trainers can take clients".to_string(),
        ));
    }

    let assignment = db::upsert_assignment(pool, customer.id, trainer.id, notes, now).await?;

    let trainer_name = trainer.full_name();
    db::create_notification(
        pool,
        customer.id,
        "Trainer Assigned",
        &format!("{} has been assigned as your personal trainer.", trainer_name),
        NotificationType::Trainer,
    )
    .await?;

    mail.send_quietly(
        &customer.email,
        "Your personal trainer has been assigned",
        format!(
            "Hello {},\n\n{} is now your personal trainer. You can reach them from your dashboard.",
            customer.full_name(),
            trainer_name
        ),
    )
    .await;
    mail.send_quietly(
        &trainer.email,
        "New client assigned",
        format!(
            "Hello {},\n\n{} has been assigned to you as a new client.",
            trainer_name,
            customer.full_name()
        ),
    )
    .await;

    Ok(assignment)
}

/// Gives the customer the least loaded verified trainer. `None` when no trainer is
/// available; an existing active assignment is returned unchanged.
#[instrument(skip(pool, mail))]
pub async fn auto_assign_trainer(
    pool: &Pool<Sqlite>,
    mail: &MailService,
    customer_id: i64,
    now: DateTime<Utc>,
) -> Result<Option<TrainerAssignment>, AppError> {
    if let Some(existing) = db::get_active_assignment_for_customer(pool, customer_id).await? {
        info!("Customer already has a trainer");
        return Ok(Some(existing));
    }

    let workloads = db::trainer_workloads(pool).await?;
    let Some(trainer_id) = pick_least_loaded(&workloads) else {
        warn!("No verified trainers available for auto-assignment");
        return Ok(None);
    };

    let customer = db::get_customer(pool, customer_id).await?;
    let trainer = db::get_trainer(pool, trainer_id).await?;
    let assignment = assign_trainer(pool, mail, &customer, &trainer, "Auto-assigned", now).await?;

    Ok(Some(assignment))
}

/// Auto-assigns every eligible customer without a trainer. Workloads are re-read after
/// each assignment so clients spread across trainers.
#[instrument(skip(pool, mail))]
pub async fn bulk_auto_assign(
    pool: &Pool<Sqlite>,
    mail: &MailService,
    now: DateTime<Utc>,
) -> Result<Vec<TrainerAssignment>, AppError> {
    let customers = db::unassigned_support_customers(pool, now, None).await?;
    info!(count = customers.len(), "Bulk auto-assigning customers");

    let mut assigned = Vec::new();
    for customer in customers {
        let workloads = db::trainer_workloads(pool).await?;
        let Some(trainer_id) = pick_least_loaded(&workloads) else {
            warn!("Ran out of verified trainers");
            break;
        };
        let trainer = db::get_trainer(pool, trainer_id).await?;
        assigned.push(assign_trainer(pool, mail, &customer, &trainer, "Auto-assigned", now).await?);
    }

    Ok(assigned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Availability;

    fn workload(trainer_id: i64, active_clients: i64) -> TrainerWorkload {
        TrainerWorkload {
            trainer_id,
            trainer_name: format!("Trainer {}", trainer_id),
            email: String::new(),
            active_clients,
            availability: Availability::for_client_count(active_clients),
        }
    }

    #[test]
    fn test_picks_fewest_clients() {
        let workloads = vec![workload(1, 4), workload(2, 1), workload(3, 2)];
        assert_eq!(pick_least_loaded(&workloads), Some(2));
    }

    #[test]
    fn test_tie_goes_to_first_in_order() {
        let workloads = vec![workload(3, 2), workload(5, 0), workload(7, 0), workload(9, 1)];
        assert_eq!(pick_least_loaded(&workloads), Some(5));
    }

    #[test]
    fn test_no_trainers() {
        assert_eq!(pick_least_loaded(&[]), None);
    }
}
