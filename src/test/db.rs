#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::assignment::{auto_assign_trainer, bulk_auto_assign};
    use crate::db::{self, CustomerFilter, NewPayment, NewSession, ProgressEntry};
    use crate::error::AppError;
    use crate::mailer::MailService;
    use crate::mailer::memory::MemoryMailer;
    use crate::models::{PaymentMethod, PaymentStatus, RegistrationStatus, SessionType};
    use crate::test::test_db::TestDbBuilder;
    use chrono::{Duration, NaiveTime, Utc};
    use rocket::tokio;

    fn quiet_mail() -> MailService {
        MailService::new(Arc::new(MemoryMailer::default()))
    }

    fn personal_plan(builder: TestDbBuilder) -> TestDbBuilder {
        builder.plan("Personal", 4999, 30, true, true)
    }

    #[tokio::test]
    async fn test_auto_assign_prefers_lowest_id_on_ties() {
        let test_db = personal_plan(TestDbBuilder::new())
            .trainer("first", true)
            .trainer("second", true)
            .trainer("pending", false)
            .customer("c1")
            .subscribe("c1", "Personal")
            .build()
            .await
            .unwrap();

        let assignment = auto_assign_trainer(
            &test_db.pool,
            &quiet_mail(),
            test_db.customer_id("c1").unwrap(),
            Utc::now(),
        )
        .await
        .unwrap()
        .expect("a verified trainer should be picked");
        assert_eq!(assignment.trainer_id, test_db.trainer_id("first").unwrap());

        // A second call returns the existing assignment.
        let again = auto_assign_trainer(
            &test_db.pool,
            &quiet_mail(),
            test_db.customer_id("c1").unwrap(),
            Utc::now(),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(again.id, assignment.id);
    }

    #[tokio::test]
    async fn test_auto_assign_without_verified_trainers() {
        let test_db = personal_plan(TestDbBuilder::new())
            .trainer("pending", false)
            .customer("c1")
            .subscribe("c1", "Personal")
            .build()
            .await
            .unwrap();

        let result = auto_assign_trainer(
            &test_db.pool,
            &quiet_mail(),
            test_db.customer_id("c1").unwrap(),
            Utc::now(),
        )
        .await
        .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_bulk_auto_assign_spreads_clients() {
        let test_db = personal_plan(TestDbBuilder::new())
            .plan("Basic", 1999, 30, false, false)
            .trainer("first", true)
            .trainer("second", true)
            .customer("c1")
            .customer("c2")
            .customer("c3")
            .customer("basic")
            .subscribe("c1", "Personal")
            .subscribe("c2", "Personal")
            .subscribe("c3", "Personal")
            .subscribe("basic", "Basic")
            .build()
            .await
            .unwrap();

        let assigned = bulk_auto_assign(&test_db.pool, &quiet_mail(), Utc::now())
            .await
            .unwrap();
        assert_eq!(assigned.len(), 3);

        let workloads = db::trainer_workloads(&test_db.pool).await.unwrap();
        let mut loads: Vec<i64> = workloads.iter().map(|w| w.active_clients).collect();
        loads.sort();
        assert_eq!(loads, vec![1, 2]);

        assert!(
            db::get_active_assignment_for_customer(
                &test_db.pool,
                test_db.customer_id("basic").unwrap()
            )
            .await
            .unwrap()
            .is_none()
        );
        assert_eq!(db::count_active_assignments(&test_db.pool).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_expire_subscriptions_deactivates_lapsed() {
        let test_db = personal_plan(TestDbBuilder::new())
            .customer("lapsed")
            .customer("current")
            .subscribe("current", "Personal")
            .build()
            .await
            .unwrap();
        let plan = db::get_plan(&test_db.pool, test_db.plan_id("Personal").unwrap())
            .await
            .unwrap();
        let lapsed = test_db.customer_id("lapsed").unwrap();
        db::start_subscription(&test_db.pool, lapsed, &plan, Utc::now() - Duration::days(60))
            .await
            .unwrap();

        let expired = db::expire_subscriptions(&test_db.pool, Utc::now()).await.unwrap();
        assert_eq!(expired, 1);

        let subscription = db::get_subscription(&test_db.pool, lapsed)
            .await
            .unwrap()
            .unwrap();
        assert!(!subscription.is_active);
        let current = db::get_subscription(&test_db.pool, test_db.customer_id("current").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(current.is_active);
    }

    #[tokio::test]
    async fn test_progress_upsert_keeps_weight() {
        let test_db = TestDbBuilder::new().customer("c1").build().await.unwrap();
        let customer_id = test_db.customer_id("c1").unwrap();
        let today = Utc::now().date_naive();

        db::upsert_progress(
            &test_db.pool,
            customer_id,
            &ProgressEntry {
                date: today,
                weight: Some(80.0),
                bmi: Some(24.7),
                sessions_attended: 1,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let merged = db::upsert_progress(
            &test_db.pool,
            customer_id,
            &ProgressEntry {
                date: today,
                sessions_attended: 3,
                customer_notes: "Leg day".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(merged.weight, Some(80.0));
        assert_eq!(merged.bmi, Some(24.7));
        assert_eq!(merged.sessions_attended, 3);
        assert_eq!(merged.customer_notes, "Leg day");
        assert_eq!(db::count_progress(&test_db.pool, customer_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_double_booking_is_conflict() {
        let test_db = TestDbBuilder::new()
            .trainer("coach", true)
            .customer("c1")
            .customer("c2")
            .build()
            .await
            .unwrap();
        let trainer_id = test_db.trainer_id("coach").unwrap();
        let slot = |customer_id| NewSession {
            trainer_id,
            customer_id,
            session_date: Utc::now().date_naive() + Duration::days(2),
            session_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            duration_minutes: 45,
            session_type: SessionType::Personal,
            notes: String::new(),
        };

        db::create_session(&test_db.pool, &slot(test_db.customer_id("c1").unwrap()))
            .await
            .unwrap();
        let second = db::create_session(&test_db.pool, &slot(test_db.customer_id("c2").unwrap())).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_approve_registration_creates_verified_trainer() {
        let test_db = TestDbBuilder::new().admin("root").build().await.unwrap();
        db::create_registration(
            &test_db.pool,
            "Maria Gomez",
            "maria@gmail.com",
            "+923004445556",
            "8 Park Lane",
            &db::hash_password("mariapass1").unwrap(),
        )
        .await
        .unwrap();

        let duplicate = db::create_registration(
            &test_db.pool,
            "Maria Gomez",
            "maria@gmail.com",
            "+923004445556",
            "8 Park Lane",
            "hash",
        )
        .await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));

        let registration =
            db::approve_registration(&test_db.pool, "maria@gmail.com", test_db.user_id("root").unwrap())
                .await
                .unwrap();
        assert_eq!(registration.status, RegistrationStatus::Approved);

        let user_id = registration.user_id.expect("approval links the new user");
        let trainer = db::get_trainer_by_user_id(&test_db.pool, user_id)
            .await
            .unwrap()
            .expect("approved registration has a trainer profile");
        assert!(trainer.is_verified);
        assert_eq!(trainer.first_name, "Maria");
        assert_eq!(trainer.last_name, "Gomez");
        assert!(db::username_exists(&test_db.pool, "maria@gmail.com").await.unwrap());

        let again =
            db::approve_registration(&test_db.pool, "maria@gmail.com", test_db.user_id("root").unwrap())
                .await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_list_customers_filters() {
        let test_db = personal_plan(TestDbBuilder::new())
            .plan("Basic", 1999, 30, false, false)
            .customer("pt")
            .customer("basic")
            .customer("none")
            .subscribe("pt", "Personal")
            .subscribe("basic", "Basic")
            .build()
            .await
            .unwrap();

        let names = |customers: Vec<crate::models::Customer>| {
            let mut names: Vec<String> = customers.into_iter().map(|c| c.username).collect();
            names.sort();
            names
        };

        let active = db::list_customers(&test_db.pool, Some(CustomerFilter::Active), None)
            .await
            .unwrap();
        assert_eq!(names(active), vec!["basic", "pt"]);

        let training =
            db::list_customers(&test_db.pool, Some(CustomerFilter::PersonalTraining), None)
                .await
                .unwrap();
        assert_eq!(names(training), vec!["pt"]);

        let none = db::list_customers(&test_db.pool, Some(CustomerFilter::NoSubscription), None)
            .await
            .unwrap();
        assert_eq!(names(none), vec!["none"]);

        let searched = db::list_customers(&test_db.pool, None, Some("BAS"))
            .await
            .unwrap();
        assert_eq!(names(searched), vec!["basic"]);
    }

    #[tokio::test]
    async fn test_failed_payment_leaves_no_subscription() {
        let test_db = personal_plan(TestDbBuilder::new())
            .customer("c1")
            .customer("c2")
            .build()
            .await
            .unwrap();
        let plan = db::get_plan(&test_db.pool, test_db.plan_id("Personal").unwrap())
            .await
            .unwrap();
        let payment = NewPayment {
            amount_cents: plan.price_cents,
            payment_method: PaymentMethod::Card,
            status: PaymentStatus::Completed,
            transaction_id: "TXN_FIXED".to_string(),
            payment_date: Utc::now(),
            notes: String::new(),
        };

        let c1 = test_db.customer_id("c1").unwrap();
        let subscription = db::start_paid_subscription(&test_db.pool, c1, &plan, &payment, Utc::now())
            .await
            .unwrap();
        assert!(subscription.is_active);
        assert_eq!(db::count_payments(&test_db.pool, c1).await.unwrap(), 1);

        // Reusing the transaction id makes the payment insert fail.
        let c2 = test_db.customer_id("c2").unwrap();
        let clash = db::start_paid_subscription(&test_db.pool, c2, &plan, &payment, Utc::now()).await;
        assert!(clash.is_err());
        assert!(db::get_subscription(&test_db.pool, c2).await.unwrap().is_none());
        assert_eq!(db::count_payments(&test_db.pool, c2).await.unwrap(), 0);
    }
}
