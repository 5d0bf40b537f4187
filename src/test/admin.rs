#[cfg(test)]
mod tests {
    use crate::api::admin::{BulkAssignResponse, ShareResponse};
    use crate::db::{self, NewResource};
    use crate::models::NotificationType;
    use crate::test::test_utils::{
        STANDARD_PASSWORD, create_standard_test_db, login_test_user, setup_test_client,
    };
    use chrono::Utc;
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;
    use serde_json::{Value, json};

    async fn post_json(client: &Client, uri: &str, body: Value) -> (Status, Value) {
        let response = client
            .post(uri.to_string())
            .header(ContentType::JSON)
            .body(body.to_string())
            .dispatch()
            .await;
        let status = response.status();
        let body = response.into_string().await.unwrap_or_default();
        (status, serde_json::from_str(&body).unwrap_or(Value::Null))
    }

    async fn get_json(client: &Client, uri: &str) -> (Status, Value) {
        let response = client.get(uri.to_string()).dispatch().await;
        let status = response.status();
        let body = response.into_string().await.unwrap_or_default();
        (status, serde_json::from_str(&body).unwrap_or(Value::Null))
    }

    #[rocket::async_test]
    async fn test_dashboard_tracks_assignment_coverage() {
        let (client, _, _) = setup_test_client(create_standard_test_db().await).await;
        login_test_user(&client, "root", STANDARD_PASSWORD).await;

        let (status, dashboard) = get_json(&client, "/api/admin/dashboard").await;
        assert_eq!(status, Status::Ok);
        assert_eq!(dashboard["stats"]["total_customers"], 1);
        assert_eq!(dashboard["stats"]["assigned_customers"], 0);
        assert_eq!(dashboard["stats"]["unassigned_customers"], 1);
        assert_eq!(dashboard["stats"]["total_trainers"], 1);
        assert_eq!(dashboard["stats"]["avg_clients_per_trainer"], 0.0);
        assert_eq!(dashboard["unassigned_customers"][0]["username"], "alice");

        let response = client.post("/api/admin/assignments/auto").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let result: BulkAssignResponse =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(result.assigned_count, 1);
        assert_eq!(result.message, "Successfully assigned trainers to 1 customers.");

        let (_, dashboard) = get_json(&client, "/api/admin/dashboard").await;
        assert_eq!(dashboard["stats"]["assigned_customers"], 1);
        assert_eq!(dashboard["stats"]["unassigned_customers"], 0);
        assert_eq!(dashboard["stats"]["active_trainers"], 1);
        assert_eq!(dashboard["stats"]["avg_clients_per_trainer"], 1.0);
        assert_eq!(dashboard["trainer_workload"][0]["active_clients"], 1);
        assert_eq!(dashboard["recent_assignments"].as_array().unwrap().len(), 1);
    }

    #[rocket::async_test]
    async fn test_assignment_requires_personal_training() {
        let (client, mailer, test_db) = setup_test_client(create_standard_test_db().await).await;
        login_test_user(&client, "root", STANDARD_PASSWORD).await;
        let tom = test_db.trainer_id("tom").unwrap();

        let (status, body) = post_json(
            &client,
            &format!("/api/admin/customers/{}/assign", test_db.customer_id("bob").unwrap()),
            json!({ "trainer_id": tom }),
        )
        .await;
        assert_eq!(status, Status::UnprocessableEntity);
        assert_eq!(
            body["errors"]["customer"][0],
            "Customer does not have an active personal training subscription."
        );

        let (status, assignment) = post_json(
            &client,
            &format!("/api/admin/customers/{}/assign", test_db.customer_id("alice").unwrap()),
            json!({ "trainer_id": tom, "notes": "Prefers mornings" }),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(assignment["trainer_id"], tom);
        assert_eq!(assignment["notes"], "Prefers mornings");
        assert!(mailer.last_to("alice@example.com").is_some());
        assert!(mailer.last_to("tom@example.com").is_some());

        let (status, _) = post_json(
            &client,
            &format!("/api/admin/customers/{}/assign", test_db.customer_id("alice").unwrap()),
            json!({ "trainer_id": test_db.trainer_id("newbie").unwrap() }),
        )
        .await;
        assert_eq!(status, Status::BadRequest);
    }

    #[rocket::async_test]
    async fn test_bulk_assign_skips_ineligible_and_assigned() {
        let (client, _, test_db) = setup_test_client(create_standard_test_db().await).await;
        login_test_user(&client, "root", STANDARD_PASSWORD).await;
        let alice = test_db.customer_id("alice").unwrap();
        let bob = test_db.customer_id("bob").unwrap();

        let (status, result) = post_json(
            &client,
            "/api/admin/assignments/bulk",
            json!({
                "customer_ids": [alice, bob, 9999],
                "assignment_method": "specific",
                "specific_trainer": test_db.trainer_id("tom").unwrap()
            }),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(result["assigned_count"], 1);

        let assignment = db::get_active_assignment_for_customer(&test_db.pool, alice)
            .await
            .unwrap()
            .unwrap();
        assert!(assignment.notes.starts_with("Bulk assigned on "));

        let (_, result) = post_json(
            &client,
            "/api/admin/assignments/bulk",
            json!({ "customer_ids": [alice], "assignment_method": "auto" }),
        )
        .await;
        assert_eq!(result["assigned_count"], 0);

        let (status, _) = post_json(
            &client,
            "/api/admin/assignments/bulk",
            json!({ "customer_ids": [alice], "assignment_method": "specific" }),
        )
        .await;
        assert_eq!(status, Status::BadRequest);

        let (status, body) = post_json(
            &client,
            "/api/admin/assignments/remove",
            json!({ "customer_ids": [alice, bob] }),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["message"], "Removed trainer assignments for 1 customers.");
        assert!(
            db::get_active_assignment_for_customer(&test_db.pool, alice)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[rocket::async_test]
    async fn test_trainer_verification() {
        let test_db = crate::test::test_db::TestDbBuilder::new()
            .trainer("newbie", false)
            .trainer("dropout", false)
            .admin("root")
            .build()
            .await
            .unwrap();
        let (client, mailer, test_db) = setup_test_client(test_db).await;
        login_test_user(&client, "root", STANDARD_PASSWORD).await;

        let (_, pending) = get_json(&client, "/api/admin/trainers?verified=false").await;
        assert_eq!(pending.as_array().unwrap().len(), 2);

        let newbie = test_db.trainer_id("newbie").unwrap();
        let (status, _) = post_json(
            &client,
            &format!("/api/admin/trainers/{}/approve", newbie),
            json!({}),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(
            mailer.last_to("newbie@example.com").unwrap().subject,
            "Trainer Account Approved"
        );

        let dropout = test_db.trainer_id("dropout").unwrap();
        let (status, _) = post_json(
            &client,
            &format!("/api/admin/trainers/{}/reject", dropout),
            json!({}),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert!(!db::username_exists(&test_db.pool, "dropout").await.unwrap());

        let (status, _) = post_json(
            &client,
            &format!("/api/admin/trainers/{}/reject", newbie),
            json!({}),
        )
        .await;
        assert_eq!(status, Status::Conflict);

        login_test_user(&client, "newbie", STANDARD_PASSWORD).await;
    }

    #[rocket::async_test]
    async fn test_registration_rejection_records_reason() {
        let (client, mailer, test_db) = setup_test_client(create_standard_test_db().await).await;
        db::create_registration(
            &test_db.pool,
            "Sam Lee",
            "sam.lee@yahoo.com",
            "+923001112223",
            "45 Market Street",
            &db::hash_password("sampass123").unwrap(),
        )
        .await
        .unwrap();

        login_test_user(&client, "root", STANDARD_PASSWORD).await;
        let (_, pending) = get_json(&client, "/api/admin/registrations?status=pending").await;
        assert_eq!(pending.as_array().unwrap().len(), 1);

        let (status, registration) = post_json(
            &client,
            "/api/admin/registrations/reject",
            json!({ "email": "sam.lee@yahoo.com", "reason": "Missing certification" }),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(registration["status"], "rejected");
        assert_eq!(registration["rejection_reason"], "Missing certification");
        assert!(
            mailer
                .last_to("sam.lee@yahoo.com")
                .unwrap()
                .body
                .contains("Missing certification")
        );

        let (status, _) = post_json(
            &client,
            "/api/admin/registrations/approve",
            json!({ "email": "nobody@gmail.com" }),
        )
        .await;
        assert_eq!(status, Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_share_resource_with_eligible_customers() {
        let (client, mailer, test_db) = setup_test_client(create_standard_test_db().await).await;
        let resource_id = db::create_resource(
            &test_db.pool,
            &NewResource {
                title: "Meal Prep Guide".to_string(),
                description: "Weekly plans".to_string(),
                external_url: Some("https://example.com/meal-prep.pdf".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let alice = test_db.customer_id("alice").unwrap();
        let bob = test_db.customer_id("bob").unwrap();

        login_test_user(&client, "root", STANDARD_PASSWORD).await;
        let response = client
            .post(format!("/api/admin/resources/{}/share", resource_id))
            .header(ContentType::JSON)
            .body(
                json!({
                    "customer_ids": [alice, bob],
                    "message": "Start with week one",
                    "notify_email": true
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let result: ShareResponse =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(result.shared_count, 1);
        assert_eq!(result.message, "Resource shared with 1 customers.");

        let notifications = db::list_notifications(&test_db.pool, alice, false, 10, 0)
            .await
            .unwrap();
        assert_eq!(notifications[0].title, "New Resource Shared");
        assert_eq!(
            notifications[0].message,
            "New resource shared: Meal Prep Guide\n\nMessage from admin: Start with week one"
        );
        assert_eq!(notifications[0].notification_type, NotificationType::General);
        assert_eq!(
            mailer.last_to("alice@example.com").unwrap().subject,
            "New Resource: Meal Prep Guide"
        );
        assert!(mailer.last_to("bob@example.com").is_none());
    }

    #[rocket::async_test]
    async fn test_facilitated_message_needs_assignment() {
        let (client, _, test_db) = setup_test_client(create_standard_test_db().await).await;
        let alice = test_db.customer_id("alice").unwrap();
        let tom = test_db.trainer_id("tom").unwrap();
        login_test_user(&client, "root", STANDARD_PASSWORD).await;

        let uri = format!("/api/admin/messages/{}/{}", alice, tom);
        let body = json!({ "subject": "Schedule", "message": "Please confirm Friday." });

        let (status, response) = post_json(&client, &uri, body.clone()).await;
        assert_eq!(status, Status::UnprocessableEntity);
        assert_eq!(
            response["errors"]["assignment"][0],
            "No active assignment found between this customer and trainer."
        );

        db::upsert_assignment(&test_db.pool, alice, tom, "", Utc::now())
            .await
            .unwrap();
        let (status, message) = post_json(&client, &uri, body).await;
        assert_eq!(status, Status::Ok);
        assert_eq!(message["subject"], "[Admin] Schedule");
        assert_eq!(
            message["message"],
            "Message facilitated by admin:\n\nPlease confirm Friday."
        );

        let (_, conversation) = get_json(&client, &uri).await;
        assert_eq!(conversation.as_array().unwrap().len(), 1);
    }

    #[rocket::async_test]
    async fn test_bulk_notification_state() {
        let (client, _, test_db) = setup_test_client(create_standard_test_db().await).await;
        let alice = test_db.customer_id("alice").unwrap();
        let mut ids = Vec::new();
        for title in ["One", "Two"] {
            ids.push(
                db::create_notification(&test_db.pool, alice, title, "body", NotificationType::General)
                    .await
                    .unwrap(),
            );
        }

        login_test_user(&client, "root", STANDARD_PASSWORD).await;
        let (status, body) =
            post_json(&client, "/api/admin/notifications/read", json!({ "ids": ids })).await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["message"], "2 notifications marked as read.");
        assert_eq!(db::count_unread_notifications(&test_db.pool, alice).await.unwrap(), 0);

        let (_, body) = post_json(
            &client,
            "/api/admin/notifications/unread",
            json!({ "ids": [ids[0]] }),
        )
        .await;
        assert_eq!(body["message"], "1 notifications marked as unread.");

        let (status, _) =
            post_json(&client, "/api/admin/notifications/sideways", json!({ "ids": [] })).await;
        assert_eq!(status, Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_catalog_management() {
        let (client, _, _) = setup_test_client(create_standard_test_db().await).await;
        login_test_user(&client, "root", STANDARD_PASSWORD).await;

        let (status, plan) = post_json(
            &client,
            "/api/admin/plans",
            json!({
                "name": "Annual Elite",
                "price": 499.0,
                "duration_days": 365,
                "trainer_support": true,
                "features": ["Unlimited sessions"]
            }),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(plan["name"], "Annual Elite");
        assert_eq!(plan["trainer_support"], true);

        let (status, _) = post_json(
            &client,
            "/api/admin/plans",
            json!({ "name": "", "price": -1.0, "duration_days": 30 }),
        )
        .await;
        assert_eq!(status, Status::UnprocessableEntity);

        let (status, category) =
            post_json(&client, "/api/admin/categories", json!({ "name": "Nutrition" })).await;
        assert_eq!(status, Status::Ok);
        let (status, _) =
            post_json(&client, "/api/admin/categories", json!({ "name": "Nutrition" })).await;
        assert_eq!(status, Status::Conflict);

        let (status, _) = post_json(
            &client,
            "/api/admin/resources",
            json!({
                "title": "Macro Basics",
                "resource_type": "link",
                "category_id": category["id"],
                "external_url": "https://example.com/macros"
            }),
        )
        .await;
        assert_eq!(status, Status::Ok);

        let (status, _) = post_json(
            &client,
            "/api/admin/resources",
            json!({ "title": "Broken", "external_url": "not a url" }),
        )
        .await;
        assert_eq!(status, Status::UnprocessableEntity);

        login_test_user(&client, "alice", STANDARD_PASSWORD).await;
        let (_, plans) = get_json(&client, "/api/customer/plans").await;
        assert!(
            plans
                .as_array()
                .unwrap()
                .iter()
                .any(|p| p["name"] == "Annual Elite")
        );
    }
}
