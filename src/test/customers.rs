#[cfg(test)]
mod tests {
    use crate::api::customer::{SubscriptionStatus, UnreadCount};
    use crate::db::{self, NewResource};
    use crate::models::ResourceType;
    use crate::test::test_utils::{
        STANDARD_PASSWORD, create_standard_test_db, login_test_user, setup_test_client,
    };
    use chrono::Utc;
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;
    use serde_json::{Value, json};

    async fn get_json(client: &Client, uri: &str) -> (Status, Value) {
        let response = client.get(uri.to_string()).dispatch().await;
        let status = response.status();
        let body = response.into_string().await.unwrap_or_default();
        (status, serde_json::from_str(&body).unwrap_or(Value::Null))
    }

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

    #[rocket::async_test]
    async fn test_subscribing_to_trainer_plan_assigns_a_trainer() {
        let (client, mailer, test_db) = setup_test_client(create_standard_test_db().await).await;
        login_test_user(&client, "bob", STANDARD_PASSWORD).await;
        let plan_id = test_db.plan_id("Personal").unwrap();

        let (status, body) = post_json(
            &client,
            &format!("/api/customer/subscription/subscribe/{}", plan_id),
            json!({}),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["message"], "Successfully subscribed to Personal!");
        assert_eq!(
            body["trainer_assignment"]["trainer_id"],
            test_db.trainer_id("tom").unwrap()
        );
        assert!(
            body["payment_transaction_id"]
                .as_str()
                .unwrap()
                .starts_with("TXN")
        );

        let subjects: Vec<String> = mailer.sent().into_iter().map(|e| e.subject).collect();
        assert!(subjects.contains(&"Your personal trainer has been assigned".to_string()));
        assert!(subjects.contains(&"New client assigned".to_string()));

        let (_, payments) = get_json(&client, "/api/customer/payments").await;
        assert_eq!(payments["payments"]["total"], 1);
        assert_eq!(payments["totals"]["total_amount"], 49.99);

        let response = client.get("/api/customer/notifications/count").dispatch().await;
        let unread: UnreadCount =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(unread.count, 2);
    }

    #[rocket::async_test]
    async fn test_basic_plan_has_no_trainer() {
        let (client, _, test_db) = setup_test_client(create_standard_test_db().await).await;
        login_test_user(&client, "bob", STANDARD_PASSWORD).await;

        let (status, body) = post_json(
            &client,
            &format!(
                "/api/customer/subscription/subscribe/{}",
                test_db.plan_id("Basic").unwrap()
            ),
            json!({}),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert!(body["trainer_assignment"].is_null());

        let (status, info) = get_json(&client, "/api/customer/trainer").await;
        assert_eq!(status, Status::Ok);
        assert!(info["trainer_assignment"].is_null());

        let (status, _) =
            post_json(&client, "/api/customer/subscription/subscribe/9999", json!({})).await;
        assert_eq!(status, Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_cancel_keeps_access_until_end() {
        let (client, _, _) = setup_test_client(create_standard_test_db().await).await;

        login_test_user(&client, "bob", STANDARD_PASSWORD).await;
        let (status, _) = post_json(&client, "/api/customer/subscription/cancel", json!({})).await;
        assert_eq!(status, Status::NotFound);

        login_test_user(&client, "alice", STANDARD_PASSWORD).await;
        let (status, _) = post_json(&client, "/api/customer/subscription/cancel", json!({})).await;
        assert_eq!(status, Status::Ok);

        let (_, body) = get_json(&client, "/api/customer/subscription").await;
        assert_eq!(body["subscription"]["auto_renew"], false);

        let response = client.get("/api/customer/subscription/status").dispatch().await;
        let status: SubscriptionStatus =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert!(status.has_subscription);
        assert_eq!(status.plan_name.as_deref(), Some("Personal"));
        assert_eq!(status.is_expired, Some(false));

        let (_, body) = post_json(&client, "/api/customer/subscription/auto-renew", json!({})).await;
        assert_eq!(body["message"], "Auto-renewal has been enabled.");
    }

    #[rocket::async_test]
    async fn test_goal_lifecycle() {
        let (client, _, _) = setup_test_client(create_standard_test_db().await).await;
        login_test_user(&client, "alice", STANDARD_PASSWORD).await;

        let (status, goal) = post_json(
            &client,
            "/api/customer/goals",
            json!({
                "title": "Run 10k",
                "goal_type": "endurance",
                "target_value": 10.0,
                "unit": "km"
            }),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(goal["status"], "active");
        let goal_id = goal["id"].as_i64().unwrap();

        let (status, body) = post_json(
            &client,
            &format!("/api/customer/goals/{}/progress", goal_id),
            json!({ "current_value": 4.0 }),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["completed"], false);

        let (_, overview) = get_json(&client, "/api/customer/goals").await;
        assert_eq!(overview["stats"]["avg_progress"], 40.0);

        let (status, body) = post_json(
            &client,
            &format!("/api/customer/goals/{}/progress", goal_id),
            json!({ "current_value": 10.5 }),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["completed"], true);
        assert_eq!(body["goal"]["status"], "completed");

        let (status, _) = post_json(
            &client,
            &format!("/api/customer/goals/{}/pause", goal_id),
            json!({}),
        )
        .await;
        assert_eq!(status, Status::BadRequest);

        let (_, notifications) = get_json(&client, "/api/customer/notifications").await;
        assert_eq!(
            notifications["notifications"]["items"][0]["title"],
            "Goal Completed!"
        );

        let (_, overview) = get_json(&client, "/api/customer/goals?status=completed").await;
        assert_eq!(overview["goals"].as_array().unwrap().len(), 1);

        let response = client
            .delete(format!("/api/customer/goals/{}", goal_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let (_, overview) = get_json(&client, "/api/customer/goals").await;
        assert_eq!(overview["stats"]["total_goals"], 0);
    }

    #[rocket::async_test]
    async fn test_goal_pause_resume_and_progress_share_a_path() {
        let (client, _, _) = setup_test_client(create_standard_test_db().await).await;
        login_test_user(&client, "alice", STANDARD_PASSWORD).await;
        let (_, goal) = post_json(
            &client,
            "/api/customer/goals",
            json!({ "title": "Squat 100kg", "target_value": 100.0, "unit": "kg" }),
        )
        .await;
        let goal_id = goal["id"].as_i64().unwrap();

        let (status, body) = post_json(
            &client,
            &format!("/api/customer/goals/{}/pause", goal_id),
            json!({}),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["status"], "paused");

        let (status, body) = post_json(
            &client,
            &format!("/api/customer/goals/{}/resume", goal_id),
            json!({}),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["status"], "active");

        let (status, body) = post_json(
            &client,
            &format!("/api/customer/goals/{}/progress", goal_id),
            json!({ "current_value": 60.0 }),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["completed"], false);

        let (status, body) = post_json(
            &client,
            &format!("/api/customer/goals/{}/stretch", goal_id),
            json!({}),
        )
        .await;
        assert_eq!(status, Status::BadRequest);
        assert_eq!(body["errors"]["action"][0], "Unknown goal action");
    }

    #[rocket::async_test]
    async fn test_goals_are_private_to_their_owner() {
        let (client, _, _) = setup_test_client(create_standard_test_db().await).await;
        login_test_user(&client, "alice", STANDARD_PASSWORD).await;
        let (_, goal) = post_json(&client, "/api/customer/goals", json!({ "title": "Stretch" })).await;
        let goal_id = goal["id"].as_i64().unwrap();

        login_test_user(&client, "bob", STANDARD_PASSWORD).await;
        let (status, _) = post_json(
            &client,
            &format!("/api/customer/goals/{}/pause", goal_id),
            json!({}),
        )
        .await;
        assert_eq!(status, Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_progress_entries_merge_by_date() {
        let (client, _, _) = setup_test_client(create_standard_test_db().await).await;
        login_test_user(&client, "alice", STANDARD_PASSWORD).await;
        let today = Utc::now().date_naive().to_string();

        let (status, _) = post_json(
            &client,
            "/api/customer/progress",
            json!({ "date": today, "weight": 72.5, "sessions_attended": 1 }),
        )
        .await;
        assert_eq!(status, Status::Ok);

        let (status, _) = post_json(
            &client,
            "/api/customer/progress",
            json!({ "date": today, "sessions_attended": 2, "customer_notes": "Felt good" }),
        )
        .await;
        assert_eq!(status, Status::Ok);

        let (_, overview) = get_json(&client, "/api/customer/progress").await;
        assert_eq!(overview["total_entries"], 1);
        assert_eq!(overview["total_sessions"], 2);
        assert_eq!(overview["latest_weight"], 72.5);

        let (status, body) = post_json(
            &client,
            "/api/customer/progress",
            json!({ "date": today, "weight": 900.0 }),
        )
        .await;
        assert_eq!(status, Status::UnprocessableEntity);
        assert_eq!(body["errors"]["weight"][0], "Weight must be between 0 and 500 kg");
    }

    #[rocket::async_test]
    async fn test_premium_resources_need_premium_plan() {
        let (client, _, test_db) = setup_test_client(create_standard_test_db().await).await;

        let premium = db::create_resource(
            &test_db.pool,
            &NewResource {
                title: "Advanced Mobility".to_string(),
                resource_type: ResourceType::Video,
                external_url: Some("https://videos.example.com/mobility".to_string()),
                is_premium: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let empty = db::create_resource(
            &test_db.pool,
            &NewResource {
                title: "Placeholder".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        login_test_user(&client, "bob", STANDARD_PASSWORD).await;
        let (_, library) = get_json(&client, "/api/customer/resources").await;
        assert_eq!(library["has_premium_access"], false);
        assert!(
            library["resources"]
                .as_array()
                .unwrap()
                .iter()
                .all(|r| r["is_premium"] == false)
        );

        let response = client
            .get(format!("/api/customer/resources/{}/download", premium))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);

        login_test_user(&client, "alice", STANDARD_PASSWORD).await;
        let response = client
            .get(format!("/api/customer/resources/{}/download", premium))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(
            response.headers().get_one("Location"),
            Some("https://videos.example.com/mobility")
        );

        let response = client
            .get(format!("/api/customer/resources/{}/download", empty))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_delete_account_requires_confirmation() {
        let (client, _, test_db) = setup_test_client(create_standard_test_db().await).await;
        login_test_user(&client, "bob", STANDARD_PASSWORD).await;

        let (status, _) = post_json(
            &client,
            "/api/customer/account/delete",
            json!({ "confirmation": "delete" }),
        )
        .await;
        assert_eq!(status, Status::UnprocessableEntity);

        let (status, _) = post_json(
            &client,
            "/api/customer/account/delete",
            json!({ "confirmation": "DELETE" }),
        )
        .await;
        assert_eq!(status, Status::Ok);

        assert!(!db::username_exists(&test_db.pool, "bob").await.unwrap());
        let (status, _) = get_json(&client, "/api/customer/dashboard").await;
        assert_eq!(status, Status::Unauthorized);
    }
}
