#[cfg(test)]
mod tests {
    use crate::api::trainer::DashboardUpdates;
    use crate::db;
    use crate::test::test_db::TestDb;
    use crate::test::test_utils::{
        STANDARD_PASSWORD, create_standard_test_db, login_test_user, setup_test_client,
    };
    use chrono::{Duration, Utc};
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

    /// Standard data with `alice` assigned to `tom`.
    async fn with_alice_assigned() -> TestDb {
        let test_db = create_standard_test_db().await;
        db::upsert_assignment(
            &test_db.pool,
            test_db.customer_id("alice").unwrap(),
            test_db.trainer_id("tom").unwrap(),
            "Test assignment",
            Utc::now(),
        )
        .await
        .expect("Failed to assign trainer");
        test_db
    }

    fn tomorrow() -> String {
        (Utc::now().date_naive() + Duration::days(1)).to_string()
    }

    #[rocket::async_test]
    async fn test_schedule_session_and_conflict() {
        let (client, _, test_db) = setup_test_client(with_alice_assigned().await).await;
        login_test_user(&client, "tom", STANDARD_PASSWORD).await;
        let alice = test_db.customer_id("alice").unwrap();

        let request = json!({
            "customer_id": alice,
            "session_date": tomorrow(),
            "session_time": "09:30",
            "session_type": "assessment"
        });

        let (status, session) = post_json(&client, "/api/trainer/schedule", request.clone()).await;
        assert_eq!(status, Status::Ok);
        assert_eq!(session["status"], "scheduled");
        assert_eq!(session["duration_minutes"], 60);

        let (status, body) = post_json(&client, "/api/trainer/schedule", request).await;
        assert_eq!(status, Status::Conflict);
        assert_eq!(
            body["errors"]["conflict"][0],
            "You already have a session scheduled at this time."
        );

        let notifications = db::list_notifications(&test_db.pool, alice, false, 10, 0)
            .await
            .unwrap();
        assert_eq!(notifications[0].title, "New Session Scheduled");
        assert!(
            notifications[0]
                .message
                .ends_with(&format!("assessment session for {} at 09:30.", tomorrow()))
        );

        let response = client.get("/api/trainer/dashboard-updates").dispatch().await;
        let updates: DashboardUpdates =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(updates.upcoming_sessions, 1);
        assert_eq!(updates.total_clients, 1);
    }

    #[rocket::async_test]
    async fn test_cannot_schedule_for_someone_elses_client() {
        let (client, _, test_db) = setup_test_client(with_alice_assigned().await).await;
        login_test_user(&client, "tom", STANDARD_PASSWORD).await;

        let (status, body) = post_json(
            &client,
            "/api/trainer/schedule",
            json!({
                "customer_id": test_db.customer_id("bob").unwrap(),
                "session_date": tomorrow(),
                "session_time": "10:00"
            }),
        )
        .await;
        assert_eq!(status, Status::Forbidden);
        assert_eq!(body["errors"]["client"][0], "You are not assigned to this client.");

        let (status, _) = get_json(
            &client,
            &format!("/api/trainer/clients/{}", test_db.customer_id("bob").unwrap()),
        )
        .await;
        assert_eq!(status, Status::Forbidden);
    }

    #[rocket::async_test]
    async fn test_schedule_rejects_bad_input() {
        let (client, _, test_db) = setup_test_client(with_alice_assigned().await).await;
        login_test_user(&client, "tom", STANDARD_PASSWORD).await;
        let alice = test_db.customer_id("alice").unwrap();

        let (status, body) = post_json(
            &client,
            "/api/trainer/schedule",
            json!({ "customer_id": alice, "session_date": "31/12/2030", "session_time": "10:00" }),
        )
        .await;
        assert_eq!(status, Status::UnprocessableEntity);
        assert_eq!(body["errors"]["session_date"][0], "Invalid date or time format.");

        let (status, _) = post_json(
            &client,
            "/api/trainer/schedule",
            json!({
                "customer_id": alice,
                "session_date": tomorrow(),
                "session_time": "10:00",
                "duration_minutes": 5
            }),
        )
        .await;
        assert_eq!(status, Status::UnprocessableEntity);
    }

    #[rocket::async_test]
    async fn test_session_status_updates_notify_client() {
        let (client, _, test_db) = setup_test_client(with_alice_assigned().await).await;
        login_test_user(&client, "tom", STANDARD_PASSWORD).await;
        let alice = test_db.customer_id("alice").unwrap();

        let (_, session) = post_json(
            &client,
            "/api/trainer/schedule",
            json!({ "customer_id": alice, "session_date": tomorrow(), "session_time": "18:00" }),
        )
        .await;
        let session_id = session["id"].as_i64().unwrap();

        let (status, _) = post_json(
            &client,
            &format!("/api/trainer/sessions/{}/status", session_id),
            json!({ "status": "no_show" }),
        )
        .await;
        assert_eq!(status, Status::BadRequest);

        let (status, _) = post_json(
            &client,
            &format!("/api/trainer/sessions/{}/status", session_id),
            json!({ "status": "cancelled" }),
        )
        .await;
        assert_eq!(status, Status::Ok);

        let notifications = db::list_notifications(&test_db.pool, alice, false, 10, 0)
            .await
            .unwrap();
        assert_eq!(notifications[0].title, "Session Cancelled");

        // A cancelled session no longer blocks its slot for a fresh booking check.
        assert!(
            !db::slot_taken(
                &test_db.pool,
                test_db.trainer_id("tom").unwrap(),
                Utc::now().date_naive() + Duration::days(1),
                chrono::NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            )
            .await
            .unwrap()
        );

        let (status, _) = post_json(
            &client,
            "/api/trainer/sessions/9999/status",
            json!({ "status": "completed" }),
        )
        .await;
        assert_eq!(status, Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_messages_reach_the_client() {
        let (client, _, test_db) = setup_test_client(with_alice_assigned().await).await;
        login_test_user(&client, "tom", STANDARD_PASSWORD).await;

        let (status, sent) = post_json(
            &client,
            "/api/trainer/messages",
            json!({
                "customer_id": test_db.customer_id("alice").unwrap(),
                "subject": "Week 1 plan",
                "message": "Three sessions this week."
            }),
        )
        .await;
        assert_eq!(status, Status::Ok);
        let message_id = sent["message_id"].as_i64().unwrap();

        let (status, _) = post_json(
            &client,
            "/api/trainer/messages",
            json!({
                "customer_id": test_db.customer_id("alice").unwrap(),
                "subject": "",
                "message": "No subject"
            }),
        )
        .await;
        assert_eq!(status, Status::UnprocessableEntity);

        login_test_user(&client, "alice", STANDARD_PASSWORD).await;
        let (_, inbox) = get_json(&client, "/api/customer/messages").await;
        assert_eq!(inbox["counts"]["unread"], 1);
        assert_eq!(inbox["messages"]["items"][0]["subject"], "Week 1 plan");

        let (status, message) = post_json(
            &client,
            &format!("/api/customer/messages/{}/read", message_id),
            json!({}),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(message["is_read"], true);
    }

    #[rocket::async_test]
    async fn test_client_list_and_search() {
        let (client, _, _) = setup_test_client(with_alice_assigned().await).await;
        login_test_user(&client, "tom", STANDARD_PASSWORD).await;

        let (status, body) = get_json(&client, "/api/trainer/clients").await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["clients"]["total"], 1);

        let (_, body) = get_json(&client, "/api/trainer/clients?search=zzz").await;
        assert_eq!(body["clients"]["total"], 0);
    }

    #[rocket::async_test]
    async fn test_profile_update_stores_hourly_rate() {
        let (client, _, _) = setup_test_client(create_standard_test_db().await).await;
        login_test_user(&client, "tom", STANDARD_PASSWORD).await;

        let response = client
            .put("/api/trainer/profile")
            .header(ContentType::JSON)
            .body(
                json!({
                    "first_name": "Tom",
                    "last_name": "Hardy",
                    "email": "tom@example.com",
                    "bio": "Strength coach",
                    "experience_years": 7,
                    "hourly_rate": 45.5
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let trainer: Value = serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(trainer["hourly_rate"], 45.5);
        assert_eq!(trainer["experience_years"], 7);
    }
}
