#[cfg(test)]
pub mod test_db {
    use crate::auth::Role;
    use crate::db::{
        NewAccount, NewPlan, create_account, create_plan, get_customer_by_user_id, get_plan,
        get_trainer_by_user_id, hash_password, start_subscription,
    };
    use crate::error::AppError;
    use chrono::Utc;
    use serde_json::json;
    use sqlx::{Pool, Sqlite, SqlitePool};
    use std::collections::HashMap;
    use std::sync::Once;
    use tracing::log::LevelFilter;

    static INIT: Once = Once::new();
    pub static STANDARD_PASSWORD: &str = "password123";

    #[derive(Default)]
    pub struct TestDbBuilder {
        users: Vec<TestUser>,
        plans: Vec<TestPlan>,
        subscriptions: Vec<(String, String)>,
    }

    pub struct TestUser {
        pub username: String,
        pub role: Role,
        pub verified: bool,
    }

    pub struct TestPlan {
        pub name: String,
        pub price_cents: i64,
        pub duration_days: i64,
        pub trainer_support: bool,
        pub premium_content: bool,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn customer(mut self, username: &str) -> Self {
            self.users.push(TestUser {
                username: username.to_string(),
                role: Role::Customer,
                verified: false,
            });
            self
        }

        pub fn trainer(mut self, username: &str, verified: bool) -> Self {
            self.users.push(TestUser {
                username: username.to_string(),
                role: Role::Trainer,
                verified,
            });
            self
        }

        pub fn admin(mut self, username: &str) -> Self {
            self.users.push(TestUser {
                username: username.to_string(),
                role: Role::Admin,
                verified: false,
            });
            self
        }

        pub fn plan(
            mut self,
            name: &str,
            price_cents: i64,
            duration_days: i64,
            trainer_support: bool,
            premium_content: bool,
        ) -> Self {
            self.plans.push(TestPlan {
                name: name.to_string(),
                price_cents,
                duration_days,
                trainer_support,
                premium_content,
            });
            self
        }

        /// Starts `username` on the named plan without recording a payment.
        pub fn subscribe(mut self, username: &str, plan_name: &str) -> Self {
            self.subscriptions
                .push((username.to_string(), plan_name.to_string()));
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = env_logger::builder()
                    .filter_level(LevelFilter::Debug)
                    .is_test(true)
                    .try_init();
            });

            let pool = SqlitePool::connect("sqlite::memory:").await?;

            sqlx::migrate!("./migrations").run(&pool).await?;

            let password_hash = hash_password(STANDARD_PASSWORD)?;
            let mut user_id_map = HashMap::new();
            let mut customer_id_map = HashMap::new();
            let mut trainer_id_map = HashMap::new();
            let mut plan_id_map = HashMap::new();

            for user in &self.users {
                let account = NewAccount {
                    username: user.username.clone(),
                    email: format!("{}@example.com", user.username),
                    password_hash: password_hash.clone(),
                    first_name: user.username.clone(),
                    last_name: "Test".to_string(),
                    phone: "+15551234567".to_string(),
                    address: "1 Gym Street".to_string(),
                    trainer_verified: user.verified,
                };
                let user_id = create_account(&pool, &account, user.role).await?;
                user_id_map.insert(user.username.clone(), user_id);

                match user.role {
                    Role::Customer => {
                        if let Some(customer) = get_customer_by_user_id(&pool, user_id).await? {
                            customer_id_map.insert(user.username.clone(), customer.id);
                        }
                    }
                    Role::Trainer => {
                        if let Some(trainer) = get_trainer_by_user_id(&pool, user_id).await? {
                            trainer_id_map.insert(user.username.clone(), trainer.id);
                        }
                    }
                    Role::Admin => {}
                }
            }

            for plan in &self.plans {
                let new_plan = NewPlan {
                    name: plan.name.clone(),
                    description: format!("{} plan", plan.name),
                    price_cents: plan.price_cents,
                    duration_days: plan.duration_days,
                    features: json!(["Gym access"]),
                    trainer_support: plan.trainer_support,
                    premium_content: plan.premium_content,
                    progress_tracking: true,
                    ..Default::default()
                };
                let plan_id = create_plan(&pool, &new_plan).await?;
                plan_id_map.insert(plan.name.clone(), plan_id);
            }

            for (username, plan_name) in &self.subscriptions {
                let (Some(customer_id), Some(plan_id)) =
                    (customer_id_map.get(username), plan_id_map.get(plan_name))
                else {
                    continue;
                };
                let plan = get_plan(&pool, *plan_id).await?;
                start_subscription(&pool, *customer_id, &plan, Utc::now()).await?;
            }

            Ok(TestDb {
                pool,
                user_id_map,
                customer_id_map,
                trainer_id_map,
                plan_id_map,
            })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub user_id_map: HashMap<String, i64>,
        pub customer_id_map: HashMap<String, i64>,
        pub trainer_id_map: HashMap<String, i64>,
        pub plan_id_map: HashMap<String, i64>,
    }

    impl TestDb {
        pub fn user_id(&self, username: &str) -> Option<i64> {
            self.user_id_map.get(username).copied()
        }

        pub fn customer_id(&self, username: &str) -> Option<i64> {
            self.customer_id_map.get(username).copied()
        }

        pub fn trainer_id(&self, username: &str) -> Option<i64> {
            self.trainer_id_map.get(username).copied()
        }

        pub fn plan_id(&self, name: &str) -> Option<i64> {
            self.plan_id_map.get(name).copied()
        }
    }
}

#[cfg(test)]
pub mod test_utils {
    use std::sync::Arc;

    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;
    use serde_json::json;

    use crate::api::auth::LoginResponse;
    use crate::env::AppConfig;
    use crate::init_rocket;
    use crate::mailer::MailService;
    use crate::mailer::memory::MemoryMailer;

    pub use super::test_db::{STANDARD_PASSWORD, TestDb, TestDbBuilder};

    /// Two customers, a verified and an unverified trainer, an admin, and a basic and a
    /// personal training plan. `alice` is on the personal training plan.
    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .customer("alice")
            .customer("bob")
            .trainer("tom", true)
            .trainer("newbie", false)
            .admin("root")
            .plan("Basic", 1999, 30, false, false)
            .plan("Personal", 4999, 30, true, true)
            .subscribe("alice", "Personal")
            .build()
            .await
            .expect("Failed to build test database")
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, Arc<MemoryMailer>, TestDb) {
        let mailer = Arc::new(MemoryMailer::default());
        let mail = MailService::new(mailer.clone());
        let rocket = init_rocket(test_db.pool.clone(), AppConfig::default(), mail).await;
        let client = Client::tracked(rocket)
            .await
            .expect("valid rocket instance");
        (client, mailer, test_db)
    }

    pub async fn login_test_user(client: &Client, username: &str, password: &str) {
        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "username": username,
                    "password": password
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        let login: LoginResponse = serde_json::from_str(&body).unwrap();
        assert!(login.success, "login failed for {}: {:?}", username, login.error);
    }
}
