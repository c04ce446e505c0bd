#[cfg(test)]
pub mod test_db {
    use crate::database::{connect_options, init_database};
    use crate::db::{create_task_at, get_all_categories, toggle_task};
    use crate::env::AppConfig;
    use crate::error::AppError;
    use crate::models::NewTask;
    use chrono::{Local, NaiveDateTime};
    use rocket::local::asynchronous::Client;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};
    use std::collections::HashMap;
    use std::sync::Once;

    static INIT: Once = Once::new();

    /// bcrypt's minimum cost keeps seeding fast under test.
    pub const TEST_HASH_COST: u32 = 4;

    pub fn test_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            password_hash_cost: TEST_HASH_COST,
        }
    }

    /// A single connection keeps every query on the same in-memory database.
    pub async fn test_pool() -> Result<Pool<Sqlite>, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_options(&test_config().database_url)?)
            .await?;

        Ok(pool)
    }

    #[derive(Default)]
    pub struct TestDbBuilder {
        tasks: Vec<TestTask>,
    }

    pub struct TestTask {
        pub title: String,
        pub description: Option<String>,
        pub category_name: Option<String>,
        pub due_date: Option<String>,
        pub completed: bool,
        pub created_at: Option<NaiveDateTime>,
    }

    impl TestTask {
        fn titled(title: &str) -> Self {
            Self {
                title: title.to_string(),
                description: None,
                category_name: None,
                due_date: None,
                completed: false,
                created_at: None,
            }
        }
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn task(mut self, title: &str) -> Self {
            self.tasks.push(TestTask::titled(title));
            self
        }

        pub fn task_in_category(mut self, title: &str, category_name: &str) -> Self {
            self.tasks.push(TestTask {
                category_name: Some(category_name.to_string()),
                ..TestTask::titled(title)
            });
            self
        }

        pub fn completed_task(mut self, title: &str) -> Self {
            self.tasks.push(TestTask {
                completed: true,
                ..TestTask::titled(title)
            });
            self
        }

        pub fn task_created_at(mut self, title: &str, created_at: &str) -> Self {
            let created_at = NaiveDateTime::parse_from_str(created_at, "%Y-%m-%d %H:%M:%S")
                .expect("Test timestamps use YYYY-MM-DD HH:MM:SS");
            self.tasks.push(TestTask {
                created_at: Some(created_at),
                ..TestTask::titled(title)
            });
            self
        }

        pub fn detailed_task(
            mut self,
            title: &str,
            description: &str,
            category_name: Option<&str>,
            due_date: Option<&str>,
        ) -> Self {
            self.tasks.push(TestTask {
                description: Some(description.to_string()),
                category_name: category_name.map(String::from),
                due_date: due_date.map(String::from),
                ..TestTask::titled(title)
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = env_logger::builder()
                    .parse_filters("debug")
                    .is_test(true)
                    .try_init();
            });

            let pool = test_pool().await?;
            init_database(&pool, &test_config()).await?;

            let category_id_map: HashMap<String, i64> = get_all_categories(&pool)
                .await?
                .into_iter()
                .map(|c| (c.name, c.id))
                .collect();

            let mut task_id_map: HashMap<String, i64> = HashMap::new();

            for task in self.tasks {
                let category_id = match &task.category_name {
                    Some(name) => Some(category_id_map.get(name).copied().ok_or_else(|| {
                        AppError::NotFound(format!("Seed category {} not found", name))
                    })?),
                    None => None,
                };

                let new_task = NewTask {
                    title: task.title.clone(),
                    description: task.description,
                    category_id,
                    due_date: task.due_date,
                };

                let created_at = task
                    .created_at
                    .unwrap_or_else(|| Local::now().naive_local());
                let task_id = create_task_at(&pool, new_task, created_at).await?;

                if task.completed {
                    toggle_task(&pool, task_id).await?;
                }

                task_id_map.insert(task.title, task_id);
            }

            Ok(TestDb {
                pool,
                task_id_map,
                category_id_map,
            })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub task_id_map: HashMap<String, i64>,
        pub category_id_map: HashMap<String, i64>,
    }

    impl TestDb {
        pub fn task_id(&self, title: &str) -> Option<i64> {
            self.task_id_map.get(title).copied()
        }

        pub fn category_id(&self, name: &str) -> Option<i64> {
            self.category_id_map.get(name).copied()
        }

        pub async fn task_count(&self) -> Result<i64, sqlx::Error> {
            sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
                .fetch_one(&self.pool)
                .await
        }

        pub async fn row_count(&self, table: &str) -> Result<i64, sqlx::Error> {
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&self.pool)
                .await
        }
    }

    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .task_created_at("Write report", "2025-03-01 09:00:00")
            .task_created_at("Water plants", "2025-03-02 09:00:00")
            .task_created_at("Read chapter 4", "2025-03-03 09:00:00")
            .build()
            .await
            .expect("Failed to build standard test database")
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        let figment = rocket::Config::figment().merge(("log_level", "off"));
        let rocket = crate::init_rocket(figment, test_db.pool.clone()).await;

        let client = Client::tracked(rocket)
            .await
            .expect("Failed to build Rocket test client");

        (client, test_db)
    }
}
