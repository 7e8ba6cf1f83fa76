use dotenv::dotenv;
use lazy_static::lazy_static;
use rand::{Rng, thread_rng};
use sqlx::{Connection, PgConnection, PgPool};
use std::env;
use std::future::Future;
use todo_rest::persistence;
use tokio::runtime::Runtime;

lazy_static! {
    static ref TOKIO_RT: Runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Tokio runtime failed to initialize");
}

const SCHEMA: &str = include_str!("../../db/schema.sql");

/// A scratch database carrying the service schema. It gets dropped along with this value,
/// even when the test using it panics.
struct TestDatabase {
    base_url: String,
    db_name: String,
}

impl TestDatabase {
    async fn create(base_url: &str) -> Result<Self, sqlx::Error> {
        let db_id: u32 = thread_rng().gen_range(10_000..99_999);
        let db_name = format!("test_db_{db_id}");

        let mut conn = PgConnection::connect(base_url).await?;
        sqlx::query(format!("CREATE DATABASE {db_name}").as_str())
            .execute(&mut conn)
            .await?;
        conn.close().await?;

        let mut test_conn = PgConnection::connect(&format!("{base_url}/{db_name}")).await?;
        sqlx::raw_sql(SCHEMA).execute(&mut test_conn).await?;
        test_conn.close().await?;

        Ok(TestDatabase {
            base_url: base_url.to_owned(),
            db_name,
        })
    }

    fn url(&self) -> String {
        format!("{}/{}", self.base_url, self.db_name)
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        let base_url = self.base_url.clone();
        let db_name = self.db_name.clone();

        TOKIO_RT.block_on(async move {
            let mut conn = match PgConnection::connect(&base_url).await {
                Ok(cxn) => cxn,
                Err(conn_err) => {
                    println!("Failed to reconnect to drop test database {db_name}, please remove it manually. Error: {conn_err}");
                    return;
                }
            };

            let drop_result = sqlx::query(format!("DROP DATABASE {db_name} WITH (FORCE)").as_str())
                .execute(&mut conn)
                .await;
            if let Err(db_err) = drop_result {
                println!("Failed to drop test database {db_name}, please remove it manually. Error: {db_err}");
            }
        });
    }
}

/// Creates a temp database with the service schema applied and hands a pool for it to the test.
///
/// Expects that the TEST_DB_URL environment variable is populated with a base postgres connection
/// string (no database name in the path)
pub fn prepare_db_and_test<F, R>(test_fn: F)
where
    R: Future<Output = ()>,
    F: FnOnce(PgPool) -> R,
{
    if dotenv().is_err() {
        println!("Test is running without .env file.");
    }
    let base_url = env::var("TEST_DB_URL").expect(
        "You must provide the TEST_DB_URL environment variable as the base postgres connection string",
    );

    let test_db = TOKIO_RT.block_on(async {
        TestDatabase::create(&base_url)
            .await
            .unwrap_or_else(|db_err| panic!("Failed to start test database: {db_err}"))
    });

    TOKIO_RT.block_on(async {
        let pool = persistence::connect_sqlx(&test_db.url(), 2)
            .await
            .expect("Could not connect to the test database");
        test_fn(pool.clone()).await;
        pool.close().await;
    });
}
