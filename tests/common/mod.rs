use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use campusrooms::mailer::{Mailer, StubMailbox};
use campusrooms::{AppState, Config, SeedRoom, Seeder, routes};

mod mock_db;

use mock_db::{DATABASE_PROVIDER, DatabaseGuard};

#[allow(dead_code)]
pub struct TestEnv {
	pub app:          TestServer,
	pub pool:         campusrooms::DbPool,
	pub db_guard:     DatabaseGuard,
	pub stub_mailbox: Arc<StubMailbox>,
}

impl TestEnv {
	fn config() -> Config {
		Config {
			database_url: std::env::var("DATABASE_URL").unwrap(),

			email_address: "noreply@campusrooms.test".parse().unwrap(),
			email_smtp_server: "stub".to_string(),
			email_smtp_password: String::new(),
			email_queue_size: 32,

			booking_email_recipient: "bookings@campusrooms.test"
				.parse()
				.unwrap(),
		}
	}

	/// Get a test environment with mocked resources for running tests
	///
	/// # Panics
	/// Panics if building a test server or mailbox fails
	pub async fn new() -> Self {
		let config = Self::config();

		let test_pool_guard = (*DATABASE_PROVIDER).acquire().await;
		let test_pool = test_pool_guard.create_pool();

		{
			let conn = test_pool.get().await.unwrap();
			let seeder = Seeder::new(&conn);

			seeder
				.populate("seed/rooms.json", async |conn, rooms| {
					for room in rooms {
						SeedRoom::insert(room, conn).await?;
					}

					Ok(())
				})
				.await;
		}

		let stub_mailbox = config.create_stub_mailbox();

		let mailer = Mailer::new(&config, stub_mailbox.clone());

		let state = AppState {
			config,
			database_pool: test_pool.clone(),
			mailer,
		};
		let app = routes::get_app_router(state);

		let test_server = TestServer::builder().build(app).unwrap();

		TestEnv {
			app:          test_server,
			pool:         test_pool,
			db_guard:     test_pool_guard,
			stub_mailbox: stub_mailbox.unwrap(),
		}
	}

	/// Block until the stub mailbox holds at least `count` messages
	#[allow(dead_code)]
	pub fn wait_for_mail(&self, count: usize) -> usize {
		let mut mailbox = self.stub_mailbox.mailbox.lock();

		if mailbox.len() < count {
			self.stub_mailbox
				.signal
				.wait_for(&mut mailbox, Duration::from_secs(2));
		}

		mailbox.len()
	}
}

/// Attach the identity headers the auth proxy would forward in production
#[allow(dead_code)]
pub trait Authenticate {
	fn as_student(self, username: &str) -> Self;
	fn as_staff(self, username: &str) -> Self;
}

impl Authenticate for TestRequest {
	fn as_student(self, username: &str) -> Self {
		self.add_header(
			HeaderName::from_static("x-auth-user-id"),
			HeaderValue::from_static("2"),
		)
		.add_header(
			HeaderName::from_static("x-auth-username"),
			HeaderValue::from_str(username).unwrap(),
		)
		.add_header(
			HeaderName::from_static("x-auth-staff"),
			HeaderValue::from_static("false"),
		)
		.add_header(
			HeaderName::from_static("x-auth-superuser"),
			HeaderValue::from_static("false"),
		)
		.add_header(
			HeaderName::from_static("x-auth-active"),
			HeaderValue::from_static("true"),
		)
	}

	fn as_staff(self, username: &str) -> Self {
		self.add_header(
			HeaderName::from_static("x-auth-user-id"),
			HeaderValue::from_static("1"),
		)
		.add_header(
			HeaderName::from_static("x-auth-username"),
			HeaderValue::from_str(username).unwrap(),
		)
		.add_header(
			HeaderName::from_static("x-auth-staff"),
			HeaderValue::from_static("true"),
		)
		.add_header(
			HeaderName::from_static("x-auth-superuser"),
			HeaderValue::from_static("false"),
		)
		.add_header(
			HeaderName::from_static("x-auth-active"),
			HeaderValue::from_static("true"),
		)
	}
}
