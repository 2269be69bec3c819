// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use agenda_server::{create_app_state, create_router, AppState, ControllerRegistry};
use agenda_server_authz::{BranchId, CompanyId, Endpoint, SubjectId};
use agenda_server_config::{ServerConfig, StaticSubjectConfig, StaticTokenConfig};
use agenda_server_db::{
	testing::insert_row, Company, CompanyRepository, EndpointRepository, Namespace,
};
use axum::{
	body::{to_bytes, Body},
	http::{header::AUTHORIZATION, Method, Request, StatusCode},
	response::Response,
	Router,
};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TENANT_HEADER: &str = "X-Company-ID";

/// Branch id present in both tenants, with different rows behind it.
pub const SHARED_BRANCH: &str = "6f1d3c1e-0000-4000-8000-000000000001";

#[derive(Debug, Clone)]
pub struct TestUser {
	pub id: SubjectId,
	pub token: String,
}

impl TestUser {
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.token)
	}
}

#[derive(Debug, Clone)]
pub struct Fixtures {
	pub c1: Company,
	pub c2: Company,
	/// Employees X and Y work for C1, Z for C2.
	pub employee_x: TestUser,
	pub employee_y: TestUser,
	pub employee_z: TestUser,
	pub client: TestUser,
	pub superadmin: TestUser,
	/// A C1 branch X is assigned to, and a C1 branch nobody is.
	pub branch_assigned: BranchId,
	pub branch_other: BranchId,
	pub sector: String,
}

pub struct TestApp {
	pub router: Router,
	pub state: AppState,
	pub fixtures: Fixtures,
	_temp_dir: TempDir,
}

fn token_entry(
	token: &str,
	id: SubjectId,
	company: Option<CompanyId>,
	roles: &[&str],
	branches: &[BranchId],
) -> StaticTokenConfig {
	StaticTokenConfig {
		token: token.to_string(),
		subject: StaticSubjectConfig {
			id: id.to_string(),
			company_id: company.map(|c| c.to_string()),
			roles: roles.iter().map(|r| r.to_string()).collect(),
			branches: branches.iter().map(|b| b.to_string()).collect(),
		},
	}
}

fn user(token: &str, id: SubjectId) -> TestUser {
	TestUser {
		id,
		token: token.to_string(),
	}
}

async fn add_employee(
	pool: &SqlitePool,
	company: &Company,
	id: SubjectId,
	branch: Option<BranchId>,
	name: &str,
) {
	insert_row(
		pool,
		&company.namespace().unwrap(),
		"employees",
		&[
			("id", json!(id.to_string())),
			("company_id", json!(company.id.to_string())),
			("branch_id", json!(branch.map(|b| b.to_string()))),
			("name", json!(name)),
			("email", json!(format!("{}@example.com", name.to_lowercase()))),
		],
	)
	.await;
}

async fn add_named_row(pool: &SqlitePool, company: &Company, table: &str, id: &str, name: &str) {
	insert_row(
		pool,
		&company.namespace().unwrap(),
		table,
		&[
			("id", json!(id)),
			("company_id", json!(company.id.to_string())),
			("name", json!(name)),
		],
	)
	.await;
}

impl TestApp {
	pub async fn new() -> Self {
		let temp_dir = tempfile::tempdir().unwrap();
		let db_path = temp_dir.path().join("test_authz.db");
		let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
		let pool = agenda_server_db::create_pool(&db_url, 5).await.unwrap();
		agenda_server_db::run_migrations(&pool).await.unwrap();
		agenda_server_db::seed_catalog(&pool).await.unwrap();

		// A gated endpoint nobody wrote a rule for.
		let locked = Endpoint::new(Method::GET, "/sector/{id}/locked", "ShowResource")
			.with_resource("sector")
			.tenant_scoped()
			.gated();
		assert!(EndpointRepository::new(pool.clone())
			.create_endpoint(&locked)
			.await
			.unwrap());

		let companies = CompanyRepository::new(pool.clone());
		let c1 = Company::new("Barbearia Centro");
		let c2 = Company::new("Studio Norte");
		companies.create_company(&c1).await.unwrap();
		companies.create_company(&c2).await.unwrap();

		let (x, y, z) = (SubjectId::generate(), SubjectId::generate(), SubjectId::generate());
		let (client, superadmin) = (SubjectId::generate(), SubjectId::generate());
		let branch_assigned = BranchId::generate();
		let branch_other = BranchId::generate();
		let sector = "sector-cabelo".to_string();

		add_named_row(&pool, &c1, "branches", &branch_assigned.to_string(), "Centro").await;
		add_named_row(&pool, &c1, "branches", &branch_other.to_string(), "Shopping").await;
		add_named_row(&pool, &c1, "branches", SHARED_BRANCH, "C1 main").await;
		add_named_row(&pool, &c2, "branches", SHARED_BRANCH, "C2 main").await;
		add_named_row(&pool, &c1, "sectors", &sector, "Cabelo").await;

		add_employee(&pool, &c1, x, Some(branch_assigned), "Xavier").await;
		add_employee(&pool, &c1, y, None, "Yara").await;
		add_employee(&pool, &c2, z, None, "Zeca").await;

		insert_row(
			&pool,
			&Namespace::Public,
			"clients",
			&[
				("id", json!(client.to_string())),
				("name", json!("Carla")),
				("email", json!("carla@example.com")),
				("created_at", json!("2025-01-01T00:00:00Z")),
			],
		)
		.await;

		let mut config = ServerConfig::default();
		config.auth.static_tokens = vec![
			token_entry("token-x", x, Some(c1.id), &["employee"], &[branch_assigned]),
			token_entry("token-y", y, Some(c1.id), &["employee"], &[]),
			token_entry("token-z", z, Some(c2.id), &["employee"], &[]),
			token_entry("token-client", client, None, &[], &[]),
			token_entry("token-root", superadmin, Some(c1.id), &["superadmin"], &[]),
		];

		let snapshot = agenda_server_db::load_snapshot(&pool).await.unwrap();
		let state = create_app_state(
			pool,
			agenda_server_authz::SnapshotHandle::new(snapshot),
			config,
		)
		.unwrap();
		let router = create_router(state.clone(), &ControllerRegistry::standard()).unwrap();

		let fixtures = Fixtures {
			c1,
			c2,
			employee_x: user("token-x", x),
			employee_y: user("token-y", y),
			employee_z: user("token-z", z),
			client: user("token-client", client),
			superadmin: user("token-root", superadmin),
			branch_assigned,
			branch_other,
			sector,
		};

		Self {
			router,
			state,
			fixtures,
			_temp_dir: temp_dir,
		}
	}

	pub async fn send(&self, request: Request<Body>) -> Response<Body> {
		self.router.clone().oneshot(request).await.unwrap()
	}

	pub async fn request(
		&self,
		method: Method,
		path: &str,
		user: Option<&TestUser>,
		tenant: Option<&CompanyId>,
		body: Option<&Value>,
	) -> Response<Body> {
		let mut builder = Request::builder().method(method).uri(path);
		if let Some(user) = user {
			builder = builder.header(AUTHORIZATION, user.bearer());
		}
		if let Some(tenant) = tenant {
			builder = builder.header(TENANT_HEADER, tenant.to_string());
		}
		let body = match body {
			Some(body) => {
				builder = builder.header("content-type", "application/json");
				Body::from(serde_json::to_vec(body).unwrap())
			}
			None => Body::empty(),
		};
		self.send(builder.body(body).unwrap()).await
	}

	pub async fn get(&self, path: &str, user: Option<&TestUser>, tenant: Option<&CompanyId>) -> Response<Body> {
		self.request(Method::GET, path, user, tenant, None).await
	}

	pub async fn post(&self, path: &str, user: Option<&TestUser>, body: &Value) -> Response<Body> {
		self.request(Method::POST, path, user, None, Some(body)).await
	}
}

pub async fn body_json(response: Response<Body>) -> Value {
	let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
	serde_json::from_slice(&bytes).unwrap()
}

pub struct AuthzCase {
	pub name: &'static str,
	pub method: Method,
	pub path: String,
	pub subject: Option<TestUser>,
	pub tenant: Option<CompanyId>,
	pub body: Option<Value>,
	pub expected_status: StatusCode,
}

pub async fn run_authz_cases(app: &TestApp, cases: &[AuthzCase]) {
	for case in cases {
		let response = app
			.request(
				case.method.clone(),
				&case.path,
				case.subject.as_ref(),
				case.tenant.as_ref(),
				case.body.as_ref(),
			)
			.await;

		if response.status() != case.expected_status {
			let (parts, body) = response.into_parts();
			let body_bytes = to_bytes(body, usize::MAX).await.unwrap();
			let body_str = String::from_utf8_lossy(&body_bytes);
			panic!(
				"Case '{}': {} {} - expected {}, got {}\nResponse body: {}",
				case.name, case.method, case.path, case.expected_status, parts.status, body_str
			);
		}
	}
}
