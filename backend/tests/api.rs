use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use image::{ImageFormat, RgbImage};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use dealership_backend::auth::{create_token, hash_password};
use dealership_backend::config::AppConfig;
use dealership_backend::models::{NewUserRecord, UserRole};
use dealership_backend::store::{MemoryStore, Store};
use dealership_backend::{router, seed, AppState};

const BOUNDARY: &str = "dealership-test-boundary";

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    config: AppConfig,
    uploads: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let vars: HashMap<String, String> = [
            ("DATABASE_URL", "memory://"),
            ("JWT_SECRET", "test-secret"),
            ("ADMIN_EMAIL", "admin@example.com"),
            ("ADMIN_PASSWORD", "changeme123"),
            ("MAX_FILE_SIZE", "200000"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .chain([(
            "UPLOAD_DIR".to_string(),
            uploads.path().to_string_lossy().into_owned(),
        )])
        .collect();
        let config = AppConfig::from_map(vars).unwrap();

        let store = Arc::new(MemoryStore::new());
        seed::ensure_default_admin(store.as_ref(), &config)
            .await
            .unwrap();
        let router = router(AppState::new(config.clone(), store.clone()));
        Self {
            router,
            store,
            config,
            uploads,
        }
    }

    async fn token_for(&self, username: &str, role: UserRole) -> String {
        let user = self
            .store
            .create_user(NewUserRecord {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: hash_password("password1").unwrap(),
                full_name: None,
                role,
            })
            .await
            .unwrap();
        create_token(&user, &self.config.jwt_secret, 60).unwrap()
    }

    async fn admin_token(&self) -> String {
        let admin = self
            .store
            .find_user_by_email("admin@example.com")
            .await
            .unwrap()
            .unwrap();
        create_token(&admin, &self.config.jwt_secret, 60).unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request(Method::GET, uri, token, Body::empty(), None))
            .await
    }

    async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.send(request(
            method,
            uri,
            token,
            Body::from(body.to_string()),
            Some("application/json".to_string()),
        ))
        .await
    }

    async fn upload(
        &self,
        uri: &str,
        token: Option<&str>,
        filename: &str,
        bytes: &[u8],
    ) -> (StatusCode, Value) {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        self.send(request(
            Method::POST,
            uri,
            token,
            Body::from(body),
            Some(format!("multipart/form-data; boundary={BOUNDARY}")),
        ))
        .await
    }

    async fn create_vehicle(&self, token: &str, body: Value) -> Value {
        let (status, vehicle) = self
            .json(Method::POST, "/api/admin/vehicles", Some(token), body)
            .await;
        assert_eq!(status, StatusCode::CREATED, "{vehicle}");
        vehicle
    }

    fn stored_files(&self) -> usize {
        fn walk(dir: &std::path::Path) -> usize {
            std::fs::read_dir(dir)
                .map(|entries| {
                    entries
                        .flatten()
                        .map(|entry| {
                            let path = entry.path();
                            if path.is_dir() {
                                walk(&path)
                            } else {
                                1
                            }
                        })
                        .sum()
                })
                .unwrap_or(0)
        }
        walk(self.uploads.path())
    }
}

fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Body,
    content_type: Option<String>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(content_type) = content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    builder.body(body).unwrap()
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    RgbImage::new(width, height)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}

#[tokio::test]
async fn health_and_root_respond() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _) = app.get("/", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn listing_filters_the_toyota_vitz() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    app.create_vehicle(
        &token,
        json!({"make": "Toyota", "model": "Vitz", "year": 2018, "price": 850000.0}),
    )
    .await;
    app.create_vehicle(
        &token,
        json!({"make": "Mazda", "model": "Demio", "year": 2016, "price": 700000.0}),
    )
    .await;

    let (status, page) = app.get("/api/vehicles?make=toyota", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["title"], "2018 Toyota Vitz");
    assert_eq!(page["pageSize"], 12);

    let (_, page) = app
        .get("/api/vehicles?make=toyota&priceMin=900000", None)
        .await;
    assert_eq!(page["total"], 0);
    assert_eq!(page["items"].as_array().unwrap().len(), 0);

    let (_, page) = app.get("/api/vehicles?sort_by=price&sort_order=asc", None).await;
    assert_eq!(page["items"][0]["make"], "Mazda");
}

#[tokio::test]
async fn listing_rejects_out_of_range_paging() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/vehicles?pageSize=500", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("pageSize"));

    let (status, _) = app.get("/api/vehicles?page=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let token = app.admin_token().await;
    let (status, page) = app
        .get("/api/admin/vehicles?pageSize=100", Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["pageSize"], 100);
}

#[tokio::test]
async fn detail_view_counts_views() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let vehicle = app
        .create_vehicle(
            &token,
            json!({"make": "Honda", "model": "Fit", "year": 2017, "price": 650000.0}),
        )
        .await;
    let uri = format!("/api/vehicles/{}", vehicle["id"].as_str().unwrap());

    app.get(&uri, None).await;
    let (status, body) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["viewsCount"], 2);

    let (status, body) = app
        .get(&format!("/api/vehicles/{}", uuid::Uuid::new_v4()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Vehicle not found");
}

#[tokio::test]
async fn admin_routes_need_a_back_office_token() {
    let app = TestApp::new().await;

    let (status, _) = app.get("/api/admin/dashboard", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/admin/dashboard", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let customer = app.token_for("0712345678", UserRole::Customer).await;
    let (status, _) = app.get("/api/admin/dashboard", Some(&customer)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let staff = app.token_for("staffer", UserRole::Staff).await;
    let (status, body) = app.get("/api/admin/dashboard", Some(&staff)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalVehicles"], 0);
}

#[tokio::test]
async fn staff_cannot_delete_vehicles() {
    let app = TestApp::new().await;
    let staff = app.token_for("staffer", UserRole::Staff).await;
    let vehicle = app
        .create_vehicle(
            &staff,
            json!({"make": "Subaru", "model": "Forester", "year": 2019, "price": 2500000.0}),
        )
        .await;
    let uri = format!("/api/admin/vehicles/{}", vehicle["id"].as_str().unwrap());

    let (status, _) = app.json(Method::DELETE, &uri, Some(&staff), json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.admin_token().await;
    let (status, body) = app.json(Method::DELETE, &uri, Some(&admin), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Vehicle deleted successfully");
}

#[tokio::test]
async fn invalid_vehicle_is_rejected() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let (status, body) = app
        .json(
            Method::POST,
            "/api/admin/vehicles",
            Some(&token),
            json!({"make": "Toyota", "model": "Vitz", "year": 1850, "price": 850000.0}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("year"));
}

#[tokio::test]
async fn gif_upload_is_declined_before_storage() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let vehicle = app
        .create_vehicle(
            &token,
            json!({"make": "Toyota", "model": "Vitz", "year": 2018, "price": 850000.0}),
        )
        .await;
    let uri = format!(
        "/api/admin/vehicles/{}/upload-image",
        vehicle["id"].as_str().unwrap()
    );

    let (status, body) = app.upload(&uri, Some(&token), "car.gif", b"GIF89a").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "bad_extension");
    assert_eq!(app.stored_files(), 0);

    let (status, body) = app
        .upload(&uri, Some(&token), "car.png", &vec![0u8; 300_000])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "oversized");
    assert_eq!(app.stored_files(), 0);
}

#[tokio::test]
async fn uploads_beyond_the_body_limit_still_report_oversized() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let vehicle = app
        .create_vehicle(
            &token,
            json!({"make": "Nissan", "model": "Note", "year": 2017, "price": 720000.0}),
        )
        .await;
    let uri = format!(
        "/api/admin/vehicles/{}/upload-image",
        vehicle["id"].as_str().unwrap()
    );
    // Well past MAX_FILE_SIZE plus the request body headroom.
    let huge = vec![7u8; 2_300_000];

    let (status, body) = app.upload(&uri, Some(&token), "car.png", &huge).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "oversized");

    let (status, body) = app.upload(&uri, Some(&token), "car.gif", &huge).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "bad_extension");
    assert_eq!(app.stored_files(), 0);
}

#[tokio::test]
async fn uploaded_images_are_served_and_removed_with_their_vehicle() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let vehicle = app
        .create_vehicle(
            &token,
            json!({"make": "Toyota", "model": "Vitz", "year": 2018, "price": 850000.0}),
        )
        .await;
    let id = vehicle["id"].as_str().unwrap();
    let uri = format!("/api/admin/vehicles/{id}/upload-image?isPrimary=true");

    let (status, first) = app.upload(&uri, Some(&token), "front.png", &png(20, 10)).await;
    assert_eq!(status, StatusCode::CREATED, "{first}");
    assert_eq!(first["isPrimary"], true);
    assert_eq!(first["displayOrder"], 0);
    let first_url = first["imageUrl"].as_str().unwrap().to_string();
    assert!(first_url.starts_with("/uploads/vehicles/"));

    let (status, second) = app.upload(&uri, Some(&token), "back.png", &png(20, 10)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["displayOrder"], 1);

    let (_, detail) = app.get(&format!("/api/admin/vehicles/{id}"), Some(&token)).await;
    let primaries = detail["images"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|img| img["isPrimary"] == true)
        .count();
    assert_eq!(primaries, 1);
    assert_eq!(detail["primaryImage"], second["imageUrl"]);

    let response = app
        .router
        .clone()
        .oneshot(request(Method::GET, &first_url, None, Body::empty(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "image/png");
    assert_eq!(app.stored_files(), 2);

    let (status, _) = app
        .json(
            Method::DELETE,
            &format!("/api/admin/vehicles/{id}"),
            Some(&token),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.stored_files(), 0);

    let (status, _) = app.get(&first_url, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_to_unknown_vehicle_stores_nothing() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let uri = format!("/api/admin/vehicles/{}/upload-image", uuid::Uuid::new_v4());
    let (status, _) = app.upload(&uri, Some(&token), "car.png", &png(4, 4)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.stored_files(), 0);
}

#[tokio::test]
async fn upload_paths_cannot_escape_the_upload_dir() {
    let app = TestApp::new().await;
    let (status, _) = app.get("/uploads/../Cargo.toml", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn enquiry_lifecycle() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let vehicle = app
        .create_vehicle(
            &token,
            json!({"make": "Nissan", "model": "Note", "year": 2017, "price": 720000.0}),
        )
        .await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/enquiries",
            None,
            json!({
                "vehicleId": uuid::Uuid::new_v4(),
                "customerName": "Jane Doe",
                "customerEmail": "jane@example.com",
                "customerPhone": "0712345678",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

    let (status, enquiry) = app
        .json(
            Method::POST,
            "/api/enquiries",
            None,
            json!({
                "vehicleId": vehicle["id"],
                "customerName": "Jane Doe",
                "customerEmail": "jane@example.com",
                "customerPhone": "0712345678",
                "enquiryType": "test_drive",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{enquiry}");
    assert_eq!(enquiry["status"], "new");
    assert_eq!(enquiry["vehicleTitle"], "2017 Nissan Note");

    let (_, page) = app
        .get("/api/admin/enquiries?status=new", Some(&token))
        .await;
    assert_eq!(page["total"], 1);
    let (_, page) = app
        .get("/api/admin/enquiries?enquiry_type=finance", Some(&token))
        .await;
    assert_eq!(page["total"], 0);

    let uri = format!("/api/admin/enquiries/{}", enquiry["id"].as_str().unwrap());
    let (status, updated) = app
        .json(
            Method::PATCH,
            &format!("{uri}/status"),
            Some(&token),
            json!({"status": "contacted"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "contacted");
    assert!(updated["respondedAt"].is_string());

    let (status, _) = app.json(Method::DELETE, &uri, Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&uri, Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sell_request_valuation() {
    let app = TestApp::new().await;
    let (status, request) = app
        .json(
            Method::POST,
            "/api/sell-requests",
            None,
            json!({
                "customerName": "John Seller",
                "customerEmail": "john@example.com",
                "customerPhone": "0722000000",
                "vehicleMake": "Mazda",
                "vehicleModel": "CX-5",
                "vehicleYear": 2015,
                "askingPrice": 1800000.0,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{request}");
    assert_eq!(request["status"], "pending");
    let id = request["id"].as_str().unwrap();

    let (status, image) = app
        .upload(
            &format!("/api/sell-requests/{id}/upload-image"),
            None,
            "side.jpg",
            &png(8, 8),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{image}");
    assert!(image["imageUrl"]
        .as_str()
        .unwrap()
        .starts_with("/uploads/sell-requests/"));

    let token = app.admin_token().await;
    let uri = format!("/api/admin/sell-requests/{id}/valuation");
    let (status, _) = app
        .json(Method::PATCH, &uri, Some(&token), json!({"valuationAmount": 0}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, valued) = app
        .json(
            Method::PATCH,
            &uri,
            Some(&token),
            json!({"valuationAmount": 1650000.0}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(valued["status"], "valued");
    assert_eq!(valued["valuationAmount"], 1650000.0);
    assert_eq!(valued["images"].as_array().unwrap().len(), 1);

    let (_, page) = app
        .get("/api/admin/sell-requests?status=valued", Some(&token))
        .await;
    assert_eq!(page["total"], 1);
}

#[tokio::test]
async fn newsletter_subscription() {
    let app = TestApp::new().await;
    let body = json!({"email": "fan@example.com"});

    let (status, reply) = app
        .json(Method::POST, "/api/newsletter/subscribe", None, body.clone())
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["message"], "Thank you for subscribing!");

    let (status, reply) = app
        .json(Method::POST, "/api/newsletter/subscribe", None, body)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(reply["message"], "You are already subscribed!");

    let (status, reply) = app
        .json(
            Method::POST,
            "/api/newsletter/subscribe",
            None,
            json!({"email": "not-an-email"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = reply["message"].as_str().unwrap();
    assert!(message.starts_with("email"));
    assert!(message.contains("not a valid email address"));
}

#[tokio::test]
async fn login_and_me() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/auth/login",
            None,
            json!({"email": "admin@example.com", "password": "wrong-password"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/auth/login",
            None,
            json!({"email": "admin@example.com", "password": "changeme123"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokenType"], "bearer");
    assert!(body["user"].get("passwordHash").is_none());
    let token = body["accessToken"].as_str().unwrap().to_string();

    let (status, me) = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "admin@example.com");
    assert!(me["lastLogin"].is_string());

    let (status, body) = app
        .json(Method::POST, "/api/auth/logout", None, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");
}

#[tokio::test]
async fn lead_capture_creates_a_customer_once() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let vehicle = app
        .create_vehicle(
            &token,
            json!({"make": "Toyota", "model": "Prado", "year": 2020, "price": 7500000.0}),
        )
        .await;
    let lead = json!({
        "name": "Wanjiku",
        "phone": "0733111222",
        "vehicleId": vehicle["id"],
    });

    let (status, first) = app
        .json(Method::POST, "/api/leads/capture", None, lead.clone())
        .await;
    assert_eq!(status, StatusCode::OK, "{first}");
    assert_eq!(first["message"], "Lead captured successfully");
    assert_eq!(first["isNewUser"], true);

    let (_, second) = app.json(Method::POST, "/api/leads/capture", None, lead).await;
    assert_eq!(second["isNewUser"], false);
    assert_eq!(second["userId"], first["userId"]);

    let customer = app
        .store
        .find_user_by_username("0733111222")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(customer.role, UserRole::Customer);
    assert_eq!(customer.email, "0733111222@placeholder.com");

    let (_, page) = app.get("/api/admin/enquiries", Some(&token)).await;
    assert_eq!(page["total"], 2);
    assert_eq!(page["items"][0]["vehicleId"], vehicle["id"]);
    assert_eq!(page["items"][0]["enquiryType"], "purchase");
}

#[tokio::test]
async fn admin_accounts_are_capped() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let new_admin = |name: &str| {
        json!({
            "username": name,
            "email": format!("{name}@example.com"),
            "password": "secret123",
            "role": "admin",
        })
    };

    let (status, body) = app
        .json(Method::POST, "/api/admin/users", Some(&token), new_admin("second"))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = app
        .json(Method::POST, "/api/admin/users", Some(&token), new_admin("third"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("Maximum number of admins"));

    let (status, staff) = app
        .json(
            Method::POST,
            "/api/admin/users",
            Some(&token),
            json!({"username": "clerk", "email": "clerk@example.com", "password": "secret123"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(staff["role"], "staff");

    let (status, _) = app
        .json(
            Method::PUT,
            &format!("/api/admin/users/{}", staff["id"].as_str().unwrap()),
            Some(&token),
            json!({"role": "admin"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .json(Method::POST, "/api/admin/users", Some(&token), new_admin("clerk"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn brands_are_public_but_managed_by_admins() {
    let app = TestApp::new().await;
    seed::seed_brands(app.store.as_ref()).await.unwrap();
    let token = app.admin_token().await;

    let (_, brands) = app.get("/api/brands", None).await;
    assert_eq!(brands.as_array().unwrap().len(), 16);
    assert_eq!(brands[0]["name"], "Toyota");

    let (status, _) = app
        .json(
            Method::POST,
            "/api/admin/brands",
            Some(&token),
            json!({"name": "Toyota"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let hidden = brands[1]["id"].as_str().unwrap();
    let (status, updated) = app
        .json(
            Method::PUT,
            &format!("/api/admin/brands/{hidden}"),
            Some(&token),
            json!({"isActive": false}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["isActive"], false);

    let (_, brands) = app.get("/api/brands", None).await;
    assert_eq!(brands.as_array().unwrap().len(), 15);
    let (_, all) = app.get("/api/admin/brands", Some(&token)).await;
    assert_eq!(all.as_array().unwrap().len(), 16);

    let staff = app.token_for("staffer", UserRole::Staff).await;
    let (status, _) = app
        .json(
            Method::POST,
            "/api/admin/brands",
            Some(&staff),
            json!({"name": "Peugeot"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn public_stats_and_dashboard() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    app.create_vehicle(
        &token,
        json!({"make": "Toyota", "model": "Vitz", "year": 2018, "price": 850000.0}),
    )
    .await;
    app.create_vehicle(
        &token,
        json!({
            "make": "Toyota", "model": "Harrier", "year": 2019, "price": 4200000.0,
            "availabilityStatus": "direct_import",
        }),
    )
    .await;
    app.create_vehicle(
        &token,
        json!({
            "make": "Mazda", "model": "Axela", "year": 2016, "price": 1200000.0,
            "availabilityStatus": "sold",
        }),
    )
    .await;

    let (status, stats) = app.get("/api/stats/public", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalVehicles"], 3);
    assert_eq!(stats["vehiclesAvailable"], 2);
    assert_eq!(stats["vehiclesSold"], 1);

    let (_, dashboard) = app.get("/api/admin/dashboard", Some(&token)).await;
    assert_eq!(dashboard["totalVehicles"], 3);
    assert_eq!(dashboard["vehiclesAvailable"], 1);
    assert_eq!(dashboard["totalInventoryValue"], 850000.0);

    let (_, makes) = app.get("/api/vehicles/makes", None).await;
    assert_eq!(makes, json!(["Mazda", "Toyota"]));
    let (_, models) = app.get("/api/vehicles/models/toyota", None).await;
    assert_eq!(models, json!(["Harrier", "Vitz"]));
    let (_, recent) = app.get("/api/vehicles/recent?limit=5", None).await;
    assert_eq!(recent.as_array().unwrap().len(), 2);
}
