use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::http::header::{AUTHORIZATION, CONTENT_TYPE};
use actix_web::middleware::from_fn;
use actix_web::{App, HttpResponse, test, web};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use works_portal_cache::MemoryCache;
use works_portal_database::{DbError, Health};
use works_portal_report_models::executive::{IndicatorDomain, IndicatorRow};
use works_portal_report_models::road::RoadReport;
use works_portal_report_models::user::{Role, User};
use works_portal_service::auth::{AuthService, DEFAULT_TOKEN_TTL};
use works_portal_service::executive::ExecutiveService;
use works_portal_service::policy::ReportPolicy;
use works_portal_service::testing::{
    MemoryExecutiveStore, MemoryReportStore, MemoryUserStore, RecordingNotifier, jpeg, principal,
};
use works_portal_service::users::UserService;
use works_portal_service::{Form, ReportService};
use works_portal_storage::MemoryObjectStore;

use crate::handlers::Probes;
use crate::middleware::{self, RequestDeadline};
use crate::{AppState, build_app};

const BOUNDARY: &str = "works-portal-test-boundary";
const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

struct StaticHealth(bool);

#[async_trait]
impl Health for StaticHealth {
    async fn ping(&self) -> Result<(), DbError> {
        if self.0 {
            Ok(())
        } else {
            Err(DbError::Conversion {
                message: "connection refused".into(),
            })
        }
    }
}

struct Harness {
    state: AppState,
    roads: Arc<MemoryReportStore<RoadReport>>,
    objects: Arc<MemoryObjectStore>,
    executive: Arc<MemoryExecutiveStore>,
}

fn reports<A: ReportPolicy>(
    cache: &Arc<MemoryCache>,
    objects: &Arc<MemoryObjectStore>,
    notifier: &Arc<RecordingNotifier>,
) -> (ReportService<A>, Arc<MemoryReportStore<A>>) {
    let store = Arc::new(MemoryReportStore::<A>::new());
    let service = ReportService::new(
        store.clone(),
        store.clone(),
        cache.clone(),
        objects.clone(),
        notifier.clone(),
    );
    (service, store)
}

fn harness_with(database_up: bool) -> Harness {
    let cache = Arc::new(MemoryCache::new());
    let objects = Arc::new(MemoryObjectStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let users = Arc::new(MemoryUserStore::new());
    let executive = Arc::new(MemoryExecutiveStore::new());

    let (roads, road_store) = reports(&cache, &objects, &notifier);
    let state = AppState {
        buildings: reports(&cache, &objects, &notifier).0,
        spatial: reports(&cache, &objects, &notifier).0,
        water: reports(&cache, &objects, &notifier).0,
        roads,
        agriculture: reports(&cache, &objects, &notifier).0,
        rice_fields: reports(&cache, &objects, &notifier).0,
        auth: AuthService::new(users.clone(), "test-secret", DEFAULT_TOKEN_TTL),
        users: UserService::new(users),
        executive: ExecutiveService::new(executive.clone()),
        probes: Probes {
            database: Arc::new(StaticHealth(database_up)),
            cache: cache.clone(),
        },
        allowed_origins: vec![],
        request_timeout: Duration::from_secs(5),
    };

    Harness {
        state,
        roads: road_store,
        objects,
        executive,
    }
}

fn harness() -> Harness {
    harness_with(true)
}

fn bearer(h: &Harness, user_id: &str, role: Role) -> String {
    let now = Utc::now();
    let token = h
        .state
        .auth
        .issue(User {
            id: user_id.into(),
            username: user_id.into(),
            email: format!("{user_id}@example.com"),
            password_hash: String::new(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .unwrap();
    format!("Bearer {}", token.token)
}

const ROAD_FIELDS: &[(&str, &str)] = &[
    ("reporterName", "Budi"),
    ("institutionUnit", "DINAS"),
    ("phoneNumber", "08123"),
    ("reportDateTime", "2024-05-01T08:00:00Z"),
    ("district", "Cibinong"),
    ("roadName", "Jl Merdeka"),
    ("roadType", "JALAN_KABUPATEN"),
    ("roadClass", "LOKAL"),
    ("pavementType", "ASPAL_FLEXIBLE"),
    ("damageType", "LUBANG"),
    ("damageLevel", "SEDANG"),
    ("damagedLength", "10"),
    ("damagedWidth", "2"),
    ("latitude", "-6.2"),
    ("longitude", "106.8"),
    ("trafficCondition", "LANCAR"),
    ("urgencyLevel", "RUTIN"),
];

fn road_form() -> Form {
    ROAD_FIELDS.iter().copied().collect()
}

fn multipart_body(fields: &[(&str, &str)], photos: usize) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for i in 0..photos {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"photos[]\"; filename=\"p{i}.jpg\"\r\n\
                 Content-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(JPEG);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(
    method: actix_web::http::Method,
    uri: &str,
    auth: &str,
    fields: &[(&str, &str)],
    photos: usize,
) -> test::TestRequest {
    test::TestRequest::default()
        .method(method)
        .uri(uri)
        .insert_header((AUTHORIZATION, auth.to_string()))
        .insert_header((
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(multipart_body(fields, photos))
}

#[actix_rt::test]
async fn creates_and_fetches_a_road_report() {
    let h = harness();
    let auth = bearer(&h, "user-a", Role::Operator);
    let app = test::init_service(build_app(h.state.clone())).await;

    let req = multipart_request(
        actix_web::http::Method::POST,
        "/api/v1/bina-marga",
        &auth,
        ROAD_FIELDS,
        2,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let data = &body["data"];

    assert_eq!(body["success"], json!(true));
    let id = data["id"].as_str().unwrap().to_string();
    assert!((data["damaged_area_m2"].as_f64().unwrap() - 20.0).abs() < f64::EPSILON);
    assert!((data["total_damaged_area_m2"].as_f64().unwrap() - 20.0).abs() < f64::EPSILON);
    assert!((data["estimated_budget"].as_f64().unwrap() - 144_000_000.0).abs() < 1.0);
    assert_eq!(data["estimated_repair_days"], json!(5));
    let photos = data["photos"].as_array().unwrap();
    assert_eq!(photos.len(), 2);
    for photo in photos {
        assert!(h.objects.contains(photo["url"].as_str().unwrap()).await);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/bina-marga/{id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["road_name"], json!("Jl Merdeka"));
    assert_eq!(body["data"]["status"], json!("PENDING"));
}

#[actix_rt::test]
async fn create_without_token_is_unauthorized() {
    let h = harness();
    let app = test::init_service(build_app(h.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/bina-marga")
        .insert_header((
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(multipart_body(ROAD_FIELDS, 2))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(h.roads.is_empty().await);
}

#[actix_rt::test]
async fn submissions_past_the_photo_limit_are_rejected() {
    let h = harness();
    let auth = bearer(&h, "user-a", Role::Operator);
    let app = test::init_service(build_app(h.state.clone())).await;

    let req = multipart_request(
        actix_web::http::Method::POST,
        "/api/v1/bina-marga",
        &auth,
        ROAD_FIELDS,
        crate::multipart::MAX_PHOTOS + 1,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], json!(["photos: max=10"]));
    assert!(h.roads.is_empty().await);
}

#[actix_rt::test]
async fn forged_token_is_rejected() {
    let h = harness();
    let app = test::init_service(build_app(h.state.clone())).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/bina-marga")
        .insert_header((AUTHORIZATION, "Bearer not.a.token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
}

#[actix_rt::test]
async fn invalid_submission_lists_every_failure() {
    let h = harness();
    let auth = bearer(&h, "user-a", Role::Operator);
    let app = test::init_service(build_app(h.state.clone())).await;

    let mut fields = ROAD_FIELDS.to_vec();
    fields.retain(|(k, _)| *k != "latitude");
    fields.push(("latitude", "95"));

    let req = multipart_request(
        actix_web::http::Method::POST,
        "/api/v1/bina-marga",
        &auth,
        &fields,
        1,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    let errors = body["error"].as_array().unwrap();
    assert!(errors.contains(&json!("latitude: range")));
    assert!(errors.contains(&json!("photos: min=2")));
    assert!(h.objects.is_empty().await);
    assert!(h.roads.is_empty().await);
}

#[actix_rt::test]
async fn other_operators_may_not_edit() {
    let h = harness();
    let owner = principal("user-a", Role::Operator);
    let report = h
        .state
        .roads
        .create(Some(&owner), &road_form(), vec![jpeg(), jpeg()])
        .await
        .unwrap();
    let intruder = bearer(&h, "user-b", Role::Operator);
    let app = test::init_service(build_app(h.state.clone())).await;

    let req = multipart_request(
        actix_web::http::Method::PUT,
        &format!("/api/v1/bina-marga/{}", report.id),
        &intruder,
        &[("roadName", "Jl Lain")],
        0,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let stored = h.state.roads.get(&report.id).await.unwrap();
    assert_eq!(stored.road_name, report.road_name);
    assert_eq!(stored.updated_at, report.updated_at);
}

#[actix_rt::test]
async fn delete_removes_the_report_and_its_photos() {
    let h = harness();
    let owner = principal("user-a", Role::Operator);
    let report = h
        .state
        .roads
        .create(Some(&owner), &road_form(), vec![jpeg(), jpeg()])
        .await
        .unwrap();
    let auth = bearer(&h, "user-a", Role::Operator);
    let app = test::init_service(build_app(h.state.clone())).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/bina-marga/{}", report.id))
        .insert_header((AUTHORIZATION, auth))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/bina-marga/{}", report.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));

    for photo in &report.photos {
        assert!(!h.objects.contains(&photo.url).await);
    }
}

#[actix_rt::test]
async fn overview_reflects_new_reports_immediately() {
    let h = harness();
    let auth = bearer(&h, "user-a", Role::Operator);
    let app = test::init_service(build_app(h.state.clone())).await;

    let overview = |app_req: test::TestRequest| {
        app_req.uri("/api/v1/bina-marga/overview").to_request()
    };

    let resp = test::call_service(&app, overview(test::TestRequest::get())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let before: Value = test::read_body_json(resp).await;
    let before = before["data"]["total_reports"].as_i64().unwrap();

    let req = multipart_request(
        actix_web::http::Method::POST,
        "/api/v1/bina-marga",
        &auth,
        ROAD_FIELDS,
        2,
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let resp = test::call_service(&app, overview(test::TestRequest::get())).await;
    let after: Value = test::read_body_json(resp).await;
    assert_eq!(after["data"]["total_reports"].as_i64().unwrap(), before + 1);
}

#[actix_rt::test]
async fn unknown_overview_scope_is_invalid() {
    let h = harness();
    let app = test::init_service(build_app(h.state.clone())).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/bina-marga/overview?scope=tunnel")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn executive_change_is_null_without_a_previous_year() {
    let h = harness();
    h.executive.insert(
        IndicatorDomain::Economy,
        vec![IndicatorRow {
            year: 2023,
            indicator_name: "Inflasi".into(),
            value: 3.0,
        }],
    );
    let auth = bearer(&h, "user-a", Role::Operator);
    let app = test::init_service(build_app(h.state.clone())).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/executive/economy/overview?year=2023")
        .insert_header((AUTHORIZATION, auth.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["inflasi"], json!(3.0));
    assert_eq!(body["data"]["perubahan_inflasi"], Value::Null);
    assert!(body["data"].as_object().unwrap().contains_key("perubahan_inflasi"));

    let req = test::TestRequest::get()
        .uri("/api/v1/executive/economy/overview?year=latest")
        .insert_header((AUTHORIZATION, auth))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], json!(["year: integer"]));
}

#[actix_rt::test]
async fn filtered_pages_cover_every_match_once() {
    let h = harness();
    let owner = principal("user-a", Role::Operator);
    for _ in 0..25 {
        h.state
            .roads
            .create(Some(&owner), &road_form(), vec![jpeg(), jpeg()])
            .await
            .unwrap();
    }
    h.state
        .roads
        .create(
            Some(&owner),
            &road_form().with("district", "Ciawi"),
            vec![jpeg(), jpeg()],
        )
        .await
        .unwrap();
    let app = test::init_service(build_app(h.state.clone())).await;

    let mut ids = BTreeSet::new();
    let mut sizes = vec![];
    for page in 1..=4 {
        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/bina-marga?district=cibinong&limit=10&page={page}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["total"], json!(25));
        let items = body["data"]["items"].as_array().unwrap();
        sizes.push(items.len());
        for item in items {
            assert_eq!(item["district"], json!("Cibinong"));
            ids.insert(item["id"].as_str().unwrap().to_string());
        }
    }

    assert_eq!(sizes, [10, 10, 5, 0]);
    assert_eq!(ids.len(), 25);
}

#[actix_rt::test]
async fn status_updates_reject_unknown_values() {
    let h = harness();
    let owner = principal("user-a", Role::Operator);
    let report = h
        .state
        .roads
        .create(Some(&owner), &road_form(), vec![jpeg(), jpeg()])
        .await
        .unwrap();
    let auth = bearer(&h, "user-a", Role::Operator);
    let app = test::init_service(build_app(h.state.clone())).await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/bina-marga/{}/status", report.id))
        .insert_header((AUTHORIZATION, auth.clone()))
        .set_json(json!({"status": "teleported"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/bina-marga/{}/status", report.id))
        .insert_header((AUTHORIZATION, auth))
        .set_json(json!({"status": "in progress", "notes": "crew dispatched"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], json!("IN_PROGRESS"));
}

#[actix_rt::test]
async fn rice_fields_have_no_status_route() {
    let h = harness();
    let auth = bearer(&h, "user-a", Role::Operator);
    let app = test::init_service(build_app(h.state.clone())).await;

    let req = test::TestRequest::patch()
        .uri("/api/v1/rice-fields/01HZXR0AD0000000000000000/status")
        .insert_header((AUTHORIZATION, auth))
        .set_json(json!({"status": "VERIFIED"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn user_management_requires_a_superadmin() {
    let h = harness();
    let operator = bearer(&h, "user-a", Role::Operator);
    let admin = bearer(&h, "root", Role::Superadmin);
    let app = test::init_service(build_app(h.state.clone())).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/users")
        .insert_header((AUTHORIZATION, operator))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/v1/users")
        .insert_header((AUTHORIZATION, admin))
        .set_json(json!({
            "username": "sari",
            "email": "sari@example.com",
            "password": "Sup3rSecret!",
            "role": "OPERATOR"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["username"], json!("sari"));
    assert!(body["data"].get("password_hash").is_none());
}

#[actix_rt::test]
async fn malformed_json_is_a_bad_request() {
    let h = harness();
    let app = test::init_service(build_app(h.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .insert_header((CONTENT_TYPE, "application/json"))
        .set_payload("{\"username\":")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
}

#[actix_rt::test]
async fn health_reports_degraded_backends() {
    let up = harness();
    let app = test::init_service(build_app(up.state.clone())).await;
    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let down = harness_with(false);
    let app = test::init_service(build_app(down.state.clone())).await;
    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["database"], json!(false));
    assert_eq!(body["data"]["cache"], json!(true));
}

#[actix_rt::test]
async fn unknown_routes_use_the_envelope() {
    let h = harness();
    let app = test::init_service(build_app(h.state.clone())).await;

    let req = test::TestRequest::get().uri("/api/v1/nowhere").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], json!("Route not found"));
}

#[actix_rt::test]
async fn registered_accounts_can_read_their_profile() {
    let h = harness();
    let app = test::init_service(build_app(h.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({
            "username": "budi",
            "email": "budi@example.com",
            "password": "Sup3rSecret!"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["user"]["role"], json!("OPERATOR"));

    let req = test::TestRequest::get().uri("/api/v1/profile").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/profile")
        .insert_header((AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["username"], json!("budi"));
}

#[actix_rt::test]
async fn read_models_rank_count_and_locate_reports() {
    let h = harness();
    let owner = principal("user-a", Role::Operator);
    let routine = h
        .state
        .roads
        .create(Some(&owner), &road_form(), vec![jpeg(), jpeg()])
        .await
        .unwrap();
    let emergency = h
        .state
        .roads
        .create(
            Some(&owner),
            &road_form()
                .with("urgencyLevel", "DARURAT")
                .with("latitude", "-6.6")
                .with("longitude", "106.9"),
            vec![jpeg(), jpeg()],
        )
        .await
        .unwrap();
    let app = test::init_service(build_app(h.state.clone())).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/bina-marga/priority")
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let order = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect::<Vec<_>>();
    assert_eq!(order, [emergency.id.clone(), routine.id.clone()]);

    let req = test::TestRequest::get()
        .uri("/api/v1/bina-marga/statistics")
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["total_reports"], json!(2));
    assert_eq!(body["data"]["pending_reports"], json!(2));

    let req = test::TestRequest::get()
        .uri("/api/v1/bina-marga/map?bbox=106.7,-6.3,106.85,-6.1")
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let points = body["data"].as_array().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["id"], json!(routine.id));

    let req = test::TestRequest::get()
        .uri("/api/v1/bina-marga/map?bbox=107,-6,106,-7")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/v1/bina-marga/emergency")
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], json!(emergency.id));
}

async fn slow_handler() -> HttpResponse {
    tokio::time::sleep(Duration::from_secs(5)).await;
    HttpResponse::Ok().finish()
}

async fn panicking_handler() -> HttpResponse {
    panic!("lost connection to postgres://admin:hunter2@db");
}

#[actix_rt::test]
async fn slow_handlers_time_out_with_the_envelope() {
    let app = test::init_service(
        App::new()
            .app_data(RequestDeadline(Duration::from_millis(20)))
            .wrap(from_fn(middleware::deadline))
            .wrap(from_fn(middleware::recover))
            .route("/slow", web::get().to(slow_handler)),
    )
    .await;

    let req = test::TestRequest::get().uri("/slow").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Request timed out"));
}

#[actix_rt::test]
async fn panicking_handlers_return_a_redacted_500() {
    let app = test::init_service(
        App::new()
            .wrap(from_fn(middleware::deadline))
            .wrap(from_fn(middleware::recover))
            .route("/panic", web::get().to(panicking_handler)),
    )
    .await;

    let req = test::TestRequest::get().uri("/panic").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Internal server error"));
    let rendered = body.to_string();
    assert!(!rendered.contains("postgres"));
    assert!(!rendered.contains("hunter2"));
}
