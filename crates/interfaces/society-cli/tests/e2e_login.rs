use std::net::SocketAddr;

use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use camino::Utf8PathBuf;
use serde_json::{json, Value};
use society_app_core::{
    Action, ActionFamily, ConsoleSettings, ResourceKey, ResourceKind, ResourceRequest,
    ResourceVerb, SessionPhase, Status,
};
use society_cli::{commands, open_console};

type JsonReply = (StatusCode, [(header::HeaderName, &'static str); 1], String);

fn reply(status: StatusCode, body: Value) -> JsonReply {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

async fn start_mock_backend() -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route(
            "/api/auth/building-admin/send-otp",
            post(|body: String| async move {
                let body: Value = serde_json::from_str(&body).unwrap_or_default();
                if body["buildingId"] != "B1" {
                    return reply(
                        StatusCode::OK,
                        json!({ "success": false, "message": "Unknown building" }),
                    );
                }
                reply(StatusCode::OK, json!({ "success": true, "data": null }))
            }),
        )
        .route(
            "/api/auth/building-admin/verify-otp",
            post(|body: String| async move {
                let body: Value = serde_json::from_str(&body).unwrap_or_default();
                if body["otp"] != "123456" {
                    return reply(
                        StatusCode::OK,
                        json!({ "success": false, "message": "Invalid OTP" }),
                    );
                }
                reply(
                    StatusCode::OK,
                    json!({
                        "success": true,
                        "data": {
                            "accessToken": "tok-1",
                            "userRoles": ["BuildingAdmin"],
                            "buildingId": "B1",
                            "userId": "u-42",
                            "name": "Asha"
                        }
                    }),
                )
            }),
        )
        .route(
            "/api/units",
            get(|headers: HeaderMap| async move {
                let auth = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                if auth != "Bearer tok-1" {
                    return reply(
                        StatusCode::UNAUTHORIZED,
                        json!({ "success": false, "message": "Session expired" }),
                    );
                }
                reply(
                    StatusCode::OK,
                    json!({ "success": true, "data": [{ "id": "U-101" }] }),
                )
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, handle)
}

fn settings(addr: SocketAddr, dir: &tempfile::TempDir) -> ConsoleSettings {
    ConsoleSettings {
        api_base_url: format!("http://{addr}/api/"),
        storage_path: Some(
            Utf8PathBuf::from_path_buf(dir.path().join("console.redb")).unwrap(),
        ),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn building_admin_signs_in_across_restarts() {
    let (addr, server) = start_mock_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(addr, &dir);

    // First run: request the OTP and exit.
    {
        let mut app = open_console(&settings).unwrap();
        commands::cmd_login(&mut app, "9876543210", Some("B1"))
            .await
            .unwrap();
        assert!(matches!(
            app.state().session.phase,
            SessionPhase::OtpPending { .. }
        ));
        app.shutdown();
    }

    // Second run picks up the pending flow from disk.
    let mut app = open_console(&settings).unwrap();
    let (phone, tenant) = {
        let state = app.state();
        let (phone, tenant) = state.session.pending_otp().unwrap();
        (phone.clone(), tenant.clone())
    };
    assert_eq!(phone.as_str(), "9876543210");
    assert_eq!(tenant.building_id().map(|b| b.as_str()), Some("B1"));

    let err = commands::cmd_resend(&mut app).await.unwrap_err();
    assert!(err.to_string().contains("resend the OTP in"));

    let err = commands::cmd_verify(&mut app, "000000").await.unwrap_err();
    assert!(err.to_string().contains("Invalid OTP"));
    assert!(!app.is_authenticated());

    let landing = commands::cmd_verify(&mut app, "123456").await.unwrap();
    assert_eq!(landing, "/dashboard");
    let user = app.current_user().unwrap();
    assert_eq!(user.id, "u-42");
    assert_eq!(user.building_id.as_ref().map(|b| b.as_str()), Some("B1"));

    assert_eq!(
        commands::cmd_open(&mut app, "/B1/building/units").unwrap(),
        "/building/units"
    );

    let units = ResourceKey::new(ResourceKind::Units, ResourceVerb::List);
    app.dispatch(Action::resource(
        units,
        ResourceRequest::list().scoped(&user),
    ));
    app.settle(ActionFamily::Resource(units)).await.unwrap();
    let state = app.state();
    let slice = state.resource(units).unwrap();
    assert_eq!(slice.status, Status::Complete);
    assert_eq!(slice.data, json!([{ "id": "U-101" }]));

    app.shutdown();
    drop(app);

    // Third run: still signed in, back on the last screen.
    let mut app = open_console(&settings).unwrap();
    assert!(app.is_authenticated());
    assert_eq!(app.mount().unwrap().as_deref(), Some("/building/units"));

    commands::cmd_logout(&mut app).unwrap();
    assert!(!app.is_authenticated());
    app.shutdown();

    server.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn backend_rejection_surfaces_as_command_error() {
    let (addr, server) = start_mock_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let mut app = open_console(&settings(addr, &dir)).unwrap();

    let err = commands::cmd_login(&mut app, "9876543210", Some("B9"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Unknown building"));
    assert_eq!(app.state().session.phase, SessionPhase::Anonymous);
    app.shutdown();
    drop(app);

    // The next command starts signed out: no OTP was ever sent.
    let mut app = open_console(&settings(addr, &dir)).unwrap();
    assert_eq!(app.state().session.phase, SessionPhase::Anonymous);
    let err = commands::cmd_verify(&mut app, "123456").await.unwrap_err();
    assert!(err.to_string().contains("Request an OTP first"));

    app.shutdown();
    server.abort();
}
