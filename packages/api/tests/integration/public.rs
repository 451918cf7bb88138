use reqwest::multipart::Form;
use uuid::Uuid;

use crate::common::{TestApp, data_form, routes};

#[tokio::test]
async fn root_is_public() {
    let app = TestApp::spawn().await;
    let res = app.get_without_auth(routes::ROOT).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["service"], "morpheo-storage");
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::spawn().await;
    let res = app.get_without_auth(routes::HEALTH).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "ok");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::spawn().await;
    let res = app.get_without_auth("/api-docs/openapi.json").await;
    assert_eq!(res.status, 200);
    assert!(res.body["paths"]["/{kind}"].is_object());
    assert!(res.body["components"]["securitySchemes"]["basic"].is_object());
}

mod authentication {
    use super::*;

    #[tokio::test]
    async fn resource_routes_require_credentials() {
        let app = TestApp::spawn().await;
        for path in [routes::PROBLEM, routes::DATA, routes::ALGO, routes::MODEL] {
            let res = app.get_without_auth(path).await;
            assert_eq!(res.status, 401, "GET {path} without auth");
            assert_eq!(res.code(), "CREDENTIALS_MISSING");
        }
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app
            .get_with_credentials(routes::DATA, crate::common::USERNAME, "wrong")
            .await;
        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unauthenticated_upload_writes_nothing() {
        let app = TestApp::spawn().await;
        let res = app
            .post_form_without_auth(routes::DATA, data_form(Uuid::new_v4(), b"abc"))
            .await;
        assert_eq!(res.status, 401);

        let list = app.get(routes::DATA).await;
        assert_eq!(list.body["total"], 0);
    }

    #[tokio::test]
    async fn auth_is_checked_before_routing_errors() {
        let app = TestApp::spawn().await;
        let res = app.get_without_auth("/unknown-kind").await;
        assert_eq!(res.status, 401);

        let res = app
            .post_form_without_auth(routes::PROBLEM, Form::new())
            .await;
        assert_eq!(res.status, 401);
    }
}
