use std::sync::Arc;

use reqwest::multipart::Form;
use uuid::Uuid;

use crate::common::{FailingRecordStore, TestApp, blob_part, description_part, routes};

mod problem {
    use super::*;

    #[tokio::test]
    async fn renames_and_changes_owner() {
        let app = TestApp::spawn().await;
        let id = app.create_problem(Uuid::new_v4(), "titanic", b"zip").await;
        let owner = Uuid::new_v4();

        let form = Form::new()
            .text("owner", owner.to_string())
            .text("name", "iris");
        let res = app.patch_form(&routes::resource("problem", &id), form).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "iris");
        assert_eq!(res.body["owner"], owner.to_string());
        assert_eq!(res.body["size"], 3);

        let fetched = app.get(&routes::resource("problem", &id)).await;
        assert_eq!(fetched.body, res.body);
    }

    #[tokio::test]
    async fn empty_name_is_rejected_and_record_unchanged() {
        let app = TestApp::spawn().await;
        let id = app.create_problem(Uuid::new_v4(), "titanic", b"zip").await;

        let res = app
            .patch_form(&routes::resource("problem", &id), Form::new().text("name", ""))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.message(), "'Name' unset");

        let fetched = app.get(&routes::resource("problem", &id)).await;
        assert_eq!(fetched.body["name"], "titanic");
    }

    #[tokio::test]
    async fn same_uuid_is_accepted() {
        let app = TestApp::spawn().await;
        let id = app.create_problem(Uuid::new_v4(), "titanic", b"zip").await;

        let res = app
            .patch_form(
                &routes::resource("problem", &id),
                Form::new().text("uuid", id.clone()),
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["id"], id);
    }

    #[tokio::test]
    async fn different_uuid_conflicts() {
        let app = TestApp::spawn().await;
        let id = app.create_problem(Uuid::new_v4(), "titanic", b"zip").await;

        let res = app
            .patch_form(
                &routes::resource("problem", &id),
                Form::new().text("uuid", Uuid::new_v4().to_string()),
            )
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.code(), "IDENTIFIER_CONFLICT");
    }

    #[tokio::test]
    async fn replaces_description() {
        let app = TestApp::spawn().await;
        let id = app.create_problem(Uuid::new_v4(), "titanic", b"zip").await;

        let form = Form::new().part(
            "description",
            description_part("# Updated", "description.md"),
        );
        let res = app.patch_form(&routes::resource("problem", &id), form).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let description = app.get_raw(&routes::description("problem", &id)).await;
        assert_eq!(description.text().await.unwrap(), "# Updated");
    }

    #[tokio::test]
    async fn failed_update_keeps_previous_description() {
        let records = FailingRecordStore {
            fail_update: true,
            ..FailingRecordStore::default()
        };
        let app = TestApp::spawn_with_records(Arc::new(records)).await;
        let id = app.create_problem(Uuid::new_v4(), "titanic", b"zip").await;

        let form = Form::new()
            .text("name", "iris")
            .part("description", description_part("# Updated", "description.md"));
        let res = app.patch_form(&routes::resource("problem", &id), form).await;
        assert_eq!(res.status, 500, "{}", res.text);

        let fetched = app.get(&routes::resource("problem", &id)).await;
        assert_eq!(fetched.body["name"], "titanic");
        let description = app.get_raw(&routes::description("problem", &id)).await;
        assert_eq!(
            description.text().await.unwrap(),
            "# Problem\nPredict survival."
        );
    }

    #[tokio::test]
    async fn empty_patch_returns_record() {
        let app = TestApp::spawn().await;
        let id = app.create_problem(Uuid::new_v4(), "titanic", b"zip").await;

        let res = app
            .patch_form(&routes::resource("problem", &id), Form::new())
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "titanic");
    }
}

mod immutable_fields {
    use super::*;

    #[tokio::test]
    async fn size_cannot_change() {
        let app = TestApp::spawn().await;
        let id = app.create_data(Uuid::new_v4(), b"abc").await;

        let res = app
            .patch_form(&routes::resource("data", &id), Form::new().text("size", "5"))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.message(), "Unknown field size");
    }

    #[tokio::test]
    async fn blob_cannot_change() {
        let app = TestApp::spawn().await;
        let id = app.create_algo(Uuid::new_v4(), "svm", b"abc").await;

        let res = app
            .patch_form(
                &routes::resource("algo", &id),
                Form::new().part("blob", blob_part(b"xyz")),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "UNKNOWN_FIELD");

        let blob = app.get_raw(&routes::blob("algo", &id)).await;
        assert_eq!(blob.bytes().await.unwrap().to_vec(), b"abc");
    }

    #[tokio::test]
    async fn data_owner_can_change() {
        let app = TestApp::spawn().await;
        let id = app.create_data(Uuid::new_v4(), b"abc").await;
        let owner = Uuid::new_v4();

        let res = app
            .patch_form(
                &routes::resource("data", &id),
                Form::new().text("owner", owner.to_string()),
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["owner"], owner.to_string());
    }
}

mod lookup {
    use super::*;

    #[tokio::test]
    async fn malformed_id_is_bad_request() {
        let app = TestApp::spawn().await;
        let res = app
            .patch_form(&routes::resource("algo", "nope"), Form::new())
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app
            .patch_form(
                &routes::resource("algo", &Uuid::new_v4().to_string()),
                Form::new().text("name", "svm"),
            )
            .await;
        assert_eq!(res.status, 404);
    }
}
