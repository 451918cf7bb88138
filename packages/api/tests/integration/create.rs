use std::sync::Arc;

use ::common::storage::{BlobKey, BlobStore};
use reqwest::multipart::Form;
use uuid::Uuid;

use crate::common::{
    FailingBlobStore, TestApp, blob_part, data_form, description_part, problem_form, routes,
};
use api::store::MemoryRecordStore;

mod multipart_problem {
    use super::*;

    #[tokio::test]
    async fn complete_form_creates_problem() {
        let app = TestApp::spawn().await;
        let owner = Uuid::new_v4();
        let res = app
            .post_form(routes::PROBLEM, problem_form(owner, "titanic", b"zip"))
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["owner"], owner.to_string());
        assert_eq!(res.body["name"], "titanic");
        assert_eq!(res.body["size"], 3);
        let id: Uuid = res.id().parse().unwrap();
        assert_eq!(id.get_version_num(), 7);

        let stored = app
            .blobs
            .read_all(&BlobKey::primary("problem", id))
            .await
            .unwrap();
        assert_eq!(stored, b"zip");
    }

    #[tokio::test]
    async fn client_chosen_id_is_kept() {
        let app = TestApp::spawn().await;
        let id = Uuid::new_v4();
        let form = Form::new()
            .text("uuid", id.to_string())
            .text("owner", Uuid::new_v4().to_string())
            .text("name", "titanic")
            .text("size", "3")
            .part("description", description_part("# T", "description.md"))
            .part("blob", blob_part(b"zip"));

        let res = app.post_form(routes::PROBLEM, form).await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.id(), id.to_string());
    }

    #[tokio::test]
    async fn missing_size_is_reported() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("owner", Uuid::new_v4().to_string())
            .text("name", "titanic")
            .part("description", description_part("# T", "description.md"))
            .part("blob", blob_part(b"zip"));

        let res = app.post_form(routes::PROBLEM, form).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "REQUIRED_FIELD_MISSING");
        assert_eq!(res.message(), "'Size' unset");
    }

    #[tokio::test]
    async fn missing_description_is_reported() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("owner", Uuid::new_v4().to_string())
            .text("name", "titanic")
            .text("size", "3")
            .part("blob", blob_part(b"zip"));

        let res = app.post_form(routes::PROBLEM, form).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.message(), "'Description' unset");
    }

    #[tokio::test]
    async fn empty_name_is_reported() {
        let app = TestApp::spawn().await;
        let res = app
            .post_form(routes::PROBLEM, problem_form(Uuid::new_v4(), "", b"zip"))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.message(), "'Name' unset");
    }

    #[tokio::test]
    async fn description_must_be_markdown() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("owner", Uuid::new_v4().to_string())
            .text("name", "titanic")
            .text("size", "3")
            .part("description", description_part("# T", "description.txt"))
            .part("blob", blob_part(b"zip"));

        let res = app.post_form(routes::PROBLEM, form).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.message(), "description should be a '.md' file");
    }

    #[tokio::test]
    async fn oversized_description_overflows() {
        let app = TestApp::spawn().await;
        let huge = "#".repeat(4097);
        let form = Form::new()
            .text("owner", Uuid::new_v4().to_string())
            .text("name", "titanic")
            .text("size", "3")
            .part("description", description_part(&huge, "description.md"))
            .part("blob", blob_part(b"zip"));

        let res = app.post_form(routes::PROBLEM, form).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.message(), "Buffer overflow reading description");
    }
}

mod multipart_fields {
    use super::*;

    #[tokio::test]
    async fn name_at_max_length_is_accepted() {
        let app = TestApp::spawn().await;
        let name = "n".repeat(255);
        let res = app
            .post_form(routes::PROBLEM, problem_form(Uuid::new_v4(), &name, b"zip"))
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"], name);
    }

    #[tokio::test]
    async fn name_over_max_length_overflows() {
        let app = TestApp::spawn().await;
        let name = "n".repeat(256);
        let res = app
            .post_form(routes::PROBLEM, problem_form(Uuid::new_v4(), &name, b"zip"))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "BUFFER_OVERFLOW");
        assert_eq!(res.message(), "Buffer overflow reading name");
    }

    #[tokio::test]
    async fn unknown_field_is_rejected() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("owner", Uuid::new_v4().to_string())
            .text("color", "blue")
            .text("size", "3")
            .part("blob", blob_part(b"abc"));

        let res = app.post_form(routes::DATA, form).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.message(), "Unknown field color");
    }

    #[tokio::test]
    async fn data_has_no_name() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("owner", Uuid::new_v4().to_string())
            .text("name", "titanic")
            .text("size", "3")
            .part("blob", blob_part(b"abc"));

        let res = app.post_form(routes::DATA, form).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.message(), "Unknown field name");
    }

    #[tokio::test]
    async fn duplicate_field_is_rejected() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("owner", Uuid::new_v4().to_string())
            .text("size", "3")
            .text("size", "4")
            .part("blob", blob_part(b"abc"));

        let res = app.post_form(routes::DATA, form).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "DUPLICATE_FIELD");
    }

    #[tokio::test]
    async fn bad_uuid_names_the_field() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("owner", "bob")
            .text("size", "3")
            .part("blob", blob_part(b"abc"));

        let res = app.post_form(routes::DATA, form).await;
        assert_eq!(res.status, 400);
        assert!(res.message().starts_with("Error parsing UUID owner"));
    }

    #[tokio::test]
    async fn bad_size_is_rejected() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("owner", Uuid::new_v4().to_string())
            .text("size", "three")
            .part("blob", blob_part(b"abc"));

        let res = app.post_form(routes::DATA, form).await;
        assert_eq!(res.status, 400);
        assert!(res.message().starts_with("Error parsing size"));
    }

    #[tokio::test]
    async fn missing_blob_is_reported() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("owner", Uuid::new_v4().to_string())
            .text("size", "3");

        let res = app.post_form(routes::DATA, form).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.message(), "'Blob' unset");
    }

    #[tokio::test]
    async fn field_after_blob_is_misplaced() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("size", "3")
            .part("blob", blob_part(b"abc"))
            .text("owner", Uuid::new_v4().to_string());

        let res = app.post_form(routes::DATA, form).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "MISPLACED_BLOB_FIELD");
        assert_eq!(app.get(routes::DATA).await.body["total"], 0);
    }

    #[tokio::test]
    async fn field_after_written_blob_is_misplaced_and_cleaned_up() {
        let app = TestApp::spawn().await;
        let id = Uuid::new_v4();
        let form = Form::new()
            .text("uuid", id.to_string())
            .text("owner", Uuid::new_v4().to_string())
            .text("size", "3")
            .part("blob", blob_part(b"abc"))
            .text("extra", "late");

        let res = app.post_form(routes::DATA, form).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "MISPLACED_BLOB_FIELD");
        assert!(
            !app.blobs
                .exists(&BlobKey::primary("data", id))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn blob_alone_reports_first_missing_field() {
        let app = TestApp::spawn().await;
        let form = Form::new().part("blob", blob_part(b"abc"));

        let res = app.post_form(routes::DATA, form).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.message(), "'Owner' unset");
    }
}

mod content_type {
    use super::*;

    #[tokio::test]
    async fn missing_content_type_is_header_error() {
        let app = TestApp::spawn().await;
        let res = app.post_body(routes::DATA, None, b"abc".to_vec()).await;
        assert_eq!(res.status, 400);
        assert!(res.message().starts_with("Error parsing header"));
    }

    #[tokio::test]
    async fn invalid_content_type_is_media_type_error() {
        let app = TestApp::spawn().await;
        let res = app
            .post_body(routes::DATA, Some("invalid"), b"abc".to_vec())
            .await;
        assert_eq!(res.status, 400);
        assert!(res.message().starts_with("Invalid media type"));
    }

    #[tokio::test]
    async fn non_multipart_content_type_is_media_type_error() {
        let app = TestApp::spawn().await;
        let res = app
            .post_body(routes::ALGO, Some("application/json"), b"{}".to_vec())
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "UNSUPPORTED_MEDIA_TYPE");
    }
}

mod blob_writes {
    use super::*;

    #[tokio::test]
    async fn end_to_end_data_round_trip() {
        let app = TestApp::spawn().await;
        let content: Vec<u8> = (0..666u32).map(|i| (i % 251) as u8).collect();
        let id = app.create_data(Uuid::new_v4(), &content).await;

        let record = app.get(&routes::resource("data", &id)).await;
        assert_eq!(record.body["size"], 666);

        let res = app.get_raw(&routes::blob("data", &id)).await;
        assert_eq!(res.status(), 200);
        assert_eq!(res.headers()["content-length"].to_str().unwrap(), "666");
        assert_eq!(res.bytes().await.unwrap().to_vec(), content);
    }

    #[tokio::test]
    async fn aborted_upload_commits_nothing() {
        let app = TestApp::spawn().await;
        let boundary = "aborted-upload";
        let partial = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"owner\"\r\n\r\n{}\r\n\
             --{boundary}\r\nContent-Disposition: form-data; name=\"size\"\r\n\r\n4096\r\n\
             --{boundary}\r\nContent-Disposition: form-data; name=\"blob\"; filename=\"blob\"\r\n\r\n\
             only the first bytes",
            Uuid::new_v4()
        );
        app.abort_upload(routes::DATA, boundary, partial.as_bytes())
            .await;

        let mut staged = app.staged_blobs();
        for _ in 0..50 {
            if staged == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            staged = app.staged_blobs();
        }
        assert_eq!(staged, 0);
        assert_eq!(app.stored_blobs("data"), 0);
        assert_eq!(app.get(routes::DATA).await.body["total"], 0);
    }

    #[tokio::test]
    async fn short_blob_fails_and_commits_nothing() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("owner", Uuid::new_v4().to_string())
            .text("size", "10")
            .part("blob", blob_part(b"abc"));

        let res = app.post_form(routes::DATA, form).await;
        assert_eq!(res.status, 500);
        assert_eq!(app.get(routes::DATA).await.body["total"], 0);

        let namespace = app.data_dir.as_ref().unwrap().path().join("data");
        let leftovers = std::fs::read_dir(&namespace)
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn long_blob_fails() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("owner", Uuid::new_v4().to_string())
            .text("size", "2")
            .part("blob", blob_part(b"abcdef"));

        let res = app.post_form(routes::DATA, form).await;
        assert_eq!(res.status, 500);
        assert_eq!(app.get(routes::DATA).await.body["total"], 0);
    }

    #[tokio::test]
    async fn failing_blob_store_is_internal_error() {
        let app =
            TestApp::spawn_with(Arc::new(MemoryRecordStore::new()), Arc::new(FailingBlobStore))
                .await;
        let res = app
            .post_form(routes::DATA, data_form(Uuid::new_v4(), b"abc"))
            .await;
        assert_eq!(res.status, 500);
        assert_eq!(res.message(), "An unexpected error occurred");
    }
}

mod identifiers {
    use super::*;

    fn data_with_id(id: Uuid) -> Form {
        Form::new()
            .text("uuid", id.to_string())
            .text("owner", Uuid::new_v4().to_string())
            .text("size", "3")
            .part("blob", blob_part(b"abc"))
    }

    #[tokio::test]
    async fn reused_id_conflicts_and_keeps_original() {
        let app = TestApp::spawn().await;
        let id = Uuid::new_v4();
        let first = app.post_form(routes::DATA, data_with_id(id)).await;
        assert_eq!(first.status, 201);

        let form = Form::new()
            .text("uuid", id.to_string())
            .text("owner", Uuid::new_v4().to_string())
            .text("size", "3")
            .part("blob", blob_part(b"xyz"));
        let second = app.post_form(routes::DATA, form).await;
        assert_eq!(second.status, 409);
        assert_eq!(second.code(), "IDENTIFIER_CONFLICT");

        let res = app.get_raw(&routes::blob("data", &id.to_string())).await;
        assert_eq!(res.bytes().await.unwrap().to_vec(), b"abc");
    }

    #[tokio::test]
    async fn concurrent_creates_have_one_winner() {
        let app = TestApp::spawn().await;
        let id = Uuid::new_v4();

        let (a, b) = tokio::join!(
            app.post_form(routes::DATA, data_with_id(id)),
            app.post_form(routes::DATA, data_with_id(id)),
        );
        let mut statuses = [a.status, b.status];
        statuses.sort_unstable();
        assert_eq!(statuses, [201, 409]);
        assert_eq!(app.get(routes::DATA).await.body["total"], 1);
    }

    #[tokio::test]
    async fn same_id_across_kinds_is_allowed() {
        let app = TestApp::spawn().await;
        let id = Uuid::new_v4();
        let data = app.post_form(routes::DATA, data_with_id(id)).await;
        assert_eq!(data.status, 201);

        let algo = Form::new()
            .text("uuid", id.to_string())
            .text("owner", Uuid::new_v4().to_string())
            .text("name", "svm")
            .text("size", "3")
            .part("blob", blob_part(b"abc"));
        let res = app.post_form(routes::ALGO, algo).await;
        assert_eq!(res.status, 201, "{}", res.text);
    }
}
