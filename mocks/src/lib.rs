//! `httpmock` fixtures imitating the document store, the media host and the
//! identity provider.

use httpmock::Method::{DELETE, PATCH, POST};
use httpmock::{Mock, MockServer};
use serde_json::{json, Value};

pub const PROJECT_ID: &str = "mediavault-test";
pub const OWNER_ID: &str = "user-1";
pub const ID_TOKEN: &str = "id-token";
pub const API_KEY: &str = "test-key";
pub const CLOUD_NAME: &str = "demo-cloud";
pub const UPLOAD_PRESET: &str = "unsigned";

pub fn documents_path() -> String {
    format!("/v1/projects/{}/databases/(default)/documents", PROJECT_ID)
}

fn document_name(collection: &str, id: &str) -> String {
    format!(
        "projects/{}/databases/(default)/documents/{}/{}",
        PROJECT_ID, collection, id
    )
}

pub fn media_document(
    id: &str,
    owner: &str,
    url: &str,
    kind: &str,
    collection: Option<&str>,
    create_time: &str,
) -> Value {
    let collection_value = match collection {
        Some(c) => json!({ "stringValue": c }),
        None => json!({ "nullValue": null }),
    };
    json!({
        "name": document_name("media", id),
        "fields": {
            "userId": { "stringValue": owner },
            "mediaUrl": { "stringValue": url },
            "resourceType": { "stringValue": kind },
            "collectionId": collection_value,
        },
        "createTime": create_time,
        "updateTime": create_time,
    })
}

pub fn collection_document(id: &str, owner: &str, name: &str, create_time: &str) -> Value {
    json!({
        "name": document_name("collections", id),
        "fields": {
            "userId": { "stringValue": owner },
            "name": { "stringValue": name },
        },
        "createTime": create_time,
        "updateTime": create_time,
    })
}

/// Shape a list of documents the way `:runQuery` streams them back.
pub fn query_rows(documents: Vec<Value>) -> Value {
    if documents.is_empty() {
        return json!([{ "readTime": "2024-01-01T00:00:00Z" }]);
    }
    Value::Array(
        documents
            .into_iter()
            .map(|d| json!({ "document": d, "readTime": "2024-01-01T00:00:00Z" }))
            .collect(),
    )
}

async fn expect_query<'a>(server: &'a MockServer, collection: &str, status: u16, body: Value) -> Mock<'a> {
    let path = format!("{}:runQuery", documents_path());
    let selector = format!("\"collectionId\":\"{}\"", collection);
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(path)
                .header("authorization", format!("Bearer {}", ID_TOKEN))
                .body_contains(selector);
            then.status(status).json_body(body);
        })
        .await
}

pub async fn expect_list_media(server: &MockServer, documents: Vec<Value>) -> Mock<'_> {
    expect_query(server, "media", 200, query_rows(documents)).await
}

pub async fn expect_list_collections(server: &MockServer, documents: Vec<Value>) -> Mock<'_> {
    expect_query(server, "collections", 200, query_rows(documents)).await
}

pub async fn expect_list_failure<'a>(server: &'a MockServer, collection: &str, status: u16) -> Mock<'a> {
    expect_query(
        server,
        collection,
        status,
        json!({ "error": { "code": status, "message": "PERMISSION_DENIED" } }),
    )
    .await
}

/// Expect a document creation in `collection`, answering with `id`.
pub async fn expect_create<'a>(server: &'a MockServer, collection: &str, id: &str) -> Mock<'a> {
    let path = format!("{}/{}", documents_path(), collection);
    let name = document_name(collection, id);
    server
        .mock_async(|when, then| {
            when.method(POST).path(path);
            then.status(200).json_body(json!({
                "name": name,
                "fields": {},
                "createTime": "2024-01-01T00:00:00Z",
                "updateTime": "2024-01-01T00:00:00Z",
            }));
        })
        .await
}

pub async fn expect_create_failure<'a>(server: &'a MockServer, collection: &str, status: u16) -> Mock<'a> {
    let path = format!("{}/{}", documents_path(), collection);
    server
        .mock_async(|when, then| {
            when.method(POST).path(path);
            then.status(status)
                .json_body(json!({ "error": { "code": status, "message": "PERMISSION_DENIED" } }));
        })
        .await
}

pub async fn expect_update<'a>(server: &'a MockServer, media_id: &str, status: u16) -> Mock<'a> {
    let path = format!("{}/media/{}", documents_path(), media_id);
    server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path(path)
                .query_param("updateMask.fieldPaths", "collectionId");
            then.status(status).json_body(json!({}));
        })
        .await
}

pub async fn expect_delete<'a>(server: &'a MockServer, media_id: &str, status: u16) -> Mock<'a> {
    let path = format!("{}/media/{}", documents_path(), media_id);
    server
        .mock_async(|when, then| {
            when.method(DELETE).path(path);
            then.status(status).json_body(json!({}));
        })
        .await
}

pub async fn expect_upload<'a>(server: &'a MockServer, kind: &str, secure_url: &str) -> Mock<'a> {
    let path = format!("/v1_1/{}/{}/upload", CLOUD_NAME, kind);
    let url = secure_url.to_string();
    server
        .mock_async(|when, then| {
            when.method(POST).path(path).body_contains(UPLOAD_PRESET);
            then.status(200).json_body(json!({
                "secure_url": url,
                "resource_type": "ignored",
            }));
        })
        .await
}

pub async fn expect_upload_failure<'a>(server: &'a MockServer, kind: &str, status: u16) -> Mock<'a> {
    let path = format!("/v1_1/{}/{}/upload", CLOUD_NAME, kind);
    server
        .mock_async(|when, then| {
            when.method(POST).path(path);
            then.status(status)
                .json_body(json!({ "error": { "message": "Upload preset not found" } }));
        })
        .await
}

fn account_body(user_id: &str, email: &str) -> Value {
    json!({
        "localId": user_id,
        "email": email,
        "idToken": ID_TOKEN,
        "refreshToken": "refresh-token",
        "expiresIn": "3600",
    })
}

/// Expect a password sign-in (`signInWithPassword`) or registration (`signUp`).
pub async fn expect_account<'a>(server: &'a MockServer, endpoint: &str, user_id: &str, email: &str) -> Mock<'a> {
    let path = format!("/v1/accounts:{}", endpoint);
    let body = account_body(user_id, email);
    server
        .mock_async(|when, then| {
            when.method(POST).path(path).query_param("key", API_KEY);
            then.status(200).json_body(body);
        })
        .await
}

pub async fn expect_account_error<'a>(server: &'a MockServer, endpoint: &str, message: &str) -> Mock<'a> {
    let path = format!("/v1/accounts:{}", endpoint);
    let body = json!({ "error": { "code": 400, "message": message } });
    server
        .mock_async(|when, then| {
            when.method(POST).path(path);
            then.status(400).json_body(body);
        })
        .await
}

pub async fn expect_token_refresh<'a>(server: &'a MockServer, user_id: &str, id_token: &str) -> Mock<'a> {
    let body = json!({
        "id_token": id_token,
        "refresh_token": "refresh-token-2",
        "expires_in": "3600",
        "user_id": user_id,
        "token_type": "Bearer",
    });
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/token")
                .query_param("key", API_KEY)
                .body_contains("grant_type=refresh_token");
            then.status(200).json_body(body);
        })
        .await
}
