mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{TestServer, PASSWORD};

#[tokio::test]
async fn plain_users_only_reach_themselves() -> Result<()> {
    let server = TestServer::start().await?;
    let (own_id, token) = server.seed_user("plain@example.com", "user").await?;
    let (other_id, _) = server.seed_user("other@example.com", "user").await?;

    let (status, body) = server.get(&format!("/v1/users/{}", own_id), &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], own_id.as_str());
    assert!(body.get("password").is_none());

    let (status, body) = server.get(&format!("/v1/users/{}", other_id), &token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Forbidden");

    let (status, _) = server.get("/v1/users", &token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = server
        .patch(&format!("/v1/users/{}", own_id), &token, json!({ "name": "Renamed" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "renamed");
    Ok(())
}

#[tokio::test]
async fn plain_users_cannot_change_their_own_role() -> Result<()> {
    let server = TestServer::start().await?;
    let (own_id, token) = server.seed_user("plain@example.com", "user").await?;
    let path = format!("/v1/users/{}", own_id);

    let (status, body) = server.patch(&path, &token, json!({ "role": "admin" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);
    let (status, _) = server.patch(&path, &token, json!({ "status": "inactive" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = server.get(&path, &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "user");
    let (status, _) = server.get("/v1/users", &token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = server.admin_token().await?;
    let (status, body) = server.patch(&path, &admin, json!({ "role": "admin" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
    Ok(())
}

#[tokio::test]
async fn admin_manages_users() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.admin_token().await?;

    let (status, created) = server
        .post(
            "/v1/users",
            Some(&admin),
            json!({
                "name": "Grace",
                "lastName": "Hopper",
                "email": "grace@example.com",
                "password": PASSWORD,
                "role": "user",
                "skills": [{ "name": "COBOL" }]
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    let id = created["id"].as_str().unwrap_or_default().to_string();
    assert_eq!(created["skills"][0]["name"], "cobol");
    assert!(created["skills"][0]["id"].is_string());
    assert!(created.get("password").is_none());

    let (status, body) = server
        .post(
            "/v1/users",
            Some(&admin),
            json!({
                "name": "Grace",
                "lastName": "Again",
                "email": "GRACE@example.com",
                "password": PASSWORD,
                "role": "user"
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already taken");

    let (status, page) = server.get("/v1/users?role=user", &admin).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalResults"], 1);
    assert_eq!(page["results"][0]["email"], "grace@example.com");

    let (status, body) = server
        .patch(&format!("/v1/users/{}", id), &admin, json!({ "email": "admin@example.com" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already taken");

    let (status, _) = server.patch(&format!("/v1/users/{}", id), &admin, json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .patch(&format!("/v1/users/{}", id), &admin, json!({ "password": "changed99" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = server
        .post("/v1/auth/login", None, json!({ "email": "grace@example.com", "password": "changed99" }))
        .await?;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(server.delete(&format!("/v1/users/{}", id), &admin).await?, StatusCode::NO_CONTENT);
    let (status, body) = server.get(&format!("/v1/users/{}", id), &admin).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
    assert_eq!(server.delete(&format!("/v1/users/{}", id), &admin).await?, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn user_search_and_id_checks() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.admin_token().await?;
    server.seed_user("lin@example.com", "user").await?;

    let (status, found) = server.get("/v1/users/search?name=TEST", &admin).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().map(Vec::len), Some(2));

    let (status, body) = server.get("/v1/users/search?name=nobody", &admin).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");

    let (status, _) = server.get("/v1/users/search?email=x", &admin).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server.get("/v1/users/12345", &admin).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    Ok(())
}
