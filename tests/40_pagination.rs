mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestServer;

async fn seed_teams(server: &TestServer, token: &str, count: usize) -> Result<()> {
    for i in 0..count {
        let (status, body) = server
            .post("/v1/teams", Some(token), json!({ "name": format!("team {:02}", i) }))
            .await?;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }
    Ok(())
}

fn names(page: &Value) -> Vec<String> {
    page["results"]
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|r| r["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn empty_collection_envelope() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.admin_token().await?;

    let (status, page) = server.get("/v1/teams", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        page,
        json!({ "results": [], "page": 1, "limit": 10, "totalPages": 0, "totalResults": 0 })
    );
    Ok(())
}

#[tokio::test]
async fn pages_walk_the_whole_collection() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.admin_token().await?;
    seed_teams(&server, &token, 25).await?;

    let (status, first) = server.get("/v1/teams", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["totalResults"], 25);
    assert_eq!(first["totalPages"], 3);
    assert_eq!(names(&first).len(), 10);
    // insertion order without sortBy
    assert_eq!(names(&first)[0], "team 00");

    let (_, last) = server.get("/v1/teams?page=3", &token).await?;
    assert_eq!(last["page"], 3);
    assert_eq!(names(&last), vec!["team 20", "team 21", "team 22", "team 23", "team 24"]);

    let (status, beyond) = server.get("/v1/teams?page=9", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(beyond["results"], json!([]));
    assert_eq!(beyond["totalResults"], 25);
    Ok(())
}

#[tokio::test]
async fn sorting_and_limit_defaults() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.admin_token().await?;
    seed_teams(&server, &token, 12).await?;

    let (_, page) = server.get("/v1/teams?sortBy=name:desc&limit=3", &token).await?;
    assert_eq!(names(&page), vec!["team 11", "team 10", "team 09"]);
    assert_eq!(page["totalPages"], 4);

    let (_, page) = server.get("/v1/teams?limit=0&page=-2", &token).await?;
    assert_eq!(page["limit"], 10);
    assert_eq!(page["page"], 1);

    let (status, _) = server.get("/v1/teams?limit=ten", &token).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server.get("/v1/teams?owner=me", &token).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn list_filters_narrow_the_count() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.admin_token().await?;
    seed_teams(&server, &token, 4).await?;
    server
        .post("/v1/teams", Some(&token), json!({ "name": "retired", "status": "inactive" }))
        .await?;

    let (_, page) = server.get("/v1/teams?status=inactive", &token).await?;
    assert_eq!(page["totalResults"], 1);
    assert_eq!(names(&page), vec!["retired"]);

    let (_, page) = server.get("/v1/teams?status=active&limit=2", &token).await?;
    assert_eq!(page["totalResults"], 4);
    assert_eq!(page["totalPages"], 2);
    Ok(())
}
