mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use common::{app, create_user, send, setup};

fn unique_domain() -> String {
    format!("{}.example.com", &Uuid::new_v4().simple().to_string()[..12])
}

#[tokio::test]
async fn staff_manage_sites() -> anyhow::Result<()> {
    let Some(state) = setup().await? else {
        return Ok(());
    };
    let app = app(&state);
    let staff = create_user(&state, "staff", true).await?;
    let customer = create_user(&state, "customer", false).await?;
    let domain = unique_domain();

    let (status, _) = send(&app, Method::GET, "/api/sites", Some(&customer.token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/sites",
        Some(&staff.token),
        Some(json!({ "name": "Test Site", "domain": domain })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["domain"], domain);
    let uri = format!("/api/sites/{}", body["data"]["id"].as_str().expect("site id"));

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/sites",
        Some(&staff.token),
        Some(json!({ "name": "Copy", "domain": domain.to_uppercase() })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&staff.token),
        Some(json!({ "name": "updated-example.com" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&staff.token),
        Some(json!({ "name": "updated-example.com" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "updated-example.com");
    assert_eq!(body["data"]["domain"], domain);

    // PUT stores exactly what was sent, casing included.
    let mixed_case = format!("Updated-{}", unique_domain().to_uppercase());
    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&staff.token),
        Some(json!({ "name": "Renamed Site", "domain": mixed_case })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["domain"], mixed_case);
    let (_, body) = send(&app, Method::GET, &uri, Some(&staff.token), None).await?;
    assert_eq!(body["data"]["name"], "Renamed Site");
    assert_eq!(body["data"]["domain"], mixed_case);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&staff.token),
        Some(json!({ "name": "n".repeat(60) })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["fields"]["name"].is_array());

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&customer.token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&staff.token), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &uri, Some(&staff.token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn social_apps_link_sites_and_hide_secrets() -> anyhow::Result<()> {
    let Some(state) = setup().await? else {
        return Ok(());
    };
    let app = app(&state);
    let staff = create_user(&state, "staff", true).await?;
    let customer = create_user(&state, "customer", false).await?;

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/sites",
        Some(&staff.token),
        Some(json!({ "name": "Linked", "domain": unique_domain() })),
    )
    .await?;
    let site_id = body["data"]["id"].as_str().expect("site id").to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/social-apps",
        Some(&customer.token),
        Some(json!({ "provider": "google", "name": "Nope", "client_id": "x" })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/social-apps",
        Some(&staff.token),
        Some(json!({
            "provider": "google",
            "name": "Test App",
            "client_id": "abc123",
            "secret": "def456",
            "site_ids": [site_id],
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["has_secret"], true);
    assert!(body["data"].get("secret").is_none());
    assert_eq!(body["data"]["site_ids"], json!([site_id]));
    let uri = format!("/api/social-apps/{}", body["data"]["id"].as_str().expect("app id"));

    // POST on an existing app replaces it and still needs a provider.
    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(&staff.token),
        Some(json!({ "name": "Test App", "client_id": "abc123", "secret": "def456" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["fields"]["provider"].is_array());

    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(&staff.token),
        Some(json!({ "provider": "github", "name": "Renamed", "client_id": "abc123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["provider"], "github");
    assert_eq!(body["data"]["has_secret"], false);
    assert_eq!(body["data"]["site_ids"], json!([]));

    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&staff.token),
        Some(json!({ "site_ids": [site_id] })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Renamed");
    assert_eq!(body["data"]["site_ids"], json!([site_id]));

    // Removing the site drops the link but keeps the app.
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/sites/{site_id}"),
        Some(&staff.token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, Method::GET, &uri, Some(&staff.token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["site_ids"], json!([]));

    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&staff.token),
        Some(json!({ "site_ids": [Uuid::new_v4()] })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&staff.token), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &uri, Some(&staff.token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
