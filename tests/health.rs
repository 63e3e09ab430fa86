mod common;

use axum::http::{Method, StatusCode};

use common::{app, lazy_state, send, setup};

#[tokio::test]
async fn health_check_reports_database() -> anyhow::Result<()> {
    let Some(state) = setup().await? else {
        return Ok(());
    };

    let (status, body) = send(&app(&state), Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Health check");
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn unknown_path_gets_json_not_found() -> anyhow::Result<()> {
    let (status, body) = send(&app(&lazy_state()), Method::GET, "/nope", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["path"], "/nope");
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() -> anyhow::Result<()> {
    let app = app(&lazy_state());
    for uri in ["/api/products", "/api/users/me", "/api/cart", "/api/sites"] {
        let (status, body) = send(&app, Method::GET, uri, None, None).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["data"]["error"], "Missing Authorization header");
    }

    let (status, _) = send(&app, Method::GET, "/api/cart", Some("not-a-jwt"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}
