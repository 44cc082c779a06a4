use axum::{response::Html, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

const SAMPLE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Sample Page</title>
</head>
<body>
    <h1>Server side rendering</h1>
    <p>This page is rendered by the server.</p>
</body>
</html>
"#;

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/fruit/", get(fruit))
        .route("/user/", get(sample_page))
        .route("/health", get(|| async { "ok" }))
}

async fn fruit() -> Json<Value> {
    Json(json!({ "fruit": "mango" }))
}

async fn sample_page() -> Html<&'static str> {
    Html(SAMPLE_PAGE)
}
