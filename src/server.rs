use std::io;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ntex::http::StatusCode;
use ntex::util::Bytes;
use ntex::web;
use ntex::web::HttpRequest;
use ntex_files::NamedFile;
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::error::ApiError;
use crate::gate::check_secret;
use crate::post::PostSummary;
use crate::post_repo::{filter_by_query, get_post_by_slug, get_posts};
use crate::query_string::QueryString;
use crate::related::{related_posts, DEFAULT_SUGGESTIONS};
use crate::sanitize::{post_filename_from_title, sanitize_image_name, validate_post_filename, validate_slug};
use crate::storage::{delete_file, store_file, StoreTarget};

struct AppState {
    config: Config,
}

fn error_response(err: &ApiError) -> web::HttpResponse {
    let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    web::HttpResponse::build(status).json(&json!({ "error": err.message() }))
}

fn parse_body<T: for<'de> Deserialize<'de>>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|_| ApiError::Validation("Invalid JSON".to_string()))
}

fn get_query(req: &HttpRequest, key: &str) -> Option<String> {
    let query_str = req.uri().query()?;
    let qs = QueryString::from(query_str);
    qs.get(key).map(|v| v.to_string())
}

// Begin: Read region --------

#[web::get("/api/blog/posts")]
async fn list_posts(req: HttpRequest, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let posts = match get_posts(&state.config.paths.posts_dir) {
        Ok(posts) => posts,
        Err(e) => {
            return error_response(&ApiError::Upstream(format!("Error listing posts: {}", e)));
        }
    };

    let query = get_query(&req, "q").unwrap_or_default();
    let summaries: Vec<PostSummary> = filter_by_query(&posts, &query)
        .into_iter()
        .map(PostSummary::from)
        .collect();

    web::HttpResponse::Ok().json(&json!({ "posts": summaries }))
}

#[web::get("/api/blog/posts/{slug}")]
async fn view_post(path: web::types::Path<String>, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let slug = path.into_inner();

    match get_post_by_slug(&state.config.paths.posts_dir, &slug) {
        Ok(Some(post)) => web::HttpResponse::Ok().json(&post),
        Ok(None) => error_response(&ApiError::NotFound("Post not found".to_string())),
        Err(e) => error_response(&ApiError::Upstream(format!("Error loading post {}: {}", slug, e))),
    }
}

#[web::get("/api/blog/posts/{slug}/related")]
async fn related_to_post(path: web::types::Path<String>, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let slug = path.into_inner();

    let posts = match get_posts(&state.config.paths.posts_dir) {
        Ok(posts) => posts,
        Err(e) => {
            return error_response(&ApiError::Upstream(format!("Error listing posts: {}", e)));
        }
    };

    let summaries: Vec<PostSummary> = related_posts(&slug, &posts, DEFAULT_SUGGESTIONS)
        .into_iter()
        .map(PostSummary::from)
        .collect();

    web::HttpResponse::Ok().json(&json!({ "posts": summaries }))
}

// End: Read region --------

// Begin: Admin region --------

#[derive(Deserialize)]
struct SaveRequest {
    key: Option<String>,
    filename: Option<String>,
    title: Option<String>,
    content: Option<String>,
}

#[web::post("/api/blog/save")]
async fn save_post(body: Bytes, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let request: SaveRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };

    if let Err(e) = check_secret(state.config.admin_secret(), request.key.as_deref()) {
        return error_response(&e);
    }

    let content = match request.content {
        Some(content) => content,
        None => return error_response(&ApiError::Validation("Missing filename or content".to_string())),
    };

    // A missing filename falls back to one derived from the title; a
    // caller-supplied filename is validated as-is, never repaired
    let filename = match request.filename.map(|f| f.trim().to_string()).filter(|f| !f.is_empty()) {
        Some(filename) => {
            if let Err(e) = validate_post_filename(&filename) {
                return error_response(&e);
            }
            filename
        }
        None => match request.title {
            Some(title) => post_filename_from_title(&title),
            None => return error_response(&ApiError::Validation("Missing filename or content".to_string())),
        },
    };

    match store_file(&state.config, StoreTarget::Posts, &filename, content.as_bytes()).await {
        Ok(path) => web::HttpResponse::Ok().json(&json!({ "ok": true, "path": path })),
        Err(e) => error_response(&e),
    }
}

#[derive(Deserialize)]
struct DeleteRequest {
    key: Option<String>,
    slug: Option<String>,
}

#[web::post("/api/blog/delete")]
async fn delete_post(body: Bytes, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let request: DeleteRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };

    if let Err(e) = check_secret(state.config.admin_secret(), request.key.as_deref()) {
        return error_response(&e);
    }

    let slug = match request.slug.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
        Some(slug) => slug,
        None => return error_response(&ApiError::Validation("Missing slug".to_string())),
    };

    if let Err(e) = validate_slug(&slug) {
        return error_response(&e);
    }

    let filename = format!("{}.md", slug);
    match delete_file(&state.config, StoreTarget::Posts, &filename).await {
        Ok(()) => web::HttpResponse::Ok().json(&json!({ "ok": true })),
        Err(e) => error_response(&e),
    }
}

#[derive(Deserialize)]
struct UploadRequest {
    key: Option<String>,
    filename: Option<String>,
    mime: Option<String>,
    data: Option<String>,
}

#[web::post("/api/blog/upload-image")]
async fn upload_image(body: Bytes, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let request: UploadRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };

    if let Err(e) = check_secret(state.config.admin_secret(), request.key.as_deref()) {
        return error_response(&e);
    }

    let data = match request.data {
        Some(data) => data,
        None => return error_response(&ApiError::Validation("Missing file".to_string())),
    };

    let bytes = match BASE64.decode(data.as_bytes()) {
        Ok(bytes) => bytes,
        Err(_) => return error_response(&ApiError::Validation("Invalid file data".to_string())),
    };

    let original_name = request.filename.unwrap_or_default();
    let mime = request.mime.unwrap_or_default();
    let filename = match sanitize_image_name(&original_name, &mime) {
        Ok(filename) => filename,
        Err(e) => return error_response(&e),
    };

    match store_file(&state.config, StoreTarget::Images, &filename, &bytes).await {
        Ok(path) => web::HttpResponse::Ok().json(&json!({ "ok": true, "path": path })),
        Err(e) => error_response(&e),
    }
}

// End: Admin region --------

#[web::get("/blog/{file_name}")]
async fn image_files(path: web::types::Path<String>, state: web::types::State<Arc<AppState>>) -> Result<NamedFile, web::Error> {
    if path.contains("../") {
        return Err(web::error::ErrorUnauthorized("Access forbidden").into());
    }

    let file_path = state.config.paths.images_dir.join(path.into_inner());

    Ok(NamedFile::open(file_path)?)
}

pub async fn server_run(config: Config) -> io::Result<()> {
    let bind_addr = config.server.address.clone();
    let bind_port = config.server.port;
    let app_state = Arc::new(AppState { config });

    web::HttpServer::new(move || {
        web::App::new()
            .state(app_state.clone())
            .service(list_posts)
            .service(related_to_post)
            .service(view_post)
            .service(save_post)
            .service(delete_post)
            .service(upload_image)
            .service(image_files)
    })
        .bind((bind_addr, bind_port))?
        .run()
        .await
}
