use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use restwire::http::{BodyType, Cookie, Entity, MediaType, Request, Response, StatusCode};
use restwire::routing::{Endpoint, StatusHandler};
use restwire::session::SessionStore;
use restwire::{Config, Server};

const EMPLOYEES: [&str; 3] = ["Nick", "Sam", "Alex"];

#[derive(Deserialize)]
struct EmployeeQuery {
    id: usize,
}

#[derive(Serialize)]
struct Employee {
    id: usize,
    name: &'static str,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::load();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(cfg.log_level.as_filter())
        .init();

    let sessions = Arc::new(SessionStore::new());
    if let Some(path) = &cfg.sessions_file {
        match std::fs::read_to_string(path) {
            Ok(doc) => {
                let loaded = sessions
                    .deserialize_many(&doc)
                    .with_context(|| format!("failed to load sessions from {}", path.display()))?;
                tracing::info!("Loaded {} sessions from {}", loaded, path.display());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).context("failed to read sessions file"),
        }
    }

    let server = Server::with_sessions(cfg.clone(), sessions.clone());
    register_demo(&server);

    server.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    server.stop();
    server.stopped().await;

    if let Some(path) = &cfg.sessions_file {
        std::fs::write(path, sessions.serialize()?)
            .with_context(|| format!("failed to save sessions to {}", path.display()))?;
        tracing::info!("Saved {} sessions to {}", sessions.len(), path.display());
    }

    Ok(())
}

fn register_demo(server: &Server) {
    server
        .add_endpoint(
            Endpoint::get("/")
                .produces(MediaType::TEXT_HTML)
                .handler(|_| Ok(Response::ok("<h1>Index! Welcome to Restwire!</h1>"))),
        )
        .add_endpoint(
            Endpoint::get("/testAPI")
                .handler(|_| Ok(Response::ok("Hello from the test API!"))),
        )
        .add_endpoint(
            Endpoint::post("/GetEmployee")
                .media(MediaType::APPLICATION_JSON)
                .request_body(BodyType::Json)
                .response_body(BodyType::Json)
                .handler(get_employee),
        )
        .add_endpoint(
            Endpoint::get("/GetUsername")
                .handler(get_username),
        )
        .add_endpoint(
            Endpoint::post("/GetUsername")
                .consumes(MediaType::APPLICATION_FORM_URLENCODED)
                .handler(get_username),
        )
        .add_endpoint(
            Endpoint::get("/testJson")
                .produces(MediaType::APPLICATION_JSON)
                .response_body(BodyType::Json)
                .handler(|_| {
                    Ok(Response::json(&serde_json::json!({
                        "server": "restwire",
                        "employees": EMPLOYEES,
                    }))?)
                }),
        )
        .add_endpoint(
            Endpoint::post("/testForm")
                .consumes(MediaType::APPLICATION_FORM_URLENCODED)
                .handler(get_username),
        )
        .add_endpoint(
            Endpoint::get("/testCookie")
                .handler(test_cookie),
        )
        .add_endpoint(
            Endpoint::get("/testSession")
                .handler(test_session),
        )
        .add_endpoint(
            Endpoint::get("/testGZIP")
                .handler(|_| {
                    Ok(Response::builder(StatusCode::OK)
                        .body("This body travelled gzip compressed.")
                        .content_encoding("gzip")
                        .build())
                }),
        )
        .set_response_handler(StatusHandler::new(
            StatusCode::NOT_FOUND,
            MediaType::TEXT_HTML,
            |req| {
                Ok(Response::builder(StatusCode::NOT_FOUND)
                    .body(format!("<h1>Nothing at {}</h1>", req.path))
                    .build())
            },
        ));
}

fn get_employee(req: &mut Request) -> anyhow::Result<Response> {
    let query: EmployeeQuery = req.body_as()?;
    match query.id.checked_sub(1).and_then(|i| EMPLOYEES.get(i)) {
        Some(name) => Ok(Response::json(&Employee {
            id: query.id,
            name: *name,
        })?),
        None => Ok(Response::new(StatusCode::NOT_FOUND)),
    }
}

fn get_username(req: &mut Request) -> anyhow::Result<Response> {
    let name = req
        .query_param("id")
        .and_then(|id| id.parse::<usize>().ok())
        .and_then(|id| id.checked_sub(1))
        .and_then(|i| EMPLOYEES.get(i));
    match name {
        Some(name) => Ok(Response::ok(*name)),
        None => Ok(Response::builder(StatusCode::BAD_REQUEST)
            .body("unknown or missing id")
            .build()),
    }
}

fn test_cookie(req: &mut Request) -> anyhow::Result<Response> {
    if let Some(cookie) = req.cookie("HeyImCookie") {
        return Ok(Response::ok(format!("Welcome back, your cookie says {}", cookie.value)));
    }
    Ok(Response::builder(StatusCode::OK)
        .body("Here is a cookie")
        .cookie(Cookie::new("HeyImCookie", "DontDeletePls"))
        .build())
}

/// Stores a greeting on the first visit and echoes it back afterwards.
fn test_session(req: &mut Request) -> anyhow::Result<Response> {
    let session = req.session();
    match session.get_as::<String>("TESTKEY") {
        Some(value) => Ok(Response::ok(value)),
        None => {
            session.put("TESTKEY", "Hello World!");
            Ok(Response::ok("Session created"))
        }
    }
}
