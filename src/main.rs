use actix_web::middleware::Logger;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use dotenv::dotenv;

use p_center::cache::SolutionCache;
use p_center::config::ServerConfig;
use p_center::convert::to_solve_job;
use p_center::domain::backend_factory::{create_backend, BackendOptions};
use p_center::domain::solve::solve_instance;
use p_center::models::{ErrorResponse, SolveRequest, SolveResponse};
use p_center::PCenterError;

struct AppState {
    config: ServerConfig,
    cache: SolutionCache,
}

fn error_response(err: PCenterError) -> HttpResponse {
    let body = ErrorResponse {
        error: err.to_string(),
    };
    if err.is_client_error() {
        log::info!("Rejected request: {}", err);
        HttpResponse::BadRequest().json(body)
    } else {
        sentry::capture_error(&err);
        HttpResponse::InternalServerError().json(body)
    }
}

// ---------- Route handlers ----------

/// POST /solve
async fn solve(state: web::Data<AppState>, req: web::Json<SolveRequest>) -> HttpResponse {
    let request = req.into_inner();

    if let Some(cached) = state.cache.get(&request) {
        log::debug!("Serving '{}' from the solution cache", request.instance.name);
        return HttpResponse::Ok().json(cached);
    }

    let job = match to_solve_job(&request, &state.config.solver, state.config.max_nodes) {
        Ok(job) => job,
        Err(err) => return error_response(err),
    };
    let options = BackendOptions {
        glpk_scale: state.config.glpk_scale,
    };
    let time_limit_secs = job.enforced_time_limit().map(|limit| limit.as_secs());

    // Solves are CPU-bound; keep them off the async workers
    let outcome = web::block(move || {
        let mut backend = create_backend(job.backend, &options);
        let solution = solve_instance(&job.instance, job.variant, backend.as_mut(), &job.config)?;
        Ok::<_, PCenterError>(SolveResponse {
            solver: backend.name().to_string(),
            variant: job.variant,
            time_limit_secs,
            solution,
        })
    })
    .await;

    match outcome {
        Ok(Ok(response)) => {
            state.cache.put(&request, &response);
            HttpResponse::Ok().json(response)
        }
        Ok(Err(err)) => error_response(err),
        Err(err) => {
            log::error!("Solve task did not complete: {}", err);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("Solve task did not complete: {}", err),
            })
        }
    }
}

/// GET /health
async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("OK")
}

/// GET /docs
async fn docs() -> impl Responder {
    let docs_html = include_str!("../static/docs.html");
    HttpResponse::Ok().content_type("text/html").body(docs_html)
}

/// GET / - Redirect to docs
async fn root_redirect() -> impl Responder {
    HttpResponse::Found()
        .append_header(("Location", "/docs"))
        .finish()
}

// ---------- Server bootstrap ----------
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = ServerConfig::from_env();

    let sentry_guard = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });
    let sentry_enabled = sentry_guard.is_some();

    let port = config.port;
    let json_limit = config.json_limit;
    log::info!(
        "Starting server on http://127.0.0.1:{} (time limit {:?}, max nodes {}, cache {}, sentry {})",
        port,
        config.solver.time_limit,
        config.max_nodes,
        config.cache_size,
        if sentry_enabled { "on" } else { "off" }
    );

    let state = web::Data::new(AppState {
        cache: SolutionCache::new(config.cache_size),
        config,
    });

    HttpServer::new(move || {
        App::new()
            .wrap(sentry_actix::Sentry::new())
            .wrap(Logger::default())
            .app_data(state.clone())
            .app_data(
                web::JsonConfig::default()
                    .limit(json_limit)
                    .error_handler(|err, _| {
                        let err_string = err.to_string();
                        actix_web::error::InternalError::from_response(
                            err,
                            HttpResponse::BadRequest()
                                .json(serde_json::json!({ "error": err_string })),
                        )
                        .into()
                    }),
            )
            .route("/", web::get().to(root_redirect))
            .route("/solve", web::post().to(solve))
            .route("/health", web::get().to(health_check))
            .route("/docs", web::get().to(docs))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
