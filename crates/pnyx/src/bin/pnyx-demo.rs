//! Sample article service.
//!
//! ```text
//! PNYX__SERVER__HTTP_ADDR=127.0.0.1:8080 cargo run --bin pnyx-demo
//! curl 'localhost:8080/api/articles?limit=2&sort=top&format=xml&pretty'
//! ```
//!
//! Reads `pnyx.toml` (or the file named by `PNYX_CONFIG`) when present.

use std::collections::HashMap;

use anyhow::Context;
use pnyx::prelude::*;
use serde::Serialize;

const NOT_FOUND: ErrorTemplate = ErrorTemplate::new(-3, "Not found: ", StatusCode::NOT_FOUND);

#[derive(Debug, Clone, Serialize)]
struct Article {
    id: u32,
    title: &'static str,
    views: u32,
    published: &'static str,
}

const ARTICLES: [Article; 4] = [
    Article {
        id: 1,
        title: "Envelopes everywhere",
        views: 120,
        published: "2024-01-03",
    },
    Article {
        id: 2,
        title: "Faults are values",
        views: 340,
        published: "2024-02-11",
    },
    Article {
        id: 3,
        title: "Negotiating XML",
        views: 75,
        published: "2024-03-28",
    },
    Article {
        id: 4,
        title: "Clamping query input",
        views: 210,
        published: "2024-05-09",
    },
];

fn sort_keys() -> HashMap<&'static str, &'static str> {
    HashMap::from([("new", "published"), ("top", "views"), ("id", "id")])
}

/// `GET /articles?limit=&offset=&sort=new|top|id`
fn list_articles(ctx: &RequestContext) -> HandlerResult<Vec<Article>> {
    let query = ctx.query();
    let limit = query.get_int_min_max("limit", 10, 1, 100)?;
    let offset = query.get_int_min_max("offset", 0, 0, i64::MAX)?;
    let sort = query.get_string("sort", "id");

    let mut articles = ARTICLES.to_vec();
    match remap(&sort, &sort_keys()) {
        "published" => articles.sort_by(|a, b| b.published.cmp(a.published)),
        "views" => articles.sort_by(|a, b| b.views.cmp(&a.views)),
        _ => articles.sort_by_key(|a| a.id),
    }

    let skip = usize::try_from(offset).unwrap_or(usize::MAX);
    let take = usize::try_from(limit).unwrap_or(usize::MAX);
    Ok(articles.into_iter().skip(skip).take(take).collect())
}

/// `GET /articles/{id}`
fn get_article(ctx: &RequestContext) -> HandlerResult<Article> {
    let raw = ctx.path_param("id").unwrap_or_default();
    let id: u32 = raw
        .parse()
        .or_else(|_| raise(FaultPayload::invalid_parameter("id")))?;

    ARTICLES
        .iter()
        .find(|article| article.id == id)
        .cloned()
        .ok_or_else(|| NOT_FOUND.with_detail(format_args!("article {id}")).into())
}

/// `GET /articles/{id}/export`, backed by a store that is always down.
fn export_article(ctx: &RequestContext) -> HandlerResult<String> {
    let id = ctx.path_param("id").unwrap_or_default();
    let body = std::fs::read_to_string("/nonexistent/export-store")
        .with_context(|| format!("exporting article {id}"))?;
    Ok(body)
}

fn router(prefix: &str) -> Router {
    let mut router = Router::with_prefix(prefix);
    router
        .register(Method::GET, "/articles", list_articles)
        .register(Method::GET, "/articles/{id}", get_article)
        .register(Method::GET, "/articles/{id}/export", export_article);

    RouteRegistrar::new(&mut router, "/health").register(Method::GET, "/", |_| Ok("ok"));
    router
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var("PNYX_CONFIG").unwrap_or_else(|_| "pnyx.toml".to_string());

    let config = ConfigLoader::new()
        .with_optional_file(&config_path)?
        .with_dotenv()?
        .with_env_prefix("PNYX")
        .load()
        .context("loading configuration")?;

    init_logging(&config.logging.log_config())?;

    let router = router(&config.server.route_prefix);
    tracing::info!(
        routes = router.route_count(),
        prefix = %config.server.route_prefix,
        "routes registered"
    );

    Server::new(config.server.server_config(), router).run().await?;
    Ok(())
}
