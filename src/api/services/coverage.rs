use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use tracing::trace;

use crate::services::{CoverageError, CoverageService};
use crate::storage::SeaOrmStorage;
use crate::utils::unix_now;

/// `?plugin=...&hours=...`; both kept raw so each failure gets its own message
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CoverageQuery {
    pub plugin: Option<String>,
    pub hours: Option<String>,
}

impl CoverageQuery {
    /// Collect from raw query pairs; a repeated key keeps its last value
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "plugin" => query.plugin = Some(value),
                "hours" => query.hours = Some(value),
                _ => {}
            }
        }
        query
    }
}

pub struct CoverageHandler;

impl CoverageHandler {
    pub async fn handle_coverage(
        query: web::Query<Vec<(String, String)>>,
        storage: web::Data<Arc<SeaOrmStorage>>,
    ) -> impl Responder {
        let query = CoverageQuery::from_pairs(query.into_inner());
        trace!("Coverage request: {:?}", query);
        let service = CoverageService::new(storage.get_ref().clone());

        match service
            .handle(query.plugin.as_deref(), query.hours.as_deref(), unix_now())
            .await
        {
            Ok(points) => HttpResponse::Ok().json(points),
            Err(e) => Self::error_response(&e),
        }
    }

    fn error_response(err: &CoverageError) -> HttpResponse {
        let mut builder = if err.is_internal() {
            HttpResponse::InternalServerError()
        } else {
            HttpResponse::Ok()
        };
        builder
            .content_type("text/plain; charset=utf-8")
            .body(err.body())
    }
}

/// Coverage 路由配置
pub fn coverage_routes() -> actix_web::Scope {
    web::scope("")
        .route("/coverage", web::get().to(CoverageHandler::handle_coverage))
        .route("/coverage.php", web::get().to(CoverageHandler::handle_coverage))
}
