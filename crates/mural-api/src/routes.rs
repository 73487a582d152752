use std::time::Duration;

use axum::{
    Router,
    handler::Handler,
    http::StatusCode,
    middleware,
    routing::{MethodFilter, MethodRouter, get, on},
};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::{log_request, require_auth, track_metrics};
use crate::state::AppState;
use crate::{auth, metrics, publications};

/// One entry of the route table.
pub struct Route {
    pub uri: &'static str,
    pub method: MethodFilter,
    pub requires_auth: bool,
    handler: MethodRouter<AppState>,
}

impl Route {
    fn new<H, T>(method: MethodFilter, uri: &'static str, handler: H, requires_auth: bool) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        Self {
            uri,
            method,
            requires_auth,
            handler: on(method, handler),
        }
    }
}

pub fn route_table() -> Vec<Route> {
    vec![
        Route::new(MethodFilter::POST, "/login", auth::login, false),
        Route::new(MethodFilter::POST, "/publicacoes", publications::create, true),
        Route::new(MethodFilter::GET, "/publicacoes", publications::feed, true),
        Route::new(MethodFilter::GET, "/publicacoes/{publicacaoId}", publications::get, true),
        Route::new(MethodFilter::PUT, "/publicacoes/{publicacaoId}", publications::update, true),
        Route::new(MethodFilter::DELETE, "/publicacoes/{publicacaoId}", publications::delete, true),
        Route::new(
            MethodFilter::GET,
            "/usuarios/{usuarioId}/publicacoes",
            publications::list_by_user,
            true,
        ),
        Route::new(
            MethodFilter::POST,
            "/publicacoes/{publicacaoId}/curtir",
            publications::like,
            true,
        ),
        Route::new(
            MethodFilter::POST,
            "/publicacoes/{publicacaoId}/descurtir",
            publications::unlike,
            true,
        ),
    ]
}

/// Installs every table entry behind metrics, then logging, then auth when
/// required, plus the unwrapped `/metrics` scrape endpoint.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let mut router = Router::new();

    for route in route_table() {
        let mut handler = route.handler;
        if route.requires_auth {
            handler = handler.route_layer(middleware::from_fn_with_state(state.clone(), require_auth));
        }
        let handler = handler
            .route_layer(middleware::from_fn(log_request))
            .route_layer(middleware::from_fn_with_state(state.clone(), track_metrics));

        router = router.route(route.uri, handler);
    }

    router
        .route("/metrics", get(metrics::scrape))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_login_is_public() {
        let table = route_table();
        assert_eq!(table.len(), 9);

        let public: Vec<&str> = table
            .iter()
            .filter(|r| !r.requires_auth)
            .map(|r| r.uri)
            .collect();
        assert_eq!(public, vec!["/login"]);
    }

    #[test]
    fn no_duplicate_method_and_path() {
        let table = route_table();
        for (i, a) in table.iter().enumerate() {
            for b in &table[i + 1..] {
                assert!(
                    !(a.uri == b.uri && a.method == b.method),
                    "duplicate route {:?} {}",
                    a.method,
                    a.uri
                );
            }
        }
    }
}
