use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    AppState,
    middleware::{auth_middleware, log_errors, require_admin},
    routes,
};

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(routes::health::health));

    let protected_routes = Router::new()
        .route("/users/me", get(routes::user::me))
        .route(
            "/todos",
            get(routes::todo::list_todos).post(routes::todo::create_todo),
        )
        .route(
            "/todos/{id}",
            get(routes::todo::get_todo)
                .put(routes::todo::update_todo)
                .delete(routes::todo::delete_todo),
        )
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    // route layers run outermost-last, so authentication happens first
    let admin_routes = Router::new()
        .route("/admin/todos", get(routes::todo::list_all_todos))
        .route("/admin/todos/{id}", delete(routes::todo::delete_any_todo))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes);

    let prefix = state.config.api_prefix();
    let router = if prefix.is_empty() {
        api
    } else {
        Router::new().nest(&prefix, api)
    };

    let router = router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(from_fn(log_errors)),
    );

    // Browser clients hit the dev server from other origins.
    #[cfg(debug_assertions)]
    let router = router.layer(tower_http::cors::CorsLayer::permissive());

    router.with_state(state)
}
