//! API Router with Swagger UI

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::SharedAccountService;
use crate::auth::SharedAccessVerifier;
use crate::interfaces::http::common::ApiResponse;
use crate::interfaces::http::middleware::{auth_middleware, AuthState};
use crate::interfaces::http::modules::health::{self, HealthState};
use crate::interfaces::http::modules::metrics::{
    http_metrics_middleware, prometheus_metrics, MetricsState,
};
use crate::interfaces::http::modules::request_id::request_id_middleware;
use crate::interfaces::http::modules::users::{self, UserHandlerState};

/// Everything the HTTP surface needs from the rest of the process.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: SharedAccountService,
    pub verifier: SharedAccessVerifier,
    pub prometheus: PrometheusHandle,
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token signed by the platform auth service"))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        users::create_user,
        users::get_public_user,
        users::get_private_user,
    ),
    components(
        schemas(
            ApiResponse<users::PublicUserDto>,
            ApiResponse<users::PrivateUserDto>,
            health::HealthResponse,
            users::CreateUserRequest,
            users::PublicUserDto,
            users::PrivateUserDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Users", description = "Account creation and lookup by id, email or username"),
    ),
    info(
        title = "BitBridge User Service API",
        version = "1.0.0",
        description = "User identity service: registration and public/private account lookups",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

pub fn create_router(state: HttpState) -> Router {
    let user_state = UserHandlerState {
        accounts: state.accounts,
    };
    let auth_state = AuthState {
        verifier: state.verifier,
    };

    let public_user_routes = Router::new()
        .route("/", post(users::create_user))
        .route("/{identifier}", get(users::get_public_user))
        .with_state(user_state.clone());

    let private_user_routes = Router::new()
        .route("/{identifier}/private", get(users::get_private_user))
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
        .with_state(user_state);

    let metrics_routes = Router::new()
        .route("/metrics", get(prometheus_metrics))
        .with_state(MetricsState {
            handle: state.prometheus,
        });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health::health_check))
        .with_state(HealthState::new())
        .merge(metrics_routes)
        .nest("/api/v1/users", public_user_routes)
        .nest("/api/v1/users", private_user_routes)
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
}
