use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{MethodRouter, get},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Basic};

use std::sync::Arc;

use crate::{ServerError, accounts, dashboard, groups, named, transactions, users};
use engine::Engine;

const DEFAULT_PAGE_SIZE: u64 = 10;

/// Listener and pagination settings.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub page_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub page_size: u64,
}

/// Resolves HTTP Basic credentials into the acting user.
///
/// Missing, malformed and wrong credentials are all rejected with 403.
async fn auth(
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(credentials) = request.headers().typed_get::<Authorization<Basic>>() else {
        return Err(ServerError::Unauthenticated(
            "authentication credentials were not provided".to_string(),
        ));
    };

    let user = state
        .engine
        .authenticate(credentials.username(), credentials.password())
        .await?;
    let Some(user) = user else {
        tracing::warn!(username = credentials.username(), "rejected credentials");
        return Err(ServerError::Unauthenticated(
            "invalid username/password".to_string(),
        ));
    };

    request.extensions_mut().insert(user.actor());
    Ok(next.run(request).await)
}

/// Registers `path` with and without a trailing slash.
fn route(
    router: Router<ServerState>,
    path: &str,
    handlers: MethodRouter<ServerState>,
) -> Router<ServerState> {
    router
        .route(path, handlers.clone())
        .route(&format!("{path}/"), handlers)
}

/// Builds the API router.
pub fn app(engine: Engine, page_size: u64) -> Router {
    let state = ServerState {
        engine: Arc::new(engine),
        page_size: page_size.max(1),
    };

    let mut router = Router::new();
    router = route(router, "/users", get(users::list).post(users::create));
    router = route(
        router,
        "/users/{id}",
        get(users::retrieve)
            .put(users::update)
            .patch(users::partial_update)
            .delete(users::destroy),
    );
    router = route(router, "/groups", get(groups::list).post(groups::create));
    router = route(
        router,
        "/groups/{id}",
        get(groups::retrieve)
            .put(groups::update)
            .patch(groups::partial_update)
            .delete(groups::destroy),
    );
    router = route(
        router,
        "/category",
        get(named::list_categories).post(named::create_category),
    );
    router = route(
        router,
        "/category/{id}",
        get(named::retrieve_category)
            .put(named::update_category)
            .patch(named::partial_update_category)
            .delete(named::destroy_category),
    );
    router = route(
        router,
        "/vendors",
        get(named::list_vendors).post(named::create_vendor),
    );
    router = route(
        router,
        "/vendors/{id}",
        get(named::retrieve_vendor)
            .put(named::update_vendor)
            .patch(named::partial_update_vendor)
            .delete(named::destroy_vendor),
    );
    router = route(router, "/accounts", get(accounts::list).post(accounts::create));
    router = route(
        router,
        "/accounts/{id}",
        get(accounts::retrieve)
            .put(accounts::update)
            .patch(accounts::partial_update)
            .delete(accounts::destroy),
    );
    router = route(
        router,
        "/transactions",
        get(transactions::list).post(transactions::create),
    );
    router = route(
        router,
        "/transactions/{id}",
        get(transactions::retrieve)
            .put(transactions::update)
            .patch(transactions::partial_update)
            .delete(transactions::destroy),
    );
    router = route(router, "/dashboard", get(dashboard::get_dashboard));

    router
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, config: Config) {
    let address = format!("{}:{}", config.bind, config.port);
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {address}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, config.page_size, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    page_size: u64,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(engine, page_size)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    page_size: u64,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, page_size, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
