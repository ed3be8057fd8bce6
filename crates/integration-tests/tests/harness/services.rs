//! Two cooperating services: a pet store and a gateway in front of it

use std::borrow::Cow;

use axum::Router;
use axum::extract::{Path, Request, State};
use axum::middleware::from_fn_with_state;
use axum::response::Response;
use axum::routing::{get, post};
use faultwire_client::ErrorDecoder;
use faultwire_config::{Config, FieldPolicy};
use faultwire_core::{Failure, HandlerInfo, HasErrorCode, HasStatus, RequestContext};
use faultwire_server::{ApiError, ErrorResponder, error_middleware};
use http::header::RETRY_AFTER;
use http::{HeaderValue, Method, StatusCode};

/// Failures raised by the pet store
#[derive(Debug, thiserror::Error)]
pub enum PetError {
    #[error("Pet already exists.")]
    Exists,

    #[error("no pet with id {0}")]
    NotFound(u64),

    #[error("pet store is under maintenance")]
    Maintenance,
}

impl HasStatus for PetError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Exists => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Maintenance => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl HasErrorCode for PetError {
    fn error_code(&self) -> Option<&str> {
        match self {
            Self::Exists => Some("PET_STORE:1234"),
            Self::NotFound(_) => Some("PET_STORE:404"),
            Self::Maintenance => None,
        }
    }
}

impl Failure for PetError {
    fn type_name(&self) -> Cow<'_, str> {
        match self {
            Self::Exists => "pet_store::PetError::Exists".into(),
            Self::NotFound(_) => "pet_store::PetError::NotFound".into(),
            Self::Maintenance => "pet_store::PetError::Maintenance".into(),
        }
    }

    fn supertypes(&self) -> Vec<Cow<'_, str>> {
        vec!["pet_store::PetError".into()]
    }

    fn as_has_status(&self) -> Option<&dyn HasStatus> {
        Some(self)
    }

    fn as_has_error_code(&self) -> Option<&dyn HasErrorCode> {
        Some(self)
    }
}

fn service_config(application: &str) -> Config {
    Config {
        application: application.to_owned(),
        default_policy: FieldPolicy {
            include_stack_trace: false,
            ..FieldPolicy::all()
        },
        ..Config::default()
    }
}

async fn create_pet() -> Result<&'static str, ApiError> {
    Err(ApiError::from(PetError::Exists).handled_by(HandlerInfo::new("pet_store::PetHandler", "create")))
}

async fn get_pet(Path(id): Path<u64>) -> Result<String, ApiError> {
    if id == 1 {
        return Ok("{\"id\":1,\"name\":\"Rex\"}".to_owned());
    }
    Err(ApiError::from(PetError::NotFound(id))
        .handled_by(HandlerInfo::new("pet_store::PetHandler", "get").with_parameter("u64")))
}

async fn maintenance(State(responder): State<ErrorResponder>, request: Request) -> Response {
    let (parts, _) = request.into_parts();
    let ctx = RequestContext::from_parts(&parts, responder.correlation_header());
    let mut response = responder.respond(&PetError::Maintenance, &ctx);
    response.headers_mut().insert(RETRY_AFTER, HeaderValue::from_static("30"));
    response
}

/// The downstream pet store
pub fn pet_store() -> Router {
    let responder = ErrorResponder::new(service_config("pet-store"));
    Router::new()
        .route("/api/pets", post(create_pet))
        .route("/api/pets/{id}", get(get_pet))
        .route("/api/maintenance", get(maintenance))
        .layer(from_fn_with_state(responder.clone(), error_middleware))
        .with_state(responder)
}

#[derive(Clone)]
struct Gateway {
    upstream: String,
    client: reqwest::Client,
    decoder: ErrorDecoder,
}

async fn proxy_pet(State(gateway): State<Gateway>, Path(id): Path<u64>) -> Result<String, ApiError> {
    let handler = HandlerInfo::new("gateway::PetProxy", "get").with_parameter("u64");

    let response = gateway
        .client
        .get(format!("{}/api/pets/{id}", gateway.upstream))
        .header("accept", "application/json")
        .send()
        .await
        .map_err(|e| ApiError::from_anyhow(&anyhow::Error::new(e)).handled_by(handler.clone()))?;

    if !response.status().is_success() {
        let error = gateway.decoder.decode(Method::GET, response).await;
        return Err(ApiError::from(error).handled_by(handler));
    }

    response
        .text()
        .await
        .map_err(|e| ApiError::from_anyhow(&anyhow::Error::new(e)).handled_by(handler))
}

/// A gateway forwarding `/gateway/pets/{id}` to `upstream`
pub fn gateway(upstream: String) -> Router {
    let config = service_config("gateway");
    let decoder = ErrorDecoder::new(&config.client);
    let responder = ErrorResponder::new(config);
    let state = Gateway {
        upstream,
        client: reqwest::Client::new(),
        decoder,
    };

    Router::new()
        .route("/gateway/pets/{id}", get(proxy_pet))
        .layer(from_fn_with_state(responder, error_middleware))
        .with_state(state)
}
