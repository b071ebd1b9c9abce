use anyhow::{Context, Result};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::metrics::{
    metrics_handler, record_blend_match, record_calibration_lookup, record_error,
    record_estimation,
};
use super::{log_requests, state::*, ServerConfig};
use crate::analysis::{
    estimate, AnalysisError, CalibrationCoefficients, CompositionEstimate, NirReading,
};
use crate::blend::{
    match_profiles, BlendProfile, BlendSample, BlendSignature, MatchResult,
    NewBlendSample, RecommendationLocale, SensorReadings,
};
use crate::calibration::{
    CalibrationEntry, CalibrationKey, CalibrationResolution, CalibrationResolver, CoffeeOrigin,
    CoffeeType, ResolutionSource, ResolutionTier,
};
use crate::sqlite_persistence::JsonField;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
        .into_response()
}

fn bad_request(message: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, message)
}

fn not_found(message: impl Into<String>) -> Response {
    error_response(StatusCode::NOT_FOUND, message)
}

fn internal_error(endpoint: &str, err: anyhow::Error) -> Response {
    error!("{} failed: {:#}", endpoint, err);
    record_error("storage", endpoint);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            debug!("Rejected request body: {}", rejection.body_text());
            Err(bad_request(rejection.body_text()))
        }
    }
}

fn parse_coffee_type(code: Option<i64>) -> Result<CoffeeType, Response> {
    match code {
        None => Ok(CoffeeType::Unknown),
        Some(code) => CoffeeType::try_from(code).map_err(bad_request),
    }
}

fn parse_coffee_origin(code: Option<i64>) -> Result<CoffeeOrigin, Response> {
    match code {
        None => Ok(CoffeeOrigin::Unknown),
        Some(code) => CoffeeOrigin::try_from(code).map_err(bad_request),
    }
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: state.version.clone(),
    };
    Json(stats)
}

// =============================================================================
// Analysis and calibration
// =============================================================================

#[derive(Deserialize, Debug)]
struct EstimateBody {
    pub nir_readings: Option<NirReading>,
    pub coffee_type: Option<i64>,
    pub coffee_origin: Option<i64>,
    pub coffee_variety: Option<String>,
}

#[derive(Serialize)]
struct EstimateResponse {
    #[serde(flatten)]
    estimate: CompositionEstimate,
    coffee_type: CoffeeType,
    coffee_origin: CoffeeOrigin,
    tier: ResolutionTier,
    source: ResolutionSource,
    coefficients: CalibrationCoefficients,
}

async fn post_estimate(
    State(state): State<ServerState>,
    body: Result<Json<EstimateBody>, JsonRejection>,
) -> Response {
    let body = match json_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let Some(reading) = body.nir_readings else {
        return bad_request("nir_readings is required");
    };
    let key = match (
        parse_coffee_type(body.coffee_type),
        parse_coffee_origin(body.coffee_origin),
    ) {
        (Ok(coffee_type), Ok(coffee_origin)) => {
            CalibrationKey::new(coffee_type, coffee_origin, body.coffee_variety.as_deref())
        }
        (Err(response), _) | (_, Err(response)) => return response,
    };

    let tier = state.config.estimation_tier;
    let resolution = match state.calibration_resolver.resolve(tier, &key) {
        Ok(resolution) => resolution,
        Err(err) => return internal_error("estimate", err),
    };
    record_estimation(tier);
    record_calibration_lookup(resolution.source);

    let estimate = estimate(&reading, &resolution.coefficients);
    Json(EstimateResponse {
        estimate,
        coffee_type: key.coffee_type,
        coffee_origin: key.coffee_origin,
        tier: resolution.tier,
        source: resolution.source,
        coefficients: resolution.coefficients,
    })
    .into_response()
}

#[derive(Deserialize, Debug)]
struct CalibrationQuery {
    pub coffee_type: Option<i64>,
    pub coffee_origin: Option<i64>,
    pub coffee_variety: Option<String>,
}

#[derive(Serialize)]
struct CalibrationResponse {
    coffee_type: CoffeeType,
    coffee_origin: CoffeeOrigin,
    tier: ResolutionTier,
    source: ResolutionSource,
    coefficients: CalibrationCoefficients,
    calibration_data: Option<CalibrationEntry>,
}

impl CalibrationResponse {
    fn new(key: &CalibrationKey, resolution: CalibrationResolution) -> Self {
        CalibrationResponse {
            coffee_type: key.coffee_type,
            coffee_origin: key.coffee_origin,
            tier: resolution.tier,
            source: resolution.source,
            coefficients: resolution.coefficients,
            calibration_data: resolution.entry,
        }
    }
}

async fn get_calibration(
    State(resolver): State<CalibrationResolver>,
    Query(query): Query<CalibrationQuery>,
) -> Response {
    let (Some(type_code), Some(origin_code)) = (query.coffee_type, query.coffee_origin) else {
        return bad_request("coffee_type and coffee_origin are required");
    };
    let key = match (
        parse_coffee_type(Some(type_code)),
        parse_coffee_origin(Some(origin_code)),
    ) {
        (Ok(coffee_type), Ok(coffee_origin)) => {
            CalibrationKey::new(coffee_type, coffee_origin, query.coffee_variety.as_deref())
        }
        (Err(response), _) | (_, Err(response)) => return response,
    };

    match resolver.resolve_persisted(&key) {
        Ok(resolution) => {
            record_calibration_lookup(resolution.source);
            Json(CalibrationResponse::new(&key, resolution)).into_response()
        }
        Err(err) => internal_error("calibration", err),
    }
}

async fn get_live_calibration(Query(query): Query<CalibrationQuery>) -> Response {
    let Some(type_code) = query.coffee_type else {
        return bad_request("coffee_type is required");
    };
    let key = match (
        parse_coffee_type(Some(type_code)),
        parse_coffee_origin(query.coffee_origin),
    ) {
        (Ok(coffee_type), Ok(coffee_origin)) => {
            CalibrationKey::new(coffee_type, coffee_origin, query.coffee_variety.as_deref())
        }
        (Err(response), _) | (_, Err(response)) => return response,
    };

    let resolution = CalibrationResolver::resolve_in_process(key.coffee_type);
    record_calibration_lookup(resolution.source);
    Json(CalibrationResponse::new(&key, resolution)).into_response()
}

// =============================================================================
// Blend profiles
// =============================================================================

#[derive(Deserialize, Debug)]
struct CreateProfileBody {
    #[serde(default)]
    pub profile_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub samples: Vec<NewBlendSample>,
}

#[derive(Serialize)]
struct CreateProfileResponse {
    profile_id: i64,
    profile_name: String,
    sample_count: usize,
    signature: BlendSignature,
}

#[derive(Serialize)]
struct AddSampleResponse {
    sample_id: i64,
    profile_id: i64,
    sample_count: i64,
    updated_signature: BlendSignature,
}

#[derive(Serialize)]
struct ProfileView {
    id: i64,
    profile_name: String,
    description: String,
    sample_count: i64,
    created_at: String,
    updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<BlendSignature>,
    samples: Vec<BlendSample>,
}

impl From<BlendProfile> for ProfileView {
    fn from(profile: BlendProfile) -> Self {
        // a malformed signature renders as an empty one, a missing one is omitted
        let signature = match profile.signature {
            JsonField::Decoded(signature) => Some(signature),
            JsonField::Missing => None,
            JsonField::Malformed(err) => {
                warn!("Blend profile {} has a malformed signature: {}", profile.id, err);
                Some(BlendSignature::default())
            }
        };
        ProfileView {
            id: profile.id,
            profile_name: profile.profile_name,
            description: profile.description,
            sample_count: profile.sample_count,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
            signature,
            samples: profile.samples,
        }
    }
}

#[derive(Serialize)]
struct ProfileListResponse {
    device_id: String,
    profiles: Vec<ProfileView>,
    total_count: usize,
}

#[derive(Serialize)]
struct MatchView {
    #[serde(flatten)]
    result: MatchResult,
    recommendation_label: &'static str,
}

impl MatchView {
    fn new(result: MatchResult, locale: RecommendationLocale) -> Self {
        let recommendation_label = result.recommendation.label(locale);
        MatchView {
            result,
            recommendation_label,
        }
    }
}

#[derive(Serialize)]
struct MatchResponse {
    device_id: String,
    sample_readings: [f64; 3],
    matches: Vec<MatchView>,
    best_match: Option<MatchView>,
    total_profiles: usize,
    analyzed_at: String,
}

async fn post_profile(
    State(blend_store): State<GuardedBlendStore>,
    Path(device_id): Path<String>,
    body: Result<Json<CreateProfileBody>, JsonRejection>,
) -> Response {
    let body = match json_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    if body.profile_name.trim().is_empty() || body.samples.is_empty() {
        return bad_request("profile_name and samples are required");
    }

    match blend_store.create_profile(
        &device_id,
        &body.profile_name,
        &body.description,
        &body.samples,
    ) {
        Ok(created) => {
            info!(
                "Device {} created blend profile {} ({} samples)",
                device_id, created.profile_id, created.sample_count
            );
            (
                StatusCode::CREATED,
                Json(CreateProfileResponse {
                    profile_id: created.profile_id,
                    profile_name: body.profile_name,
                    sample_count: created.sample_count,
                    signature: created.signature,
                }),
            )
                .into_response()
        }
        Err(err)
            if matches!(
                err.downcast_ref::<AnalysisError>(),
                Some(AnalysisError::EmptyInput)
            ) =>
        {
            bad_request(err.to_string())
        }
        Err(err) => internal_error("create_profile", err),
    }
}

async fn get_profiles(
    State(blend_store): State<GuardedBlendStore>,
    Path(device_id): Path<String>,
) -> Response {
    match blend_store.list_profiles(&device_id) {
        Ok(profiles) => {
            let profiles: Vec<ProfileView> = profiles.into_iter().map(ProfileView::from).collect();
            let total_count = profiles.len();
            Json(ProfileListResponse {
                device_id,
                profiles,
                total_count,
            })
            .into_response()
        }
        Err(err) => internal_error("list_profiles", err),
    }
}

async fn get_profile(
    State(blend_store): State<GuardedBlendStore>,
    Path((device_id, profile_id)): Path<(String, i64)>,
) -> Response {
    match blend_store.get_profile(&device_id, profile_id) {
        Ok(Some(profile)) => Json(ProfileView::from(profile)).into_response(),
        Ok(None) => not_found("Blend profile not found"),
        Err(err) => internal_error("get_profile", err),
    }
}

async fn delete_profile(
    State(blend_store): State<GuardedBlendStore>,
    Path((device_id, profile_id)): Path<(String, i64)>,
) -> Response {
    match blend_store.delete_profile(&device_id, profile_id) {
        Ok(true) => {
            info!("Device {} deleted blend profile {}", device_id, profile_id);
            StatusCode::OK.into_response()
        }
        Ok(false) => not_found("Blend profile not found"),
        Err(err) => internal_error("delete_profile", err),
    }
}

async fn post_profile_sample(
    State(blend_store): State<GuardedBlendStore>,
    Path((device_id, profile_id)): Path<(String, i64)>,
    body: Result<Json<NewBlendSample>, JsonRejection>,
) -> Response {
    let sample = match json_body(body) {
        Ok(sample) => sample,
        Err(response) => return response,
    };

    match blend_store.add_sample(&device_id, profile_id, &sample) {
        Ok(Some(added)) => (
            StatusCode::CREATED,
            Json(AddSampleResponse {
                sample_id: added.sample_id,
                profile_id: added.profile_id,
                sample_count: added.sample_count,
                updated_signature: added.signature,
            }),
        )
            .into_response(),
        Ok(None) => not_found("Blend profile not found"),
        Err(err) => internal_error("add_sample", err),
    }
}

async fn post_match(
    State(state): State<ServerState>,
    Path(device_id): Path<String>,
    body: Result<Json<SensorReadings>, JsonRejection>,
) -> Response {
    let query = match json_body(body) {
        Ok(query) => query,
        Err(response) => return response,
    };
    if query.is_all_zero() {
        return bad_request("sensor readings are required");
    }

    let candidates = match state.blend_store.list_candidates(&device_id) {
        Ok(candidates) => candidates,
        Err(err) => return internal_error("match", err),
    };
    let report = match_profiles(&query, &candidates);
    record_blend_match(
        report.best_match().map(|m| m.recommendation),
        report.skipped,
    );

    let locale = state.config.recommendation_locale;
    let best_match = report
        .best_match()
        .cloned()
        .map(|m| MatchView::new(m, locale));
    let matches = report
        .matches
        .into_iter()
        .map(|m| MatchView::new(m, locale))
        .collect();

    Json(MatchResponse {
        device_id,
        sample_readings: query.as_array(),
        matches,
        best_match,
        total_profiles: candidates.len(),
        analyzed_at: Utc::now().to_rfc3339(),
    })
    .into_response()
}

pub fn make_app(
    config: ServerConfig,
    calibration_resolver: CalibrationResolver,
    blend_store: GuardedBlendStore,
) -> Result<Router> {
    let state = ServerState::new(config, calibration_resolver, blend_store);

    let analysis_routes: Router = Router::new()
        .route("/estimate", post(post_estimate))
        .with_state(state.clone());

    let calibration_routes: Router = Router::new()
        .route("/", get(get_calibration))
        .route("/live", get(get_live_calibration))
        .with_state(state.clone());

    let device_routes: Router = Router::new()
        .route("/{device_id}/profiles", post(post_profile))
        .route("/{device_id}/profiles", get(get_profiles))
        .route("/{device_id}/profiles/{profile_id}", get(get_profile))
        .route("/{device_id}/profiles/{profile_id}", delete(delete_profile))
        .route(
            "/{device_id}/profiles/{profile_id}/samples",
            post(post_profile_sample),
        )
        .route("/{device_id}/match", post(post_match))
        .with_state(state.clone());

    let home_router: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    let mut app: Router = home_router
        .nest("/v1/analysis", analysis_routes)
        .nest("/v1/calibration", calibration_routes)
        .nest("/v1/devices", device_routes);

    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(
    config: ServerConfig,
    calibration_resolver: CalibrationResolver,
    blend_store: GuardedBlendStore,
) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, calibration_resolver, blend_store)?;

    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(metrics_listener, make_metrics_app()).await {
            error!("Metrics server stopped: {}", err);
        }
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    Ok(axum::serve(listener, app).await?)
}
