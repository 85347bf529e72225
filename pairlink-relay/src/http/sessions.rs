//! Signaling endpoints - PIN issuance and the offer/answer handshake.

use crate::error::{ApiError, ApiResult};
use crate::http::{check_global, check_pin_rate, observed};
use crate::server::PairRelay;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::{Extension, Json};
use pairlink_types::{Envelope, Pin, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Response to session creation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    /// The new session's identifier.
    pub session_id: SessionId,
    /// The PIN bound to it.
    pub pin: Pin,
}

/// Response to PIN resolution.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    /// The live session behind the PIN.
    pub session_id: SessionId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResolveQuery {
    pin: String,
}

/// Request/response body carrying one envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct EnvelopeBody {
    /// The opaque envelope, stored and echoed unchanged.
    pub envelope: Envelope,
}

/// `POST /v1/sessions`
pub async fn create_session(
    Extension(relay): Extension<Arc<PairRelay>>,
) -> ApiResult<Json<CreateSessionResponse>> {
    check_global(&relay)?;
    let (session_id, pin) = relay
        .create_session()
        .map_err(|e| observed(&relay, e))?;
    Ok(Json(CreateSessionResponse { session_id, pin }))
}

/// `GET /v1/sessions/resolve?pin=`
pub async fn resolve_pin(
    Extension(relay): Extension<Arc<PairRelay>>,
    query: Result<Query<ResolveQuery>, QueryRejection>,
) -> ApiResult<Json<ResolveResponse>> {
    check_global(&relay)?;
    let Query(query) =
        query.map_err(|e| observed(&relay, ApiError::Validation(e.to_string())))?;
    let pin = Pin::parse(&query.pin)
        .map_err(|e| observed(&relay, ApiError::Validation(e.to_string())))?;
    check_pin_rate(&relay, pin.as_str())?;

    let session_id = relay.resolve_pin(&pin).map_err(|e| observed(&relay, e))?;
    Ok(Json(ResolveResponse { session_id }))
}

/// `GET /v1/sessions/{id}/offer`
pub async fn get_offer(
    Extension(relay): Extension<Arc<PairRelay>>,
    Path(id): Path<String>,
) -> ApiResult<Json<EnvelopeBody>> {
    check_global(&relay)?;
    let id = parse_id(&relay, &id)?;
    let envelope = relay.get_offer(&id).map_err(|e| observed(&relay, e))?;
    Ok(Json(EnvelopeBody { envelope }))
}

/// `POST /v1/sessions/{id}/offer`
pub async fn post_offer(
    Extension(relay): Extension<Arc<PairRelay>>,
    Path(id): Path<String>,
    body: Result<Json<EnvelopeBody>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    check_global(&relay)?;
    let id = parse_id(&relay, &id)?;
    let Json(body) = body.map_err(|e| observed(&relay, ApiError::Validation(e.to_string())))?;
    relay
        .post_offer(&id, body.envelope)
        .map_err(|e| observed(&relay, e))?;
    Ok(Json(json!({})))
}

/// `POST /v1/sessions/{id}/answer`
pub async fn post_answer(
    Extension(relay): Extension<Arc<PairRelay>>,
    Path(id): Path<String>,
    body: Result<Json<EnvelopeBody>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    check_global(&relay)?;
    let id = parse_id(&relay, &id)?;
    let Json(body) = body.map_err(|e| observed(&relay, ApiError::Validation(e.to_string())))?;
    relay
        .post_answer(&id, body.envelope)
        .map_err(|e| observed(&relay, e))?;
    Ok(Json(json!({})))
}

/// `GET /v1/sessions/{id}/answer` - the read-once consumption.
pub async fn get_answer(
    Extension(relay): Extension<Arc<PairRelay>>,
    Path(id): Path<String>,
) -> ApiResult<Json<EnvelopeBody>> {
    check_global(&relay)?;
    let id = parse_id(&relay, &id)?;
    let envelope = relay.take_answer(&id).map_err(|e| observed(&relay, e))?;
    Ok(Json(EnvelopeBody { envelope }))
}

/// `DELETE /v1/sessions/{id}`
pub async fn delete_session(
    Extension(relay): Extension<Arc<PairRelay>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    check_global(&relay)?;
    let id = parse_id(&relay, &id)?;
    relay.delete_session(&id);
    Ok(StatusCode::NO_CONTENT)
}

fn parse_id(relay: &PairRelay, raw: &str) -> ApiResult<SessionId> {
    SessionId::parse(raw).map_err(|e| observed(relay, ApiError::Validation(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{body_json, send, test_relay, test_relay_with};
    use crate::http::build_router;
    use axum::http::StatusCode;

    fn envelope(session_id: &str, tag: &str) -> serde_json::Value {
        json!({
            "v": 1,
            "sessionId": session_id,
            "nonceB64": format!("bm9uY2Ut{tag}"),
            "ctB64": format!("Y2lwaGVy{tag}"),
        })
    }

    #[tokio::test]
    async fn full_session_walkthrough() {
        let app = build_router(test_relay());

        // Create: PIN is 6 digits, session id is a UUID.
        let response = send(&app, "POST", "/v1/sessions", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let sid = body["sessionId"].as_str().unwrap().to_string();
        let pin = body["pin"].as_str().unwrap().to_string();
        assert_eq!(pin.len(), 6);
        assert!(pin.bytes().all(|b| b.is_ascii_digit()));
        assert!(SessionId::parse(&sid).is_ok());

        // Resolve returns the same id.
        let response = send(&app, "GET", &format!("/v1/sessions/resolve?pin={pin}"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["sessionId"], sid.as_str());

        // Preconditions: offer read is 404, early answer is 409, both
        // reporting offer_not_set.
        let response = send(&app, "GET", &format!("/v1/sessions/{sid}/offer"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "offer_not_set");

        let response = send(
            &app,
            "POST",
            &format!("/v1/sessions/{sid}/answer"),
            Some(json!({ "envelope": envelope(&sid, "early") })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["error"], "offer_not_set");

        // Offer roundtrip.
        let offer = envelope(&sid, "offer");
        let response = send(
            &app,
            "POST",
            &format!("/v1/sessions/{sid}/offer"),
            Some(json!({ "envelope": offer })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, "GET", &format!("/v1/sessions/{sid}/offer"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["envelope"], offer);

        // Answer, then the read-once consumption.
        let answer = envelope(&sid, "answer");
        let response = send(
            &app,
            "POST",
            &format!("/v1/sessions/{sid}/answer"),
            Some(json!({ "envelope": answer })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, "GET", &format!("/v1/sessions/{sid}/answer"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["envelope"], answer);

        let response = send(&app, "GET", &format!("/v1/sessions/{sid}/answer"), None).await;
        assert_eq!(response.status(), StatusCode::GONE);
        assert_eq!(body_json(response).await["error"], "session_expired");

        // Delete is 204; the PIN then resolves to an ended lifecycle.
        let response = send(&app, "DELETE", &format!("/v1/sessions/{sid}"), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, "GET", &format!("/v1/sessions/resolve?pin={pin}"), None).await;
        assert!(matches!(
            response.status(),
            StatusCode::NOT_FOUND | StatusCode::GONE
        ));
        let body = body_json(response).await;
        assert!(body["error"] == "session_expired" || body["error"] == "pin_not_found");
    }

    #[tokio::test]
    async fn resolve_unknown_pin_is_404() {
        let app = build_router(test_relay());
        let response = send(&app, "GET", "/v1/sessions/resolve?pin=000000", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "pin_not_found");
    }

    #[tokio::test]
    async fn resolve_malformed_pin_is_400() {
        let app = build_router(test_relay());
        for bad in ["12345", "1234567", "12345a", ""] {
            let response =
                send(&app, "GET", &format!("/v1/sessions/resolve?pin={bad}"), None).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "pin {bad:?}");
            assert_eq!(body_json(response).await["error"], "validation");
        }
    }

    #[tokio::test]
    async fn resolve_without_pin_param_is_400() {
        let app = build_router(test_relay());
        let response = send(&app, "GET", "/v1/sessions/resolve", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_session_id_is_400() {
        let app = build_router(test_relay());
        let response = send(&app, "GET", "/v1/sessions/not-a-uuid/offer", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "validation");
    }

    #[tokio::test]
    async fn unknown_session_id_is_410() {
        let app = build_router(test_relay());
        let ghost = SessionId::new();
        let response = send(&app, "GET", &format!("/v1/sessions/{ghost}/offer"), None).await;
        assert_eq!(response.status(), StatusCode::GONE);
        assert_eq!(body_json(response).await["error"], "session_expired");
    }

    #[tokio::test]
    async fn second_offer_is_conflict() {
        let app = build_router(test_relay());
        let body = body_json(send(&app, "POST", "/v1/sessions", None).await).await;
        let sid = body["sessionId"].as_str().unwrap().to_string();

        let uri = format!("/v1/sessions/{sid}/offer");
        let first = send(&app, "POST", &uri, Some(json!({ "envelope": envelope(&sid, "a") }))).await;
        assert_eq!(first.status(), StatusCode::OK);

        let second =
            send(&app, "POST", &uri, Some(json!({ "envelope": envelope(&sid, "b") }))).await;
        assert_eq!(second.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(second).await["error"], "offer_already_set");
    }

    #[tokio::test]
    async fn offer_body_must_carry_envelope() {
        let app = build_router(test_relay());
        let body = body_json(send(&app, "POST", "/v1/sessions", None).await).await;
        let sid = body["sessionId"].as_str().unwrap().to_string();

        let response = send(
            &app,
            "POST",
            &format!("/v1/sessions/{sid}/offer"),
            Some(json!({ "something": "else" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "validation");
    }

    #[tokio::test]
    async fn delete_unknown_session_is_still_204() {
        let app = build_router(test_relay());
        let ghost = SessionId::new();
        let response = send(&app, "DELETE", &format!("/v1/sessions/{ghost}"), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn expired_session_reports_410_everywhere() {
        let mut config = crate::config::Config::default();
        config.ttl.session_ttl_secs = 0;
        let app = build_router(test_relay_with(config));

        let body = body_json(send(&app, "POST", "/v1/sessions", None).await).await;
        let sid = body["sessionId"].as_str().unwrap().to_string();
        let pin = body["pin"].as_str().unwrap().to_string();

        let response = send(&app, "GET", &format!("/v1/sessions/{sid}/offer"), None).await;
        assert_eq!(response.status(), StatusCode::GONE);

        let response = send(&app, "GET", &format!("/v1/sessions/resolve?pin={pin}"), None).await;
        assert_eq!(response.status(), StatusCode::GONE);
        assert_eq!(body_json(response).await["error"], "session_expired");
    }
}
