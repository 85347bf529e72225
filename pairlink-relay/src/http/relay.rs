//! The `/relay` endpoint - one POST, dispatched on the `action` field.

use crate::channels::{ChannelKey, ReceiveOutcome};
use crate::error::ApiError;
use crate::http::{check_global, check_pin_rate, observed};
use crate::server::PairRelay;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use pairlink_types::{
    AckResponse, AckStatusResponse, Chunk, ReceiveResponse, ReceiveStatus, RelayRequest,
    SendResponse,
};
use std::sync::Arc;

/// `POST /relay`
pub async fn handle(
    Extension(relay): Extension<Arc<PairRelay>>,
    body: Result<Json<RelayRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    check_global(&relay)?;
    let Json(request) =
        body.map_err(|e| observed(&relay, ApiError::Validation(e.to_string())))?;
    if request.password_hash().is_empty() {
        return Err(observed(
            &relay,
            ApiError::Validation("passwordHash must not be empty".to_string()),
        ));
    }
    check_pin_rate(&relay, request.pin().as_str())?;

    let response = match request {
        RelayRequest::Send {
            pin,
            password_hash,
            chunk_index,
            total_chunks,
            data,
        } => {
            let key = ChannelKey::new(pin, password_hash);
            relay
                .relay_send(key, chunk_index, total_chunks, data)
                .map_err(|e| observed(&relay, e))?;
            Json(SendResponse::waiting()).into_response()
        }
        RelayRequest::Receive { pin, password_hash } => {
            let key = ChannelKey::new(pin, password_hash);
            Json(receive_response(relay.relay_receive(&key))).into_response()
        }
        RelayRequest::Ack { pin, password_hash } => {
            let key = ChannelKey::new(pin, password_hash);
            relay.relay_ack(&key).map_err(|e| observed(&relay, e))?;
            Json(AckResponse { success: true }).into_response()
        }
        RelayRequest::AckStatus { pin, password_hash } => {
            let key = ChannelKey::new(pin, password_hash);
            let acknowledged = relay
                .relay_ack_status(&key)
                .map_err(|e| observed(&relay, e))?;
            Json(AckStatusResponse { acknowledged }).into_response()
        }
    };
    Ok(response)
}

fn receive_response(outcome: ReceiveOutcome) -> ReceiveResponse {
    match outcome {
        ReceiveOutcome::Expired => ReceiveResponse {
            status: ReceiveStatus::Expired,
            chunk: None,
        },
        ReceiveOutcome::Done => ReceiveResponse {
            status: ReceiveStatus::Done,
            chunk: None,
        },
        ReceiveOutcome::Chunk { index, data } => ReceiveResponse {
            status: ReceiveStatus::ChunkAvailable,
            chunk: Some(Chunk {
                chunk_index: index,
                data,
            }),
        },
        ReceiveOutcome::Waiting => ReceiveResponse {
            status: ReceiveStatus::Waiting,
            chunk: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::build_router;
    use crate::http::testing::{body_json, send, test_relay, test_relay_with};
    use axum::http::StatusCode;
    use serde_json::json;

    fn send_chunk(pin: &str, hash: &str, index: u32, total: u32, data: &str) -> serde_json::Value {
        json!({
            "action": "send",
            "pin": pin,
            "passwordHash": hash,
            "chunkIndex": index,
            "totalChunks": total,
            "data": data,
        })
    }

    fn receive(pin: &str, hash: &str) -> serde_json::Value {
        json!({ "action": "receive", "pin": pin, "passwordHash": hash })
    }

    fn ack(pin: &str, hash: &str) -> serde_json::Value {
        json!({ "action": "ack", "pin": pin, "passwordHash": hash })
    }

    fn ack_status(pin: &str, hash: &str) -> serde_json::Value {
        json!({ "action": "ack-status", "pin": pin, "passwordHash": hash })
    }

    #[tokio::test]
    async fn single_direction_transfer_with_ack() {
        let app = build_router(test_relay());
        let (pin, hash) = ("123456", "hash_a_to_b");

        // Two chunks sent, both reported as waiting.
        for i in 0..2 {
            let response = send(
                &app,
                "POST",
                "/relay",
                Some(send_chunk(pin, hash, i, 2, &format!("chunk_{i}"))),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_json(response).await["status"], "waiting");
        }

        // Delivered in order, then done.
        for i in 0..2 {
            let response = send(&app, "POST", "/relay", Some(receive(pin, hash))).await;
            let body = body_json(response).await;
            assert_eq!(body["status"], "chunkAvailable");
            assert_eq!(body["chunk"]["chunkIndex"], i);
            assert_eq!(body["chunk"]["data"], format!("chunk_{i}"));
        }
        let response = send(&app, "POST", "/relay", Some(receive(pin, hash))).await;
        assert_eq!(body_json(response).await["status"], "done");

        // Ack flag flips once acknowledged.
        let response = send(&app, "POST", "/relay", Some(ack_status(pin, hash))).await;
        assert_eq!(body_json(response).await["acknowledged"], false);

        let response = send(&app, "POST", "/relay", Some(ack(pin, hash))).await;
        assert_eq!(body_json(response).await["success"], true);

        let response = send(&app, "POST", "/relay", Some(ack_status(pin, hash))).await;
        assert_eq!(body_json(response).await["acknowledged"], true);
    }

    #[tokio::test]
    async fn directions_on_one_pin_stay_isolated() {
        let app = build_router(test_relay());
        let pin = "222333";

        let r = send(&app, "POST", "/relay", Some(send_chunk(pin, "a_to_b", 0, 1, "forward"))).await;
        assert_eq!(r.status(), StatusCode::OK);
        let r = send(&app, "POST", "/relay", Some(send_chunk(pin, "b_to_a", 0, 1, "reverse"))).await;
        assert_eq!(r.status(), StatusCode::OK);

        let body = body_json(send(&app, "POST", "/relay", Some(receive(pin, "b_to_a"))).await).await;
        assert_eq!(body["chunk"]["data"], "reverse");
        let body = body_json(send(&app, "POST", "/relay", Some(receive(pin, "a_to_b"))).await).await;
        assert_eq!(body["chunk"]["data"], "forward");
    }

    #[tokio::test]
    async fn receive_before_any_send_is_expired_status() {
        let app = build_router(test_relay());
        let response = send(&app, "POST", "/relay", Some(receive("999000", "h"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "expired");
    }

    #[tokio::test]
    async fn waiting_when_next_chunk_missing() {
        let app = build_router(test_relay());
        let (pin, hash) = ("444555", "h");

        // Chunk 1 of 2 arrives first; the cursor sits at 0.
        let r = send(&app, "POST", "/relay", Some(send_chunk(pin, hash, 1, 2, "second"))).await;
        assert_eq!(r.status(), StatusCode::OK);

        let body = body_json(send(&app, "POST", "/relay", Some(receive(pin, hash))).await).await;
        assert_eq!(body["status"], "waiting");

        let r = send(&app, "POST", "/relay", Some(send_chunk(pin, hash, 0, 2, "first"))).await;
        assert_eq!(r.status(), StatusCode::OK);

        for expected in ["first", "second"] {
            let body =
                body_json(send(&app, "POST", "/relay", Some(receive(pin, hash))).await).await;
            assert_eq!(body["status"], "chunkAvailable");
            assert_eq!(body["chunk"]["data"], expected);
        }
    }

    #[tokio::test]
    async fn ack_on_missing_channel_is_410() {
        let app = build_router(test_relay());
        for body in [ack("777888", "h"), ack_status("777888", "h")] {
            let response = send(&app, "POST", "/relay", Some(body)).await;
            assert_eq!(response.status(), StatusCode::GONE);
            assert_eq!(body_json(response).await["error"], "session_expired");
        }
    }

    #[tokio::test]
    async fn malformed_relay_bodies_are_400() {
        let app = build_router(test_relay());
        let cases = [
            json!({ "action": "steal", "pin": "123456", "passwordHash": "h" }),
            json!({ "action": "send", "pin": "123456", "passwordHash": "h" }),
            json!({ "action": "receive", "pin": "12", "passwordHash": "h" }),
            json!({ "action": "receive", "pin": "123456", "passwordHash": "" }),
        ];
        for case in cases {
            let response = send(&app, "POST", "/relay", Some(case.clone())).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "case {case}");
            assert_eq!(body_json(response).await["error"], "validation");
        }
    }

    #[tokio::test]
    async fn oversized_and_overcounted_sends_are_rejected() {
        let mut config = crate::config::Config::default();
        config.limits.max_chunk_bytes = 8;
        config.limits.max_total_chunks = 4;
        let app = build_router(test_relay_with(config));
        let (pin, hash) = ("606060", "h");

        let response = send(
            &app,
            "POST",
            "/relay",
            Some(send_chunk(pin, hash, 0, 1, "way past eight bytes")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response =
            send(&app, "POST", "/relay", Some(send_chunk(pin, hash, 0, 5, "x"))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response =
            send(&app, "POST", "/relay", Some(send_chunk(pin, hash, 3, 3, "x"))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn resend_overwrites_buffered_chunk() {
        let app = build_router(test_relay());
        let (pin, hash) = ("151515", "h");

        for data in ["draft", "final"] {
            let r = send(&app, "POST", "/relay", Some(send_chunk(pin, hash, 0, 1, data))).await;
            assert_eq!(r.status(), StatusCode::OK);
        }
        let body = body_json(send(&app, "POST", "/relay", Some(receive(pin, hash))).await).await;
        assert_eq!(body["chunk"]["data"], "final");
    }

    #[tokio::test]
    async fn done_channel_still_answers_ack_status() {
        let app = build_router(test_relay());
        let (pin, hash) = ("313131", "h");

        let r = send(&app, "POST", "/relay", Some(send_chunk(pin, hash, 0, 1, "only"))).await;
        assert_eq!(r.status(), StatusCode::OK);
        let body = body_json(send(&app, "POST", "/relay", Some(receive(pin, hash))).await).await;
        assert_eq!(body["status"], "chunkAvailable");
        let body = body_json(send(&app, "POST", "/relay", Some(receive(pin, hash))).await).await;
        assert_eq!(body["status"], "done");

        let r = send(&app, "POST", "/relay", Some(ack(pin, hash))).await;
        assert_eq!(r.status(), StatusCode::OK);
        let body = body_json(send(&app, "POST", "/relay", Some(ack_status(pin, hash))).await).await;
        assert_eq!(body["acknowledged"], true);
    }
}
