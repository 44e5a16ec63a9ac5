//! Relay endpoint integration tests

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use quipchat::model::ContentPart;
use quipchat::persona::{AUDIO_PROMPT, PERSONA_INSTRUCTION, TRANSCRIPTION_PLACEHOLDER};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{FormPart, StubModel, body_json, build_test_router, json_post, multipart_post};

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router(StubModel::replying("unused"));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_ready_endpoint_reports_model() {
    let app = build_test_router(StubModel::replying("unused"));

    let response = app
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["checks"]["model"]["status"], "ok");
    assert_eq!(json["checks"]["model"]["message"], "stub-model");
}

#[tokio::test]
async fn test_chat_replies_with_model_text() {
    let model = StubModel::replying("Hi there! 🎉");
    let app = build_test_router(model.clone());

    let response = app
        .oneshot(json_post("/api/chat", &json!({"message": "Hello", "history": []})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"reply": "Hi there! 🎉"}));

    let requests = model.requests();
    assert_eq!(requests.len(), 1);
    let contents = &requests[0].contents;
    assert_eq!(contents.len(), 2);
    assert_eq!(contents[0].parts[0].as_text(), Some(PERSONA_INSTRUCTION));
    assert_eq!(contents[1].parts[0].as_text(), Some("Hello"));
}

#[tokio::test]
async fn test_chat_forwards_history_in_order() {
    let model = StubModel::replying("ok");
    let app = build_test_router(model.clone());

    let body = json!({
        "message": "and now?",
        "history": [
            {"role": "user", "parts": [{"text": "first"}]},
            {"role": "model", "parts": [{"text": "answer"}]}
        ]
    });
    let response = app.oneshot(json_post("/api/chat", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let requests = model.requests();
    let texts: Vec<Option<&str>> = requests[0]
        .contents
        .iter()
        .map(|c| c.parts[0].as_text())
        .collect();
    assert_eq!(
        texts,
        vec![Some(PERSONA_INSTRUCTION), Some("first"), Some("answer"), Some("and now?")]
    );
}

#[tokio::test]
async fn test_chat_missing_history_is_empty() {
    let model = StubModel::replying("ok");
    let app = build_test_router(model.clone());

    let response = app
        .oneshot(json_post("/api/chat", &json!({"message": "solo"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(model.requests()[0].contents.len(), 2);
}

#[tokio::test]
async fn test_chat_requires_message() {
    for body in [json!({"history": []}), json!({"message": ""}), json!({})] {
        let model = StubModel::replying("unused");
        let app = build_test_router(model.clone());

        let response = app.oneshot(json_post("/api/chat", &body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"error": "Message is required"}));
        assert!(model.requests().is_empty(), "model must not be called");
    }
}

#[tokio::test]
async fn test_chat_rejects_malformed_body() {
    let app = build_test_router(StubModel::replying("unused"));

    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "Invalid request body"}));
}

#[tokio::test]
async fn test_chat_rejects_invalid_history() {
    let model = StubModel::replying("unused");
    let app = build_test_router(model.clone());

    let body = json!({"message": "hi", "history": "not a list"});
    let response = app.oneshot(json_post("/api/chat", &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "Invalid history"}));
    assert!(model.requests().is_empty());
}

#[tokio::test]
async fn test_chat_upstream_failure_hides_detail() {
    let app = build_test_router(StubModel::failing("quota exceeded for key abc123"));

    let response = app
        .oneshot(json_post("/api/chat", &json!({"message": "Hello"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json, json!({"error": "Failed to generate response"}));
    assert!(!json.to_string().contains("abc123"));
}

#[tokio::test]
async fn test_audio_chat_replies_with_placeholder_transcription() {
    let model = StubModel::replying("I heard you!");
    let app = build_test_router(model.clone());

    let request = multipart_post(
        "/api/audio-chat",
        &[
            FormPart::File {
                name: "audio",
                file_name: "voice-message.webm",
                content_type: "audio/webm",
                bytes: b"fake-webm-bytes",
            },
            FormPart::Text {
                name: "history",
                value: r#"[{"role":"user","parts":[{"text":"earlier"}]}]"#,
            },
        ],
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"reply": "I heard you!", "transcription": TRANSCRIPTION_PLACEHOLDER})
    );

    let requests = model.requests();
    let contents = &requests[0].contents;
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[1].parts[0].as_text(), Some("earlier"));

    let turn = &contents[2].parts;
    let ContentPart::InlineData(data) = &turn[0] else {
        panic!("expected inline audio first");
    };
    assert_eq!(data.mime_type, "audio/webm");
    assert_eq!(turn[1].as_text(), Some(AUDIO_PROMPT));
}

#[tokio::test]
async fn test_audio_chat_unparseable_history_is_ignored() {
    let model = StubModel::replying("still here");
    let app = build_test_router(model.clone());

    let request = multipart_post(
        "/api/audio-chat",
        &[
            FormPart::File {
                name: "audio",
                file_name: "clip.wav",
                content_type: "audio/wav",
                bytes: b"RIFF....WAVE",
            },
            FormPart::Text {
                name: "history",
                value: "not json",
            },
        ],
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    // Persona plus the audio turn only
    assert_eq!(model.requests()[0].contents.len(), 2);
}

#[tokio::test]
async fn test_audio_chat_requires_file() {
    let model = StubModel::replying("unused");
    let app = build_test_router(model.clone());

    let request = multipart_post(
        "/api/audio-chat",
        &[FormPart::Text {
            name: "history",
            value: "[]",
        }],
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "Audio file is required"}));
    assert!(model.requests().is_empty());
}

#[tokio::test]
async fn test_audio_chat_text_audio_field_is_not_a_file() {
    let model = StubModel::replying("unused");
    let app = build_test_router(model.clone());

    let request = multipart_post(
        "/api/audio-chat",
        &[
            FormPart::Text {
                name: "audio",
                value: "hello",
            },
            FormPart::Text {
                name: "history",
                value: "[]",
            },
        ],
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "Audio file is required"}));
    assert!(model.requests().is_empty());
}

#[tokio::test]
async fn test_audio_chat_empty_file_is_missing() {
    let model = StubModel::replying("unused");
    let app = build_test_router(model.clone());

    let request = multipart_post(
        "/api/audio-chat",
        &[FormPart::File {
            name: "audio",
            file_name: "empty.webm",
            content_type: "audio/webm",
            bytes: b"",
        }],
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "Audio file is required"}));
    assert!(model.requests().is_empty());
}

#[tokio::test]
async fn test_audio_chat_rejects_disallowed_type() {
    let model = StubModel::replying("unused");
    let app = build_test_router(model.clone());

    let request = multipart_post(
        "/api/audio-chat",
        &[FormPart::File {
            name: "audio",
            file_name: "clip.flac",
            content_type: "audio/flac",
            bytes: b"fLaC",
        }],
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Invalid file type. Only audio files are allowed."})
    );
    assert!(model.requests().is_empty());
}

#[tokio::test]
async fn test_audio_chat_rejects_oversized_file() {
    let model = StubModel::replying("unused");
    let app = build_test_router(model.clone());

    let bytes = vec![0u8; quipchat::audio::MAX_AUDIO_BYTES + 1];
    let request = multipart_post(
        "/api/audio-chat",
        &[FormPart::File {
            name: "audio",
            file_name: "long.webm",
            content_type: "audio/webm",
            bytes: &bytes,
        }],
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Audio file exceeds the 10MB limit"})
    );
    assert!(model.requests().is_empty());
}

#[tokio::test]
async fn test_audio_chat_rejects_second_file() {
    let app = build_test_router(StubModel::replying("unused"));

    let file = FormPart::File {
        name: "audio",
        file_name: "a.webm",
        content_type: "audio/webm",
        bytes: b"one",
    };
    let again = FormPart::File {
        name: "audio",
        file_name: "b.webm",
        content_type: "audio/webm",
        bytes: b"two",
    };
    let response = app
        .oneshot(multipart_post("/api/audio-chat", &[file, again]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "Unexpected field"}));
}

#[tokio::test]
async fn test_audio_chat_upstream_failure() {
    let app = build_test_router(StubModel::failing("model overloaded"));

    let request = multipart_post(
        "/api/audio-chat",
        &[FormPart::File {
            name: "audio",
            file_name: "clip.ogg",
            content_type: "audio/ogg",
            bytes: b"OggS",
        }],
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({"error": "Failed to process audio"}));
}

#[tokio::test]
async fn test_rate_limit_returns_429() {
    let chat = quipchat::ChatService::new(
        StubModel::replying("ok"),
        quipchat::GenerationConfig::default(),
    );
    let app = quipchat::ApiServerBuilder::new(chat, 0)
        .rate_limit(Some(1))
        .build()
        .router();

    let first = app
        .clone()
        .oneshot(json_post("/api/chat", &json!({"message": "one"})))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(json_post("/api/chat", &json!({"message": "two"})))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(second).await, json!({"error": "Too many requests"}));
}
