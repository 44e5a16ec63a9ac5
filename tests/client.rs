//! Client against a live relay over TCP

use std::sync::Arc;

use quipchat::client::session::{CHAT_FAILED, VOICE_FAILED, VOICE_HISTORY_TEXT};
use quipchat::client::{ChatSession, RelayApi, RelayClient};
use quipchat::{ApiServerBuilder, AudioClip, ChatService, Error, GenerationConfig, Message};
use tokio::net::TcpListener;

mod common;
use common::StubModel;

/// Start a relay on an ephemeral port and return its base URL
async fn start_relay(model: Arc<StubModel>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let chat = ChatService::new(model, GenerationConfig::default());
    let server = ApiServerBuilder::new(chat, addr.port()).build();
    tokio::spawn(server.serve(listener));

    format!("http://{addr}")
}

#[tokio::test]
async fn test_text_then_voice_conversation() {
    let model = StubModel::replying("Hey there, friend!");
    let url = start_relay(model.clone()).await;
    let relay = RelayClient::new(url);
    let mut session = ChatSession::new();

    let reply = session.send_text(&relay, "Hello").await.unwrap();
    assert_eq!(reply.text, "Hey there, friend!");
    assert!(!reply.speak);
    assert_eq!(
        session.history(),
        &[Message::user("Hello"), Message::model("Hey there, friend!")]
    );

    let clip = AudioClip::new(b"fake-webm".to_vec(), "audio/webm");
    let reply = session.send_voice(&relay, &clip).await.unwrap();
    assert!(reply.speak, "a voice turn switches spoken replies on");
    assert_eq!(session.history().len(), 4);
    assert_eq!(session.history()[2].text(), VOICE_HISTORY_TEXT);

    // The upload carried the earlier turns
    let requests = model.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].contents[1].parts[0].as_text(), Some("Hello"));
}

#[tokio::test]
async fn test_failed_requests_render_apologies() {
    let url = start_relay(StubModel::failing("boom")).await;
    let relay = RelayClient::new(url);
    let mut session = ChatSession::new();

    assert!(session.send_text(&relay, "Hello").await.is_none());
    let clip = AudioClip::new(b"OggS".to_vec(), "audio/ogg");
    assert!(session.send_voice(&relay, &clip).await.is_none());

    let texts: Vec<&str> = session
        .transcript()
        .entries()
        .iter()
        .map(|e| e.text.as_str())
        .collect();
    assert!(texts.contains(&CHAT_FAILED));
    assert!(texts.contains(&VOICE_FAILED));
    assert!(session.history().is_empty());
    assert!(!session.voice_replies());
}

#[tokio::test]
async fn test_relay_status_errors_are_typed() {
    let url = start_relay(StubModel::replying("unused")).await;
    let relay = RelayClient::new(url);

    let err = relay.chat("", &[]).await.unwrap_err();
    assert!(matches!(err, Error::Relay(msg) if msg.contains("400")));

    let clip = AudioClip::new(b"fLaC".to_vec(), "audio/flac");
    let err = relay.audio_chat(&clip, &[]).await.unwrap_err();
    assert!(matches!(err, Error::Upload(msg) if msg.contains("415")));
}
