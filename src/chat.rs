//! Request-scoped relay logic shared by the HTTP handlers

use std::sync::Arc;

use crate::audio::AudioClip;
use crate::conversation::{Message, Role};
use crate::model::{Content, ContentPart, GenerateRequest, GenerationConfig, GenerativeModel};
use crate::persona::{AUDIO_PROMPT, persona_message};
use crate::{Error, Result};

/// Builds model requests and forwards them upstream
///
/// Holds no per-conversation state; history arrives with every call.
#[derive(Clone)]
pub struct ChatService {
    model: Arc<dyn GenerativeModel>,
    generation: GenerationConfig,
}

impl ChatService {
    /// Create a service over a model with the given generation config
    #[must_use]
    pub fn new(model: Arc<dyn GenerativeModel>, generation: GenerationConfig) -> Self {
        Self { model, generation }
    }

    /// Identifier of the underlying model
    #[must_use]
    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Reply to a text message
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for an empty message, or the model's error
    pub async fn reply(&self, history: &[Message], message: &str) -> Result<String> {
        if message.is_empty() {
            return Err(Error::Validation("message is required".to_string()));
        }

        let turn = Content {
            role: Role::User,
            parts: vec![ContentPart::Text(message.to_string())],
        };
        let request = self.request(history, turn);
        self.model.generate(&request).await
    }

    /// Reply to a spoken audio clip
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for an empty clip, or the model's error
    pub async fn reply_to_audio(&self, history: &[Message], clip: &AudioClip) -> Result<String> {
        if clip.bytes.is_empty() {
            return Err(Error::Validation("audio clip is empty".to_string()));
        }

        let turn = Content {
            role: Role::User,
            parts: vec![ContentPart::audio(clip), ContentPart::Text(AUDIO_PROMPT.to_string())],
        };
        let request = self.request(history, turn);
        self.model.generate(&request).await
    }

    /// `[persona, ...history, turn]` with the fixed generation config
    fn request(&self, history: &[Message], turn: Content) -> GenerateRequest {
        let mut contents = Vec::with_capacity(history.len() + 2);
        contents.push(Content::from(&persona_message()));
        contents.extend(history.iter().map(Content::from));
        contents.push(turn);

        GenerateRequest {
            contents,
            generation_config: self.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::persona::PERSONA_INSTRUCTION;

    struct Recording {
        requests: Mutex<Vec<GenerateRequest>>,
    }

    #[async_trait]
    impl GenerativeModel for Recording {
        async fn generate(&self, request: &GenerateRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            Ok("pong".to_string())
        }

        fn model_id(&self) -> &str {
            "recording"
        }
    }

    fn service() -> (ChatService, Arc<Recording>) {
        let model = Arc::new(Recording {
            requests: Mutex::new(Vec::new()),
        });
        (ChatService::new(model.clone(), GenerationConfig::default()), model)
    }

    #[tokio::test]
    async fn persona_then_history_then_message() {
        let (service, model) = service();
        let history = vec![Message::user("first"), Message::model("reply")];

        let reply = service.reply(&history, "second").await.unwrap();
        assert_eq!(reply, "pong");

        let requests = model.requests.lock().unwrap();
        let contents = &requests[0].contents;
        assert_eq!(contents.len(), 4);
        assert_eq!(contents[0].parts[0].as_text(), Some(PERSONA_INSTRUCTION));
        assert_eq!(contents[1].parts[0].as_text(), Some("first"));
        assert_eq!(contents[2].role, Role::Model);
        assert_eq!(contents[3].parts[0].as_text(), Some("second"));
        assert_eq!(requests[0].generation_config, GenerationConfig::default());
    }

    #[tokio::test]
    async fn audio_turn_carries_clip_and_prompt() {
        let (service, model) = service();
        let clip = AudioClip::new(vec![1, 2, 3], "audio/ogg");

        service.reply_to_audio(&[], &clip).await.unwrap();

        let requests = model.requests.lock().unwrap();
        let turn = requests[0].contents.last().unwrap();
        assert!(matches!(&turn.parts[0], ContentPart::InlineData(d) if d.mime_type == "audio/ogg"));
        assert_eq!(turn.parts[1].as_text(), Some(AUDIO_PROMPT));
    }

    #[tokio::test]
    async fn empty_message_never_reaches_model() {
        let (service, model) = service();
        assert!(matches!(service.reply(&[], "").await, Err(Error::Validation(_))));
        assert!(model.requests.lock().unwrap().is_empty());
    }
}
