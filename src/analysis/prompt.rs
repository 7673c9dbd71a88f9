use serde::Serialize;

pub const ANALYSIS_INSTRUCTION: &str = "You are a food calorie analyzer. Analyze this food image and \
provide ONLY a JSON response with this exact format, no other text or explanation: \
{\"foods\": [{\"name\": \"food name\", \"calories\": number}], \"totalCalories\": number}. \
Be precise with food names and realistic with calorie counts. \
Do not include any other fields or text in the response.";

/// Chat-completion request body sent to the vision model.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

pub fn image_data_uri(image_b64: &str) -> String {
    format!("data:image/jpeg;base64,{}", image_b64)
}

/// Single user turn: the instruction followed by the embedded image.
pub fn build_request(model: &str, image_b64: &str) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![ChatMessage {
            role: "user",
            content: vec![
                ContentPart::Text {
                    text: ANALYSIS_INSTRUCTION.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_data_uri(image_b64),
                    },
                },
            ],
        }],
    }
}
