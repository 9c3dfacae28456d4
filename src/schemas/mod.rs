//! API schema definitions

pub mod openai;

pub use openai::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatRole, Choice, ResponseMessage,
    Usage,
};
