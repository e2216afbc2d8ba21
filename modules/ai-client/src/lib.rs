pub mod error;
pub mod ollama;
pub mod openai;
pub mod traits;
pub mod util;

pub use error::AiError;
pub use ollama::Ollama;
pub use openai::OpenAi;
pub use traits::{Message, MessageRole, TextCompletion};
pub use util::truncate_to_char_boundary;
