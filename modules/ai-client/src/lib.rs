pub mod claude;
pub mod error;
pub mod openai;
pub mod openrouter;
pub mod schema;
pub mod traits;
pub mod util;

pub use claude::Claude;
pub use error::AiError;
pub use openai::OpenAi;
pub use openrouter::OpenRouter;
pub use schema::StructuredOutput;
pub use traits::{ChatModel, Message, MessageRole};
pub use util::{extract_json_object, strip_code_blocks, truncate_to_char_boundary};
