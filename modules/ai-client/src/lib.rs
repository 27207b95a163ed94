pub mod claude;
pub mod error;
pub mod gemini;
pub mod traits;

pub use claude::Claude;
pub use error::AiError;
pub use gemini::Gemini;
pub use traits::CompletionModel;
