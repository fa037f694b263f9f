pub mod message;
pub mod notifier;
pub mod webhook;

pub use message::{sanitize_text, NotificationBatch};
pub use notifier::{NotifierAgent, NotifierConfig};
pub use webhook::WebhookClient;

pub mod prelude {
    pub use super::notifier::{NotifierAgent, NotifierConfig};
    pub use td_core::{Error, Result, SummarizedArticle};
}
