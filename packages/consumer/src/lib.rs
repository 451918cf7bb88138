pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod notifier;

pub use backend::{ExecutionBackend, ProcessBackend};
pub use config::{BackendConfig, ConsumerAppConfig, ConsumerConfig};
pub use dispatch::{Disposition, Dispatcher};
pub use error::{BackendError, ErrorKind, HandlerError};
pub use handlers::TaskHandler;
pub use notifier::{LogNotifier, OutcomeNotifier, TaskOutcome};
