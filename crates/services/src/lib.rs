#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod error;
pub mod gateway;
pub mod session_client;
pub mod sessions;
pub mod token_store;
pub mod transport;

pub use reasoning_core::Clock;
pub use reasoning_core::fallback;

pub use app_services::AppServices;
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, ApiErrorKind, AppServicesError, SessionError};
pub use gateway::RequestGateway;
pub use session_client::SessionClient;
pub use sessions::{
    ContentApi, LifecycleState, PracticeFlow, QuestionLifecycle, ReviewFlow, ReviewProgress,
};
pub use token_store::{CREDENTIAL_KEY, TokenStore};
pub use transport::{HttpTransport, ReqwestTransport, StubTransport};
