//! Web API 层。
//!
//! 提供 Axum 路由，将 HTTP 请求委托给应用层的在线注册表与消息服务。
//! 操作者身份通过 `User` 请求头传入，不做额外认证。

mod error;
mod routes;
mod state;

pub use error::{ApiError, ErrorBody};
pub use routes::{router, ActingParticipant, ApiJson, USER_HEADER};
pub use state::AppState;
