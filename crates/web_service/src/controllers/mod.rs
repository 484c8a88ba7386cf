pub mod chat_controller;
pub mod home_controller;

/// Cookie carrying the conversation identifier issued by the landing route.
pub const SESSION_COOKIE: &str = "chat_session";

/// Conversation used when a caller never visited the landing route and so
/// carries no session cookie.
pub const DEFAULT_SESSION: &str = "default";
