pub mod events;
pub mod rate_limiter;
pub mod relay;
pub mod room;
pub mod session;
pub mod validation;
