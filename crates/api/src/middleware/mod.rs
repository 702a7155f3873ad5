pub mod cors;
pub mod logging;

pub use cors::cors_layer;
pub use logging::{get_tracing_layer, logging_middleware};
