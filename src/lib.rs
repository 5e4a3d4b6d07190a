pub mod config;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod panel;
pub mod period;
pub mod pipeline;
pub mod process;
pub mod schema;
