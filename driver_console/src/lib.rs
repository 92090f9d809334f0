pub mod broadcaster;
pub mod config;
pub mod console;
pub mod http_sink;
pub mod providers;
