pub mod record;
pub mod connection;
pub mod sink;
pub mod tcp_sink;
pub mod queue;
pub mod noop_sink;
pub mod emitter;
pub mod producer;
pub mod services;

pub mod config;
pub mod env;
pub mod init;
pub mod app;
