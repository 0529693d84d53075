mod async_result;
mod auth;
mod config;
mod host;
mod mock;
mod model;
mod query;
