mod auth;
mod client;
mod model;
mod oauth;
mod support;
mod workflows;
