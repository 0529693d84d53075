use fulfil_client::Client;

use wiremock::MockServer;

pub const API_KEY: &str = "test-api-key";

/// A client pointed at `server`, authenticated with [`API_KEY`].
pub fn client_for(server: &MockServer) -> Client {
    Client::builder("acme")
        .host(server.uri())
        .api_key(API_KEY)
        .build()
        .expect("client should build")
}
