use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub token_secret: SecretString,
    /// Access-token TTL in seconds.
    pub access_token_ttl: u64,
    /// Refresh-token TTL in seconds.
    pub refresh_token_ttl: u64,
    pub frontend_url: String,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(token_secret: SecretString) -> Self {
        Self {
            token_secret,
            access_token_ttl: 60 * 60,
            refresh_token_ttl: 7 * 24 * 60 * 60,
            frontend_url: "http://localhost:5173".to_string(),
        }
    }
}
