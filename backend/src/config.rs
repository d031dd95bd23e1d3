use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. When unset the server runs on the
    /// in-memory store (local development only).
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub port: u16,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok();

        let jwt_secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| "your-secret-key-change-this-in-production".to_string());

        // The PORT environment variable is provided by the hosting runtime.
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        Ok(Config {
            database_url,
            jwt_secret,
            port,
        })
    }
}
