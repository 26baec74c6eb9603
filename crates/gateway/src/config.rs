//! Application configuration loaded from environment variables.

/// Gateway configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `8080`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `CAR_SERVICE_URL` — car service base URL (default: `http://localhost:8070`)
/// - `PAYMENT_SERVICE_URL` — payment service base URL (default: `http://localhost:8050`)
/// - `RENTAL_SERVICE_URL` — rental service base URL (default: `http://localhost:8060`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub car_service_url: String,
    pub payment_service_url: String,
    pub rental_service_url: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            car_service_url: std::env::var("CAR_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8070".to_string()),
            payment_service_url: std::env::var("PAYMENT_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8050".to_string()),
            rental_service_url: std::env::var("RENTAL_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8060".to_string()),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            car_service_url: "http://localhost:8070".to_string(),
            payment_service_url: "http://localhost:8050".to_string(),
            rental_service_url: "http://localhost:8060".to_string(),
        }
    }
}
