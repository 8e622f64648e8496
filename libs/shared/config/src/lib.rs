use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_url: String,
    pub store_api_key: String,
    pub jwt_secret: String,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_from_address: String,
    pub image_store_url: String,
    pub image_store_api_key: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            store_url: env::var("STORE_URL").unwrap_or_else(|_| {
                warn!("STORE_URL not set, using empty value");
                String::new()
            }),
            store_api_key: env::var("STORE_API_KEY").unwrap_or_else(|_| {
                warn!("STORE_API_KEY not set, using empty value");
                String::new()
            }),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                warn!("JWT_SECRET not set, using empty value");
                String::new()
            }),
            mail_api_url: env::var("MAIL_API_URL").unwrap_or_else(|_| {
                warn!("MAIL_API_URL not set, using empty value");
                String::new()
            }),
            mail_api_key: env::var("MAIL_API_KEY").unwrap_or_else(|_| {
                warn!("MAIL_API_KEY not set, using empty value");
                String::new()
            }),
            mail_from_address: env::var("MAIL_FROM_ADDRESS").unwrap_or_else(|_| {
                warn!("MAIL_FROM_ADDRESS not set, using default");
                "no-reply@medibook.local".to_string()
            }),
            image_store_url: env::var("IMAGE_STORE_URL").unwrap_or_else(|_| {
                warn!("IMAGE_STORE_URL not set, using empty value");
                String::new()
            }),
            image_store_api_key: env::var("IMAGE_STORE_API_KEY").unwrap_or_else(|_| {
                warn!("IMAGE_STORE_API_KEY not set, using empty value");
                String::new()
            }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.store_url.is_empty() && !self.store_api_key.is_empty() && !self.jwt_secret.is_empty()
    }

    pub fn is_mail_configured(&self) -> bool {
        !self.mail_api_url.is_empty() && !self.mail_api_key.is_empty()
    }

    pub fn is_image_store_configured(&self) -> bool {
        !self.image_store_url.is_empty() && !self.image_store_api_key.is_empty()
    }
}
