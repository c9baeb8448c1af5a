use anyhow::{Context, Result};
use std::env;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    #[allow(dead_code)]
    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

/// Brand-based supplier routing table (see `workflow::dispatch`).
///
/// Appliances whose manufacturer appears in `brands` additionally notify
/// the configured supplier contact on status changes and parts events.
/// Matching is case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct SupplierRouting {
    pub brands: Vec<String>,
    pub contact_name: String,
    pub contact_phone: Option<String>,
}

impl SupplierRouting {
    pub fn routes_brand(&self, manufacturer: &str) -> bool {
        self.brands
            .iter()
            .any(|b| b.eq_ignore_ascii_case(manufacturer.trim()))
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Auth (HS256, operator-provisioned tokens)
    pub auth_jwt_secret: String,

    // SMS gateway
    pub sms_gateway_url: String,
    pub sms_gateway_token: String,
    pub sms_sender_id: String,

    // Transactional email API
    pub email_api_url: String,
    pub email_api_token: String,
    pub email_from_address: String,

    // Outbound notification policy
    pub notification_timeout_seconds: u64,

    // Brand-based supplier routing
    pub supplier_routing: SupplierRouting,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        // Database
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        // CORS
        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Auth
        let auth_jwt_secret = env::var("AUTH_JWT_SECRET").context("AUTH_JWT_SECRET must be set")?;

        // SMS gateway
        let sms_gateway_url = env::var("SMS_GATEWAY_URL").context("SMS_GATEWAY_URL must be set")?;
        Url::parse(&sms_gateway_url).context("SMS_GATEWAY_URL is not a valid URL")?;
        let sms_gateway_token =
            env::var("SMS_GATEWAY_TOKEN").context("SMS_GATEWAY_TOKEN must be set")?;
        let sms_sender_id = env::var("SMS_SENDER_ID").unwrap_or_else(|_| "REPAIRHUB".to_string());

        // Email API
        let email_api_url = env::var("EMAIL_API_URL").context("EMAIL_API_URL must be set")?;
        Url::parse(&email_api_url).context("EMAIL_API_URL is not a valid URL")?;
        let email_api_token = env::var("EMAIL_API_TOKEN").context("EMAIL_API_TOKEN must be set")?;
        let email_from_address = env::var("EMAIL_FROM_ADDRESS")
            .unwrap_or_else(|_| "service@repairhub.local".to_string());

        // Notification policy
        let notification_timeout_seconds = env::var("NOTIFICATION_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        // Supplier routing table. Empty brand list disables the route.
        let supplier_routed_brands: Vec<String> = env::var("SUPPLIER_ROUTED_BRANDS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let supplier_contact_name =
            env::var("SUPPLIER_CONTACT_NAME").unwrap_or_else(|_| "Parts supplier".to_string());
        let supplier_contact_phone =
            env::var("SUPPLIER_CONTACT_PHONE").ok().filter(|s| !s.is_empty());

        Ok(Settings {
            env,
            server_addr,
            database_url,
            database_max_connections,
            cors_allow_origins,
            auth_jwt_secret,
            sms_gateway_url,
            sms_gateway_token,
            sms_sender_id,
            email_api_url,
            email_api_token,
            email_from_address,
            notification_timeout_seconds,
            supplier_routing: SupplierRouting {
                brands: supplier_routed_brands,
                contact_name: supplier_contact_name,
                contact_phone: supplier_contact_phone,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supplier_routing_matches_case_insensitively() {
        let routing = SupplierRouting {
            brands: vec!["Arctic".to_string(), "Polarline".to_string()],
            contact_name: "Parts supplier".to_string(),
            contact_phone: Some("+15550001111".to_string()),
        };

        assert!(routing.routes_brand("arctic"));
        assert!(routing.routes_brand(" POLARLINE "));
        assert!(!routing.routes_brand("Beko"));
    }

    #[test]
    fn empty_routing_table_matches_nothing() {
        let routing = SupplierRouting::default();
        assert!(!routing.routes_brand("Arctic"));
    }
}
