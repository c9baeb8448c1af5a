use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role an authenticated actor operates under.
///
/// Admins may drive any transition; technicians only the field subset on
/// services assigned to them; business partners are read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Admin,
    Technician,
    BusinessPartner,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Technician => "technician",
            Self::BusinessPartner => "business_partner",
        }
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims carried by operator-provisioned HS256 tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (actor ID)
    pub sub: String,

    /// Actor role
    pub role: ActorRole,

    /// Display name shown in audit logs and notification templates
    #[serde(default)]
    pub name: Option<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Authenticated actor attached to a request after token verification.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub role: ActorRole,
    pub name: String,
}

impl Actor {
    pub fn from_claims(claims: &Claims) -> Result<Self, &'static str> {
        let id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid actor ID in token")?;

        Ok(Self {
            id,
            role: claims.role,
            name: claims.name.clone().unwrap_or_else(|| "unknown".to_string()),
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == ActorRole::Admin
    }
}

/// Verify an HS256 token and return its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_for(role: ActorRole, secret: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            role,
            name: Some("Test Actor".to_string()),
            iat: now,
            exp: now + 3600,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn verifies_round_trip_and_role() {
        let token = token_for(ActorRole::Technician, "s3cret");
        let claims = verify_token(&token, "s3cret").unwrap();
        assert_eq!(claims.role, ActorRole::Technician);

        let actor = Actor::from_claims(&claims).unwrap();
        assert!(!actor.is_admin());
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = token_for(ActorRole::Admin, "s3cret");
        assert!(verify_token(&token, "other").is_err());
    }
}
