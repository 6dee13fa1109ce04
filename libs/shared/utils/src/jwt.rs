use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use shared_models::auth::{JwtClaims, JwtHeader, TokenResponse, User};

type HmacSha256 = Hmac<Sha256>;

fn sign(signing_input: &str, jwt_secret: &str) -> Result<String, String> {
    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

/// Issue an HS256 token for an authenticated account.
pub fn issue_token(
    subject: &str,
    email: &str,
    role: &str,
    jwt_secret: &str,
    ttl_minutes: i64,
) -> Result<TokenResponse, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let now = Utc::now();
    let expires_at = now + Duration::minutes(ttl_minutes);

    let header = JwtHeader {
        alg: "HS256".to_string(),
        typ: "JWT".to_string(),
    };
    let claims = JwtClaims {
        sub: subject.to_string(),
        exp: Some(expires_at.timestamp().max(0) as u64),
        email: Some(email.to_string()),
        role: Some(role.to_string()),
        iat: Some(now.timestamp().max(0) as u64),
    };

    let header_json = serde_json::to_string(&header).map_err(|e| e.to_string())?;
    let claims_json = serde_json::to_string(&claims).map_err(|e| e.to_string())?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json)
    );
    let signature = sign(&signing_input, jwt_secret)?;

    Ok(TokenResponse {
        token: format!("{}.{}", signing_input, signature),
        token_type: "Bearer".to_string(),
        expires_at,
    })
}

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let mut mac = match HmacSha256::new_from_slice(jwt_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return Err("Failed to create HMAC".to_string()),
    };
    mac.update(format!("{}.{}", header_b64, claims_b64).as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: JwtClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        }
    };

    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp().max(0) as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err("Token expired".to_string());
        }
    }

    let created_at = claims
        .iat
        .and_then(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    let user = User {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
        created_at,
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SECRET: &str = "test-secret-key-for-jwt-validation-must-be-long-enough";

    #[test]
    fn test_issued_token_validates() {
        let issued = issue_token("42", "nurse@clinic.test", "user", SECRET, 30).unwrap();
        assert_eq!(issued.token_type, "Bearer");

        let user = validate_token(&issued.token, SECRET).unwrap();
        assert_eq!(user.id, "42");
        assert_eq!(user.email.as_deref(), Some("nurse@clinic.test"));
        assert_eq!(user.role.as_deref(), Some("user"));
        assert!(!user.is_admin());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = issue_token("1", "a@clinic.test", "admin", SECRET, 30).unwrap();
        assert_matches!(validate_token(&issued.token, "another-secret"), Err(msg) if msg == "Invalid token signature");
    }

    #[test]
    fn test_expired_token_rejected() {
        let issued = issue_token("1", "a@clinic.test", "admin", SECRET, -5).unwrap();
        assert_matches!(validate_token(&issued.token, SECRET), Err(msg) if msg == "Token expired");
    }

    #[test]
    fn test_malformed_token_rejected() {
        assert_matches!(validate_token("not-a-token", SECRET), Err(msg) if msg == "Invalid token format");
    }

    #[test]
    fn test_empty_secret_refused() {
        assert!(issue_token("1", "a@clinic.test", "user", "", 30).is_err());
        assert!(validate_token("a.b.c", "").is_err());
    }
}
