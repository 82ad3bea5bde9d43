use crate::claims::{ClaimMeta, Claims};
use crate::unixtime::UnixTimestamp;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::Duration;
use tracing::debug;

//--------------------------------------------------------------------------------------------------
// Errors
//--------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("signing secret must not be empty")]
    EmptySecret,
    #[error("token validity must be positive")]
    NonPositiveValidity,
}

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

// The distinction is for logs only; clients see one generic authentication failure
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("token has expired")]
    Expired,
    #[error("token signed with an unsupported algorithm")]
    AlgorithmMismatch,
    #[error("token signature does not verify")]
    Signature,
    #[error("malformed token")]
    Malformed,
}

//--------------------------------------------------------------------------------------------------
// Token codec
//--------------------------------------------------------------------------------------------------

/// Issues and verifies signed, expiring identity tokens. Stateless; both directions use the same
/// symmetric secret.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: Duration,
    issuer: String,
}

impl TokenCodec {
    const ALGORITHM: Algorithm = Algorithm::HS256;

    // There is no safe default for the secret - an empty one is a construction error, and the
    // server treats that as fatal at startup
    pub fn new(
        secret: &str,
        validity: Duration,
        issuer: impl Into<String>,
    ) -> Result<Self, CodecError> {
        if secret.is_empty() {
            return Err(CodecError::EmptySecret);
        }
        if validity <= Duration::ZERO {
            return Err(CodecError::NonPositiveValidity);
        }

        Ok(TokenCodec {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validity,
            issuer: issuer.into(),
        })
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    pub fn issue(&self, meta: ClaimMeta) -> Result<String, IssueError> {
        let claims = Claims::new(meta, UnixTimestamp::now(), self.validity, &self.issuer);

        debug!(user_id = claims.user_id(), "Issuing token");

        let token = encode(&Header::new(Self::ALGORITHM), &claims, &self.encoding_key)?;

        Ok(token)
    }

    // Purely cryptographic: revocation is a separate pipeline step and is not consulted here
    pub fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        let mut validation = Validation::new(Self::ALGORITHM);
        // Default leeway is 60s; expiry here is exact. A token is accepted while now <= exp and
        // rejected once now > exp.
        validation.leeway = 0;
        validation.validate_exp = true;

        let data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|err| {
                match err.kind() {
                    ErrorKind::ExpiredSignature => VerifyError::Expired,
                    ErrorKind::InvalidAlgorithm => VerifyError::AlgorithmMismatch,
                    ErrorKind::InvalidSignature => VerifyError::Signature,
                    _ => VerifyError::Malformed,
                }
            })?;

        Ok(data.claims)
    }
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::{ADMIN, NORMAL};

    fn codec(secret: &str) -> TokenCodec {
        TokenCodec::new(secret, Duration::hours(1), "sentinel-test").unwrap()
    }

    fn meta() -> ClaimMeta {
        ClaimMeta {
            user_id: 42,
            role_id: ADMIN,
        }
    }

    #[test]
    fn empty_secret_is_rejected() {
        let result = TokenCodec::new("", Duration::hours(1), "sentinel-test");
        assert!(matches!(result, Err(CodecError::EmptySecret)));
    }

    #[test]
    fn non_positive_validity_is_rejected() {
        let result = TokenCodec::new("secret", Duration::ZERO, "sentinel-test");
        assert!(matches!(result, Err(CodecError::NonPositiveValidity)));

        let result = TokenCodec::new("secret", Duration::seconds(-5), "sentinel-test");
        assert!(matches!(result, Err(CodecError::NonPositiveValidity)));
    }

    #[test]
    fn issue_verify_round_trip() {
        let codec = codec("round-trip-secret");

        let token = codec.issue(meta()).unwrap();
        let claims = codec.verify(&token).unwrap();

        assert_eq!(claims.user_id(), 42);
        assert_eq!(claims.role_id(), ADMIN);
        assert_eq!(claims.issuer(), "sentinel-test");
        assert!(claims.expires_at() > claims.issued_at());
        assert_eq!(
            claims.expires_at().unix_timestamp() - claims.issued_at().unix_timestamp(),
            3600
        );
    }

    #[test]
    fn roles_round_trip_by_value() {
        let codec = codec("role-secret");

        let token = codec
            .issue(ClaimMeta {
                user_id: 7,
                role_id: NORMAL,
            })
            .unwrap();
        let claims = codec.verify(&token).unwrap();

        assert_eq!(claims.role_id(), NORMAL);
        assert_ne!(claims.role_id(), ADMIN);
    }

    #[test]
    fn wrong_secret_fails_signature() {
        let issuing = codec("secret-a");
        let verifying = codec("secret-b");

        let token = issuing.issue(meta()).unwrap();

        assert!(matches!(
            verifying.verify(&token),
            Err(VerifyError::Signature)
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec("garbage-secret");

        assert!(matches!(
            codec.verify("not-a-token"),
            Err(VerifyError::Malformed)
        ));
        assert!(matches!(codec.verify(""), Err(VerifyError::Malformed)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec("expiry-secret");

        // exp = now - 1h
        let claims = Claims::new(
            meta(),
            UnixTimestamp::now() + Duration::hours(-2),
            Duration::hours(1),
            "sentinel-test",
        );
        let token = encode(
            &Header::new(TokenCodec::ALGORITHM),
            &claims,
            &codec.encoding_key,
        )
        .unwrap();

        assert!(matches!(codec.verify(&token), Err(VerifyError::Expired)));
    }

    #[test]
    fn expiry_boundary_has_no_leeway() {
        let codec = codec("leeway-secret");

        // exp = now - 2s: inside jsonwebtoken's default 60s leeway, so this test pins the
        // exact-boundary rule (now > exp rejects)
        let claims = Claims::new(
            meta(),
            UnixTimestamp::now() + Duration::seconds(-62),
            Duration::seconds(60),
            "sentinel-test",
        );
        let token = encode(
            &Header::new(TokenCodec::ALGORITHM),
            &claims,
            &codec.encoding_key,
        )
        .unwrap();

        assert!(matches!(codec.verify(&token), Err(VerifyError::Expired)));
    }

    #[test]
    fn mismatched_algorithm_is_rejected() {
        let codec = codec("algorithm-secret");

        // Same secret, different HMAC flavor
        let claims = Claims::new(
            meta(),
            UnixTimestamp::now(),
            Duration::hours(1),
            "sentinel-test",
        );
        let token = encode(&Header::new(Algorithm::HS384), &claims, &codec.encoding_key).unwrap();

        assert!(matches!(
            codec.verify(&token),
            Err(VerifyError::AlgorithmMismatch)
        ));
    }
}
