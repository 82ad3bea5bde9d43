use serde::Deserialize;

//--------------------------------------------------------------------------------------------------
// Config to be read from file
//--------------------------------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct Config {
    #[serde(default)]
    pub debug: bool,
    pub http_port: Option<u16>,
    pub postgres_connection_string: String,
    // No Redis means revocations are process-local (MemoryRevocationStore)
    pub redis_url: Option<String>,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub upload: UploadConfig,
    #[serde(default)]
    pub captcha: CaptchaConfig,
}

// The secret is required and must be non-empty; TokenCodec::new enforces the latter and startup
// fails on either
#[derive(Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub validity_hours: i64,
    pub issuer: String,
}

#[derive(Deserialize)]
pub struct RateLimitConfig {
    pub limit: usize,
    pub window_secs: u64,
}

#[derive(Clone, Deserialize)]
pub struct UploadConfig {
    pub dir: String,
    pub max_size_mb: u64,
}

#[derive(Default, Deserialize)]
pub struct CaptchaConfig {
    // Require a captcha answer on login
    #[serde(default)]
    pub login: bool,
}

//--------------------------------------------------------------------------------------------------
