use crate::captcha::CaptchaStore;
use crate::cfg::UploadConfig;
use crate::db::DbConnectionPool;
use crate::handler_proxy::IssueAccess;
use sentinel::extract::AdmissionState;
use sentinel::limiter::SlidingWindowLimiter;
use sentinel::revocation::RevocationStore;
use sentinel::TokenCodec;
use std::sync::Arc;

//--------------------------------------------------------------------------------------------------
// State given to the handlers
//--------------------------------------------------------------------------------------------------

pub type StateRef = Arc<State>;

pub struct State {
    db_connection: DbConnectionPool,
    token_codec: TokenCodec,
    revocations: Arc<dyn RevocationStore>,
    limiter: SlidingWindowLimiter,
    captchas: CaptchaStore,
    upload: UploadConfig,
    login_captcha: bool,
}

impl State {
    pub fn new(
        db_connection: DbConnectionPool,
        token_codec: TokenCodec,
        revocations: Arc<dyn RevocationStore>,
        limiter: SlidingWindowLimiter,
        captchas: CaptchaStore,
        upload: UploadConfig,
        login_captcha: bool,
    ) -> Self {
        Self {
            db_connection,
            token_codec,
            revocations,
            limiter,
            captchas,
            upload,
            login_captcha,
        }
    }

    // Issuing is gated so only the handler proxy can grant it
    pub fn issue_codec(&self, _issue_access: IssueAccess) -> &TokenCodec {
        &self.token_codec
    }

    pub fn db_connection(&self) -> &DbConnectionPool {
        &self.db_connection
    }

    pub fn revocations(&self) -> &dyn RevocationStore {
        self.revocations.as_ref()
    }

    pub fn limiter(&self) -> &SlidingWindowLimiter {
        &self.limiter
    }

    pub fn captchas(&self) -> &CaptchaStore {
        &self.captchas
    }

    pub fn upload(&self) -> &UploadConfig {
        &self.upload
    }

    pub fn login_captcha(&self) -> bool {
        self.login_captcha
    }
}

impl AdmissionState for State {
    fn token_codec(&self) -> &TokenCodec {
        &self.token_codec
    }

    fn revocation_store(&self) -> &dyn RevocationStore {
        self.revocations.as_ref()
    }
}

//--------------------------------------------------------------------------------------------------
