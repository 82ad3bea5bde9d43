use crate::state::StateRef;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

//--------------------------------------------------------------------------------------------------
// Response types
//--------------------------------------------------------------------------------------------------

#[derive(Serialize)]
pub struct GenerateCaptchaResponse {
    #[serde(rename = "captchaID")]
    pub captcha_id: String,
    pub captcha: String,
}

//--------------------------------------------------------------------------------------------------
// Handler
//--------------------------------------------------------------------------------------------------

pub async fn handler(State(state): State<StateRef>) -> Json<GenerateCaptchaResponse> {
    let (captcha_id, captcha) = state.captchas().generate();

    Json(GenerateCaptchaResponse {
        captcha_id,
        captcha,
    })
}

//--------------------------------------------------------------------------------------------------
