pub mod captcha;
pub mod images;
pub mod login;
pub mod logout;
pub mod probe;
pub mod users;
