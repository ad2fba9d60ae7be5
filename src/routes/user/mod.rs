mod handler;
mod model;

pub use handler::{edit, login, login_sms, profile, send_sms_code, signup};
