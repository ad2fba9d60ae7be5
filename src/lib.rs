use std::sync::Arc;

use config::Config;
use service::AccountService;
use sms::CodeVerifier;
use token::TokenIssuer;

pub mod cache;
pub mod config;
pub mod domain;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod service;
pub mod sms;
pub mod store;
pub mod token;
pub mod utils;

#[cfg(test)]
pub mod testutil;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AccountService>,
    pub issuer: Arc<TokenIssuer>,
    pub verifier: Arc<dyn CodeVerifier>,
    pub config: Config,
}
