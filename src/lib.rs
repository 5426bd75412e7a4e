pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
pub mod utils;

use std::sync::Arc;

use config::Config;
use db::MarketStore;
use service::{AuthService, JobService, UserService};

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<dyn MarketStore>,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub job_service: JobService,
}

impl AppState {
    pub fn new(env: Config, db_client: Arc<dyn MarketStore>) -> Self {
        AppState {
            auth_service: AuthService::new(db_client.clone(), env.clone()),
            user_service: UserService::new(db_client.clone(), env.clone()),
            job_service: JobService::new(db_client.clone()),
            env,
            db_client,
        }
    }
}
