use std::sync::Arc;

use crate::application::greetings::GreetingService;
use crate::infra::db::PostgresRepositories;

#[derive(Clone)]
pub struct HttpState {
    pub greetings: Arc<GreetingService>,
    /// Present only when greetings are stored in Postgres.
    pub db: Option<Arc<PostgresRepositories>>,
}
