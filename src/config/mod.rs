mod schema;

pub use schema::{Config, SecretsConfig};
