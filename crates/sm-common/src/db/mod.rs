pub mod listings;
pub mod marketplace;
pub mod match_results;
pub mod migrations;
pub mod pool;
pub mod requests;
pub mod util;

pub use listings::query_listings;
pub use marketplace::PgMarketplace;
pub use match_results::upsert_match_results;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPoolError, PgPool, create_pool_from_url, create_pool_from_url_checked, ping};
pub use requests::fetch_request;
