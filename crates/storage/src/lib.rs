pub mod db;
pub mod store;

pub use db::{
    create_db, get_all_rules, get_all_transactions, insert_transaction, save_rule,
    update_rule, update_transaction, DbPool,
};
pub use store::SqliteStore;
