pub use sea_orm_migration::prelude::*;

mod m20260210_000001_users;
mod m20260210_000002_categories;
mod m20260215_000001_buckets;
mod m20260220_000001_bills;
mod m20260301_000001_expenses;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260210_000001_users::Migration),
            Box::new(m20260210_000002_categories::Migration),
            Box::new(m20260215_000001_buckets::Migration),
            Box::new(m20260220_000001_bills::Migration),
            Box::new(m20260301_000001_expenses::Migration),
        ]
    }
}
