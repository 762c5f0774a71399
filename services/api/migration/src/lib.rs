pub use sea_orm_migration::prelude::*;

mod m20260801_000001_create_accounts;
mod m20260801_000002_create_one_time_codes;
mod m20260801_000003_create_events;
mod m20260801_000004_create_event_participants;
mod m20260801_000005_create_outbox_events;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260801_000001_create_accounts::Migration),
            Box::new(m20260801_000002_create_one_time_codes::Migration),
            Box::new(m20260801_000003_create_events::Migration),
            Box::new(m20260801_000004_create_event_participants::Migration),
            Box::new(m20260801_000005_create_outbox_events::Migration),
        ]
    }
}
