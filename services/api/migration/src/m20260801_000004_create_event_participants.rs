use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EventParticipants::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EventParticipants::EventId).uuid().not_null())
                    .col(ColumnDef::new(EventParticipants::Email).string().not_null())
                    .col(
                        ColumnDef::new(EventParticipants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    // Composite primary key is also the unique-invite guard.
                    .primary_key(
                        Index::create()
                            .col(EventParticipants::EventId)
                            .col(EventParticipants::Email),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(EventParticipants::Table, EventParticipants::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index for invited-events lookups by the caller's email.
        manager
            .create_index(
                Index::create()
                    .table(EventParticipants::Table)
                    .col(EventParticipants::Email)
                    .name("idx_event_participants_email")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventParticipants::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum EventParticipants {
    Table,
    EventId,
    Email,
    CreatedAt,
}

#[derive(Iden)]
enum Events {
    Table,
    Id,
}
