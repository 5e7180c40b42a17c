use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // SQLite doesn't support multiple ALTER TABLE operations in one statement
        manager
            .alter_table(
                Table::alter()
                    .table(MindMapRelationships::Table)
                    .add_column(
                        ColumnDef::new(MindMapRelationships::SourceHandle)
                            .string()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(MindMapRelationships::Table)
                    .add_column(
                        ColumnDef::new(MindMapRelationships::TargetHandle)
                            .string()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(MindMapRelationships::Table)
                    .drop_column(MindMapRelationships::TargetHandle)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(MindMapRelationships::Table)
                    .drop_column(MindMapRelationships::SourceHandle)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum MindMapRelationships {
    Table,
    SourceHandle,
    TargetHandle,
}
