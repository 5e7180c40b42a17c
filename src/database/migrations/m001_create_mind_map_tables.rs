use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create mind_map_nodes table
        manager
            .create_table(
                Table::create()
                    .table(MindMapNodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MindMapNodes::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MindMapNodes::LessonId).string().not_null())
                    .col(ColumnDef::new(MindMapNodes::ParentId).string().null())
                    .col(ColumnDef::new(MindMapNodes::Level).integer().not_null().default(0))
                    .col(ColumnDef::new(MindMapNodes::SortOrder).integer().not_null().default(0))
                    .col(ColumnDef::new(MindMapNodes::TitleAr).string().not_null())
                    .col(ColumnDef::new(MindMapNodes::TitleEn).string().not_null())
                    .col(ColumnDef::new(MindMapNodes::DescriptionAr).text())
                    .col(ColumnDef::new(MindMapNodes::DescriptionEn).text())
                    .col(ColumnDef::new(MindMapNodes::NodeType).string().not_null())
                    .col(ColumnDef::new(MindMapNodes::Color).string().not_null())
                    .col(ColumnDef::new(MindMapNodes::Shape).string().not_null())
                    .col(
                        ColumnDef::new(MindMapNodes::IsPublished)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(MindMapNodes::PositionX).double())
                    .col(ColumnDef::new(MindMapNodes::PositionY).double())
                    .col(ColumnDef::new(MindMapNodes::DateHijri).string())
                    .col(ColumnDef::new(MindMapNodes::DateGregorian).string())
                    .col(ColumnDef::new(MindMapNodes::Location).string())
                    .col(ColumnDef::new(MindMapNodes::Participants).text())
                    .col(ColumnDef::new(MindMapNodes::Decision).text())
                    .col(ColumnDef::new(MindMapNodes::Alternatives).text())
                    .col(ColumnDef::new(MindMapNodes::Outcomes).text())
                    .col(ColumnDef::new(MindMapNodes::MoralLessons).text())
                    .col(ColumnDef::new(MindMapNodes::ModernApps).text())
                    .col(ColumnDef::new(MindMapNodes::SecurityImpact).text())
                    .col(ColumnDef::new(MindMapNodes::Sources).text())
                    .col(ColumnDef::new(MindMapNodes::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(MindMapNodes::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mind_map_nodes_parent_id")
                            .from(MindMapNodes::Table, MindMapNodes::ParentId)
                            .to(MindMapNodes::Table, MindMapNodes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_mind_map_nodes_lesson_id")
                    .table(MindMapNodes::Table)
                    .col(MindMapNodes::LessonId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_mind_map_nodes_parent_id")
                    .table(MindMapNodes::Table)
                    .col(MindMapNodes::ParentId)
                    .to_owned(),
            )
            .await?;

        // Create mind_map_relationships table
        manager
            .create_table(
                Table::create()
                    .table(MindMapRelationships::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MindMapRelationships::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MindMapRelationships::LessonId).string().not_null())
                    .col(ColumnDef::new(MindMapRelationships::FromNodeId).string().not_null())
                    .col(ColumnDef::new(MindMapRelationships::ToNodeId).string().not_null())
                    .col(
                        ColumnDef::new(MindMapRelationships::RelationshipType)
                            .string()
                            .not_null()
                            .default("RELATED"),
                    )
                    .col(ColumnDef::new(MindMapRelationships::Color).string().not_null())
                    .col(
                        ColumnDef::new(MindMapRelationships::LineWidth)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(
                        ColumnDef::new(MindMapRelationships::LineStyle)
                            .string()
                            .not_null()
                            .default("solid"),
                    )
                    .col(ColumnDef::new(MindMapRelationships::LabelAr).string())
                    .col(ColumnDef::new(MindMapRelationships::LabelEn).string())
                    .col(ColumnDef::new(MindMapRelationships::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mind_map_relationships_from_node_id")
                            .from(MindMapRelationships::Table, MindMapRelationships::FromNodeId)
                            .to(MindMapNodes::Table, MindMapNodes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mind_map_relationships_to_node_id")
                            .from(MindMapRelationships::Table, MindMapRelationships::ToNodeId)
                            .to(MindMapNodes::Table, MindMapNodes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One edge per ordered node pair within a lesson
        manager
            .create_index(
                Index::create()
                    .name("idx_mind_map_relationships_unique_pair")
                    .table(MindMapRelationships::Table)
                    .col(MindMapRelationships::LessonId)
                    .col(MindMapRelationships::FromNodeId)
                    .col(MindMapRelationships::ToNodeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MindMapRelationships::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(MindMapNodes::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum MindMapNodes {
    Table,
    Id,
    LessonId,
    ParentId,
    Level,
    SortOrder,
    TitleAr,
    TitleEn,
    DescriptionAr,
    DescriptionEn,
    NodeType,
    Color,
    Shape,
    IsPublished,
    PositionX,
    PositionY,
    DateHijri,
    DateGregorian,
    Location,
    Participants,
    Decision,
    Alternatives,
    Outcomes,
    MoralLessons,
    ModernApps,
    SecurityImpact,
    Sources,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum MindMapRelationships {
    Table,
    Id,
    LessonId,
    FromNodeId,
    ToNodeId,
    RelationshipType,
    Color,
    LineWidth,
    LineStyle,
    LabelAr,
    LabelEn,
    CreatedAt,
}
