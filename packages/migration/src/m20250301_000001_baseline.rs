use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKeyAction, Index, Table};

use crate::idents::{Admins, Employees, Messages, SalonTranslations, Salons, Schedules, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

fn id_col<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .integer()
        .not_null()
        .primary_key()
        .auto_increment()
        .to_owned()
}

fn created_at<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // salons
        manager
            .create_table(
                Table::create()
                    .table(Salons::Table)
                    .if_not_exists()
                    .col(id_col(Salons::Id))
                    .col(ColumnDef::new(Salons::Name).string().not_null())
                    .col(ColumnDef::new(Salons::Slug).string().not_null().unique_key())
                    .col(ColumnDef::new(Salons::Address).string().null())
                    .col(ColumnDef::new(Salons::Phone).string().null())
                    .col(ColumnDef::new(Salons::Email).string().null())
                    .col(
                        ColumnDef::new(Salons::Timezone)
                            .string()
                            .not_null()
                            .default("UTC"),
                    )
                    .col(
                        ColumnDef::new(Salons::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(created_at(Salons::CreatedAt))
                    .col(created_at(Salons::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // admins; salon_id NULL means a global super admin
        manager
            .create_table(
                Table::create()
                    .table(Admins::Table)
                    .if_not_exists()
                    .col(id_col(Admins::Id))
                    .col(ColumnDef::new(Admins::SalonId).integer().null())
                    .col(
                        ColumnDef::new(Admins::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Admins::Email).string().null())
                    .col(ColumnDef::new(Admins::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Admins::IsSuperAdmin)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(created_at(Admins::CreatedAt))
                    .col(created_at(Admins::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_admins_salon_id")
                            .from(Admins::Table, Admins::SalonId)
                            .to(Salons::Table, Salons::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // employees
        manager
            .create_table(
                Table::create()
                    .table(Employees::Table)
                    .if_not_exists()
                    .col(id_col(Employees::Id))
                    .col(ColumnDef::new(Employees::SalonId).integer().not_null())
                    .col(ColumnDef::new(Employees::Name).string().not_null())
                    .col(
                        ColumnDef::new(Employees::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Employees::Email).string().null())
                    .col(ColumnDef::new(Employees::Phone).string().null())
                    .col(ColumnDef::new(Employees::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Employees::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(created_at(Employees::CreatedAt))
                    .col(created_at(Employees::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employees_salon_id")
                            .from(Employees::Table, Employees::SalonId)
                            .to(Salons::Table, Salons::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // users (salon customers)
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(id_col(Users::Id))
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Phone).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::Email).string().null())
                    .col(ColumnDef::new(Users::PasswordHash).string().null())
                    .col(created_at(Users::CreatedAt))
                    .col(created_at(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // schedules (appointments)
        manager
            .create_table(
                Table::create()
                    .table(Schedules::Table)
                    .if_not_exists()
                    .col(id_col(Schedules::Id))
                    .col(ColumnDef::new(Schedules::SalonId).integer().not_null())
                    .col(ColumnDef::new(Schedules::EmployeeId).integer().not_null())
                    .col(ColumnDef::new(Schedules::UserId).integer().null())
                    .col(ColumnDef::new(Schedules::ServiceName).string().not_null())
                    .col(
                        ColumnDef::new(Schedules::StartsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Schedules::EndsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Schedules::Status)
                            .string()
                            .not_null()
                            .default("booked"),
                    )
                    .col(ColumnDef::new(Schedules::Notes).text().null())
                    .col(created_at(Schedules::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schedules_salon_id")
                            .from(Schedules::Table, Schedules::SalonId)
                            .to(Salons::Table, Salons::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schedules_employee_id")
                            .from(Schedules::Table, Schedules::EmployeeId)
                            .to(Employees::Table, Employees::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schedules_user_id")
                            .from(Schedules::Table, Schedules::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_schedules_salon_starts_at")
                    .table(Schedules::Table)
                    .col(Schedules::SalonId)
                    .col(Schedules::StartsAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // messages
        manager
            .create_table(
                Table::create()
                    .table(Messages::Table)
                    .if_not_exists()
                    .col(id_col(Messages::Id))
                    .col(ColumnDef::new(Messages::SalonId).integer().not_null())
                    .col(ColumnDef::new(Messages::UserId).integer().not_null())
                    .col(ColumnDef::new(Messages::EmployeeId).integer().null())
                    .col(ColumnDef::new(Messages::Direction).string().not_null())
                    .col(ColumnDef::new(Messages::Body).text().not_null())
                    .col(created_at(Messages::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_messages_salon_id")
                            .from(Messages::Table, Messages::SalonId)
                            .to(Salons::Table, Salons::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_messages_user_id")
                            .from(Messages::Table, Messages::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // salon_translations
        manager
            .create_table(
                Table::create()
                    .table(SalonTranslations::Table)
                    .if_not_exists()
                    .col(id_col(SalonTranslations::Id))
                    .col(
                        ColumnDef::new(SalonTranslations::SalonId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SalonTranslations::Locale).string().not_null())
                    .col(ColumnDef::new(SalonTranslations::Name).string().not_null())
                    .col(
                        ColumnDef::new(SalonTranslations::Description)
                            .text()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_salon_translations_salon_id")
                            .from(SalonTranslations::Table, SalonTranslations::SalonId)
                            .to(Salons::Table, Salons::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_salon_translations_salon_locale")
                    .table(SalonTranslations::Table)
                    .col(SalonTranslations::SalonId)
                    .col(SalonTranslations::Locale)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Children first
        for table in [
            SalonTranslations::Table.into_iden(),
            Messages::Table.into_iden(),
            Schedules::Table.into_iden(),
            Users::Table.into_iden(),
            Employees::Table.into_iden(),
            Admins::Table.into_iden(),
            Salons::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}
