//! Table and column identifiers shared by the migrations.

use sea_orm_migration::prelude::*;

#[derive(Iden, Clone, Copy)]
pub enum Salons {
    Table,
    Id,
    Name,
    Slug,
    Address,
    Phone,
    Email,
    Timezone,
    IsActive,
    WorkingHours,
    BookingSettings,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum Admins {
    Table,
    Id,
    SalonId,
    Username,
    Email,
    PasswordHash,
    IsSuperAdmin,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum Employees {
    Table,
    Id,
    SalonId,
    Name,
    Username,
    Email,
    Phone,
    PasswordHash,
    IsActive,
    WorkingHours,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum Users {
    Table,
    Id,
    Name,
    Phone,
    Email,
    PasswordHash,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum Schedules {
    Table,
    Id,
    SalonId,
    EmployeeId,
    UserId,
    ServiceName,
    StartsAt,
    EndsAt,
    Status,
    Notes,
    CreatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum Messages {
    Table,
    Id,
    SalonId,
    UserId,
    EmployeeId,
    Direction,
    Body,
    Channel,
    ReadAt,
    CreatedAt,
}

#[derive(Iden, Clone, Copy)]
pub enum SalonTranslations {
    Table,
    Id,
    SalonId,
    Locale,
    Name,
    Description,
}
