use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_accounts_tables::Migration),
            Box::new(m20240301_000002_create_catalog_tables::Migration),
            Box::new(m20240301_000003_create_orders_tables::Migration),
            Box::new(m20240301_000004_create_delivery_tables::Migration),
            Box::new(m20240301_000005_create_scoped_settings_tables::Migration),
            Box::new(m20240301_000006_create_list_preferences_table::Migration),
        ]
    }
}

mod m20240301_000001_create_accounts_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_accounts_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::BusinessName).string().not_null())
                        .col(ColumnDef::new(Users::DisplayName).string().null())
                        .col(ColumnDef::new(Users::PhoneNumber).string().not_null())
                        .col(ColumnDef::new(Users::Role).string_len(20).not_null())
                        .col(ColumnDef::new(Users::Region).string().null())
                        .col(
                            ColumnDef::new(Users::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_users_role")
                        .table(Users::Table)
                        .col(Users::Role)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(AdminUsers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AdminUsers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AdminUsers::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(AdminUsers::Name).string().not_null())
                        .col(ColumnDef::new(AdminUsers::PasswordHash).string().not_null())
                        .col(ColumnDef::new(AdminUsers::Role).string_len(20).not_null())
                        .col(
                            ColumnDef::new(AdminUsers::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(AdminUsers::LastLoginAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(AdminUsers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AdminUsers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        BusinessName,
        DisplayName,
        PhoneNumber,
        Role,
        Region,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum AdminUsers {
        Table,
        Id,
        Email,
        Name,
        PasswordHash,
        Role,
        IsActive,
        LastLoginAt,
        CreatedAt,
    }
}

mod m20240301_000002_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Description).text().null())
                        .col(
                            ColumnDef::new(Products::Price)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::Category).string().null())
                        .col(ColumnDef::new(Products::Subcategory).string().null())
                        .col(
                            ColumnDef::new(Products::StockAvailable)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::Unit).string().not_null())
                        .col(ColumnDef::new(Products::SellerId).uuid().not_null())
                        .col(ColumnDef::new(Products::Status).string_len(20).not_null())
                        .col(ColumnDef::new(Products::VariantGroupId).uuid().null())
                        .col(ColumnDef::new(Products::ImageUrls).json().not_null())
                        .col(ColumnDef::new(Products::MasterProductId).uuid().null())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_seller_id")
                        .table(Products::Table)
                        .col(Products::SellerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_variant_group_id")
                        .table(Products::Table)
                        .col(Products::VariantGroupId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductVariants::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductVariants::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductVariants::ProductId).uuid().not_null())
                        .col(ColumnDef::new(ProductVariants::Sku).string().not_null())
                        .col(
                            ColumnDef::new(ProductVariants::VariantType)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::VariantValue)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::Price)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::StockQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::IsDefault)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::DisplayOrder)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::VariantProductId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_variants_product_id")
                                .from(ProductVariants::Table, ProductVariants::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // (product_id, variant_product_id) duplicates are rejected so that
            // relinking the same sibling twice surfaces as a conflict.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_variants_link")
                        .table(ProductVariants::Table)
                        .col(ProductVariants::ProductId)
                        .col(ProductVariants::VariantProductId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(MasterProducts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MasterProducts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MasterProducts::Name).string().not_null())
                        .col(ColumnDef::new(MasterProducts::Description).text().null())
                        .col(ColumnDef::new(MasterProducts::Category).string().null())
                        .col(ColumnDef::new(MasterProducts::Subcategory).string().null())
                        .col(ColumnDef::new(MasterProducts::Unit).string().not_null())
                        .col(
                            ColumnDef::new(MasterProducts::SuggestedPrice)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(MasterProducts::ImageUrls).json().not_null())
                        .col(
                            ColumnDef::new(MasterProducts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MasterProducts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MasterProducts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductVariants::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        Name,
        Description,
        Price,
        Category,
        Subcategory,
        StockAvailable,
        Unit,
        SellerId,
        Status,
        VariantGroupId,
        ImageUrls,
        MasterProductId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ProductVariants {
        Table,
        Id,
        ProductId,
        Sku,
        VariantType,
        VariantValue,
        Price,
        StockQuantity,
        IsDefault,
        DisplayOrder,
        VariantProductId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum MasterProducts {
        Table,
        Id,
        Name,
        Description,
        Category,
        Subcategory,
        Unit,
        SuggestedPrice,
        ImageUrls,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000003_create_orders_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_orders_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::RetailerId).uuid().not_null())
                        .col(ColumnDef::new(Orders::SellerId).uuid().not_null())
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::Status).string_len(20).not_null())
                        .col(ColumnDef::new(Orders::DeliveryAddress).json().null())
                        .col(ColumnDef::new(Orders::Notes).text().null())
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_status")
                        .table(Orders::Table)
                        .col(Orders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_created_at")
                        .table(Orders::Table)
                        .col(Orders::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ProductId).uuid().null())
                        .col(ColumnDef::new(OrderItems::ProductName).string().not_null())
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(OrderItems::Price)
                                .decimal()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order_id")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        RetailerId,
        SellerId,
        TotalAmount,
        Status,
        DeliveryAddress,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        ProductId,
        ProductName,
        Quantity,
        Price,
    }
}

mod m20240301_000004_create_delivery_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_delivery_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DeliveryPartners::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DeliveryPartners::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DeliveryPartners::Name).string().not_null())
                        .col(ColumnDef::new(DeliveryPartners::Phone).string().not_null())
                        .col(
                            ColumnDef::new(DeliveryPartners::VehicleType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryPartners::VehicleNumber)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryPartners::IsOnline)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(DeliveryPartners::IsAvailable)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(DeliveryPartners::Rating)
                                .decimal_len(3, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryPartners::LastSeenAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryPartners::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryPartners::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DeliveryLocationLogs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DeliveryLocationLogs::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryLocationLogs::PartnerId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryLocationLogs::Latitude)
                                .double()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryLocationLogs::Longitude)
                                .double()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryLocationLogs::RecordedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_delivery_location_logs_partner_id")
                                .from(DeliveryLocationLogs::Table, DeliveryLocationLogs::PartnerId)
                                .to(DeliveryPartners::Table, DeliveryPartners::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_delivery_location_logs_partner")
                        .table(DeliveryLocationLogs::Table)
                        .col(DeliveryLocationLogs::PartnerId)
                        .col(DeliveryLocationLogs::RecordedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DeliveryRejections::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DeliveryRejections::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryRejections::PartnerId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DeliveryRejections::OrderId).uuid().not_null())
                        .col(ColumnDef::new(DeliveryRejections::Reason).string().null())
                        .col(
                            ColumnDef::new(DeliveryRejections::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_delivery_rejections_partner_id")
                                .from(DeliveryRejections::Table, DeliveryRejections::PartnerId)
                                .to(DeliveryPartners::Table, DeliveryPartners::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DeliveryRejections::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DeliveryLocationLogs::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DeliveryPartners::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum DeliveryPartners {
        Table,
        Id,
        Name,
        Phone,
        VehicleType,
        VehicleNumber,
        IsOnline,
        IsAvailable,
        Rating,
        LastSeenAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum DeliveryLocationLogs {
        Table,
        Id,
        PartnerId,
        Latitude,
        Longitude,
        RecordedAt,
    }

    #[derive(DeriveIden)]
    enum DeliveryRejections {
        Table,
        Id,
        PartnerId,
        OrderId,
        Reason,
        CreatedAt,
    }
}

mod m20240301_000005_create_scoped_settings_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_scoped_settings_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AdminMessages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AdminMessages::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(AdminMessages::Title).string().not_null())
                        .col(ColumnDef::new(AdminMessages::Body).text().not_null())
                        .col(ColumnDef::new(AdminMessages::Scope).string_len(16).not_null())
                        .col(ColumnDef::new(AdminMessages::ScopeValue).string().null())
                        .col(
                            ColumnDef::new(AdminMessages::Priority)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(AdminMessages::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(AdminMessages::StartsAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(AdminMessages::ExpiresAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(AdminMessages::CreatedBy).uuid().null())
                        .col(
                            ColumnDef::new(AdminMessages::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AdminMessages::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(FeatureFlags::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FeatureFlags::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(FeatureFlags::Key).string().not_null())
                        .col(ColumnDef::new(FeatureFlags::Description).string().null())
                        .col(
                            ColumnDef::new(FeatureFlags::Enabled)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(FeatureFlags::Scope).string_len(16).not_null())
                        .col(ColumnDef::new(FeatureFlags::ScopeValue).string().null())
                        .col(ColumnDef::new(FeatureFlags::UpdatedBy).uuid().null())
                        .col(
                            ColumnDef::new(FeatureFlags::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FeatureFlags::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_feature_flags_key")
                        .table(FeatureFlags::Table)
                        .col(FeatureFlags::Key)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(AppConfigs::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(AppConfigs::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(AppConfigs::Key).string().not_null())
                        .col(ColumnDef::new(AppConfigs::Value).json().not_null())
                        .col(ColumnDef::new(AppConfigs::Description).string().null())
                        .col(ColumnDef::new(AppConfigs::Scope).string_len(16).not_null())
                        .col(ColumnDef::new(AppConfigs::ScopeValue).string().null())
                        .col(ColumnDef::new(AppConfigs::UpdatedBy).uuid().null())
                        .col(
                            ColumnDef::new(AppConfigs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AppConfigs::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_app_configs_key")
                        .table(AppConfigs::Table)
                        .col(AppConfigs::Key)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AppConfigs::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(FeatureFlags::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(AdminMessages::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum AdminMessages {
        Table,
        Id,
        Title,
        Body,
        Scope,
        ScopeValue,
        Priority,
        IsActive,
        StartsAt,
        ExpiresAt,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum FeatureFlags {
        Table,
        Id,
        Key,
        Description,
        Enabled,
        Scope,
        ScopeValue,
        UpdatedBy,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum AppConfigs {
        Table,
        Id,
        Key,
        Value,
        Description,
        Scope,
        ScopeValue,
        UpdatedBy,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000006_create_list_preferences_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000006_create_list_preferences_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ListPreferences::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ListPreferences::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ListPreferences::AdminId).uuid().not_null())
                        .col(ColumnDef::new(ListPreferences::ListKey).string().not_null())
                        .col(
                            ColumnDef::new(ListPreferences::Page)
                                .big_integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(ListPreferences::PerPage)
                                .big_integer()
                                .not_null()
                                .default(20),
                        )
                        .col(ColumnDef::new(ListPreferences::Filters).json().not_null())
                        .col(
                            ColumnDef::new(ListPreferences::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_list_preferences_admin_list")
                        .table(ListPreferences::Table)
                        .col(ListPreferences::AdminId)
                        .col(ListPreferences::ListKey)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ListPreferences::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ListPreferences {
        Table,
        Id,
        AdminId,
        ListKey,
        Page,
        PerPage,
        Filters,
        UpdatedAt,
    }
}
