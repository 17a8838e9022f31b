use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_stock_items_table::Migration),
            Box::new(m20240101_000002_create_stock_units_table::Migration),
            Box::new(m20240101_000003_create_orders_table::Migration),
            Box::new(m20240101_000004_create_order_units_table::Migration),
            Box::new(m20240101_000005_create_order_items_table::Migration),
            Box::new(m20240101_000006_create_promotional_items_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_stock_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_stock_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockItems::Name).string().not_null())
                        .col(ColumnDef::new(StockItems::Provider).string().null())
                        .col(
                            ColumnDef::new(StockItems::CodeType)
                                .string()
                                .not_null()
                                .default("Kit"),
                        )
                        .col(ColumnDef::new(StockItems::ReceivedDate).date().null())
                        .col(ColumnDef::new(StockItems::ExpiryDate).date().null())
                        .col(
                            ColumnDef::new(StockItems::CurrentStock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockItems::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockItems::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockItems::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum StockItems {
        Table,
        Id,
        Name,
        Provider,
        CodeType,
        ReceivedDate,
        ExpiryDate,
        CurrentStock,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_stock_units_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_stock_units_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockUnits::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockUnits::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockUnits::ItemId).uuid().not_null())
                        // No unique constraint: duplicate barcodes are a
                        // permitted data shape (see stock_unit entity docs)
                        .col(ColumnDef::new(StockUnits::Barcode).string().not_null())
                        .col(ColumnDef::new(StockUnits::BatchNumber).string().null())
                        .col(
                            ColumnDef::new(StockUnits::Status)
                                .string()
                                .not_null()
                                .default("In Stock"),
                        )
                        .col(
                            ColumnDef::new(StockUnits::LastUpdate)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockUnits::SignedOutBy).string().null())
                        .col(
                            ColumnDef::new(StockUnits::SignedOutDate)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockUnits::PromotionalNotes)
                                .text()
                                .null(),
                        )
                        .col(ColumnDef::new(StockUnits::ReturnedBy).string().null())
                        .col(ColumnDef::new(StockUnits::ReturnedDate).timestamp().null())
                        .col(ColumnDef::new(StockUnits::ReturnReason).text().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_units_item")
                                .from(StockUnits::Table, StockUnits::ItemId)
                                .to(
                                    super::m20240101_000001_create_stock_items_table::StockItems::Table,
                                    super::m20240101_000001_create_stock_items_table::StockItems::Id,
                                ),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_units_item_status")
                        .table(StockUnits::Table)
                        .col(StockUnits::ItemId)
                        .col(StockUnits::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockUnits::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum StockUnits {
        Table,
        Id,
        ItemId,
        Barcode,
        BatchNumber,
        Status,
        LastUpdate,
        SignedOutBy,
        SignedOutDate,
        PromotionalNotes,
        ReturnedBy,
        ReturnedDate,
        ReturnReason,
    }
}

mod m20240101_000003_create_orders_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_orders_table"
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
                        .col(ColumnDef::new(Orders::Provider).string().null())
                        .col(ColumnDef::new(Orders::Name).string().null())
                        .col(ColumnDef::new(Orders::Surname).string().null())
                        .col(ColumnDef::new(Orders::PractitionerName).string().null())
                        .col(
                            ColumnDef::new(Orders::Status)
                                .string()
                                .not_null()
                                .default("Pending"),
                        )
                        .col(ColumnDef::new(Orders::OptInStatus).string().null())
                        .col(ColumnDef::new(Orders::Notes).text().null())
                        .col(
                            ColumnDef::new(Orders::SentOut)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Orders::ReceivedBack)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Orders::KitRegistered)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Orders::ResultsSent)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Orders::Paid)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Orders::Invoiced)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Orders::OrderedAt).timestamp().not_null())
                        .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Orders::CompletedAt).timestamp().null())
                        .col(ColumnDef::new(Orders::WoocommerceId).big_integer().null())
                        .col(
                            ColumnDef::new(Orders::FilloutSubmissionId)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(Orders::RawApiData).text().null())
                        .col(ColumnDef::new(Orders::CustomerEmail).string().null())
                        .col(ColumnDef::new(Orders::CustomerPhone).string().null())
                        .col(
                            ColumnDef::new(Orders::PaymentReceived)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Orders::AwaitingPayment)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Orders::PaymentNotes).text().null())
                        .col(ColumnDef::new(Orders::PaymentDate).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_orders_provider")
                        .table(Orders::Table)
                        .col(Orders::Provider)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Orders {
        Table,
        Id,
        Provider,
        Name,
        Surname,
        PractitionerName,
        Status,
        OptInStatus,
        Notes,
        SentOut,
        ReceivedBack,
        KitRegistered,
        ResultsSent,
        Paid,
        Invoiced,
        OrderedAt,
        CreatedAt,
        CompletedAt,
        WoocommerceId,
        FilloutSubmissionId,
        RawApiData,
        CustomerEmail,
        CustomerPhone,
        PaymentReceived,
        AwaitingPayment,
        PaymentNotes,
        PaymentDate,
    }
}

mod m20240101_000004_create_order_units_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_order_units_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderUnits::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderUnits::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderUnits::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderUnits::UnitId).uuid().not_null())
                        .col(
                            ColumnDef::new(OrderUnits::AssignedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_units_order")
                                .from(OrderUnits::Table, OrderUnits::OrderId)
                                .to(
                                    super::m20240101_000003_create_orders_table::Orders::Table,
                                    super::m20240101_000003_create_orders_table::Orders::Id,
                                ),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_units_unit")
                                .from(OrderUnits::Table, OrderUnits::UnitId)
                                .to(
                                    super::m20240101_000002_create_stock_units_table::StockUnits::Table,
                                    super::m20240101_000002_create_stock_units_table::StockUnits::Id,
                                ),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_order_units_order")
                        .table(OrderUnits::Table)
                        .col(OrderUnits::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_order_units_unit")
                        .table(OrderUnits::Table)
                        .col(OrderUnits::UnitId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderUnits::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum OrderUnits {
        Table,
        Id,
        OrderId,
        UnitId,
        AssignedAt,
    }
}

mod m20240101_000005_create_order_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_order_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
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
                        .col(ColumnDef::new(OrderItems::Sku).string().not_null())
                        .col(
                            ColumnDef::new(OrderItems::Qty)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(
                                    super::m20240101_000003_create_orders_table::Orders::Table,
                                    super::m20240101_000003_create_orders_table::Orders::Id,
                                ),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum OrderItems {
        Table,
        Id,
        OrderId,
        Sku,
        Qty,
    }
}

mod m20240101_000006_create_promotional_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_promotional_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PromotionalItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PromotionalItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PromotionalItems::Name).string().not_null())
                        .col(
                            ColumnDef::new(PromotionalItems::Category)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PromotionalItems::Description).text().null())
                        .col(
                            ColumnDef::new(PromotionalItems::Quantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(PromotionalItems::AvailableQuantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(ColumnDef::new(PromotionalItems::Location).string().null())
                        .col(ColumnDef::new(PromotionalItems::Condition).string().null())
                        .col(
                            ColumnDef::new(PromotionalItems::SignedOut)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(PromotionalItems::SignedOutBy)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PromotionalItems::SignedOutDate)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PromotionalItems::ExpectedReturnDate)
                                .date()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PromotionalItems::SignOutNotes)
                                .text()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PromotionalItems::LastReturnedDate)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PromotionalItems::LastReturnedBy)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(PromotionalItems::ReturnNotes).text().null())
                        .col(
                            ColumnDef::new(PromotionalItems::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PromotionalItems::UpdatedAt)
                                .timestamp()
                                .null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PromotionalItems::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum PromotionalItems {
        Table,
        Id,
        Name,
        Category,
        Description,
        Quantity,
        AvailableQuantity,
        Location,
        Condition,
        SignedOut,
        SignedOutBy,
        SignedOutDate,
        ExpectedReturnDate,
        SignOutNotes,
        LastReturnedDate,
        LastReturnedBy,
        ReturnNotes,
        CreatedAt,
        UpdatedAt,
    }
}
