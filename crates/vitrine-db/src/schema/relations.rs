//! # Relations
//!
//! Declared relations, as associated constants of the column enums, for
//! relation filters:
//!
//! ```rust,ignore
//! // Boutiques with at least one product running low
//! let low = BoutiqueColumn::STOCKS.some(StockColumn::Quantity.lt(5));
//! db.boutiques().find_many(FindMany::new().filter(low)).await?;
//!
//! // Sales paid entirely by mobile money
//! let mm = SaleColumn::PAYMENTS.every(PaymentColumn::Method.equals("mobile_money"));
//!
//! // Stock rows of active products only
//! let active = StockColumn::PRODUCT.is(ProductColumn::IsActive.equals(true));
//! ```

use super::{
    BoutiqueColumn, PaymentColumn, ProductColumn, SaleColumn, SaleItemColumn, StockColumn,
    StockEntryColumn, StockEntryItemColumn, SupplierColumn, UserColumn,
};
use crate::query::{BelongsTo, HasMany};

impl UserColumn {
    /// Sales rung up by the user.
    pub const SALES: HasMany<UserColumn, SaleColumn> = HasMany::new(SaleColumn::CashierUserId);
    /// Stock entries the user recorded.
    pub const STOCK_ENTRIES: HasMany<UserColumn, StockEntryColumn> =
        HasMany::new(StockEntryColumn::CreatedByUserId);
}

impl BoutiqueColumn {
    pub const STOCKS: HasMany<BoutiqueColumn, StockColumn> = HasMany::new(StockColumn::BoutiqueId);
    pub const SALES: HasMany<BoutiqueColumn, SaleColumn> = HasMany::new(SaleColumn::BoutiqueId);
}

impl ProductColumn {
    pub const STOCKS: HasMany<ProductColumn, StockColumn> = HasMany::new(StockColumn::ProductId);
    pub const SALE_ITEMS: HasMany<ProductColumn, SaleItemColumn> =
        HasMany::new(SaleItemColumn::ProductId);
    pub const STOCK_ENTRY_ITEMS: HasMany<ProductColumn, StockEntryItemColumn> =
        HasMany::new(StockEntryItemColumn::ProductId);
}

impl StockColumn {
    pub const BOUTIQUE: BelongsTo<StockColumn, BoutiqueColumn> =
        BelongsTo::new(StockColumn::BoutiqueId);
    pub const PRODUCT: BelongsTo<StockColumn, ProductColumn> =
        BelongsTo::new(StockColumn::ProductId);
}

impl SupplierColumn {
    pub const STOCK_ENTRIES: HasMany<SupplierColumn, StockEntryColumn> =
        HasMany::new(StockEntryColumn::SupplierId);
}

impl StockEntryColumn {
    pub const ITEMS: HasMany<StockEntryColumn, StockEntryItemColumn> =
        HasMany::new(StockEntryItemColumn::StockEntryId);
    pub const SUPPLIER: BelongsTo<StockEntryColumn, SupplierColumn> =
        BelongsTo::new(StockEntryColumn::SupplierId);
    pub const CREATED_BY: BelongsTo<StockEntryColumn, UserColumn> =
        BelongsTo::new(StockEntryColumn::CreatedByUserId);
}

impl StockEntryItemColumn {
    pub const STOCK_ENTRY: BelongsTo<StockEntryItemColumn, StockEntryColumn> =
        BelongsTo::new(StockEntryItemColumn::StockEntryId);
    pub const PRODUCT: BelongsTo<StockEntryItemColumn, ProductColumn> =
        BelongsTo::new(StockEntryItemColumn::ProductId);
}

impl SaleColumn {
    pub const ITEMS: HasMany<SaleColumn, SaleItemColumn> = HasMany::new(SaleItemColumn::SaleId);
    pub const PAYMENTS: HasMany<SaleColumn, PaymentColumn> = HasMany::new(PaymentColumn::SaleId);
    pub const BOUTIQUE: BelongsTo<SaleColumn, BoutiqueColumn> =
        BelongsTo::new(SaleColumn::BoutiqueId);
    pub const CASHIER: BelongsTo<SaleColumn, UserColumn> =
        BelongsTo::new(SaleColumn::CashierUserId);
}

impl SaleItemColumn {
    pub const SALE: BelongsTo<SaleItemColumn, SaleColumn> = BelongsTo::new(SaleItemColumn::SaleId);
    pub const PRODUCT: BelongsTo<SaleItemColumn, ProductColumn> =
        BelongsTo::new(SaleItemColumn::ProductId);
}

impl PaymentColumn {
    pub const SALE: BelongsTo<PaymentColumn, SaleColumn> = BelongsTo::new(PaymentColumn::SaleId);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{ColumnExt, Filter};
    use sqlx::{QueryBuilder, Sqlite};

    fn sql<C: crate::query::Column>(filter: &Filter<C>) -> String {
        let mut qb = QueryBuilder::<Sqlite>::new("");
        filter.render(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn test_boutique_stocks_some() {
        let f = BoutiqueColumn::STOCKS.some(StockColumn::Quantity.lt(5));
        assert_eq!(
            sql(&f),
            "EXISTS (SELECT 1 FROM \"Stock\" WHERE \"Stock\".\"boutiqueId\" = \"Boutique\".\"id\" \
             AND (\"Stock\".\"quantity\" < ?))"
        );
    }
}
