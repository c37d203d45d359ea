//! `Sale`, `SaleItem` and `Payment` tables.

use chrono::Utc;

use vitrine_core::{
    Money, NewPayment, NewSale, NewSaleItem, Payment, Sale, SaleItem, DEFAULT_CURRENCY,
    SALE_STATUS_COMPLETED,
};

use crate::error::DbResult;
use crate::model::{generate_id, Insertable, Model, UniqueKey};
use crate::query::{columns, Value};
use crate::schema::id_key;

// =============================================================================
// Sale
// =============================================================================

columns! {
    pub enum SaleColumn for "Sale" {
        Id => "id": Text,
        BoutiqueId => "boutiqueId": Text,
        CashierUserId => "cashierUserId": Text,
        Total => "total": Decimal,
        PaymentMethod => "paymentMethod": Text,
        Currency => "currency": Text,
        CreatedAt => "createdAt": Timestamp,
        OfflineId => "offlineId": Text,
        Status => "status": Text,
    }
}

/// Unique lookups of a sale.
///
/// `OfflineId` is the id a register assigned while disconnected; it makes
/// replays of the same sale detectable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleKey {
    Id(String),
    OfflineId(String),
}

impl UniqueKey for SaleKey {
    type Column = SaleColumn;

    fn fields(&self) -> Vec<(SaleColumn, Value)> {
        match self {
            SaleKey::Id(id) => vec![(SaleColumn::Id, id.into())],
            SaleKey::OfflineId(offline_id) => vec![(SaleColumn::OfflineId, offline_id.into())],
        }
    }
}

impl Model for Sale {
    type Column = SaleColumn;
    type Key = SaleKey;
    type Create = NewSale;

    const ENTITY: &'static str = "Sale";
    const UPDATED_AT: Option<SaleColumn> = None;
}

impl Insertable for NewSale {
    type Column = SaleColumn;

    fn into_row(self) -> DbResult<Vec<(SaleColumn, Value)>> {
        self.validate()?;

        Ok(vec![
            (SaleColumn::Id, generate_id(self.id).into()),
            (SaleColumn::BoutiqueId, self.boutique_id.into()),
            (SaleColumn::CashierUserId, self.cashier_user_id.into()),
            (SaleColumn::Total, self.total.into()),
            (SaleColumn::PaymentMethod, self.payment_method.into()),
            (
                SaleColumn::Currency,
                self.currency
                    .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
                    .into(),
            ),
            (SaleColumn::CreatedAt, self.created_at.unwrap_or_else(Utc::now).into()),
            (SaleColumn::OfflineId, self.offline_id.into()),
            (
                SaleColumn::Status,
                self.status
                    .unwrap_or_else(|| SALE_STATUS_COMPLETED.to_string())
                    .into(),
            ),
        ])
    }
}

// =============================================================================
// SaleItem
// =============================================================================

columns! {
    pub enum SaleItemColumn for "SaleItem" {
        Id => "id": Text,
        SaleId => "saleId": Text,
        ProductId => "productId": Text,
        Quantity => "quantity": Integer,
        UnitPrice => "unitPrice": Decimal,
        Discount => "discount": Decimal,
    }
}

id_key!(SaleItemKey => SaleItemColumn);

impl Model for SaleItem {
    type Column = SaleItemColumn;
    type Key = SaleItemKey;
    type Create = NewSaleItem;

    const ENTITY: &'static str = "SaleItem";
    const UPDATED_AT: Option<SaleItemColumn> = None;
}

impl Insertable for NewSaleItem {
    type Column = SaleItemColumn;

    fn into_row(self) -> DbResult<Vec<(SaleItemColumn, Value)>> {
        self.validate()?;

        Ok(vec![
            (SaleItemColumn::Id, generate_id(self.id).into()),
            (SaleItemColumn::SaleId, self.sale_id.into()),
            (SaleItemColumn::ProductId, self.product_id.into()),
            (SaleItemColumn::Quantity, self.quantity.into()),
            (SaleItemColumn::UnitPrice, self.unit_price.into()),
            (SaleItemColumn::Discount, self.discount.unwrap_or_else(Money::zero).into()),
        ])
    }
}

// =============================================================================
// Payment
// =============================================================================

columns! {
    pub enum PaymentColumn for "Payment" {
        Id => "id": Text,
        SaleId => "saleId": Text,
        Method => "method": Text,
        Amount => "amount": Decimal,
        Reference => "reference": Text,
    }
}

id_key!(PaymentKey => PaymentColumn);

impl Model for Payment {
    type Column = PaymentColumn;
    type Key = PaymentKey;
    type Create = NewPayment;

    const ENTITY: &'static str = "Payment";
    const UPDATED_AT: Option<PaymentColumn> = None;
}

impl Insertable for NewPayment {
    type Column = PaymentColumn;

    fn into_row(self) -> DbResult<Vec<(PaymentColumn, Value)>> {
        self.validate()?;

        Ok(vec![
            (PaymentColumn::Id, generate_id(self.id).into()),
            (PaymentColumn::SaleId, self.sale_id.into()),
            (PaymentColumn::Method, self.method.into()),
            (PaymentColumn::Amount, self.amount.into()),
            (PaymentColumn::Reference, self.reference.into()),
        ])
    }
}
