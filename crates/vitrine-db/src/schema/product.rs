//! `Product` table.

use chrono::Utc;

use vitrine_core::{NewProduct, Product, TaxRate};

use crate::error::DbResult;
use crate::model::{generate_id, Insertable, Model, UniqueKey};
use crate::query::{columns, Changes, Value};

columns! {
    pub enum ProductColumn for "Product" {
        Id => "id": Text,
        Sku => "sku": Text,
        Name => "name": Text,
        Category => "category": Text,
        Price => "price": Decimal,
        Cost => "cost": Decimal,
        Barcode => "barcode": Text,
        TaxRate => "taxRate": Decimal,
        IsActive => "isActive": Boolean,
        CreatedAt => "createdAt": Timestamp,
        UpdatedAt => "updatedAt": Timestamp,
    }
}

/// Unique lookups of a product. Barcodes are indexed but not unique.
///
/// `Sku` is trimmed like it is on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductKey {
    Id(String),
    Sku(String),
}

impl UniqueKey for ProductKey {
    type Column = ProductColumn;

    fn fields(&self) -> Vec<(ProductColumn, Value)> {
        match self {
            ProductKey::Id(id) => vec![(ProductColumn::Id, id.into())],
            ProductKey::Sku(sku) => vec![(ProductColumn::Sku, sku.trim().into())],
        }
    }
}

impl Model for Product {
    type Column = ProductColumn;
    type Key = ProductKey;
    type Create = NewProduct;

    const ENTITY: &'static str = "Product";
    const UPDATED_AT: Option<ProductColumn> = Some(ProductColumn::UpdatedAt);

    fn prepare_changes(changes: Changes<ProductColumn>) -> Changes<ProductColumn> {
        changes
            .map_text(ProductColumn::Sku, |s| s.trim().to_string())
            .map_text(ProductColumn::Name, |s| s.trim().to_string())
    }
}

impl Insertable for NewProduct {
    type Column = ProductColumn;

    fn into_row(self) -> DbResult<Vec<(ProductColumn, Value)>> {
        self.validate()?;
        let now = Utc::now();

        Ok(vec![
            (ProductColumn::Id, generate_id(self.id).into()),
            (ProductColumn::Sku, self.sku.trim().into()),
            (ProductColumn::Name, self.name.trim().into()),
            (ProductColumn::Category, self.category.into()),
            (ProductColumn::Price, self.price.into()),
            (ProductColumn::Cost, self.cost.into()),
            (ProductColumn::Barcode, self.barcode.into()),
            (ProductColumn::TaxRate, self.tax_rate.unwrap_or_else(TaxRate::zero).into()),
            (ProductColumn::IsActive, self.is_active.unwrap_or(true).into()),
            (ProductColumn::CreatedAt, now.into()),
            (ProductColumn::UpdatedAt, now.into()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use vitrine_core::Money;

    #[test]
    fn test_sku_key_trimmed() {
        assert_eq!(ProductKey::Sku(" BISSAP-1L\n".to_string()).describe(), "sku=BISSAP-1L");
    }

    #[test]
    fn test_decimals_bound_exactly() {
        let row = NewProduct {
            sku: "BISSAP-1L".to_string(),
            name: "Jus de bissap 1L".to_string(),
            price: Money::new(dec!(1500.00)),
            cost: Some(Money::new(dec!(912.345))),
            tax_rate: Some(TaxRate::new(dec!(18))),
            ..Default::default()
        }
        .into_row()
        .unwrap();

        let get = |col: ProductColumn| row.iter().find(|(c, _)| *c == col).map(|(_, v)| v.clone());
        assert_eq!(get(ProductColumn::Price), Some(Value::Decimal(dec!(1500.00))));
        assert_eq!(get(ProductColumn::Cost), Some(Value::Decimal(dec!(912.345))));
        assert_eq!(get(ProductColumn::TaxRate), Some(Value::Decimal(dec!(18))));
        assert_eq!(get(ProductColumn::IsActive), Some(Value::Bool(true)));
    }
}
