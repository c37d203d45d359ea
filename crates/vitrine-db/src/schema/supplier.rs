//! `Supplier` table.

use chrono::Utc;

use vitrine_core::validation::normalize_email;
use vitrine_core::{NewSupplier, Supplier};

use crate::error::DbResult;
use crate::model::{generate_id, Insertable, Model};
use crate::query::{columns, Value};
use crate::schema::id_key;

columns! {
    pub enum SupplierColumn for "Supplier" {
        Id => "id": Text,
        Name => "name": Text,
        ContactName => "contactName": Text,
        Phone => "phone": Text,
        Email => "email": Text,
        Address => "address": Text,
        CreatedAt => "createdAt": Timestamp,
        UpdatedAt => "updatedAt": Timestamp,
    }
}

id_key!(SupplierKey => SupplierColumn);

impl Model for Supplier {
    type Column = SupplierColumn;
    type Key = SupplierKey;
    type Create = NewSupplier;

    const ENTITY: &'static str = "Supplier";
    const UPDATED_AT: Option<SupplierColumn> = Some(SupplierColumn::UpdatedAt);
}

impl Insertable for NewSupplier {
    type Column = SupplierColumn;

    fn into_row(self) -> DbResult<Vec<(SupplierColumn, Value)>> {
        self.validate()?;
        let now = Utc::now();

        Ok(vec![
            (SupplierColumn::Id, generate_id(self.id).into()),
            (SupplierColumn::Name, self.name.trim().into()),
            (SupplierColumn::ContactName, self.contact_name.into()),
            (SupplierColumn::Phone, self.phone.into()),
            (
                SupplierColumn::Email,
                self.email.as_deref().map(normalize_email).into(),
            ),
            (SupplierColumn::Address, self.address.into()),
            (SupplierColumn::CreatedAt, now.into()),
            (SupplierColumn::UpdatedAt, now.into()),
        ])
    }
}
