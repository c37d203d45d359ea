//! `Boutique` table.

use chrono::Utc;

use vitrine_core::{Boutique, NewBoutique};

use crate::error::DbResult;
use crate::model::{generate_id, Insertable, Model, UniqueKey};
use crate::query::{columns, Changes, Value};

columns! {
    pub enum BoutiqueColumn for "Boutique" {
        Id => "id": Text,
        Name => "name": Text,
        Code => "code": Text,
        Address => "address": Text,
        City => "city": Text,
        Country => "country": Text,
        CreatedAt => "createdAt": Timestamp,
        UpdatedAt => "updatedAt": Timestamp,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoutiqueKey {
    Id(String),
    /// Short store code printed on receipts, e.g. `DKR-01`. Trimmed.
    Code(String),
}

impl UniqueKey for BoutiqueKey {
    type Column = BoutiqueColumn;

    fn fields(&self) -> Vec<(BoutiqueColumn, Value)> {
        match self {
            BoutiqueKey::Id(id) => vec![(BoutiqueColumn::Id, id.into())],
            BoutiqueKey::Code(code) => vec![(BoutiqueColumn::Code, code.trim().into())],
        }
    }
}

impl Model for Boutique {
    type Column = BoutiqueColumn;
    type Key = BoutiqueKey;
    type Create = NewBoutique;

    const ENTITY: &'static str = "Boutique";
    const UPDATED_AT: Option<BoutiqueColumn> = Some(BoutiqueColumn::UpdatedAt);

    fn prepare_changes(changes: Changes<BoutiqueColumn>) -> Changes<BoutiqueColumn> {
        changes
            .map_text(BoutiqueColumn::Code, |s| s.trim().to_string())
            .map_text(BoutiqueColumn::Name, |s| s.trim().to_string())
    }
}

impl Insertable for NewBoutique {
    type Column = BoutiqueColumn;

    fn into_row(self) -> DbResult<Vec<(BoutiqueColumn, Value)>> {
        self.validate()?;
        let now = Utc::now();

        Ok(vec![
            (BoutiqueColumn::Id, generate_id(self.id).into()),
            (BoutiqueColumn::Name, self.name.trim().into()),
            (BoutiqueColumn::Code, self.code.trim().into()),
            (BoutiqueColumn::Address, self.address.into()),
            (BoutiqueColumn::City, self.city.into()),
            (BoutiqueColumn::Country, self.country.into()),
            (BoutiqueColumn::CreatedAt, now.into()),
            (BoutiqueColumn::UpdatedAt, now.into()),
        ])
    }
}
