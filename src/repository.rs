//! Collection operations shared by every entity in the [`Document`].
//!
//! These work on the in-memory document only; committing is the caller's
//! job, so a failed operation never leaves anything half-written.

use crate::domain::aggregates::{Customer, DeliveryCompany, Order, Product, Toggle, User};
use crate::domain::EntityKind;
use crate::error::{BackofficeError, Result};
use crate::store::Document;

pub trait Record: Clone {
    const KIND: EntityKind;

    fn id(&self) -> &str;
    fn collection(doc: &Document) -> &Vec<Self>;
    fn collection_mut(doc: &mut Document) -> &mut Vec<Self>;
}

macro_rules! record {
    ($ty:ty, $kind:expr, $field:ident) => {
        impl Record for $ty {
            const KIND: EntityKind = $kind;

            fn id(&self) -> &str { &self.id }
            fn collection(doc: &Document) -> &Vec<Self> { &doc.$field }
            fn collection_mut(doc: &mut Document) -> &mut Vec<Self> { &mut doc.$field }
        }
    };
}

record!(Customer, EntityKind::Customer, customers);
record!(Product, EntityKind::Product, products);
record!(DeliveryCompany, EntityKind::DeliveryCompany, delivery_companies);
record!(Order, EntityKind::Order, orders);
record!(User, EntityKind::User, users);

pub fn find<'a, R: Record>(doc: &'a Document, id: &str) -> Option<&'a R> {
    R::collection(doc).iter().find(|r| r.id() == id)
}

pub fn find_mut<'a, R: Record>(doc: &'a mut Document, id: &str) -> Result<&'a mut R> {
    R::collection_mut(doc)
        .iter_mut()
        .find(|r| r.id() == id)
        .ok_or_else(|| BackofficeError::not_found(R::KIND, id))
}

pub fn append<R: Record>(doc: &mut Document, record: R) {
    R::collection_mut(doc).push(record);
}

/// Applies `change` to the record with `id` and returns the result.
pub fn update<R: Record>(doc: &mut Document, id: &str, change: impl FnOnce(&mut R)) -> Result<R> {
    let record = find_mut::<R>(doc, id)?;
    change(&mut *record);
    Ok(record.clone())
}

pub fn remove<R: Record>(doc: &mut Document, id: &str) -> Result<()> {
    let records = R::collection_mut(doc);
    let before = records.len();
    records.retain(|r| r.id() != id);
    if records.len() == before {
        return Err(BackofficeError::not_found(R::KIND, id));
    }
    Ok(())
}

pub fn toggle<R: Record + Toggle>(doc: &mut Document, id: &str) -> Result<R> {
    update(doc, id, |r: &mut R| {
        r.toggle();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::timestamp;
    use rust_decimal::Decimal;

    fn company(id: &str) -> DeliveryCompany {
        DeliveryCompany {
            id: id.into(), name: format!("Company {id}"), phone: "0590000000".into(), cost: Decimal::new(15, 0),
            zone_costs: Default::default(), is_active: true, created_at: timestamp(),
        }
    }

    fn doc() -> Document {
        let mut doc = Document::default();
        append(&mut doc, company("D1"));
        append(&mut doc, company("D2"));
        doc
    }

    #[test]
    fn test_remove_existing() {
        let mut doc = doc();
        let survivor = doc.delivery_companies[1].clone();
        remove::<DeliveryCompany>(&mut doc, "D1").unwrap();
        assert_eq!(doc.delivery_companies, vec![survivor]);
    }

    #[test]
    fn test_missing_ids_are_not_found() {
        let mut doc = doc();
        let before = doc.clone();
        assert!(matches!(remove::<DeliveryCompany>(&mut doc, "nope"), Err(BackofficeError::NotFound(EntityKind::DeliveryCompany, _))));
        assert!(toggle::<DeliveryCompany>(&mut doc, "nope").is_err());
        assert!(update::<DeliveryCompany>(&mut doc, "nope", |c| c.name.clear()).is_err());
        assert_eq!(doc, before);
    }

    #[test]
    fn test_toggle_flips_one_record() {
        let mut doc = doc();
        let toggled = toggle::<DeliveryCompany>(&mut doc, "D2").unwrap();
        assert!(!toggled.is_active);
        assert!(doc.delivery_companies[0].is_active);
        assert!(!doc.delivery_companies[1].is_active);
    }
}
