use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cadence::CadenceEntry;

/// The fixed set of order fields the engine collects. Everything the mapper
/// resolves, the validator checks, and the extractor returns is keyed by one
/// of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ClientName,
    ClientCode,
    TaxId,
    Plant,
    PaymentTerm,
    PaymentMethod,
    MaterialCode,
    TotalQuantity,
    Cadence,
    Seller,
    SellerEmail,
    City,
    NegotiationDate,
    Incoterm,
    FreightPrice,
    UnitPrice,
    Campaign,
}

impl Field {
    pub const ALL: [Field; 17] = [
        Field::ClientName,
        Field::ClientCode,
        Field::TaxId,
        Field::Plant,
        Field::PaymentTerm,
        Field::PaymentMethod,
        Field::MaterialCode,
        Field::TotalQuantity,
        Field::Cadence,
        Field::Seller,
        Field::SellerEmail,
        Field::City,
        Field::NegotiationDate,
        Field::Incoterm,
        Field::FreightPrice,
        Field::UnitPrice,
        Field::Campaign,
    ];

    /// Human-readable label used in questions and the confirmation summary.
    pub fn label(&self) -> &'static str {
        match self {
            Field::ClientName => "client name",
            Field::ClientCode => "client code",
            Field::TaxId => "tax id (CNPJ/CPF)",
            Field::Plant => "plant",
            Field::PaymentTerm => "payment condition",
            Field::PaymentMethod => "payment method",
            Field::MaterialCode => "material",
            Field::TotalQuantity => "total quantity",
            Field::Cadence => "delivery cadence",
            Field::Seller => "seller",
            Field::SellerEmail => "seller email",
            Field::City => "city",
            Field::NegotiationDate => "negotiation date",
            Field::Incoterm => "incoterm",
            Field::FreightPrice => "freight price",
            Field::UnitPrice => "price",
            Field::Campaign => "campaign",
        }
    }
}

/// A partial field set as returned by the extractor for one utterance.
/// `None` means the extractor saw nothing for that field; an empty string is
/// an explicit request to clear it.
pub type FieldPatch = BTreeMap<Field, Option<String>>;

/// The accumulating, partially-filled order built across conversation turns.
///
/// Every field is an optional raw-or-canonical string; the mapper rewrites
/// values in place as they resolve to reference codes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOrder {
    pub client_name: Option<String>,
    pub client_code: Option<String>,
    pub tax_id: Option<String>,
    pub plant: Option<String>,
    pub payment_term: Option<String>,
    pub payment_method: Option<String>,
    pub material_code: Option<String>,
    pub total_quantity: Option<String>,
    pub cadence: Option<String>,
    pub seller: Option<String>,
    pub seller_email: Option<String>,
    pub city: Option<String>,
    pub negotiation_date: Option<String>,
    pub incoterm: Option<String>,
    pub freight_price: Option<String>,
    pub unit_price: Option<String>,
    pub campaign: Option<String>,
}

impl DraftOrder {
    pub fn get(&self, field: Field) -> Option<&str> {
        let slot = match field {
            Field::ClientName => &self.client_name,
            Field::ClientCode => &self.client_code,
            Field::TaxId => &self.tax_id,
            Field::Plant => &self.plant,
            Field::PaymentTerm => &self.payment_term,
            Field::PaymentMethod => &self.payment_method,
            Field::MaterialCode => &self.material_code,
            Field::TotalQuantity => &self.total_quantity,
            Field::Cadence => &self.cadence,
            Field::Seller => &self.seller,
            Field::SellerEmail => &self.seller_email,
            Field::City => &self.city,
            Field::NegotiationDate => &self.negotiation_date,
            Field::Incoterm => &self.incoterm,
            Field::FreightPrice => &self.freight_price,
            Field::UnitPrice => &self.unit_price,
            Field::Campaign => &self.campaign,
        };
        slot.as_deref()
    }

    pub fn set(&mut self, field: Field, value: Option<String>) {
        let slot = match field {
            Field::ClientName => &mut self.client_name,
            Field::ClientCode => &mut self.client_code,
            Field::TaxId => &mut self.tax_id,
            Field::Plant => &mut self.plant,
            Field::PaymentTerm => &mut self.payment_term,
            Field::PaymentMethod => &mut self.payment_method,
            Field::MaterialCode => &mut self.material_code,
            Field::TotalQuantity => &mut self.total_quantity,
            Field::Cadence => &mut self.cadence,
            Field::Seller => &mut self.seller,
            Field::SellerEmail => &mut self.seller_email,
            Field::City => &mut self.city,
            Field::NegotiationDate => &mut self.negotiation_date,
            Field::Incoterm => &mut self.incoterm,
            Field::FreightPrice => &mut self.freight_price,
            Field::UnitPrice => &mut self.unit_price,
            Field::Campaign => &mut self.campaign,
        };
        *slot = value;
    }

    /// True when the field holds a non-blank value.
    pub fn is_filled(&self, field: Field) -> bool {
        self.get(field).is_some_and(|value| !value.trim().is_empty())
    }

    /// Merge one extractor patch into the draft. A present non-empty value
    /// overwrites; an explicit empty string clears; an absent value is a
    /// no-op so one turn never wipes out what earlier turns collected.
    pub fn apply_patch(&mut self, patch: &FieldPatch) {
        for (field, value) in patch {
            match value {
                Some(text) if text.is_empty() => self.set(*field, None),
                Some(text) => self.set(*field, Some(text.clone())),
                None => {}
            }
        }
    }
}

/// A draft that passed every validation, frozen for confirmation and ticket
/// creation. The cadence is carried in parsed form alongside its canonical
/// serialization inside the summary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalizedOrder {
    pub order: DraftOrder,
    pub cadence: Vec<CadenceEntry>,
    pub summary: String,
}
