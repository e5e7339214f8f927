//! Deterministic order summary shown for final confirmation. Field order and
//! wording are stable; conversation tests compare against this text verbatim.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::{DraftOrder, Field};

/// Renders the confirmation summary for a completed draft. `cadence_text` is
/// the canonical delivery-schedule block, or `None` when the schedule could
/// not be parsed.
pub fn render(draft: &DraftOrder, cadence_text: Option<&str>, request_date: NaiveDate) -> String {
    let field = |field: Field| display(draft.get(field));
    let client_name =
        draft.get(Field::ClientName).map(str::to_string).unwrap_or_else(|| "<not found>".into());
    let campaign = draft
        .get(Field::Campaign)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("SEM REF");
    let cadence = cadence_text.unwrap_or("N/A (unrecognized format)");

    format!(
        "Request date: {date}\n\
         Seller: {seller}\n\
         Tax ID: {tax_id}\n\
         City: {city}\n\
         Seller email: {email}\n\
         Plant: {plant}\n\
         Client name: {client_name}\n\
         Client code: {client_code}\n\
         Campaign: {campaign}\n\
         Negotiation date: {negotiation}\n\
         Payment term: {term}\n\
         Payment method: {method}\n\
         Incoterm: {incoterm}\n\
         Freight price: {freight}\n\
         Unit price: {price}\n\
         Material code: {material}\n\
         -- Delivery schedule --\n\
         {cadence}",
        date = request_date.format("%d/%m/%Y"),
        seller = field(Field::Seller),
        tax_id = field(Field::TaxId),
        city = field(Field::City),
        email = field(Field::SellerEmail),
        plant = field(Field::Plant),
        client_code = field(Field::ClientCode),
        negotiation = field(Field::NegotiationDate),
        term = field(Field::PaymentTerm),
        method = field(Field::PaymentMethod),
        incoterm = field(Field::Incoterm),
        freight = freight_display(draft.get(Field::FreightPrice), draft.get(Field::Incoterm)),
        price = display_money(draft.get(Field::UnitPrice)),
        material = field(Field::MaterialCode),
    )
}

fn display(value: Option<&str>) -> String {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value.to_string(),
        None => "N/A".to_string(),
    }
}

fn display_money(value: Option<&str>) -> String {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return "N/A".to_string();
    };
    match parse_amount(value) {
        Some(amount) => format!("{:.2}", amount).replace('.', ","),
        None => value.to_string(),
    }
}

/// Freight is annotated by incoterm: informative under FOB/TPD, mandatory
/// under CIF, and rendered as an N/A variant when absent or zero.
fn freight_display(freight: Option<&str>, incoterm: Option<&str>) -> String {
    let incoterm = incoterm.map(str::trim).filter(|value| !value.is_empty());
    let freight = freight.map(str::trim).filter(|value| !value.is_empty());

    let amount = freight.and_then(parse_amount);
    let is_present = match (freight, amount) {
        (None, _) => false,
        (Some(_), Some(amount)) => !amount.is_zero(),
        // Unparseable but non-empty text is shown as-is.
        (Some(_), None) => true,
    };

    if is_present {
        let shown = match amount {
            Some(amount) => format!("{:.2}", amount).replace('.', ","),
            None => freight.unwrap_or_default().to_string(),
        };
        return match incoterm.map(str::to_uppercase).as_deref() {
            Some("CIF") => format!("{shown} (CIF)"),
            Some("FOB") => format!("{shown} (FOB - informative value)"),
            Some("TPD") => format!("{shown} (TPD - informative value)"),
            Some(_) => format!("{shown} (Incoterm: {})", incoterm.unwrap_or_default()),
            None => format!("{shown} (incoterm not specified)"),
        };
    }

    match incoterm.map(str::to_uppercase).as_deref() {
        Some("CIF") => "N/A (CIF - value not provided)".to_string(),
        Some("FOB") => "N/A (FOB)".to_string(),
        Some("TPD") => "N/A (TPD)".to_string(),
        Some(_) => format!("N/A (Incoterm: {})", incoterm.unwrap_or_default()),
        None => "N/A".to_string(),
    }
}

fn parse_amount(value: &str) -> Option<Decimal> {
    value.replace(',', ".").parse::<Decimal>().ok()
}
