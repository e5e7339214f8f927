//! Seed reference data for tests, the CLI `doctor`/`resolve`/`simulate`
//! commands, and local development. Mirrors the shape of the production
//! sheets: clients (code, name, tax id), materials, payment terms, payment
//! methods with their synonym lists, and plant codes.
//!
//! The duplicate tax id on clients 10002/10003 is intentional; duplicates
//! exist in the real table and the resolver must cope with them.

use crate::reference::{
    ClientRow, MaterialRow, PaymentMethodRow, PaymentTermRow, PlantRow, ReferenceIndex,
};

pub const CLIENTS: [(&str, &str, &str); 5] = [
    ("10001", "Agropecuária Boa Vista Ltda", "12.345.678/0001-01"),
    ("10002", "Fazenda Dois Irmãos", "040.074.561-51"),
    ("10003", "Fazenda Dois Irmãos Unidade Norte", "04007456151"),
    ("10004", "Cooperativa Agrícola Sorriso", "98.765.432/0001-55"),
    ("10005", "Grãos do Cerrado S.A.", "11.222.333/0001-44"),
];

pub const MATERIALS: [(&str, &str); 4] = [
    ("30001", "FS Ouro"),
    ("30002", "Farelo de Soja Comum"),
    ("30003", "Farelo de Soja Premium"),
    ("30004", "Óleo Degomado"),
];

pub const PAYMENT_TERMS: [(&str, &str); 4] = [
    ("A000", "À vista"),
    ("A015", "15 dias"),
    ("A030", "30 dias"),
    ("A045", "45 dias"),
];

pub const PAYMENT_METHODS: [(&str, &str, &str); 5] = [
    ("D", "Boleto", "boleto bancario|boletos"),
    ("T", "TED", "ted|transferencia|transferência bancária"),
    ("A", "PIX", "pix"),
    ("E", "Antecipação 50%", "antecipação|antecipacao 50"),
    ("F", "Antecipação 100%", "antecipação|antecipacao 100"),
];

pub const PLANTS: [(&str, &str); 3] = [
    ("Lucas do Rio Verde", "LRV"),
    ("Primavera do Leste", "PDL"),
    ("Sorriso", "SRS"),
];

pub fn client_rows() -> Vec<ClientRow> {
    CLIENTS
        .iter()
        .map(|(code, name, tax_id)| ClientRow {
            code: (*code).to_string(),
            name: (*name).to_string(),
            tax_id: (*tax_id).to_string(),
        })
        .collect()
}

pub fn material_rows() -> Vec<MaterialRow> {
    MATERIALS
        .iter()
        .map(|(code, description)| MaterialRow {
            code: (*code).to_string(),
            description: (*description).to_string(),
        })
        .collect()
}

pub fn payment_term_rows() -> Vec<PaymentTermRow> {
    PAYMENT_TERMS
        .iter()
        .map(|(code, description)| PaymentTermRow {
            code: (*code).to_string(),
            description: (*description).to_string(),
        })
        .collect()
}

pub fn payment_method_rows() -> Vec<PaymentMethodRow> {
    PAYMENT_METHODS
        .iter()
        .map(|(code, description, keywords)| PaymentMethodRow {
            code: (*code).to_string(),
            description: (*description).to_string(),
            keywords: keywords
                .split('|')
                .filter(|keyword| !keyword.trim().is_empty())
                .map(|keyword| keyword.trim().to_string())
                .collect(),
        })
        .collect()
}

pub fn plant_rows() -> Vec<PlantRow> {
    PLANTS
        .iter()
        .map(|(name, code)| PlantRow {
            name: (*name).to_string(),
            code: (*code).to_string(),
        })
        .collect()
}

pub fn reference_index() -> ReferenceIndex {
    ReferenceIndex::new(
        client_rows(),
        material_rows(),
        payment_term_rows(),
        payment_method_rows(),
        plant_rows(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_index_is_usable() {
        assert!(reference_index().is_usable());
    }

    #[test]
    fn keyword_lists_are_split_on_pipes() {
        let rows = payment_method_rows();
        let ted = rows.iter().find(|row| row.code == "T").unwrap();
        assert_eq!(ted.keywords.len(), 3);
    }
}
