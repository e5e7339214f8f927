//! The read-only reference index the mapper resolves against.
//!
//! Built once from five row sets (clients, materials, payment terms, payment
//! methods, plants). Every descriptive column is normalized at build time
//! with the same functions the mapper applies to incoming values, so lookups
//! are plain string comparisons at turn time. The index is immutable and
//! `Send + Sync`; share it behind an `Arc`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::normalize::{normalize_compact, normalize_tax_id};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRow {
    pub code: String,
    pub name: String,
    pub tax_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRow {
    pub code: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTermRow {
    pub code: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodRow {
    pub code: String,
    pub description: String,
    /// Synonyms users type for this method, pipe-delimited in the source
    /// sheet and split before they reach this struct.
    pub keywords: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantRow {
    pub name: String,
    pub code: String,
}

struct IndexedClient {
    row: ClientRow,
    name_norm: String,
    tax_id_norm: String,
}

struct IndexedMaterial {
    row: MaterialRow,
    code_norm: String,
    description_norm: String,
}

struct IndexedMethod {
    row: PaymentMethodRow,
    description_norm: String,
}

/// All lookup structures the mapper needs, precomputed.
pub struct ReferenceIndex {
    clients: Vec<IndexedClient>,
    tax_id_lookup: BTreeMap<String, Vec<usize>>,

    materials: Vec<IndexedMaterial>,
    material_codes: BTreeSet<String>,

    term_codes: BTreeSet<String>,
    term_map: BTreeMap<String, String>,
    term_vocabulary: Vec<String>,

    methods: Vec<IndexedMethod>,
    method_codes: BTreeSet<String>,
    method_map: BTreeMap<String, String>,
    method_keyword_map: BTreeMap<String, Vec<String>>,
    method_vocabulary: Vec<String>,

    plant_codes: BTreeSet<String>,
    plants: Vec<PlantRow>,
}

impl ReferenceIndex {
    pub fn new(
        clients: Vec<ClientRow>,
        materials: Vec<MaterialRow>,
        terms: Vec<PaymentTermRow>,
        methods: Vec<PaymentMethodRow>,
        plants: Vec<PlantRow>,
    ) -> Self {
        let clients: Vec<IndexedClient> = clients
            .into_iter()
            .map(|row| IndexedClient {
                name_norm: normalize_compact(&row.name),
                tax_id_norm: normalize_tax_id(&row.tax_id),
                row,
            })
            .collect();

        let mut tax_id_lookup: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (position, client) in clients.iter().enumerate() {
            if !client.tax_id_norm.is_empty() {
                tax_id_lookup
                    .entry(client.tax_id_norm.clone())
                    .or_default()
                    .push(position);
            }
        }

        let materials: Vec<IndexedMaterial> = materials
            .into_iter()
            .map(|row| IndexedMaterial {
                code_norm: normalize_compact(&row.code),
                description_norm: normalize_compact(&row.description),
                row,
            })
            .collect();
        let material_codes = materials
            .iter()
            .map(|material| material.code_norm.clone())
            .collect();

        let mut term_codes = BTreeSet::new();
        let mut term_map: BTreeMap<String, String> = BTreeMap::new();
        for row in &terms {
            term_codes.insert(normalize_compact(&row.code));
            for key in [normalize_compact(&row.code), normalize_compact(&row.description)] {
                if key.is_empty() {
                    continue;
                }
                // On collision keep the shortest original code.
                match term_map.get(&key) {
                    Some(existing) if existing.len() <= row.code.len() => {}
                    _ => {
                        term_map.insert(key, row.code.clone());
                    }
                }
            }
        }
        let term_vocabulary = vocabulary_by_length(term_map.keys());

        let methods: Vec<IndexedMethod> = methods
            .into_iter()
            .map(|row| IndexedMethod {
                description_norm: normalize_compact(&row.description),
                row,
            })
            .collect();
        let method_codes: BTreeSet<String> =
            methods.iter().map(|method| method.row.code.clone()).collect();
        let mut method_map: BTreeMap<String, String> = BTreeMap::new();
        let mut method_keyword_map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for method in &methods {
            for key in [normalize_compact(&method.row.code), method.description_norm.clone()] {
                if key.is_empty() {
                    continue;
                }
                if let Some(existing) = method_map.get(&key) {
                    if existing != &method.row.code {
                        warn!(
                            term = %key,
                            first = %existing,
                            second = %method.row.code,
                            "payment-method term maps to multiple codes"
                        );
                    }
                }
                method_map.insert(key, method.row.code.clone());
            }
            for keyword in &method.row.keywords {
                let key = normalize_compact(keyword);
                if key.is_empty() {
                    continue;
                }
                let codes = method_keyword_map.entry(key).or_default();
                if !codes.contains(&method.row.code) {
                    codes.push(method.row.code.clone());
                }
            }
        }
        let method_vocabulary = vocabulary_by_length(
            method_map.keys().chain(method_keyword_map.keys()),
        );

        let plant_codes = plants
            .iter()
            .map(|row| row.code.trim().to_uppercase())
            .filter(|code| !code.is_empty())
            .collect();

        ReferenceIndex {
            clients,
            tax_id_lookup,
            materials,
            material_codes,
            term_codes,
            term_map,
            term_vocabulary,
            methods,
            method_codes,
            method_map,
            method_keyword_map,
            method_vocabulary,
            plant_codes,
            plants,
        }
    }

    /// False when any row set came up empty; the mapper turns this into a
    /// fatal error instead of silently resolving nothing.
    pub fn is_usable(&self) -> bool {
        !self.clients.is_empty()
            && !self.materials.is_empty()
            && !self.term_map.is_empty()
            && !self.methods.is_empty()
            && !self.plant_codes.is_empty()
    }

    // --- clients ---

    pub fn client_by_code(&self, code: &str) -> Option<&ClientRow> {
        let matches: Vec<&IndexedClient> = self
            .clients
            .iter()
            .filter(|client| client.row.code == code)
            .collect();
        if matches.len() > 1 {
            warn!(code, "client code is duplicated in the reference table");
            return None;
        }
        matches.first().map(|client| &client.row)
    }

    /// All rows sharing a punctuation-stripped tax id, in table order.
    pub fn clients_by_tax_id(&self, tax_id_norm: &str) -> Vec<&ClientRow> {
        self.tax_id_lookup
            .get(tax_id_norm)
            .map(|positions| {
                positions
                    .iter()
                    .map(|position| &self.clients[*position].row)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Rows whose normalized name contains the given normalized fragment.
    pub fn clients_containing_name(&self, fragment_norm: &str) -> Vec<&ClientRow> {
        if fragment_norm.is_empty() {
            return Vec::new();
        }
        self.clients
            .iter()
            .filter(|client| client.name_norm.contains(fragment_norm))
            .map(|client| &client.row)
            .collect()
    }

    /// (row, normalized name) pairs for fuzzy scoring.
    pub fn clients_with_normalized_names(
        &self,
    ) -> impl Iterator<Item = (&ClientRow, &str)> {
        self.clients
            .iter()
            .filter(|client| !client.name_norm.is_empty())
            .map(|client| (&client.row, client.name_norm.as_str()))
    }

    // --- materials ---

    pub fn is_material_code(&self, code_norm: &str) -> bool {
        self.material_codes.contains(code_norm)
    }

    pub fn material_by_exact_description(&self, description_norm: &str) -> Option<&MaterialRow> {
        self.materials
            .iter()
            .find(|material| material.description_norm == description_norm)
            .map(|material| &material.row)
    }

    pub fn materials_containing(&self, fragment_norm: &str) -> Vec<&MaterialRow> {
        if fragment_norm.is_empty() {
            return Vec::new();
        }
        self.materials
            .iter()
            .filter(|material| material.description_norm.contains(fragment_norm))
            .map(|material| &material.row)
            .collect()
    }

    pub fn material_by_code(&self, code_norm: &str) -> Option<&MaterialRow> {
        self.materials
            .iter()
            .find(|material| material.code_norm == code_norm)
            .map(|material| &material.row)
    }

    // --- payment terms ---

    pub fn is_term_code(&self, code_norm: &str) -> bool {
        self.term_codes.contains(code_norm)
    }

    pub fn term_code_for(&self, term_norm: &str) -> Option<&str> {
        self.term_map.get(term_norm).map(String::as_str)
    }

    /// Known term spellings, longest first, for the compound split.
    pub fn term_vocabulary(&self) -> &[String] {
        &self.term_vocabulary
    }

    // --- payment methods ---

    pub fn is_method_code(&self, code: &str) -> bool {
        self.method_codes.contains(code)
    }

    pub fn method_code_for(&self, term_norm: &str) -> Option<&str> {
        self.method_map.get(term_norm).map(String::as_str)
    }

    pub fn method_codes_for_keyword(&self, keyword_norm: &str) -> Option<&[String]> {
        self.method_keyword_map
            .get(keyword_norm)
            .map(Vec::as_slice)
    }

    /// Resolve a normalized spelling (direct term or single-code keyword) to
    /// a method code, for use inside the compound split.
    pub fn method_code_for_any_term(&self, term_norm: &str) -> Option<&str> {
        if let Some(code) = self.method_map.get(term_norm) {
            return Some(code);
        }
        match self.method_keyword_map.get(term_norm) {
            Some(codes) if codes.len() == 1 => Some(&codes[0]),
            _ => None,
        }
    }

    pub fn method_by_code(&self, code: &str) -> Option<&PaymentMethodRow> {
        self.methods
            .iter()
            .find(|method| method.row.code == code)
            .map(|method| &method.row)
    }

    pub fn methods_containing(&self, fragment_norm: &str) -> Vec<&PaymentMethodRow> {
        if fragment_norm.is_empty() {
            return Vec::new();
        }
        self.methods
            .iter()
            .filter(|method| method.description_norm.contains(fragment_norm))
            .map(|method| &method.row)
            .collect()
    }

    /// Known method spellings (terms and keywords), longest first.
    pub fn method_vocabulary(&self) -> &[String] {
        &self.method_vocabulary
    }

    // --- plants ---

    pub fn plant_codes(&self) -> &BTreeSet<String> {
        &self.plant_codes
    }

    pub fn plants(&self) -> &[PlantRow] {
        &self.plants
    }
}

fn vocabulary_by_length<'a>(keys: impl Iterator<Item = &'a String>) -> Vec<String> {
    let unique: BTreeSet<&String> = keys.collect();
    let mut vocabulary: Vec<String> = unique.into_iter().cloned().collect();
    vocabulary.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    vocabulary
}
