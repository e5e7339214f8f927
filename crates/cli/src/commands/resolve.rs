use std::sync::Arc;

use orderly_core::{fixtures, DraftOrder, Field, FieldMapper, MatchingConfig};

use super::CommandResult;

/// One-shot resolver probe: put `value` in `field`, run a mapping pass over
/// the seed reference data, and report what came out.
pub fn run(field_name: &str, value: &str) -> CommandResult {
    let Some(field) = parse_field(field_name) else {
        let known = Field::ALL.map(field_key).join(", ");
        return CommandResult::failure(
            "resolve",
            "unknown_field",
            format!("unknown field '{field_name}' (known fields: {known})"),
            3,
        );
    };

    let mapper =
        FieldMapper::new(Arc::new(fixtures::reference_index()), MatchingConfig::default());
    let mut draft = DraftOrder::default();
    draft.set(field, Some(value.to_string()));
    let pass = mapper.map(&draft, value);

    let mut lines = Vec::new();
    for changed in Field::ALL {
        let before = draft.get(changed);
        let after = pass.draft.get(changed);
        if before != after || (changed == field && after.is_some()) {
            lines.push(format!(
                "{}: {:?} -> {:?}",
                field_key(changed),
                before.unwrap_or(""),
                after.unwrap_or("")
            ));
        }
    }
    for warning in &pass.issues.warnings {
        lines.push(format!("warning [{}]: {}", field_key(warning.field), warning.message));
    }
    for prompt in &pass.issues.ambiguities {
        lines.push(format!("ambiguity [{}]:\n{}", field_key(prompt.field), prompt.question));
    }
    for error in &pass.issues.errors {
        lines.push(format!("error: {error}"));
    }

    CommandResult::success("resolve", lines.join("\n"))
}

fn parse_field(name: &str) -> Option<Field> {
    let wanted = name.trim().to_lowercase();
    Field::ALL.into_iter().find(|field| field_key(*field) == wanted)
}

/// The serde snake_case name of a field, as used on the command line.
fn field_key(field: Field) -> String {
    serde_json::to_string(&field).unwrap_or_default().trim_matches('"').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_round_trip() {
        assert_eq!(parse_field("payment_method"), Some(Field::PaymentMethod));
        assert_eq!(parse_field("tax_id"), Some(Field::TaxId));
        assert_eq!(parse_field("no_such_field"), None);
    }
}
