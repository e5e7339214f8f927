use orderly_core::cadence;

use super::CommandResult;

pub fn run(text: &str, total: Option<&str>, date: Option<&str>) -> CommandResult {
    match cadence::parse(text, total, date) {
        Some(entries) => {
            let rendered = cadence::render(&entries);
            CommandResult::success(
                "cadence",
                format!("{} entr{} parsed:\n{rendered}", entries.len(), plural(entries.len())),
            )
        }
        None => CommandResult::failure(
            "cadence",
            "cadence_format",
            format!("no delivery-schedule entries recognized in '{text}'"),
            3,
        ),
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        "y"
    } else {
        "ies"
    }
}
