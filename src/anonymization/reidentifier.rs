//! Restoring original text from placeholders
//!
//! Inverts the replacer using an entity ledger. Per-code overrides let a
//! reviewer supply text for a code, including codes that never went
//! through the mapper (placeholders written by an external detector).

use crate::anonymization::config::DateRedactionPolicy;
use crate::anonymization::models::{Entity, EntityType};
use crate::anonymization::replacer::extract_year;
use crate::domain::{AnonError, Result};
use std::collections::{HashMap, HashSet};

struct Target {
    text: String,
    /// Year consumed after a date placeholder, if any
    year: Option<String>,
}

/// Restore `anonymized` using `ledger`, with optional per-code overrides
///
/// The first ledger entry for a code wins. A code whose resolved text is
/// empty is left in place. Under [`DateRedactionPolicy::KeepYear`] a date
/// placeholder followed by ` YYYY` consumes the year when it is the year of
/// the recorded date; under `Full` any year after a code is document text.
pub fn restore(
    anonymized: &str,
    ledger: &[Entity],
    policy: DateRedactionPolicy,
    overrides: &HashMap<String, String>,
) -> Result<String> {
    let mut targets: HashMap<&str, Target> = HashMap::new();
    for entity in ledger {
        let code = entity.replacement_code.as_str();
        if code.is_empty() || targets.contains_key(code) {
            continue;
        }
        let text = overrides
            .get(code)
            .cloned()
            .unwrap_or_else(|| entity.original_text.clone());
        let year = (policy == DateRedactionPolicy::KeepYear
            && entity.entity_type == EntityType::Date)
            .then(|| extract_year(&entity.original_text).map(str::to_string))
            .flatten();
        targets.insert(code, Target { text, year });
    }
    targets.retain(|_, target| !target.text.is_empty());

    let restored = if targets.is_empty() {
        anonymized.to_string()
    } else {
        substitute(anonymized, &targets)?
    };

    let ledger_codes: HashSet<&str> = ledger
        .iter()
        .map(|e| e.replacement_code.as_str())
        .collect();
    let mut extra: Vec<(&String, &String)> = overrides
        .iter()
        .filter(|(code, text)| !ledger_codes.contains(code.as_str()) && !text.is_empty())
        .collect();
    extra.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut restored = restored;
    for (code, text) in extra {
        restored = restored.replace(code.as_str(), text);
    }

    tracing::debug!(
        codes = targets.len(),
        overrides = overrides.len(),
        "Placeholders restored"
    );

    Ok(restored)
}

fn substitute(anonymized: &str, targets: &HashMap<&str, Target>) -> Result<String> {
    let mut codes: Vec<&str> = targets.keys().copied().collect();
    codes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let alternation = codes
        .iter()
        .map(|code| regex::escape(code))
        .collect::<Vec<_>>()
        .join("|");
    let regex = regex::Regex::new(&format!(r"({alternation})(?: ((?:19|20)\d{{2}})\b)?"))
        .map_err(|e| AnonError::ReplacementVerificationFailure(format!("restore matcher: {e}")))?;

    let mut out = String::with_capacity(anonymized.len());
    let mut last = 0;
    for captures in regex.captures_iter(anonymized) {
        let (Some(whole), Some(code)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let Some(target) = targets.get(code.as_str()) else {
            continue;
        };

        out.push_str(&anonymized[last..whole.start()]);
        out.push_str(&target.text);

        if let Some(year) = captures.get(2) {
            if target.year.as_deref() != Some(year.as_str()) {
                out.push(' ');
                out.push_str(year.as_str());
            }
        }
        last = whole.end();
    }
    out.push_str(&anonymized[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coded(text: &str, ty: EntityType, code: &str) -> Entity {
        let mut entity = Entity::new(text, ty);
        entity.replacement_code = code.to_string();
        entity
    }

    #[test]
    fn test_restore_basic() {
        let ledger = vec![
            coded("Aroha", EntityType::PersonClient, "[CLIENT_A]"),
            coded("Dr. Smith", EntityType::PersonProvider, "[PROVIDER_A]"),
        ];
        let restored = restore(
            "[CLIENT_A] saw [PROVIDER_A]; [CLIENT_A]'s mood improved.",
            &ledger,
            DateRedactionPolicy::Full,
            &HashMap::new(),
        )
        .unwrap();
        assert_eq!(restored, "Aroha saw Dr. Smith; Aroha's mood improved.");
    }

    #[test]
    fn test_longer_code_not_split() {
        let ledger = vec![
            coded("Ana", EntityType::PersonClient, "[CLIENT_A]"),
            coded("Bea", EntityType::PersonClient, "[CLIENT_AB]"),
        ];
        let restored = restore(
            "[CLIENT_AB] and [CLIENT_A]",
            &ledger,
            DateRedactionPolicy::Full,
            &HashMap::new(),
        )
        .unwrap();
        assert_eq!(restored, "Bea and Ana");
    }

    #[test]
    fn test_date_year_consumed_only_when_matching() {
        let ledger = vec![coded("12/03/1978", EntityType::Date, "[DATE_A]")];
        let restored = restore(
            "Born [DATE_A] 1978, reviewed [DATE_A] 2024.",
            &ledger,
            DateRedactionPolicy::KeepYear,
            &HashMap::new(),
        )
        .unwrap();
        assert_eq!(restored, "Born 12/03/1978, reviewed 12/03/1978 2024.");
    }

    #[test]
    fn test_full_policy_keeps_year_after_date() {
        let ledger = vec![coded("12/03/2019", EntityType::Date, "[DATE_A]")];
        let restored = restore(
            "Admitted [DATE_A] 2019 intake cohort.",
            &ledger,
            DateRedactionPolicy::Full,
            &HashMap::new(),
        )
        .unwrap();
        assert_eq!(restored, "Admitted 12/03/2019 2019 intake cohort.");
    }

    #[test]
    fn test_first_ledger_entry_wins() {
        let ledger = vec![
            coded("Aroha", EntityType::PersonClient, "[CLIENT_A]"),
            coded("AROHA", EntityType::PersonClient, "[CLIENT_A]"),
        ];
        let restored =
            restore("[CLIENT_A]", &ledger, DateRedactionPolicy::Full, &HashMap::new()).unwrap();
        assert_eq!(restored, "Aroha");
    }

    #[test]
    fn test_overrides() {
        let ledger = vec![
            coded("Aroha", EntityType::PersonClient, "[CLIENT_A]"),
            coded("", EntityType::PersonOther, "[PERSON_A]"),
        ];
        let mut overrides = HashMap::new();
        overrides.insert("[CLIENT_A]".to_string(), "the client".to_string());
        overrides.insert("[LOCATION_Z]".to_string(), "Hamilton".to_string());

        let restored = restore(
            "[CLIENT_A] met [PERSON_A] in [LOCATION_Z].",
            &ledger,
            DateRedactionPolicy::Full,
            &overrides,
        )
        .unwrap();
        assert_eq!(restored, "the client met [PERSON_A] in Hamilton.");
    }

    #[test]
    fn test_empty_ledger_is_identity() {
        let restored =
            restore("No codes [X] here.", &[], DateRedactionPolicy::Full, &HashMap::new()).unwrap();
        assert_eq!(restored, "No codes [X] here.");
    }
}
