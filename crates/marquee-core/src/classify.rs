use crate::records::{EventKind, ParticipantType, PayerBucket};

struct KeywordRule<T> {
    keywords: &'static [&'static str],
    category: T,
}

/// Ordered rules, first match wins. The fallback lives in the classify
/// functions so unrecognized text always maps to a value.
const EVENT_RULES: &[KeywordRule<EventKind>] = &[
    KeywordRule {
        keywords: &["tet", "lunar new year", "countdown"],
        category: EventKind::Tet,
    },
    KeywordRule {
        keywords: &["christmas", "xmas", "new year", "holiday", "national day"],
        category: EventKind::PublicHoliday,
    },
    KeywordRule {
        keywords: &["wedding", "birthday", "private", "buyout", "corporate"],
        category: EventKind::Private,
    },
];

const PAYER_RULES: &[KeywordRule<PayerBucket>] = &[
    KeywordRule {
        keywords: &["sponsor", "sponsored", "brand"],
        category: PayerBucket::Sponsor,
    },
    KeywordRule {
        keywords: &["promoter", "takeover", "collab"],
        category: PayerBucket::Promoter,
    },
];

const PARTICIPANT_RULES: &[KeywordRule<ParticipantType>] = &[KeywordRule {
    keywords: &["resident"],
    category: ParticipantType::Resident,
}];

fn first_match<T: Copy>(rules: &[KeywordRule<T>], text: &str, fallback: T) -> T {
    let haystack = text.to_lowercase();
    for rule in rules {
        if rule
            .keywords
            .iter()
            .any(|keyword| haystack.contains(keyword))
        {
            return rule.category;
        }
    }
    fallback
}

/// Total over all input, including the empty string.
pub fn classify_event(text: &str) -> EventKind {
    first_match(EVENT_RULES, text, EventKind::Regular)
}

pub fn classify_payer(text: &str) -> PayerBucket {
    first_match(PAYER_RULES, text, PayerBucket::House)
}

pub fn classify_participant(name: &str) -> ParticipantType {
    first_match(PARTICIPANT_RULES, name, ParticipantType::Guest)
}

/// `amount = duration_hours × base_rate × multiplier`, computed entirely in
/// minor units with i128 intermediates. Rounds half away from zero exactly
/// once at the end; intermediate values are never rounded.
pub fn compute_amount_minor(duration_minutes: u32, base_rate_minor: i64, kind: EventKind) -> i64 {
    let (num, den) = kind.multiplier();
    let numerator = i128::from(duration_minutes) * i128::from(base_rate_minor) * i128::from(num);
    let denominator = 60i128 * i128::from(den);
    round_half_away_from_zero(numerator, denominator) as i64
}

fn round_half_away_from_zero(numerator: i128, denominator: i128) -> i128 {
    debug_assert!(denominator > 0);
    if numerator >= 0 {
        (2 * numerator + denominator) / (2 * denominator)
    } else {
        (2 * numerator - denominator) / (2 * denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_rules_apply_in_order() {
        // "tet" outranks the holiday bucket even when both would match.
        assert_eq!(classify_event("Tet Holiday Special"), EventKind::Tet);
        assert_eq!(classify_event("TET COUNTDOWN"), EventKind::Tet);
        assert_eq!(classify_event("Christmas Eve"), EventKind::PublicHoliday);
        assert_eq!(classify_event("Nguyen wedding"), EventKind::Private);
    }

    #[test]
    fn classifiers_are_total() {
        assert_eq!(classify_event(""), EventKind::Regular);
        assert_eq!(classify_event("???"), EventKind::Regular);
        assert_eq!(classify_payer(""), PayerBucket::House);
        assert_eq!(classify_participant(""), ParticipantType::Guest);
    }

    #[test]
    fn payer_rules_pick_ledger() {
        assert_eq!(classify_payer("Heineken sponsored night"), PayerBucket::Sponsor);
        assert_eq!(classify_payer("XO promoter takeover"), PayerBucket::Promoter);
        assert_eq!(classify_payer("regular friday"), PayerBucket::House);
    }

    #[test]
    fn resident_names_classify_as_resident() {
        assert_eq!(classify_participant("Resident DJ Linh"), ParticipantType::Resident);
        assert_eq!(classify_participant("DJ Amor"), ParticipantType::Guest);
    }

    #[test]
    fn amount_uses_exact_multiplier_and_single_rounding() {
        // 1.5h at 1_000_000 minor units, ×1.5 => 2_250_000
        assert_eq!(compute_amount_minor(90, 1_000_000, EventKind::Tet), 2_250_000);
        // 2h flat rate, ×1.0
        assert_eq!(compute_amount_minor(120, 1_000_000, EventKind::Regular), 2_000_000);
    }

    #[test]
    fn amount_rounds_half_away_from_zero() {
        // 10 minutes at rate 3 => 3 * 10 / 60 = 0.5 => rounds to 1
        assert_eq!(compute_amount_minor(10, 3, EventKind::Regular), 1);
        // 10 minutes at rate 2 => 0.333.. => 0
        assert_eq!(compute_amount_minor(10, 2, EventKind::Regular), 0);
        // Negative rates stay symmetric.
        assert_eq!(compute_amount_minor(10, -3, EventKind::Regular), -1);
    }

    #[test]
    fn rounding_happens_once_not_per_step() {
        // 10 minutes at rate 100, ×1.5 is exactly 25. Rounding the hourly
        // product first (16.67 -> 17, ×1.5 -> 25.5 -> 26) would drift.
        assert_eq!(compute_amount_minor(10, 100, EventKind::Tet), 25);
    }
}
