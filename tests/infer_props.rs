use csv_sync::infer::{Kind, infer_kind};
use proptest::prelude::*;

// Alphabet with no 'n', so no sample can spell the float literals
// "inf"/"nan" that would make text parse as a number.
const WORD: &str = "[a-mo-z]{1,8}";

proptest! {
    #[test]
    fn inference_is_deterministic(samples in proptest::collection::vec("[a-z0-9.@-]{0,8}", 0..12)) {
        let first = infer_kind(samples.iter().map(String::as_str));
        let second = infer_kind(samples.iter().map(String::as_str));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn first_recognizable_sample_decides(number in "[1-9][0-9]{0,5}", tail in proptest::collection::vec(WORD, 0..6)) {
        let mut samples = vec![number];
        samples.extend(tail);
        prop_assert_eq!(infer_kind(samples.iter().map(String::as_str)), Kind::Number);
    }

    #[test]
    fn leading_text_hides_nothing_behind_it(head in proptest::collection::vec(WORD, 1..6), number in "[1-9][0-9]{0,5}") {
        // A recognizable value decides the kind no matter how much
        // unrecognizable text precedes it.
        let mut samples = head;
        samples.push(number);
        prop_assert_eq!(infer_kind(samples.iter().map(String::as_str)), Kind::Number);
    }

    #[test]
    fn unrecognizable_samples_default_to_text(samples in proptest::collection::vec(WORD, 0..8)) {
        prop_assert_eq!(infer_kind(samples.iter().map(String::as_str)), Kind::Text);
    }

    #[test]
    fn dates_win_only_when_no_number_precedes(day in 1u32..29, month in 1u32..13) {
        let date = format!("2024-{month:02}-{day:02}");
        prop_assert_eq!(infer_kind([date.as_str()]), Kind::Date);
        prop_assert_eq!(infer_kind(["7", date.as_str()]), Kind::Number);
    }
}
