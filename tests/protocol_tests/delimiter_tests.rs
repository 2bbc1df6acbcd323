//! Delimiter Selection Tests

use agentcmd::protocol::{select_delimiter, DELIMITERS};

#[test]
fn test_no_values_selects_space() {
    assert_eq!(select_delimiter(&DELIMITERS, Vec::<&str>::new()), Some(' '));
}

#[test]
fn test_plain_values_select_space() {
    assert_eq!(select_delimiter(&DELIMITERS, vec!["abc", "123", ""]), Some(' '));
}

#[test]
fn test_escalates_in_candidate_order() {
    assert_eq!(select_delimiter(&DELIMITERS, vec!["a b"]), Some('^'));
    assert_eq!(select_delimiter(&DELIMITERS, vec!["a b", "x^y"]), Some('!'));
    assert_eq!(select_delimiter(&DELIMITERS, vec!["a b^!$%@#*"]), Some('~'));
}

#[test]
fn test_match_at_start_of_value_counts() {
    // A candidate in the first position of a value is a collision too.
    assert_eq!(select_delimiter(&DELIMITERS, vec![" leading"]), Some('^'));
}

#[test]
fn test_exhausted_candidates() {
    assert_eq!(select_delimiter(&DELIMITERS, vec![" ^!$%", "@#*~"]), None);
}

#[test]
fn test_custom_candidates() {
    assert_eq!(select_delimiter(&['|', ';'], vec!["a|b"]), Some(';'));
    assert_eq!(select_delimiter(&[], vec!["a"]), None);
}
