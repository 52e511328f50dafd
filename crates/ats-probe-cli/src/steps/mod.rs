//! Step definitions.
//!
//! Each step hands its arguments to the matching [`ScenarioContext`] method;
//! whether a failure stops the scenario is decided there, by the step's
//! failure policy.
//!
//! [`ScenarioContext`]: ats_probe::ScenarioContext

mod auth;
mod menu;
mod records;

use ats_probe::scenario::steps;

/// Step names paired with the phrase feature files use
pub const VOCABULARY: [(&str, &str); 8] = [
    (
        steps::LOGIN,
        r#"Login to system with "<url>" and "<email>" and "<search>" and "<account index>" and "<password>""#,
    ),
    (steps::LOGOUT, "perform logout from system"),
    (steps::VERIFY_LOGIN, "verify login successful"),
    (steps::SELECT_MENU, r#"Select menu "<menu>" and sub-menu "<index>""#),
    (steps::VERIFY_PAGE, "verify page opened successfully"),
    (steps::FIND_PARAMETER, r#"find parameter name at index "<index>""#),
    (steps::FIND_RECORD, r#"find record number at index "<index>""#),
    (steps::FIND_OPTION, r#"find option id with text "<text>""#),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_covers_every_step() {
        let names: Vec<_> = VOCABULARY.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, steps::ALL.to_vec());
    }
}
