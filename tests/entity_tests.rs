//! Entity detection and filename labeling.

use finrag::{EntityDetector, NameMatchDetector, company_from_filename};

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn detection_is_case_insensitive_whole_word() {
    let detector = NameMatchDetector;
    let known = labels(&["Tesla", "Apple"]);

    let detected = detector.detect("how did APPLE's margin compare to tesla?", &known);

    assert_eq!(detected, vec!["Apple".to_string(), "Tesla".to_string()]);
}

#[test]
fn labels_do_not_match_inside_longer_words() {
    let detector = NameMatchDetector;
    let known = labels(&["Apple", "Pineapple"]);

    let detected = detector.detect("Summarize Pineapple Inc. revenue", &known);

    assert_eq!(detected, vec!["Pineapple".to_string()]);
}

#[test]
fn entities_come_back_in_first_mention_order() {
    let detector = NameMatchDetector;
    // Known order deliberately differs from mention order.
    let known = labels(&["Tesla", "Nvidia", "Microsoft"]);

    let detected = detector.detect("Compare Microsoft and Nvidia against Tesla", &known);

    assert_eq!(
        detected,
        vec!["Microsoft".to_string(), "Nvidia".to_string(), "Tesla".to_string()]
    );
}

#[test]
fn unmentioned_labels_are_not_detected() {
    let detector = NameMatchDetector;
    let known = labels(&["Tesla", "Apple"]);

    let detected = detector.detect("What were the main risk factors?", &known);

    assert!(detected.is_empty());
}

#[test]
fn filenames_map_to_known_company_labels() {
    assert_eq!(company_from_filename("10-K TESLA.pdf"), "Tesla");
    assert_eq!(company_from_filename("EC-TSLA.pdf"), "Tesla");
    assert_eq!(company_from_filename("aapl_annual_report_2024.PDF"), "Apple");
    assert_eq!(company_from_filename("nvidia-q2-earnings.pdf"), "Nvidia");
}

#[test]
fn unknown_filenames_fall_back_to_the_first_meaningful_token() {
    assert_eq!(company_from_filename("acme_annual_report_2024.pdf"), "Acme");
    assert_eq!(company_from_filename("10-K_ZENITH.pdf"), "Zenith");
    assert_eq!(company_from_filename("globex.pdf"), "Globex");
}
