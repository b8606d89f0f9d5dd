use common::error::Errno;
use objcli::command::{help_texts, report_error};

#[test]
fn test_report_error_once() {
    let mut out = Vec::new();
    report_error(&Errno::Einval(String::from("object key is empty")), &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "Error: object key is empty\n");
}

#[test]
fn test_help_text_layout() {
    for (name, help) in help_texts() {
        assert!(help.usage(name).starts_with(&format!("objcli {} ", name)));
        let after = help.after_help();
        assert!(after.contains("SYNTAX:") && after.contains("SAMPLES:"), "{}", after);
        assert!(after.contains(help.sample));
    }
}
