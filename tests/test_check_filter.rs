use chrono::NaiveDate;
use media_filter::filter::{Filter, FilterError};
use media_filter::metadata::MetaData;

fn filter() -> Filter {
    Filter::with_meta_data(MetaData {
        message_id: 5,
        message_date: NaiveDate::from_ymd_opt(2022, 8, 5)
            .and_then(|d| d.and_hms_opt(14, 35, 12))
            .expect("valid date"),
        media_file_size: 1024 * 1024 * 10,
        media_type: "video".to_string(),
        ..MetaData::default()
    })
}

fn diagnostic(expr: &str) -> String {
    let (ok, message) = filter().check_filter(expr);
    assert!(!ok, "'{}' should be rejected", expr);
    message.unwrap_or_else(|| panic!("'{}' should carry a diagnostic", expr))
}

#[test]
fn test_valid_expressions_pass() {
    let filter = filter();
    for expr in [
        "caption == r'.*#中文.*'",
        "file_size >= 10MB and media_type == 'video'",
        "message_date >= 2022.03.04 14:50:15 || id == 1",
        "1024 * 1024 * 1024 * 11 == 11GB",
        "reply_to_message_id != 0",
    ] {
        assert_eq!(filter.check_filter(expr), (true, None), "{}", expr);
    }
}

#[test]
fn test_type_mismatch_names_string_fields() {
    assert_eq!(diagnostic("caption = 1"), "caption is str but 1 is not");
    assert_eq!(diagnostic("caption = 3KB"), "caption is str but 3072 is not");
    assert_eq!(
        diagnostic("media_type == 2022.01"),
        "media_type is str but 2022.01 is not"
    );
}

#[test]
fn test_type_mismatch_shows_bound_values() {
    assert_eq!(diagnostic("id == 'x'"), "5 is int but x is not");
    assert_eq!(
        diagnostic("message_date == 1"),
        "2022-08-05 14:35:12 is datetime but 1 is not"
    );
    // 2023/01/45 folds to the integer 44
    assert_eq!(
        diagnostic("message_date == 2023/01/45"),
        "2022-08-05 14:35:12 is datetime but 44 is not"
    );
}

#[test]
fn test_syntax_errors_name_the_offending_token() {
    assert_eq!(
        diagnostic("caption == rr'.*#中文啊.*'"),
        "Syntax error at '.*#中文啊.*'"
    );
    assert_eq!(diagnostic("caption tis r'.*#中文啊.*'"), "Syntax error at 'tis'");
    assert_eq!(diagnostic("id == .*"), "Syntax error at '*'");
    assert_eq!(diagnostic("file_size == 3kb"), "Syntax error at 'kb'");
    assert_eq!(diagnostic("message_date == 2023/0b-05"), "Syntax error at 'b'");
}

#[test]
fn test_truncated_input_reports_eof() {
    assert_eq!(diagnostic("id == ."), "Syntax error at EOF");
    assert_eq!(diagnostic("caption == 'open"), "Syntax error at EOF");
    assert_eq!(diagnostic("213"), "Syntax error at EOF");
}

#[test]
fn test_undefined_names() {
    assert_eq!(diagnostic("caption2 == .*#中文啊.*'"), "Undefined name caption2");
    assert_eq!(diagnostic("message_id == 5"), "Undefined name message_id");
}

#[test]
fn test_check_filter_agrees_with_exec() {
    let filter = filter();
    for expr in [
        "id == 5",
        "id == 'x'",
        "caption tis 'x'",
        "file_size > 1MB or nope == 1",
        "media_type == r'(video'",
        "id == 1 / 0",
    ] {
        let (ok, message) = filter.check_filter(expr);
        match filter.exec(expr) {
            Ok(_) => assert!(ok && message.is_none(), "{}", expr),
            Err(err) => {
                assert!(!ok, "{}", expr);
                assert_eq!(message, Some(err.to_string()), "{}", expr);
            }
        }
    }
}

#[test]
fn test_exec_error_variants() {
    let filter = filter();
    assert!(filter.exec("caption tis 'x'").expect_err("syntax").is_syntax());
    assert!(matches!(
        filter.exec("media_type == r'(video'"),
        Err(FilterError::InvalidRegex { .. })
    ));
    assert!(matches!(
        filter.exec("id == 9223372036854775807 + 1"),
        Err(FilterError::Arithmetic(_))
    ));
    assert!(matches!(
        filter.exec("media_type > 'a'"),
        Err(FilterError::UnsupportedOperator { op: ">", ty: "str" })
    ));
}
