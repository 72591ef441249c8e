//! Tests for program message construction across the whole vocabulary

mod common;

use common::*;

/// Every (group, header) pair the instrument defines.
fn valid_pairs() -> Vec<(Group, Option<Header>)> {
    vec![
        (Group::Identify, None),
        (Group::ClearStatus, None),
        (Group::Communicate, Some(Header::ResponseHeader)),
        (Group::Communicate, Some(Header::Overlap)),
        (Group::Communicate, Some(Header::Remote)),
        (Group::Communicate, Some(Header::Verbose)),
        (Group::Input, Some(Header::Module(1))),
        (Group::Input, Some(Header::Module(4))),
        (Group::Numeric, Some(Header::Format)),
        (Group::Numeric, Some(Header::Value)),
        (Group::Status, Some(Header::ExtendedEventStatusEnable)),
        (Group::Status, Some(Header::Filter(1))),
        (Group::Status, Some(Header::Filter(16))),
    ]
}

fn prefix(group: Group, header: Option<Header>) -> String {
    format!(
        "{}{}",
        group,
        header.map(|h| h.to_string()).unwrap_or_default()
    )
}

#[test]
fn test_query_is_group_header_and_suffix() {
    for (group, header) in valid_pairs() {
        if group == Group::ClearStatus {
            continue;
        }
        let built = Command::query(group, header).build().unwrap();
        assert_eq!(built, format!("{}?", prefix(group, header)));
        assert!(!built.ends_with(' '), "query {built:?} has trailing space");
    }
}

#[test]
fn test_setting_is_group_header_space_argument() {
    let settable = [
        (Header::ResponseHeader, "OFF"),
        (Header::Overlap, "ON"),
        (Header::Remote, "ON"),
        (Header::Verbose, "OFF"),
        (Header::Format, "ASCii"),
        (Header::ExtendedEventStatusEnable, "1"),
        (Header::Filter(7), "FALL"),
    ];
    for (header, argument) in settable {
        let built = Command::set(header, argument).build().unwrap();
        assert_eq!(built, format!("{} {}", prefix(header.group(), Some(header)), argument));
    }
}

#[test]
fn test_query_with_argument_is_malformed_everywhere() {
    for (group, header) in valid_pairs() {
        let command = Command {
            group,
            header,
            argument: Some("1".to_string()),
            query: true,
        };
        assert!(
            matches!(command.build(), Err(WTError::MalformedCommand(_))),
            "query on {} accepted an argument",
            prefix(group, header)
        );
    }
}

#[test]
fn test_query_with_empty_argument_is_plain_query() {
    let command = Command {
        group: Group::Numeric,
        header: Some(Header::Value),
        argument: Some(String::new()),
        query: true,
    };
    assert_eq!(command.build().unwrap(), ":NUMeric:VALue?");
}

#[test]
fn test_fixed_vocabulary_strings() {
    assert_eq!(Command::common(Group::ClearStatus).build().unwrap(), "*CLS");
    assert_eq!(Command::query(Group::Identify, None).build().unwrap(), "*IDN?");
    assert_eq!(
        Command::set(Header::Format, NumericFormat::Float.token()).build().unwrap(),
        ":NUMeric:FORMat FLOat"
    );
    assert_eq!(
        Command::query(Group::Numeric, Some(Header::Value)).build().unwrap(),
        ":NUMeric:VALue?"
    );
    assert_eq!(
        Command::switch(Header::ResponseHeader, true).unwrap().build().unwrap(),
        ":COMMunicate:HEADer ON"
    );
    assert_eq!(
        Command::switch(Header::Overlap, false).unwrap().build().unwrap(),
        ":COMMunicate:OVERlap OFF"
    );
}

#[test]
fn test_every_group_renders_its_mnemonic() {
    let expected = ["*CLS", "*IDN", ":COMMunicate", ":INPut", ":NUMeric", ":STATus"];
    for (group, mnemonic) in Group::ALL.iter().zip(expected) {
        assert_eq!(group.to_string(), mnemonic);
    }
}
