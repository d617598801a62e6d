#![allow(missing_docs)]

use core::str::FromStr;

use log as _;
use partplan_types::{ByteSize, ByteSizeError};
use serde_json as _;
use test_log::test;
use thiserror as _;
use toml as _;

#[test]
fn byte_size_plain() {
    assert_eq!(ByteSize::from_str("5000000").unwrap(), ByteSize(5_000_000));
    assert_eq!(ByteSize::from_str("512B").unwrap(), ByteSize(512));
}

#[test]
fn byte_size_suffixes() {
    assert_eq!(ByteSize::from_str("2M").unwrap(), ByteSize(2_097_152));
    assert_eq!(ByteSize::from_str("2MiB").unwrap(), ByteSize(2_097_152));
    assert_eq!(ByteSize::from_str("4k").unwrap(), ByteSize(4096));
    assert_eq!(ByteSize::from_str("10G").unwrap(), ByteSize(10_737_418_240));
    assert_eq!(ByteSize::from_str("1 TiB").unwrap(), ByteSize(1 << 40));
}

#[test]
fn byte_size_unknown_unit() {
    assert_eq!(
        ByteSize::from_str("10Q").unwrap_err(),
        ByteSizeError::Unit(String::from("Q"))
    );
}

#[test]
fn byte_size_no_number() {
    assert!(matches!(
        ByteSize::from_str("G").unwrap_err(),
        ByteSizeError::Number(_)
    ));
}

#[test]
fn byte_size_overflow() {
    assert_eq!(
        ByteSize::from_str("99999999999T").unwrap_err(),
        ByteSizeError::Overflow
    );
}

#[test]
fn byte_size_display() {
    assert_eq!(ByteSize(2_097_152).to_string(), "2 MiB");
    assert_eq!(ByteSize(1 << 40).to_string(), "1 TiB");
    assert_eq!(ByteSize(5_000_000).to_string(), "5000000 B");
    assert_eq!(ByteSize(0).to_string(), "0 B");
}
