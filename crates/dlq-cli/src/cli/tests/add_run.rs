//! Tests for add and run subcommands.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use dlq_core::item::ContentKind;

#[test]
fn cli_parse_add() {
    match parse(&["dlq", "add", "https://example.com/file.iso"]) {
        CliCommand::Add {
            url,
            source_ref,
            priority,
            title,
            kind,
            file_name,
        } => {
            assert_eq!(url, "https://example.com/file.iso");
            assert!(source_ref.is_none());
            assert_eq!(priority, 0);
            assert!(title.is_none());
            assert_eq!(kind, ContentKind::Other);
            assert!(file_name.is_none());
        }
        _ => panic!("expected Add"),
    }
}

#[test]
fn cli_parse_add_all_options() {
    match parse(&[
        "dlq",
        "add",
        "https://example.com/v.mp4",
        "--source-ref",
        "video:7",
        "--priority",
        "-2",
        "--title",
        "Keynote",
        "--kind",
        "video",
        "--file-name",
        "keynote.mp4",
    ]) {
        CliCommand::Add {
            source_ref,
            priority,
            title,
            kind,
            file_name,
            ..
        } => {
            assert_eq!(source_ref.as_deref(), Some("video:7"));
            assert_eq!(priority, -2);
            assert_eq!(title.as_deref(), Some("Keynote"));
            assert_eq!(kind, ContentKind::Video);
            assert_eq!(file_name.as_deref(), Some("keynote.mp4"));
        }
        _ => panic!("expected Add with options"),
    }
}

#[test]
fn cli_parse_add_rejects_unknown_kind() {
    assert!(Cli::try_parse_from(["dlq", "add", "https://x.com/a", "--kind", "movie"]).is_err());
}

#[test]
fn cli_parse_run() {
    match parse(&["dlq", "run"]) {
        CliCommand::Run { jobs, keep_alive } => {
            assert!(jobs.is_none());
            assert!(!keep_alive);
        }
        _ => panic!("expected Run"),
    }
}

#[test]
fn cli_parse_run_jobs() {
    match parse(&["dlq", "run", "--jobs", "4", "--keep-alive"]) {
        CliCommand::Run { jobs, keep_alive } => {
            assert_eq!(jobs, Some(4));
            assert!(keep_alive);
        }
        _ => panic!("expected Run with --jobs"),
    }
}

#[test]
fn cli_parse_run_rejects_negative_jobs() {
    assert!(Cli::try_parse_from(["dlq", "run", "--jobs", "-1"]).is_err());
}
