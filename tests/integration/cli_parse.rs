use clap::{CommandFactory, Parser};
use cfgtree::tooling::cli::Cli;

#[test]
fn parse_valid_command_matrix() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["cfgtree", "tree"],
        vec!["cfgtree", "cat", "roles/init.lua"],
        vec!["cfgtree", "validate"],
        vec!["cfgtree", "validate", "./conf"],
        vec!["cfgtree", "pull", "./conf"],
        vec!["cfgtree", "push", "./conf", "--dry-run"],
        vec!["cfgtree", "push", "./conf", "--prune", "--yes"],
        vec!["cfgtree", "schema", "show"],
        vec!["cfgtree", "schema", "check", "schema.yml"],
        vec!["cfgtree", "schema", "apply", "schema.yml", "--yes"],
        vec!["cfgtree", "--endpoint", "http://h:8081/admin/api", "--log-level", "debug", "tree"],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_ok(), "expected valid parse for args: {args:?}");
    }
}

#[test]
fn parse_rejects_missing_arguments() {
    assert!(Cli::try_parse_from(["cfgtree", "cat"]).is_err());
    assert!(Cli::try_parse_from(["cfgtree", "push"]).is_err());
    assert!(Cli::try_parse_from(["cfgtree", "schema"]).is_err());
    assert!(Cli::try_parse_from(["cfgtree", "schema", "apply"]).is_err());
    assert!(Cli::try_parse_from(["cfgtree", "delete", "a.yml"]).is_err());
}

#[test]
fn command_definition_is_consistent() {
    Cli::command().debug_assert();
}
