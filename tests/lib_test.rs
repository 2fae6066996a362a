//! Library integration tests.

use stepforge::StepforgeError;

#[test]
fn error_types_are_public() {
    let err = StepforgeError::UnknownStep {
        name: "fetch_x".into(),
        referenced_by: "build_x".into(),
    };
    assert!(err.to_string().contains("fetch_x"));
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> stepforge::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn cli_types_are_public() {
    use clap::Parser;
    use stepforge::cli::{Cli, Commands};

    let cli = Cli::parse_from(["stepforge", "options", "build_x", "--json"]);
    match cli.command {
        Some(Commands::Options(args)) => {
            assert_eq!(args.step, "build_x");
            assert!(args.json);
        }
        other => panic!("expected options command, got {:?}", other),
    }
}

#[test]
fn config_parses_from_yaml() {
    let config = stepforge::config::parse_config(
        "steps:\n  hello:\n    options:\n      argv: [echo, hi]\n",
        std::path::Path::new("config.yml"),
    )
    .unwrap();
    assert!(config.steps.contains_key("hello"));
}
