//! Library integration tests.

use stepwise::StepwiseError;

#[test]
fn error_types_are_public() {
    let err = StepwiseError::UnregisteredStep {
        step: "apply_regex".into(),
    };
    assert!(err.to_string().contains("apply_regex"));
    assert!(err.is_configuration());
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> stepwise::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn cli_types_are_public() {
    use clap::Parser;
    use stepwise::cli::{Cli, Commands};

    let cli = Cli::parse_from(["stepwise", "list", "--json"]);

    if let Commands::List(args) = cli.command {
        assert!(args.json);
    } else {
        panic!("Expected List command");
    }
}

#[test]
fn definition_rejects_missing_metadata() {
    use stepwise::activity::{ActivityDefinition, ActivityMetadata};
    use stepwise::steps::StepRegistry;

    let registry = StepRegistry::builder().step("exit", || Ok(true)).build().unwrap();
    let err = ActivityDefinition::new(ActivityMetadata::new(""), registry).unwrap_err();
    assert!(matches!(err, StepwiseError::MissingMetadata { .. }));
}

#[test]
fn empty_registry_is_rejected() {
    use stepwise::steps::StepRegistry;

    let err = StepRegistry::builder().build().unwrap_err();
    assert!(matches!(err, StepwiseError::EmptyRegistry));
}
