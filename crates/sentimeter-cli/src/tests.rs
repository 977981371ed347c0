use super::*;

#[test]
fn parses_db_commands() {
    let cli = Cli::try_parse_from(["sentimeter-cli", "db", "migrate"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));

    let cli = Cli::try_parse_from(["sentimeter-cli", "db", "seed"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Seed
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["sentimeter-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn annotate_flags_default_to_neutral() {
    let cli = Cli::try_parse_from(["sentimeter-cli", "annotate", "--text", "just a day"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Annotate {
            ref text,
            positive: false,
            negative: false,
        }) if text == "just a day"
    ));
}

#[test]
fn annotate_accepts_mixed_sentiment() {
    let cli = Cli::try_parse_from([
        "sentimeter-cli",
        "annotate",
        "--text",
        "good food, awful service",
        "--positive",
        "--negative",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Annotate {
            positive: true,
            negative: true,
            ..
        })
    ));
}

#[test]
fn annotate_requires_text() {
    assert!(Cli::try_parse_from(["sentimeter-cli", "annotate", "--positive"]).is_err());
}

#[test]
fn analyze_requires_at_least_one_text() {
    assert!(Cli::try_parse_from(["sentimeter-cli", "analyze"]).is_err());

    let cli = Cli::try_parse_from(["sentimeter-cli", "analyze", "great!", "awful"])
        .expect("expected valid cli args");
    match cli.command {
        Some(Commands::Analyze { texts }) => assert_eq!(texts, ["great!", "awful"]),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn report_output_is_optional() {
    let cli = Cli::try_parse_from(["sentimeter-cli", "report"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Report { output: None })));

    let cli = Cli::try_parse_from(["sentimeter-cli", "report", "--output", "report.md"])
        .expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Report { output: Some(_) })));
}

#[test]
fn demo_defaults_to_local_server() {
    let cli = Cli::try_parse_from(["sentimeter-cli", "demo"]).expect("expected valid cli args");
    match cli.command {
        Some(Commands::Demo { url, texts }) => {
            assert_eq!(url, demo::DEFAULT_ANALYZE_URL);
            assert!(texts.is_empty());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn retrain_takes_no_arguments() {
    let cli = Cli::try_parse_from(["sentimeter-cli", "retrain"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Retrain)));
}
