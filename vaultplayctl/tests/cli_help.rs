use assert_cmd::cargo::cargo_bin_cmd;

fn help_text(args: &[&str]) -> String {
    let mut cmd = cargo_bin_cmd!("vaultplayctl");
    let output = cmd
        .args(args)
        .arg("--help")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8_lossy(&output).into_owned()
}

#[test]
fn top_level_help_lists_commands() {
    let text = help_text(&[]);
    for command in ["entitlement", "access", "progress", "simulate"] {
        assert!(text.contains(command), "help missing '{command}'");
    }
    assert!(text.contains("--memory"), "help missing --memory");
}

#[test]
fn entitlement_subcommands_present() {
    let text = help_text(&["entitlement"]);
    assert!(text.contains("show"), "entitlement help missing show");
    assert!(text.contains("grant"), "entitlement help missing grant");
    assert!(text.contains("unlock"), "entitlement help missing unlock");

    let grant = help_text(&["entitlement", "grant"]);
    assert!(grant.contains("--plan"), "grant help missing --plan");
    assert!(grant.contains("--proof"), "grant help missing --proof");
}

#[test]
fn simulate_help_mentions_options() {
    let text = help_text(&["simulate"]);
    for flag in ["--premium", "--duration", "--watch", "--buy", "--persist"] {
        assert!(text.contains(flag), "simulate help missing {flag}");
    }
}
