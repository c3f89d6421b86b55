#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::NamedTempFile;

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.env_remove("HOLIDAY_ENGINE_DB")
        .env_remove("HOLIDAY_ENGINE_CATALOG")
        .env("HOLIDAY_ENGINE_SEED_YEARS", "2025..2026")
        .write_stdin(script.to_string())
        .assert()
}

#[test]
fn cli_resolves_barcelona() {
    run_cli("resolve ES/Catalonia/Barcelona 2025\nquit\n")
        .success()
        .stdout(str_contains("14 holidays"))
        .stdout(str_contains("La Mercè"));
}

#[test]
fn cli_reports_uncovered_location() {
    run_cli("resolve JP/Tokyo 2025\nquit\n")
        .success()
        .stdout(str_contains("create the calendar manually"));
}

#[test]
fn cli_exception_toggle_changes_non_working_days() {
    let script = "office add mad ES/Madrid/Madrid 2025\n\
                  except mad 2025-12-08 work\n\
                  except mad 2025-12-08 work\n\
                  except mad 2025-12-09 work\n\
                  quit\n";
    run_cli(script)
        .success()
        .stdout(str_contains("Exception set on 2025-12-08."))
        .stdout(str_contains("Exception cleared on 2025-12-08."))
        .stdout(str_contains("has no holiday on 2025-12-09"));
}

#[test]
fn cli_annual_update_and_accept() {
    let script = "office add bcn ES/Catalonia/Barcelona 2025 noauto\n\
                  update run 2026\n\
                  update list\n\
                  accept bcn\n\
                  accept bcn\n\
                  quit\n";
    run_cli(script)
        .success()
        .stdout(str_contains("Update 2026 for bcn: pending"))
        .stdout(str_contains("Update 2026 for bcn: applied"))
        .stdout(str_contains("has no open annual update"));
}

#[test]
fn cli_save_and_load_offices_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().replace('\\', "\\\\");
    let script = format!(
        "office add bcn ES/Catalonia/Barcelona 2025\n\
         closure add bcn August 2025-08-11 2025-08-22 recurring\n\
         save {path}\n\
         office add tmp ES/Madrid 2025\n\
         load {path}\n\
         offices\n\
         quit\n"
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Offices loaded from"));
    let after_reload = output
        .split("Offices loaded from")
        .last()
        .unwrap_or_default();
    assert!(after_reload.contains("bcn"));
    assert!(
        !after_reload.contains("tmp "),
        "office added after save should be gone:\n{}",
        after_reload
    );
}
