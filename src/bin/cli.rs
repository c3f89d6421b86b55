use chrono::NaiveDate;
use office_holidays::{
    AnnualUpdateRecord, CompanyClosure, EngineConfig, ExceptionAction, HolidayEngine,
    InMemoryOfficeDirectory, LocationCatalog, LocationKey, OfficeCalendarConfig, OfficeId,
    RegionalCalendar, load_offices_from_json, save_offices_to_json, telemetry,
};
use std::io::{self, Write};
use std::sync::Arc;

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// `COUNTRY/REGION[/CITY]`
fn parse_location(s: &str) -> Option<LocationKey> {
    let mut parts = s.split('/').map(str::trim);
    let country = parts.next().filter(|p| !p.is_empty())?;
    let region = parts.next().filter(|p| !p.is_empty())?;
    let mut location = LocationKey::new(country, region);
    if let Some(city) = parts.next().filter(|p| !p.is_empty()) {
        location = location.with_city(city);
    }
    if parts.next().is_some() {
        return None;
    }
    Some(location)
}

fn print_help() {
    println!(
        "Commands:\n  help                                         Show this help\n  resolve <COUNTRY/REGION[/CITY]> <year>       Resolve a calendar from the catalog\n  office add <id> <COUNTRY/REGION[/CITY]> <year> [noauto]\n                                               Apply a resolved calendar to an office (auto-update on)\n  office show <id>                             Show an office configuration\n  offices                                      List offices\n  except <id> <YYYY-MM-DD> <work|skip> [reason...]\n                                               Toggle an exception on a holiday\n  closure add <id> <name> <start> [end] [recurring]\n                                               Add a company closure\n  closure rm <id> <name>                       Remove a company closure\n  days <id>                                    List effective non-working days\n  next <id> <YYYY-MM-DD>                       Next working day after a date\n  update run <year>                            Run the annual update for every office\n  update list                                  List updates waiting for a decision\n  accept <id>                                  Accept the office's open update\n  reject <id>                                  Reject the office's open update\n  save <path>                                  Save offices to a JSON file\n  load <path>                                  Load offices from a JSON file\n  quit|exit                                    Exit"
    );
}

fn print_calendar(calendar: &RegionalCalendar) {
    println!(
        "Calendar {} {} (source: {}, {} holidays)",
        calendar.location,
        calendar.year,
        calendar.source,
        calendar.len()
    );
    for holiday in calendar.holidays() {
        let moveable = if holiday.moveable { " (moveable)" } else { "" };
        println!(
            "  {}  {:<32} {}{}",
            holiday.date, holiday.name, holiday.kind, moveable
        );
    }
}

fn print_office(office: &OfficeCalendarConfig) {
    println!("Office             : {}", office.office_id);
    println!("Location           : {}", office.location);
    println!("Auto update        : {}", office.auto_update);
    let working_days = office
        .working_days
        .iter()
        .map(|wd| wd.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    println!("Working days       : {}", working_days);
    print_calendar(&office.calendar);
    if !office.exceptions.is_empty() {
        println!("Exceptions:");
        for exception in &office.exceptions {
            println!(
                "  {}  {:<32} {}{}",
                exception.holiday_date,
                exception.holiday_name,
                exception.action,
                exception
                    .reason
                    .as_deref()
                    .map(|r| format!(" ({r})"))
                    .unwrap_or_default()
            );
        }
    }
    if !office.closures.is_empty() {
        println!("Closures:");
        for closure in &office.closures {
            print_closure(closure);
        }
    }
    if let Some(record) = &office.open_update {
        println!("Open update        : {} ({})", record.year, record.status);
    }
}

fn print_closure(closure: &CompanyClosure) {
    let end = closure
        .end_date
        .map(|d| format!(" to {d}"))
        .unwrap_or_default();
    let recurring = if closure.recurring { " (recurring)" } else { "" };
    println!(
        "  {:<24} {}{}{}",
        closure.name, closure.start_date, end, recurring
    );
}

fn print_record(record: &AnnualUpdateRecord) {
    println!(
        "Update {} for {}: {} (+{} -{} ~{})",
        record.year,
        record.office_id,
        record.status,
        record.added.len(),
        record.removed.len(),
        record.date_changed.len()
    );
    for holiday in &record.added {
        println!("  added   {}  {}", holiday.date, holiday.name);
    }
    for holiday in &record.removed {
        println!("  removed {}  {}", holiday.date, holiday.name);
    }
    for change in record.date_change_summaries() {
        println!(
            "  moved   {}  {} -> {}",
            change.name, change.old_date, change.new_date
        );
    }
}

fn main() {
    telemetry::init_tracing();

    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };
    let catalog: Arc<dyn LocationCatalog> = match config.build_catalog() {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Catalog error: {}", e);
            std::process::exit(2);
        }
    };
    let mut engine = match config.build_directory() {
        Ok(directory) => HolidayEngine::new(catalog.clone(), directory),
        Err(e) => {
            eprintln!("Storage error: {}", e);
            std::process::exit(2);
        }
    };

    println!("Office Holidays (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "resolve" => {
                let location_s = parts.next();
                let year_s = parts.next();
                match (location_s.and_then(parse_location), year_s) {
                    (Some(location), Some(year_s)) => {
                        let year: i32 = match year_s.parse() {
                            Ok(v) => v,
                            Err(_) => {
                                println!("Invalid year");
                                continue;
                            }
                        };
                        match engine.resolve_calendar(&location, year) {
                            Ok(calendar) => print_calendar(&calendar),
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: resolve <COUNTRY/REGION[/CITY]> <year>"),
                }
            }
            "office" => match parts.next() {
                Some("add") => {
                    let id_s = parts.next();
                    let location_s = parts.next();
                    let year_s = parts.next();
                    let auto_update = parts.next() != Some("noauto");
                    match (id_s, location_s.and_then(parse_location), year_s) {
                        (Some(id_s), Some(location), Some(year_s)) => {
                            let year: i32 = match year_s.parse() {
                                Ok(v) => v,
                                Err(_) => {
                                    println!("Invalid year");
                                    continue;
                                }
                            };
                            let calendar = match engine.resolve_calendar(&location, year) {
                                Ok(calendar) => calendar,
                                Err(e) => {
                                    println!("Error: {}", e);
                                    continue;
                                }
                            };
                            let office_id = OfficeId::from(id_s);
                            let applied =
                                engine.apply_calendar(&office_id, location, calendar, auto_update);
                            match applied {
                                Ok(office) => {
                                    println!("Office {} configured.", office.office_id);
                                    print_office(&office);
                                }
                                Err(e) => println!("Error: {}", e),
                            }
                        }
                        _ => println!(
                            "Usage: office add <id> <COUNTRY/REGION[/CITY]> <year> [noauto]"
                        ),
                    }
                }
                Some("show") => match parts.next() {
                    Some(id_s) => match engine.office(&OfficeId::from(id_s)) {
                        Ok(office) => print_office(&office),
                        Err(e) => println!("Error: {}", e),
                    },
                    None => println!("Usage: office show <id>"),
                },
                _ => println!("Usage: office add|show ..."),
            },
            "offices" => match engine.offices() {
                Ok(offices) if offices.is_empty() => println!("No offices configured."),
                Ok(offices) => {
                    for office in offices {
                        println!(
                            "  {:<16} {:<32} {} ({} holidays)",
                            office.office_id.as_str(),
                            office.location.to_string(),
                            office.calendar.year,
                            office.calendar.len()
                        );
                    }
                }
                Err(e) => println!("Error: {}", e),
            },
            "except" => {
                let id_s = parts.next();
                let date_s = parts.next();
                let action_s = parts.next();
                let reason = parts.collect::<Vec<_>>().join(" ");
                match (id_s, date_s, action_s) {
                    (Some(id_s), Some(date_s), Some(action_s)) => {
                        let date = match parse_date(date_s) {
                            Some(d) => d,
                            None => {
                                println!("Invalid date (YYYY-MM-DD)");
                                continue;
                            }
                        };
                        let action = match ExceptionAction::from_str(action_s) {
                            Some(a) => a,
                            None => {
                                println!("Invalid action (work|skip)");
                                continue;
                            }
                        };
                        let reason = if reason.is_empty() { None } else { Some(reason) };
                        match engine.set_exception(&OfficeId::from(id_s), date, action, reason) {
                            Ok(exceptions) => {
                                if exceptions.iter().any(|e| e.holiday_date == date) {
                                    println!("Exception set on {date}.");
                                } else {
                                    println!("Exception cleared on {date}.");
                                }
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: except <id> <YYYY-MM-DD> <work|skip> [reason...]"),
                }
            }
            "closure" => match parts.next() {
                Some("add") => {
                    let id_s = parts.next();
                    let name_s = parts.next();
                    let start_s = parts.next();
                    let rest: Vec<&str> = parts.collect();
                    match (id_s, name_s, start_s.and_then(parse_date)) {
                        (Some(id_s), Some(name), Some(start)) => {
                            let recurring = rest.contains(&"recurring");
                            let end = match rest.iter().find(|s| **s != "recurring") {
                                Some(end_s) => match parse_date(end_s) {
                                    Some(d) => Some(d),
                                    None => {
                                        println!("Invalid end date (YYYY-MM-DD)");
                                        continue;
                                    }
                                },
                                None => None,
                            };
                            let closure = match CompanyClosure::new(name, start, end, recurring) {
                                Ok(c) => c,
                                Err(e) => {
                                    println!("Error: {}", e);
                                    continue;
                                }
                            };
                            match engine.add_closure(&OfficeId::from(id_s), closure) {
                                Ok(closures) => {
                                    println!("Closure added.");
                                    closures.iter().for_each(print_closure);
                                }
                                Err(e) => println!("Error: {}", e),
                            }
                        }
                        _ => println!(
                            "Usage: closure add <id> <name> <YYYY-MM-DD> [YYYY-MM-DD] [recurring]"
                        ),
                    }
                }
                Some("rm") => match (parts.next(), parts.next()) {
                    (Some(id_s), Some(name)) => {
                        match engine.remove_closure(&OfficeId::from(id_s), name) {
                            Ok(_) => println!("Closure '{name}' removed."),
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: closure rm <id> <name>"),
                },
                _ => println!("Usage: closure add|rm ..."),
            },
            "days" => match parts.next() {
                Some(id_s) => match engine.describe_non_working_days(&OfficeId::from(id_s)) {
                    Ok(days) => {
                        println!("{} non-working days:", days.len());
                        for (date, reason) in days {
                            println!("  {}  {:<32} {}", date, reason.name, reason.kind);
                        }
                    }
                    Err(e) => println!("Error: {}", e),
                },
                None => println!("Usage: days <id>"),
            },
            "next" => match (parts.next(), parts.next().and_then(parse_date)) {
                (Some(id_s), Some(date)) => match engine.work_calendar(&OfficeId::from(id_s)) {
                    Ok(calendar) => {
                        println!("Next working day: {}", calendar.next_working_day(date))
                    }
                    Err(e) => println!("Error: {}", e),
                },
                _ => println!("Usage: next <id> <YYYY-MM-DD>"),
            },
            "update" => match parts.next() {
                Some("run") => match parts.next().map(str::parse::<i32>) {
                    Some(Ok(year)) => {
                        let outcomes = engine.run_annual_update(year);
                        println!("Annual update {year}: {} offices", outcomes.len());
                        for outcome in &outcomes {
                            match &outcome.result {
                                Ok(record) => print_record(record),
                                Err(e) => {
                                    println!("Update {year} for {}: failed: {e}", outcome.office_id)
                                }
                            }
                        }
                    }
                    _ => println!("Usage: update run <year>"),
                },
                Some("list") => match engine.open_updates() {
                    Ok(records) if records.is_empty() => println!("No open updates."),
                    Ok(records) => records.iter().for_each(print_record),
                    Err(e) => println!("Error: {}", e),
                },
                _ => println!("Usage: update run <year> | update list"),
            },
            "accept" | "reject" => match parts.next() {
                Some(id_s) => {
                    let office_id = OfficeId::from(id_s);
                    let result = if cmd == "accept" {
                        engine.accept_update(&office_id)
                    } else {
                        engine.reject_update(&office_id)
                    };
                    match result {
                        Ok(record) => print_record(&record),
                        Err(e) => println!("Error: {}", e),
                    }
                }
                None => println!("Usage: {} <id>", cmd),
            },
            "save" => match parts.next() {
                Some(path) => match engine.offices() {
                    Ok(offices) => match save_offices_to_json(&offices, path) {
                        Ok(_) => println!("Offices saved to {path}"),
                        Err(e) => println!("Save error: {}", e),
                    },
                    Err(e) => println!("Error: {}", e),
                },
                None => println!("Usage: save <path>"),
            },
            "load" => match parts.next() {
                Some(path) => match load_offices_from_json(path)
                    .and_then(InMemoryOfficeDirectory::with_offices)
                {
                    Ok(directory) => {
                        engine = HolidayEngine::new(catalog.clone(), Arc::new(directory));
                        println!("Offices loaded from {path}");
                    }
                    Err(e) => println!("Load error: {}", e),
                },
                None => println!("Usage: load <path>"),
            },
            _ => {
                println!("Unknown command. Type 'help' for a list of commands.");
            }
        }
    }
}
