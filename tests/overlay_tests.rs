use chrono::NaiveDate;
use office_holidays::overlay::{apply, prune_exceptions, toggle_exception};
use office_holidays::{
    ExceptionAction, Holiday, HolidayException, HolidayKind, HolidayStatus, LocationKey,
    RegionalCalendar, builtin_catalog, compute_non_working_days, resolve,
};
use proptest::prelude::*;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn madrid_2025() -> RegionalCalendar {
    let catalog = builtin_catalog(2025..=2026);
    resolve(&catalog, &LocationKey::new("ES", "Madrid"), 2025).unwrap()
}

#[test]
fn work_exception_on_immaculate_conception_toggles_cleanly() {
    let calendar = madrid_2025();
    let dec_8 = calendar.holiday_on(d(2025, 12, 8)).unwrap().clone();
    assert_eq!(dec_8.name, "Immaculate Conception");

    let exceptions = toggle_exception(&[], &dec_8, ExceptionAction::Work, None);
    assert_eq!(exceptions.len(), 1);
    let days = compute_non_working_days(&apply(&calendar, &exceptions), &[]);
    assert!(!days.contains(&d(2025, 12, 8)));
    assert!(days.contains(&d(2025, 12, 25)));

    let exceptions = toggle_exception(&exceptions, &dec_8, ExceptionAction::Work, None);
    assert!(exceptions.is_empty());
    let days = compute_non_working_days(&apply(&calendar, &exceptions), &[]);
    assert!(days.contains(&d(2025, 12, 8)));
}

#[test]
fn switching_action_replaces_the_exception() {
    let calendar = madrid_2025();
    let holiday = calendar.holiday_on(d(2025, 5, 2)).unwrap().clone();

    let exceptions = toggle_exception(
        &[],
        &holiday,
        ExceptionAction::Work,
        Some("quarter close".into()),
    );
    let exceptions = toggle_exception(&exceptions, &holiday, ExceptionAction::Skip, None);
    assert_eq!(exceptions.len(), 1);
    assert_eq!(exceptions[0].action, ExceptionAction::Skip);
    assert_eq!(exceptions[0].reason, None);

    let effective = apply(&calendar, &exceptions);
    let entry = effective
        .holidays
        .iter()
        .find(|e| e.holiday.date == d(2025, 5, 2))
        .unwrap();
    assert_eq!(entry.status, HolidayStatus::NotObserved);
    assert_eq!(effective.holidays.len(), calendar.len());
}

#[test]
fn pruning_keeps_moved_holidays_and_drops_vanished_ones() {
    let catalog = builtin_catalog(2025..=2026);
    let location = LocationKey::new("ES", "Madrid");
    let current = resolve(&catalog, &location, 2025).unwrap();
    let next = resolve(&catalog, &location, 2026).unwrap();

    let maundy = current
        .holidays()
        .iter()
        .find(|h| h.name == "Maundy Thursday")
        .unwrap()
        .clone();
    let exceptions = toggle_exception(&[], &maundy, ExceptionAction::Work, None);

    let (kept, pruned) = prune_exceptions(&exceptions, &next);
    assert!(pruned.is_empty());
    assert_eq!(kept[0].holiday_date, d(2026, 4, 2));

    let gone = HolidayException {
        holiday_date: d(2025, 3, 19),
        holiday_name: "Saint Joseph".into(),
        holiday_kind: HolidayKind::Regional,
        action: ExceptionAction::Skip,
        reason: None,
    };
    let (kept, pruned) = prune_exceptions(&[gone.clone()], &next);
    assert!(kept.is_empty());
    assert_eq!(pruned.len(), 1);
    assert_eq!(pruned[0].exception, gone);
    assert_eq!(pruned[0].calendar_year, 2026);
}

fn holiday_pool() -> Vec<Holiday> {
    vec![
        Holiday::new(d(2025, 1, 1), "New Year's Day", HolidayKind::National),
        Holiday::new(d(2025, 5, 1), "Labour Day", HolidayKind::National),
        Holiday::new(d(2025, 9, 11), "National Day of Catalonia", HolidayKind::Regional),
        Holiday::new(d(2025, 9, 24), "La Mercè", HolidayKind::Local),
    ]
}

fn arb_toggle() -> impl Strategy<Value = (usize, ExceptionAction)> {
    (
        0usize..4,
        prop_oneof![Just(ExceptionAction::Work), Just(ExceptionAction::Skip)],
    )
}

proptest! {
    #[test]
    fn toggling_twice_restores_the_previous_state(
        history in prop::collection::vec(arb_toggle(), 0..12),
        last in arb_toggle(),
    ) {
        let pool = holiday_pool();
        let mut exceptions: Vec<HolidayException> = Vec::new();
        for (idx, action) in history {
            exceptions = toggle_exception(&exceptions, &pool[idx], action, None);
        }
        let before = exceptions.clone();
        let had_same = before
            .iter()
            .any(|e| e.holiday_date == pool[last.0].date && e.action == last.1);

        let once = toggle_exception(&exceptions, &pool[last.0], last.1, None);
        let twice = toggle_exception(&once, &pool[last.0], last.1, None);

        if had_same {
            // first toggle cleared it, second sets it again
            prop_assert_eq!(twice, before);
        } else {
            prop_assert!(!twice.iter().any(|e| e.holiday_date == pool[last.0].date));
        }
        prop_assert!(once.windows(2).all(|pair| pair[0].holiday_date < pair[1].holiday_date));
    }

    #[test]
    fn non_working_days_never_include_excepted_dates(
        history in prop::collection::vec(arb_toggle(), 0..12),
    ) {
        let calendar = RegionalCalendar::manual(
            LocationKey::new("ES", "Catalonia").with_city("Barcelona"),
            2025,
            holiday_pool(),
        );
        let pool = holiday_pool();
        let mut exceptions: Vec<HolidayException> = Vec::new();
        for (idx, action) in history {
            exceptions = toggle_exception(&exceptions, &pool[idx], action, None);
        }
        let days = compute_non_working_days(&apply(&calendar, &exceptions), &[]);
        for exception in &exceptions {
            prop_assert!(!days.contains(&exception.holiday_date));
        }
        prop_assert_eq!(days.len(), pool.len() - exceptions.len());
    }
}
