use chrono::NaiveDate;
use studyhub_core::model::calendar::EventType;
use studyhub_core::model::note::Subject;
use studyhub_core::service::{days_until, NewEvent};
use studyhub_core::storage::MemoryKvStorage;
use studyhub_core::store::Store;
use studyhub_core::CalendarService;

fn day(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap()
}

fn event(title: &str, date: NaiveDate, kind: EventType) -> NewEvent {
    NewEvent {
        title: title.to_string(),
        date,
        end_date: None,
        kind,
        subject: None,
        description: None,
    }
}

#[test]
fn blank_titles_and_reversed_ranges_are_ignored() {
    let memory = MemoryKvStorage::new();
    let store = Store::new(&memory);
    let mut service = CalendarService::new(&store).unwrap();

    assert_eq!(
        service
            .add_event(event("   ", day(3, 1), EventType::Event))
            .unwrap(),
        None
    );
    let mut reversed = event("Trip", day(3, 5), EventType::Event);
    reversed.end_date = Some(day(3, 4));
    assert_eq!(service.add_event(reversed).unwrap(), None);

    assert!(service.events().is_empty());
    assert!(memory.raw("studyhub-events").is_none());
}

#[test]
fn new_entries_start_incomplete_and_toggle() {
    let store = Store::new(MemoryKvStorage::new());
    let mut service = CalendarService::new(&store).unwrap();
    let mut input = event("  Essay draft ", day(3, 10), EventType::Assignment);
    input.subject = Some(Subject::English);
    input.description = Some("  ".to_string());
    let id = service.add_event(input).unwrap().unwrap();

    let stored = &service.events()[0];
    assert_eq!(stored.title, "Essay draft");
    assert_eq!(stored.subject, Some(Subject::English));
    assert_eq!(stored.description, None);
    assert!(!stored.completed);

    assert!(service.toggle_complete(&id).unwrap());
    assert!(service.events()[0].completed);
    assert!(service.toggle_complete(&id).unwrap());
    assert!(!service.events()[0].completed);
    assert!(!service.toggle_complete("missing").unwrap());
}

#[test]
fn day_view_is_sorted_by_title() {
    let store = Store::new(MemoryKvStorage::new());
    let mut service = CalendarService::new(&store).unwrap();
    for title in ["chem lab", "Algebra quiz", "Book club"] {
        service
            .add_event(event(title, day(4, 2), EventType::Event))
            .unwrap();
    }
    service
        .add_event(event("Other day", day(4, 3), EventType::Event))
        .unwrap();

    let titles: Vec<String> = service
        .events_on(day(4, 2))
        .into_iter()
        .map(|event| event.title)
        .collect();
    assert_eq!(titles, vec!["Algebra quiz", "Book club", "chem lab"]);
}

#[test]
fn homework_lists_open_assignments_from_today() {
    let store = Store::new(MemoryKvStorage::new());
    let mut service = CalendarService::new(&store).unwrap();
    let today = day(5, 10);
    service
        .add_event(event("Past worksheet", day(5, 9), EventType::Assignment))
        .unwrap();
    let done = service
        .add_event(event("Done worksheet", day(5, 12), EventType::Assignment))
        .unwrap()
        .unwrap();
    service.toggle_complete(&done).unwrap();
    service
        .add_event(event("Lab writeup", day(5, 20), EventType::Assignment))
        .unwrap();
    service
        .add_event(event("Reading log", day(5, 10), EventType::Assignment))
        .unwrap();
    service
        .add_event(event("Unit test", day(5, 11), EventType::Test))
        .unwrap();

    let titles: Vec<String> = service
        .homework(today)
        .into_iter()
        .map(|event| event.title)
        .collect();
    assert_eq!(titles, vec!["Reading log", "Lab writeup"]);
}

#[test]
fn upcoming_lists_are_chronological_and_capped_at_five() {
    let store = Store::new(MemoryKvStorage::new());
    let mut service = CalendarService::new(&store).unwrap();
    let today = day(6, 1);
    for offset in (0..7).rev() {
        service
            .add_event(event(
                &format!("Test {offset}"),
                day(6, 2 + offset),
                EventType::Test,
            ))
            .unwrap();
    }
    service
        .add_event(event("Old test", day(5, 30), EventType::Test))
        .unwrap();
    let party = service
        .add_event(event("Party", day(6, 1), EventType::Event))
        .unwrap()
        .unwrap();

    let tests = service.upcoming_tests(today);
    assert_eq!(tests.len(), 5);
    assert_eq!(tests[0].title, "Test 0");
    assert_eq!(tests[4].title, "Test 4");

    let upcoming = service.upcoming_events(today);
    assert_eq!(upcoming.len(), 5);
    assert_eq!(upcoming[0].title, "Party");

    service.toggle_complete(&party).unwrap();
    assert_eq!(service.upcoming_events(today)[0].title, "Test 0");
    assert!(service.delete_event(&party).unwrap());
}

#[test]
fn days_until_counts_whole_days() {
    assert_eq!(days_until(day(6, 15), day(6, 1)), 14);
    assert_eq!(days_until(day(6, 1), day(6, 1)), 0);
    assert_eq!(days_until(day(5, 31), day(6, 1)), -1);
}
