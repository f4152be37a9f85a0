use chrono::NaiveDate;
use studyhub_core::model::finance::ExpenseCategory;
use studyhub_core::service::NewExpense;
use studyhub_core::storage::MemoryKvStorage;
use studyhub_core::store::Store;
use studyhub_core::FinanceService;

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn expense(amount: f64, category: ExpenseCategory, date: NaiveDate) -> NewExpense {
    NewExpense {
        amount,
        category,
        description: "lunch".to_string(),
        date,
    }
}

#[test]
fn invalid_expense_amounts_write_nothing() {
    let memory = MemoryKvStorage::new();
    let store = Store::new(&memory);
    let mut service = FinanceService::new(&store).unwrap();

    for amount in [0.0, -4.5, f64::NAN, f64::INFINITY] {
        let added = service
            .add_expense(expense(amount, ExpenseCategory::Food, day(2024, 5, 1)))
            .unwrap();
        assert_eq!(added, None);
    }
    assert!(service.expenses().is_empty());
    assert!(memory.raw("studyhub-expenses").is_none());
}

#[test]
fn monthly_totals_and_breakdown_only_count_the_month() {
    let store = Store::new(MemoryKvStorage::new());
    let mut service = FinanceService::new(&store).unwrap();
    service
        .add_expense(expense(12.5, ExpenseCategory::Food, day(2024, 5, 3)))
        .unwrap();
    service
        .add_expense(expense(7.5, ExpenseCategory::Food, day(2024, 5, 20)))
        .unwrap();
    service
        .add_expense(expense(30.0, ExpenseCategory::School, day(2024, 5, 31)))
        .unwrap();
    service
        .add_expense(expense(99.0, ExpenseCategory::Food, day(2024, 4, 30)))
        .unwrap();

    let may = day(2024, 5, 15);
    assert_eq!(service.monthly_total(may), 50.0);
    assert_eq!(service.expenses_in_month(may).len(), 3);
    assert_eq!(service.expenses_in_month(may)[0].date, day(2024, 5, 31));

    let breakdown = service.category_breakdown(may);
    let categories: Vec<ExpenseCategory> = breakdown.iter().map(|entry| entry.category).collect();
    assert_eq!(categories, vec![ExpenseCategory::Food, ExpenseCategory::School]);
    assert_eq!(breakdown[0].total, 20.0);
}

#[test]
fn six_month_totals_run_oldest_first_across_year_boundary() {
    let store = Store::new(MemoryKvStorage::new());
    let mut service = FinanceService::new(&store).unwrap();
    service
        .add_expense(expense(10.0, ExpenseCategory::Transport, day(2023, 11, 2)))
        .unwrap();
    service
        .add_expense(expense(5.0, ExpenseCategory::Other, day(2024, 2, 29)))
        .unwrap();

    let totals = service.recent_monthly_totals(day(2024, 3, 31), 6);
    let months: Vec<(i32, u32)> = totals.iter().map(|t| (t.year, t.month)).collect();
    assert_eq!(
        months,
        vec![(2023, 10), (2023, 11), (2023, 12), (2024, 1), (2024, 2), (2024, 3)]
    );
    assert_eq!(totals[1].total, 10.0);
    assert_eq!(totals[4].total, 5.0);
    assert_eq!(totals[5].total, 0.0);
}

#[test]
fn goal_amounts_are_clamped_to_target() {
    let store = Store::new(MemoryKvStorage::new());
    let mut service = FinanceService::new(&store).unwrap();
    assert_eq!(service.add_goal("  ", 100.0).unwrap(), None);
    assert_eq!(service.add_goal("Laptop", 0.0).unwrap(), None);
    let id = service.add_goal("Laptop", 800.0).unwrap().unwrap();
    assert_eq!(service.goals()[0].current_amount, 0.0);

    service.update_goal_amount(&id, 1200.0).unwrap();
    assert_eq!(service.goals()[0].current_amount, 800.0);

    service.update_goal_amount(&id, -50.0).unwrap();
    assert_eq!(service.goals()[0].current_amount, 0.0);

    service.update_goal_amount(&id, 200.0).unwrap();
    assert_eq!(service.goals()[0].progress(), 0.25);

    assert!(!service.update_goal_amount(&id, f64::NAN).unwrap());
    assert!(!service.update_goal_amount("missing", 10.0).unwrap());
    assert!(service.delete_goal(&id).unwrap());
    assert!(service.goals().is_empty());
}

#[test]
fn spending_limits_upsert_by_category_and_drive_budget_status() {
    let store = Store::new(MemoryKvStorage::new());
    let mut service = FinanceService::new(&store).unwrap();
    let may = day(2024, 5, 1);
    service
        .add_expense(expense(60.0, ExpenseCategory::Entertainment, may))
        .unwrap();
    service
        .add_expense(expense(10.0, ExpenseCategory::Food, may))
        .unwrap();

    assert!(service
        .set_spending_limit(ExpenseCategory::Entertainment, 100.0)
        .unwrap());
    assert!(service
        .set_spending_limit(ExpenseCategory::Entertainment, 50.0)
        .unwrap());
    assert!(service.set_spending_limit(ExpenseCategory::Food, 40.0).unwrap());
    assert!(!service.set_spending_limit(ExpenseCategory::Food, -1.0).unwrap());
    assert_eq!(service.limits().len(), 2);

    let status = service.budget_status(may);
    assert_eq!(status[0].category, ExpenseCategory::Food);
    assert_eq!(status[0].remaining, 30.0);
    assert!(!status[0].over_limit);
    assert_eq!(status[1].category, ExpenseCategory::Entertainment);
    assert_eq!(status[1].spent, 60.0);
    assert_eq!(status[1].remaining, 0.0);
    assert!(status[1].over_limit);

    assert!(service
        .remove_spending_limit(ExpenseCategory::Food)
        .unwrap());
    assert_eq!(service.budget_status(may).len(), 1);
}
