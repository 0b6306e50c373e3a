//! Segmented charts of accounts, filters and snapshots through a general ledger.

use chrono::NaiveDate;
use rstest::{fixture, rstest};
use tally_core::account::{AccountFilter, AccountNumberTemplate, AccountType, Segment};
use tally_core::ledger::{
    EntryType, GeneralLedger, LedgerError, PeriodStatus, Posting, Snapshot, SubledgerRollup,
};
use tally_shared::{Currency, Money};

fn eur(cents: i64) -> Money {
    Money::from_minor(cents, Currency::Eur)
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 7, d).unwrap()
}

fn template() -> AccountNumberTemplate {
    AccountNumberTemplate::new(vec![
        Segment::new("Division", 2).values([("10", "North"), ("20", "South")]),
        Segment::new("Account", 3)
            .range(100..=199, "Assets")
            .range(200..=299, "Liabilities")
            .range(400..=499, "Revenue")
            .range(500..=599, "Expenses"),
    ])
    .unwrap()
}

#[fixture]
fn gl() -> GeneralLedger {
    let mut gl = GeneralLedger::with_template("Regions", Currency::Eur, template());
    for (code, name, account_type) in [
        ("10-100", "North Cash", AccountType::Asset),
        ("20-100", "South Cash", AccountType::Asset),
        ("10-200", "North Payables", AccountType::Liability),
        ("10-400", "North Sales", AccountType::Revenue),
        ("20-400", "South Sales", AccountType::Revenue),
        ("20-500", "South Travel", AccountType::Expense),
    ] {
        gl.create_account(code, name, account_type).unwrap();
    }
    gl.record(
        day(3),
        vec![Posting::debit("10-100", eur(8_000)), Posting::credit("10-400", eur(8_000))],
        None,
    )
    .unwrap();
    gl.record(
        day(4),
        vec![Posting::debit("20-100", eur(5_000)), Posting::credit("20-400", eur(5_000))],
        None,
    )
    .unwrap();
    gl.record(
        day(9),
        vec![Posting::debit("20-500", eur(1_200)), Posting::credit("10-200", eur(1_200))],
        Some("Conference trip".to_string()),
    )
    .unwrap();
    gl
}

#[rstest]
#[case::unknown_division("30-100")]
#[case::account_out_of_range("10-300")]
#[case::wrong_width("10-1000")]
#[case::missing_segment("10")]
#[case::wrong_separator("10.100")]
fn test_codes_outside_template_rejected(mut gl: GeneralLedger, #[case] code: &str) {
    assert!(matches!(
        gl.create_account(code, "Bad", AccountType::Asset),
        Err(LedgerError::InvalidAccountNumber { .. })
    ));
    assert_eq!(gl.chart().len(), 6);
}

#[rstest]
fn test_number_segments(gl: GeneralLedger) {
    let number = gl.chart().number("20-500").unwrap();
    assert_eq!(number.segment("division"), Some("20"));
    assert_eq!(number.label("Division"), Some("South"));
    assert_eq!(number.label("account"), Some("Expenses"));
    assert_eq!(gl.chart().template().unwrap().form(), "XX-XXX");
}

#[rstest]
#[case::by_division(AccountFilter::new().eq("division", "20"), vec!["20-100", "20-400", "20-500"])]
#[case::by_name(AccountFilter::new().eq("name", "north cash"), vec!["10-100"])]
#[case::exact_name(AccountFilter::new().eq("name", "north cash").exact(), vec![])]
#[case::and(
    AccountFilter::new().eq("division", "10").any_of("account", ["100", "400"]),
    vec!["10-100", "10-400"]
)]
#[case::or(
    AccountFilter::new().eq("type", "expense").eq("type", "liability").match_any(),
    vec!["10-200", "20-500"]
)]
#[case::empty(AccountFilter::new(), vec![])]
fn test_filter_accounts(
    gl: GeneralLedger,
    #[case] filter: AccountFilter,
    #[case] expected: Vec<&str>,
) {
    let codes: Vec<&str> = gl.filter_accounts(&filter).map(|a| a.code()).collect();
    assert_eq!(codes, expected);
}

#[rstest]
#[case::single_by_segment(AccountFilter::new().eq("account", "500"), Some("20-500"))]
#[case::single_by_name(AccountFilter::new().eq("name", "north payables"), Some("10-200"))]
#[case::no_match(AccountFilter::new().eq("account", "123"), None)]
fn test_find_account(
    gl: GeneralLedger,
    #[case] filter: AccountFilter,
    #[case] expected: Option<&str>,
) {
    let found = gl.find_account(&filter).unwrap();
    assert_eq!(found.map(|a| a.code()), expected);
}

#[rstest]
fn test_find_account_with_several_matches(gl: GeneralLedger) {
    assert_eq!(
        gl.find_account(&AccountFilter::new().eq("account", "100")),
        Err(LedgerError::AmbiguousAccount(vec![
            "10-100".to_string(),
            "20-100".to_string(),
        ]))
    );
}

#[rstest]
fn test_net_balance_of_filtered_accounts(gl: GeneralLedger) {
    let south = AccountFilter::new().eq("division", "20");
    // South cash and travel are debit-normal, south sales credit-normal.
    assert_eq!(
        gl.net_balance_as(&south, EntryType::Debit, day(31)).unwrap(),
        eur(1_200)
    );
    let nothing = AccountFilter::new().eq("division", "99");
    assert!(gl.net_balance_as(&nothing, EntryType::Debit, day(31)).unwrap().is_zero());
}

#[rstest]
fn test_snapshot_json_round_trip(mut gl: GeneralLedger) {
    let mut north = SubledgerRollup::new("North");
    north.add_account("10-100").unwrap().add_account("10-200").unwrap();
    gl.add_rollup(north).unwrap();
    gl.archive_account("20-500").unwrap();
    gl.close();

    let json = gl.snapshot().to_json().unwrap();
    let restored = GeneralLedger::restore(Snapshot::from_json(&json).unwrap()).unwrap();

    assert_eq!(restored.name(), "Regions");
    assert_eq!(restored.currency(), Currency::Eur);
    assert_eq!(restored.status(), PeriodStatus::Closed);
    assert_eq!(restored.chart().template(), gl.chart().template());
    assert!(restored.account("20-500").unwrap().is_archived());
    assert_eq!(
        restored.rollup_balance("North", day(31)).unwrap(),
        gl.rollup_balance("North", day(31)).unwrap()
    );
    assert_eq!(
        restored.trial_balance(day(31)).unwrap(),
        gl.trial_balance(day(31)).unwrap()
    );
    assert!(restored.verify().is_ok());
}

#[rstest]
fn test_snapshot_with_invalid_code_rejected(gl: GeneralLedger) {
    let json = gl.snapshot().to_json().unwrap().replace("20-500", "90-500");
    let err = GeneralLedger::restore(Snapshot::from_json(&json).unwrap()).unwrap_err();
    assert_eq!(err.error_code(), "CORRUPT_LEDGER_DATA");
}

#[rstest]
fn test_snapshot_with_overlapping_rollups_rejected(mut gl: GeneralLedger) {
    let mut north = SubledgerRollup::new("North");
    north.add_account("10-100").unwrap();
    gl.add_rollup(north.clone()).unwrap();

    let mut snapshot = gl.snapshot();
    snapshot.rollups.push(north);
    assert!(matches!(
        GeneralLedger::restore(snapshot),
        Err(LedgerError::CorruptLedgerData(_))
    ));
}

#[rstest]
fn test_restored_last_period_cannot_roll_forward(mut gl: GeneralLedger) {
    gl.close();
    let mut snapshot = gl.snapshot();
    snapshot.period = u32::MAX;
    let restored = GeneralLedger::restore(snapshot).unwrap();
    assert_eq!(restored.status(), PeriodStatus::Closed);

    assert_eq!(
        restored.start_next_period(day(31)).unwrap_err(),
        LedgerError::PeriodLimitReached(u32::MAX)
    );
}
