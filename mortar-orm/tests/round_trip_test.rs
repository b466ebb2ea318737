use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use mortar_orm::value::{LiteralOptions, to_literal};
use mortar_orm::{Model, Reflect, RowSet, Tag, parse_rows};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Model, PartialEq)]
struct Sample {
    tiny: i8,
    small: i16,
    int: i32,
    big: i64,
    size: isize,
    utiny: u8,
    usmall: u16,
    uint: u32,
    ubig: u64,
    usize_: usize,
    ratio: f32,
    precise: f64,
    active: bool,
    #[orm("label")]
    name: String,
    created_at: DateTime<Utc>,
    #[orm("stamped,layout=RFC3339")]
    stamped_at: DateTime<Utc>,
    #[orm("hired,layout=DateOnly")]
    hire_date: DateTime<Utc>,
    birthday: NaiveDate,
    logged_at: NaiveDateTime,
    #[orm("audited,layout=RFC3339Nano")]
    audited_at: NaiveDateTime,
    token: Uuid,
}

fn sample() -> Sample {
    Sample {
        tiny: -8,
        small: -1600,
        int: 10001,
        big: -9_000_000_000,
        size: 42,
        utiny: 255,
        usmall: 65535,
        uint: 4_000_000_000,
        ubig: u64::MAX,
        usize_: 7,
        ratio: 1.25,
        precise: 0.1,
        active: true,
        name: "O'Brien".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 4, 1, 9, 30, 15).unwrap(),
        stamped_at: Utc.with_ymd_and_hms(1999, 12, 31, 23, 59, 59).unwrap(),
        hire_date: Utc.with_ymd_and_hms(1986, 6, 26, 0, 0, 0).unwrap(),
        birthday: NaiveDate::from_ymd_opt(1953, 9, 2).unwrap(),
        logged_at: NaiveDate::from_ymd_opt(2001, 2, 3).unwrap().and_hms_opt(4, 5, 6).unwrap(),
        audited_at: NaiveDate::from_ymd_opt(2010, 7, 8).unwrap().and_hms_micro_opt(9, 10, 11, 123_456).unwrap(),
        token: Uuid::new_v4(),
    }
}

// Column names and unquoted cell text for every field, as a driver would
// return them.
fn columns_and_cells(value: &Sample) -> (Vec<String>, Vec<String>) {
    let mut columns = Vec::new();
    let mut cells = Vec::new();
    for (index, field) in Sample::fields().iter().enumerate() {
        let tag = Tag::parse(field.tag);
        columns.push(tag.column_name(field.name));
        let opts = LiteralOptions { quote: false, time_format: tag.layout() };
        cells.push(to_literal(&value.field_value(index).unwrap(), opts).unwrap());
    }
    (columns, cells)
}

#[test]
fn struct_values_survive_insert_and_parse() {
    let original = sample();
    let (columns, cells) = columns_and_cells(&original);

    let stmt = mortar_orm::insert("samples", &columns.iter().map(String::as_str).collect::<Vec<_>>())
        .model(&original);
    let sql = stmt.build_sql().unwrap();
    assert!(sql.contains("'O''Brien'"));
    assert!(sql.contains("'1999-12-31T23:59:59Z'"));
    assert!(sql.contains("'1986-06-26'"));
    assert!(sql.contains("'2001-02-03 04:05:06'"));
    assert!(sql.contains("'2010-07-08T09:10:11.123456Z'"));

    let mut rows = RowSet::new(columns).row(cells);
    let mut parsed = Sample::default();
    parse_rows(&mut rows, &mut parsed).unwrap();

    assert_eq!(parsed, original);
}

#[test]
fn column_order_does_not_matter() {
    let original = sample();
    let (mut columns, mut cells) = columns_and_cells(&original);
    columns.reverse();
    cells.reverse();

    let mut rows = RowSet::new(columns).row(cells);
    let mut parsed: Vec<Sample> = Vec::new();
    parse_rows(&mut rows, &mut parsed).unwrap();

    assert_eq!(parsed, vec![original]);
}
