use chrono::{DateTime, TimeZone, Utc};
use mortar_orm::{Conn, Database, Drivers, Model};

#[derive(Debug, Clone, Default, Model, PartialEq)]
struct Employee {
    emp_no: i64,
    #[orm("first_name")]
    name: String,
    #[orm("hire_date,layout=DateOnly")]
    hired: DateTime<Utc>,
    nickname: String,
}

fn employees() -> Vec<Employee> {
    vec![
        Employee {
            emp_no: 10001,
            name: "Taro".into(),
            hired: Utc.with_ymd_and_hms(1986, 6, 26, 0, 0, 0).unwrap(),
            nickname: String::new(),
        },
        Employee {
            emp_no: 10002,
            name: "Jiro".into(),
            hired: Utc.with_ymd_and_hms(1985, 11, 21, 0, 0, 0).unwrap(),
            nickname: String::new(),
        },
    ]
}

async fn setup() -> Result<Database, Box<dyn std::error::Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    // One connection, so every statement sees the same in-memory database.
    let db = Database::builder().max_connections(1).connect("sqlite::memory:").await?;
    db.create_table("employees")
        .if_not_exists()
        .column("emp_no", "INTEGER")
        .not_null()
        .column("first_name", "TEXT")
        .not_null()
        .column("hire_date", "TEXT")
        .column("nickname", "TEXT")
        .primary_key("pk_employees", &["emp_no"])
        .migrate()
        .await?;
    db.insert("employees", &["emp_no", "first_name", "hire_date"]).model(&employees()).exec().await?;
    Ok(db)
}

#[tokio::test]
async fn insert_and_query_models() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;
    assert_eq!(db.driver(), Drivers::SQLite);
    db.ping().await?;

    let mut found: Vec<Employee> = Vec::new();
    db.select(&["emp_no", "first_name", "hire_date", "nickname"])
        .from(&["employees"])
        .order_by(&["emp_no"])
        .query(&mut found)
        .await?;
    assert_eq!(found, employees());

    let mut first = Employee::default();
    db.select(&[]).from(&["employees"]).where_clause("first_name = ?", "Jiro").query(&mut first).await?;
    assert_eq!(first.emp_no, 10002);

    let mut count = 0i64;
    db.select(&["COUNT(*)"]).from(&["employees"]).query(&mut count).await?;
    assert_eq!(count, 2);

    db.close().await;
    Ok(())
}

#[tokio::test]
async fn update_and_delete_report_affected_rows() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    let result = db
        .update("employees", &["nickname"])
        .set("Tarochan")
        .where_clause("emp_no = ?", 10001)
        .exec()
        .await?;
    assert_eq!(result.rows_affected, 1);

    let mut nickname = String::new();
    db.select(&["nickname"]).from(&["employees"]).where_clause("emp_no = ?", 10001).query(&mut nickname).await?;
    assert_eq!(nickname, "Tarochan");

    let result = db.delete().from(&["employees"]).where_clause("emp_no > ?", 0).exec().await?;
    assert_eq!(result.rows_affected, 2);

    let mut remaining: Vec<Employee> = vec![Employee::default()];
    db.select(&[]).from(&["employees"]).query(&mut remaining).await?;
    assert!(remaining.is_empty());
    Ok(())
}

#[tokio::test]
async fn transactions_commit_and_roll_back() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    let tx = db.begin().await?;
    tx.delete().from(&["employees"]).where_clause("emp_no = ?", 10001).exec().await?;
    tx.rollback().await?;

    let mut count = 0i64;
    db.select(&["COUNT(*)"]).from(&["employees"]).query(&mut count).await?;
    assert_eq!(count, 2);

    let tx = db.begin().await?;
    tx.delete().from(&["employees"]).where_clause("emp_no = ?", 10001).exec().await?;
    tx.commit().await?;

    db.select(&["COUNT(*)"]).from(&["employees"]).query(&mut count).await?;
    assert_eq!(count, 1);
    Ok(())
}

#[tokio::test]
async fn schema_changes() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    db.create_index("ix_first_name").on("employees", &["first_name"]).migrate().await?;
    db.drop_index("ix_first_name").migrate().await?;
    db.alter_table("employees").add_column("gender", "TEXT").default("M").migrate().await?;

    let mut genders: Vec<String> = Vec::new();
    db.select(&["gender"]).from(&["employees"]).query(&mut genders).await?;
    assert_eq!(genders, ["M", "M"]);

    db.alter_table("employees").rename("staff").migrate().await?;
    db.drop_table("staff").if_exists().migrate().await?;
    db.drop_table("staff").if_exists().migrate().await?;
    Ok(())
}
