use std::collections::HashMap;

use mortar_orm::{
    Clause, Conn, Drivers, Error, MockDb, Model, Statement, alter_table, create_index, create_table, delete, drop_index,
    insert, select, update,
};

#[derive(Debug, Default, Model)]
struct Employee {
    emp_no: i32,
    first_name: String,
    last_name: String,
}

#[derive(Debug, Default, Model)]
struct Salary {
    #[orm("emp_no,typ=INT,notnull=t,pk=pk_salaries,fk=fk_salaries_emp:employees(emp_no)")]
    emp_no: i32,
    #[orm("notnull=t")]
    salary: i64,
    #[orm("from_date,typ=DATE,notnull=t,pk=pk_salaries")]
    from: chrono::NaiveDate,
}

#[test]
fn select_renders_literals() {
    let stmt = select(&["emp_no"]).from(&["employees"]).where_clause("emp_no = ?", 10001);
    assert_eq!(stmt.build_sql().unwrap(), "SELECT emp_no FROM employees WHERE emp_no = 10001");

    let stmt = select(&["emp_no"])
        .from(&["employees"])
        .where_clause("first_name = ? AND active = ?", ("Taro", true));
    assert_eq!(
        stmt.to_string(),
        "SELECT emp_no FROM employees WHERE first_name = 'Taro' AND active = true"
    );
}

#[test]
fn select_with_join_and_in_list() {
    let stmt = select(&["e.emp_no", "d.dept_name as name"])
        .from(&["employees as e"])
        .join("dept_emp as de")
        .on("e.emp_no = de.emp_no", ())
        .left_join("departments as d")
        .on("de.dept_no = d.dept_no", ())
        .where_clause("e.emp_no IN (?)", (vec![10001, 10002],))
        .order_by(&["e.emp_no"]);
    assert_eq!(
        stmt.build_sql().unwrap(),
        "SELECT e.emp_no, d.dept_name AS name FROM employees AS e \
         INNER JOIN dept_emp AS de ON e.emp_no = de.emp_no \
         LEFT JOIN departments AS d ON de.dept_no = d.dept_no \
         WHERE e.emp_no IN (10001, 10002) ORDER BY e.emp_no"
    );
}

#[test]
fn rendering_is_repeatable() {
    let stmt = select(&[]).from(&["employees"]).limit(5).offset(10);
    let first = stmt.build_sql().unwrap();
    assert_eq!(first, "SELECT * FROM employees LIMIT 5 OFFSET 10");
    assert_eq!(stmt.build_sql().unwrap(), first);
}

#[test]
fn insert_update_delete() {
    let employees = vec![
        Employee { emp_no: 1001, first_name: "Taro".into(), last_name: "Yamada".into() },
        Employee { emp_no: 1002, first_name: "Jiro".into(), last_name: "Sato".into() },
    ];
    let stmt = insert("employees", &["emp_no", "first_name"]).model(&employees);
    assert_eq!(
        stmt.build_sql().unwrap(),
        "INSERT INTO employees (emp_no, first_name) VALUES (1001, 'Taro'), (1002, 'Jiro')"
    );

    let changes: HashMap<String, String> = HashMap::from([("last_name".to_string(), "Suzuki".to_string())]);
    let stmt = update("employees", &["last_name"]).model(&changes).where_clause("emp_no = ?", 1001);
    assert_eq!(stmt.build_sql().unwrap(), "UPDATE employees SET last_name = 'Suzuki' WHERE emp_no = 1001");

    let stmt = delete().from(&["employees"]).where_clause("emp_no = ?", 1002);
    assert_eq!(stmt.build_sql().unwrap(), "DELETE FROM employees WHERE emp_no = 1002");
}

#[test]
fn update_model_rejects_vectors() {
    let stmt = update("employees", &["first_name"]).model(&vec![Employee::default()]);
    assert!(matches!(stmt.build_sql(), Err(Error::InvalidType(_))));
}

#[test]
fn create_table_from_tags_uses_the_connection_driver() {
    let db = MockDb::new(Drivers::Postgres);
    let stmt = db.create_table("salaries").if_not_exists().model::<Salary>();
    assert_eq!(
        stmt.build_sql().unwrap(),
        "CREATE TABLE IF NOT EXISTS salaries (emp_no INT NOT NULL, salary BIGINT NOT NULL, from_date DATE NOT NULL, \
         CONSTRAINT pk_salaries PRIMARY KEY (emp_no, from_date), \
         CONSTRAINT fk_salaries_emp FOREIGN KEY (emp_no) REFERENCES employees(emp_no))"
    );

    let stmt = create_table("employees").column("emp_no", "INT").auto_increment().primary_key("pk", &["emp_no"]);
    assert_eq!(
        stmt.build_sql().unwrap(),
        "CREATE TABLE employees (emp_no INT AUTO_INCREMENT, CONSTRAINT pk PRIMARY KEY (emp_no))"
    );
}

#[test]
fn dialect_specific_schema_statements() {
    let db = MockDb::new(Drivers::SQLite);
    assert_eq!(db.drop_index("ix_name").build_sql().unwrap(), "DROP INDEX ix_name");
    assert!(drop_index("ix_name").build_sql().is_err());
    assert_eq!(
        db.alter_table("employees").drop_unique("uc_name").build_sql().unwrap(),
        "ALTER TABLE employees DROP CONSTRAINT uc_name"
    );
    assert_eq!(
        alter_table("employees").drop_unique("uc_name").build_sql().unwrap(),
        "ALTER TABLE employees DROP INDEX uc_name"
    );
    assert_eq!(
        create_index("ix_hire").on("employees", &["hire_date"]).build_sql().unwrap(),
        "CREATE INDEX ix_hire ON employees (hire_date)"
    );
}

#[test]
fn injected_clauses_are_rejected() {
    let mut stmt: Statement = update("employees", &["first_name"]).set("Taro").into();
    stmt.push_clause(Clause::OrderBy(vec!["emp_no".into()]));
    let err = stmt.build_sql().unwrap_err();
    assert!(matches!(err, Error::InvalidClause { .. }));
    assert_eq!(err.to_string(), "OrderBy is not supported for UPDATE statement");
}

#[test]
fn deferred_errors_win_over_rendering() {
    let stmt = insert("employees", &["emp_no", "hire_date"]).model(&Employee::default());
    assert_eq!(stmt.to_string(), "invalid syntax: column hire_date has no matching field in statement_test::Employee");
}
