//! # Tag Module
//!
//! Parses the text of a field's `#[orm("...")]` attribute.
//!
//! ## Grammar
//!
//! Comma separated tokens. A token without `=` is the column name; the
//! others are `key=value` pairs:
//!
//! | Key       | Meaning                                            |
//! |-----------|----------------------------------------------------|
//! | `typ`     | SQL column type used by model-mode `CREATE TABLE`  |
//! | `notnull` | `t` marks the column `NOT NULL`                    |
//! | `default` | `DEFAULT` literal                                  |
//! | `pk`      | primary key constraint group                       |
//! | `uc`      | unique constraint group                            |
//! | `fk`      | `group:table(column)` foreign key                  |
//! | `layout`  | time layout, named or strftime pattern             |
//!
//! Unknown keys are ignored. Commas inside parentheses do not split, so
//! `typ=DECIMAL(10,2)` is a single token.

use heck::ToSnakeCase;

/// Parsed field tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    pub column: Option<String>,
    pub typ: Option<String>,
    pub not_null: bool,
    pub default: Option<String>,
    pub pk: Option<String>,
    pub uc: Option<String>,
    pub fk: Option<String>,
    /// Reference part of `fk`, e.g. `departments(dept_no)`.
    pub fk_ref: Option<String>,
    pub layout: Option<String>,
}

impl Tag {
    pub fn parse(raw: &str) -> Self {
        let mut tag = Tag::default();
        for token in split_tokens(raw) {
            let Some((key, value)) = token.split_once('=') else {
                tag.column = Some(token.to_string());
                continue;
            };
            let value = value.trim().to_string();
            match key.trim() {
                "typ" => tag.typ = Some(value),
                "notnull" => tag.not_null = value == "t",
                "default" => tag.default = Some(value),
                "pk" => tag.pk = Some(value),
                "uc" => tag.uc = Some(value),
                "fk" => match value.split_once(':') {
                    Some((group, reference)) => {
                        tag.fk = Some(group.to_string());
                        tag.fk_ref = Some(reference.to_string());
                    }
                    None => tag.fk = Some(value),
                },
                "layout" => tag.layout = Some(value),
                _ => {}
            }
        }
        tag
    }

    /// Column name for a field: the tag override, else the snake_case field name.
    pub fn column_name(&self, field_name: &str) -> String {
        match &self.column {
            Some(column) => column.clone(),
            None => field_name.to_snake_case(),
        }
    }

    pub fn layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }
}

fn split_tokens(raw: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in raw.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                tokens.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    tokens.push(&raw[start..]);
    tokens.into_iter().map(str::trim).filter(|t| !t.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_key() {
        let tag = Tag::parse(
            "emp_no,typ=INT,notnull=t,default=0,pk=pk_emp,uc=uc_emp,fk=fk_dept:departments(dept_no),layout=DateOnly",
        );
        assert_eq!(
            tag,
            Tag {
                column: Some("emp_no".into()),
                typ: Some("INT".into()),
                not_null: true,
                default: Some("0".into()),
                pk: Some("pk_emp".into()),
                uc: Some("uc_emp".into()),
                fk: Some("fk_dept".into()),
                fk_ref: Some("departments(dept_no)".into()),
                layout: Some("DateOnly".into()),
            }
        );
    }

    #[test]
    fn empty_tag_falls_back_to_snake_case() {
        let tag = Tag::parse("");
        assert_eq!(tag, Tag::default());
        assert_eq!(tag.column_name("firstName"), "first_name");
        assert_eq!(tag.column_name("emp_no"), "emp_no");
    }

    #[test]
    fn notnull_only_accepts_t() {
        assert!(!Tag::parse("notnull=true").not_null);
        assert!(Tag::parse("notnull=t").not_null);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let tag = Tag::parse("name,size=10");
        assert_eq!(tag.column.as_deref(), Some("name"));
        assert_eq!(tag.typ, None);
    }

    #[test]
    fn parenthesized_commas_stay_in_one_token() {
        let tag = Tag::parse("salary,typ=DECIMAL(10,2),notnull=t");
        assert_eq!(tag.typ.as_deref(), Some("DECIMAL(10,2)"));
        assert!(tag.not_null);
    }
}
