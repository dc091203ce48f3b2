// SQL Parser Integration Tests

use amberdb::query::executor::{Constant, Expression, Predicate, Term};
use amberdb::query::parser::ast::{InsertData, ModifyData};
use amberdb::query::parser::{parse, Lexer, ParseError, Statement, TokenType};
use amberdb::record::FieldType;

fn field(name: &str) -> Expression {
    Expression::Field(name.to_string())
}

fn constant(value: impl Into<Constant>) -> Expression {
    Expression::Constant(value.into())
}

fn predicate(terms: Vec<Term>) -> Predicate {
    let mut predicate = Predicate::new();
    for term in terms {
        predicate.conjoin_with(Predicate::with_term(term));
    }
    predicate
}

#[test]
fn test_select_join_query() {
    let Ok(Statement::Query(query)) =
        parse("select name from student, exam where id = stuid and grade = 'A';")
    else {
        panic!("expected a query");
    };
    assert_eq!(query.fields, vec!["name"]);
    assert_eq!(query.tables, vec!["student", "exam"]);
    assert_eq!(
        query.predicate,
        predicate(vec![
            Term::new(field("id"), field("stuid")),
            Term::new(field("grade"), constant("A")),
        ])
    );
    assert_eq!(query.predicate.to_string(), "id = stuid and grade = 'A'");
}

#[test]
fn test_keywords_and_identifiers_are_case_insensitive() {
    let upper = parse("SELECT Name FROM Student WHERE MajorId = 10").unwrap();
    let lower = parse("select name from student where majorid = 10").unwrap();
    assert_eq!(upper, lower);

    // String literals keep their case
    let Ok(Statement::Query(query)) = parse("select a from t where b = 'MiXeD'") else {
        panic!("expected a query");
    };
    assert_eq!(query.predicate.equates_with_constant("b"), Some(&Constant::from("MiXeD")));
}

#[test]
fn test_select_star() {
    let Ok(Statement::Query(query)) = parse("select * from exam") else {
        panic!("expected a query");
    };
    assert!(query.fields.is_empty());
    assert!(query.predicate.is_empty());
}

#[test]
fn test_insert() {
    let statement = parse("insert into exam (stuid, grade) values (12, \"B\")").unwrap();
    assert_eq!(
        statement,
        Statement::Insert(InsertData {
            table: "exam".to_string(),
            fields: vec!["stuid".to_string(), "grade".to_string()],
            values: vec![Constant::Int(12), Constant::from("B")],
        })
    );
}

#[test]
fn test_update_with_field_expression() {
    let statement = parse("update student set majorid = id where gradyear = -1").unwrap();
    assert_eq!(
        statement,
        Statement::Modify(ModifyData {
            table: "student".to_string(),
            field: "majorid".to_string(),
            new_value: field("id"),
            predicate: predicate(vec![Term::new(field("gradyear"), constant(-1))]),
        })
    );
}

#[test]
fn test_delete_without_predicate() {
    let Ok(Statement::Delete(delete)) = parse("delete from exam") else {
        panic!("expected a delete");
    };
    assert_eq!(delete.table, "exam");
    assert!(delete.predicate.is_empty());
}

#[test]
fn test_create_table() {
    let Ok(Statement::CreateTable(create)) =
        parse("create table student (id integer, name varchar(10), gradyear int)")
    else {
        panic!("expected a create table");
    };
    assert_eq!(create.table, "student");
    assert_eq!(create.schema.fields(), ["id", "name", "gradyear"]);
    assert_eq!(create.schema.field_type("name"), Some(FieldType::Varchar));
    assert_eq!(create.schema.length("name"), Some(10));
    assert_eq!(create.schema.field_type("id"), Some(FieldType::Integer));
}

#[test]
fn test_syntax_errors() {
    assert!(matches!(parse("select from t"), Err(ParseError::ExpectedToken { .. })));
    assert!(matches!(parse("select a from t where"), Err(ParseError::EndOfInput)));
    assert!(matches!(parse("select a from t where a > 1"), Err(ParseError::ExpectedToken { .. })));
    assert!(matches!(parse("drop table t"), Err(ParseError::UnexpectedToken(_))));
    assert!(matches!(parse("select a from t; select b from t"), Err(ParseError::UnexpectedToken(_))));
    assert!(matches!(parse("create table t (a float)"), Err(ParseError::ExpectedToken { .. })));
    assert!(matches!(
        parse("insert into t (a) values ('unterminated)"),
        Err(ParseError::InvalidLiteral(_))
    ));
    assert_eq!(parse(""), Err(ParseError::EndOfInput));
}

#[test]
fn test_error_reports_position() {
    let Err(ParseError::ExpectedToken { found, .. }) = parse("select a\nfrom t where b c") else {
        panic!("expected a positioned error");
    };
    assert_eq!(found.literal, "c");
    assert_eq!(found.line, 2);
    assert_eq!(found.column, 16);
}

#[test]
fn test_lexer_token_stream() {
    let types: Vec<TokenType> = Lexer::new("SET x = 'y', 42;")
        .tokenize()
        .into_iter()
        .map(|t| t.token_type)
        .collect();
    assert_eq!(
        types,
        vec![
            TokenType::SET,
            TokenType::IDENTIFIER("x".to_string()),
            TokenType::EQUALS,
            TokenType::STRING("y".to_string()),
            TokenType::COMMA,
            TokenType::INTEGER(42),
            TokenType::SEMICOLON,
            TokenType::EOF,
        ]
    );
}
