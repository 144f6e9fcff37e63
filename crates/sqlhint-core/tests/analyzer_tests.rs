// Integration tests for the SQL analyzer
use pretty_assertions::assert_eq;
use sqlhint_core::{
    Analyzer, AnalyzerOptions, Diagnostic, DiagnosticCode, Schema, SchemaBuilder, Severity, Span,
    SqlDialect,
};

fn setup_schema() -> Schema {
    let schema_sql = r#"
            CREATE TABLE users (
                id INT NOT NULL AUTO_INCREMENT PRIMARY KEY,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255),
                age INT,
                active BOOLEAN NOT NULL,
                created_at DATETIME,
                settings JSON,
                UNIQUE KEY uq_email (email)
            );

            CREATE TABLE orders (
                id INT NOT NULL PRIMARY KEY,
                user_id INT NOT NULL,
                total DECIMAL(10, 2),
                KEY idx_user (user_id)
            );
        "#;

    let mut builder = SchemaBuilder::new("app");
    builder.parse(schema_sql).unwrap();
    builder.build()
}

fn analyze(sql: &str) -> Vec<Diagnostic> {
    Analyzer::with_schema(setup_schema()).analyze(sql).unwrap()
}

fn codes(diagnostics: &[Diagnostic]) -> Vec<DiagnosticCode> {
    diagnostics.iter().map(|d| d.code).collect()
}

#[test]
fn test_empty_input() {
    let diagnostics = Analyzer::default().analyze("").unwrap();
    assert_eq!(
        diagnostics,
        vec![Diagnostic::error(
            DiagnosticCode::EmptyQuery,
            "Query is empty.",
            Span::new(0, 0)
        )]
    );
}

#[test]
fn test_valid_queries_without_schema() {
    let analyzer = Analyzer::default();
    for sql in [
        "SELECT id, name FROM users",
        "SELECT u.id, o.total FROM users u JOIN orders o ON o.user_id = u.id",
        "SELECT COUNT(*) AS c FROM orders GROUP BY user_id ORDER BY c",
    ] {
        let diagnostics = analyzer.analyze(sql).unwrap();
        assert!(diagnostics.is_empty(), "{sql}: {diagnostics:?}");
    }
}

#[test]
fn test_unterminated_string() {
    let diagnostics = Analyzer::default().analyze("SELECT \"hello").unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, DiagnosticCode::LexerError);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!(diagnostics[0].span, Span::new(0, 13));
}

#[test]
fn test_truncated_keyword() {
    let diagnostics = Analyzer::default().analyze("SELEC * FROM users").unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, DiagnosticCode::ParserError);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!(diagnostics[0].span, Span::new(0, 5));
}

#[test]
fn test_incomplete_statement() {
    let diagnostics = Analyzer::default().analyze("SELECT * FROM").unwrap();
    assert_eq!(codes(&diagnostics), vec![DiagnosticCode::ParserError]);
    assert_eq!(diagnostics[0].span, Span::new(13, 13));

    let diagnostics = Analyzer::default()
        .analyze("SELECT 1;\nSELECT * FROM")
        .unwrap();
    assert_eq!(diagnostics[0].span, Span::new(23, 23));
}

#[test]
fn test_syntax_error_does_not_stop_later_statements() {
    let diagnostics = analyze("SELEC 1; SELECT * FROM usrs");
    assert_eq!(
        codes(&diagnostics),
        vec![DiagnosticCode::ParserError, DiagnosticCode::MissingTable]
    );
}

#[test]
fn test_insert_arity_mismatch() {
    let diagnostics = Analyzer::default()
        .analyze("INSERT INTO t (a, b) VALUES (x)")
        .unwrap();
    assert_eq!(
        diagnostics,
        vec![Diagnostic::warning(
            DiagnosticCode::ColumnRowMismatch,
            "Column count does not match value count.",
            Span::new(0, 31)
        )]
    );
}

#[test]
fn test_insert_without_field_list() {
    let diagnostics = Analyzer::default()
        .analyze("INSERT INTO t VALUES (1)")
        .unwrap();
    assert_eq!(
        diagnostics,
        vec![Diagnostic::warning(
            DiagnosticCode::ColumnRowMismatch,
            "Column count does not match value count.",
            Span::new(0, 24)
        )]
    );
}

#[test]
fn test_insert_select_has_no_rows_to_count() {
    let diagnostics = analyze("INSERT INTO orders (id, user_id) SELECT id, id FROM users");
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn test_insert_arity_checked_per_row() {
    let diagnostics = analyze("INSERT INTO users (name, age) VALUES ('a', 1), ('b')");
    assert_eq!(codes(&diagnostics), vec![DiagnosticCode::ColumnRowMismatch]);
}

#[test]
fn test_missing_table_with_suggestion() {
    let diagnostics = analyze("SELECT * FROM usrs");
    assert_eq!(
        diagnostics,
        vec![Diagnostic::warning(
            DiagnosticCode::MissingTable,
            "Table 'usrs' does not exist in database 'app'. Did you mean 'users'?",
            Span::new(14, 18)
        )]
    );

    let diagnostics = analyze("SELECT * FROM invalid_table");
    assert_eq!(codes(&diagnostics), vec![DiagnosticCode::MissingTable]);
    assert!(diagnostics[0]
        .message
        .starts_with("Table 'invalid_table' does not exist in database 'app'. Did you mean '"));
}

#[test]
fn test_missing_table_without_candidates() {
    let analyzer = Analyzer::with_schema(Schema::new("empty"));
    let diagnostics = analyzer.analyze("SELECT * FROM users").unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].message,
        "Table 'users' does not exist in database 'empty'."
    );
}

#[test]
fn test_case_mismatch_suggests_exact_name() {
    let diagnostics = analyze("SELECT * FROM USERS");
    assert_eq!(
        diagnostics,
        vec![Diagnostic::warning(
            DiagnosticCode::MissingTable,
            "Table 'USERS' does not exist in database 'app'. Did you mean 'users'?",
            Span::new(14, 19)
        )]
    );

    let diagnostics = analyze("SELECT Name FROM users");
    assert_eq!(
        diagnostics,
        vec![Diagnostic::warning(
            DiagnosticCode::MissingColumn,
            "Column 'Name' does not exist in table 'users'. Did you mean 'name'?",
            Span::new(7, 11)
        )]
    );
}

#[test]
fn test_missing_column() {
    let diagnostics = analyze("SELECT u.nme FROM users u");
    assert_eq!(
        diagnostics,
        vec![Diagnostic::warning(
            DiagnosticCode::MissingColumn,
            "Column 'nme' does not exist in table 'users'. Did you mean 'name'?",
            Span::new(9, 12)
        )]
    );
}

#[test]
fn test_missing_index_suggestion() {
    let diagnostics = analyze("SELECT * FROM users WHERE name = \"x\"");
    assert_eq!(
        diagnostics,
        vec![Diagnostic::suggestion(
            DiagnosticCode::MissingIndex,
            "You can optimize this query by adding a MySQL index for column 'name'.",
            Span::new(26, 30)
        )]
    );
}

#[test]
fn test_indexed_and_json_columns() {
    assert!(analyze("SELECT * FROM users WHERE id = 1 AND email = 'a@b.c'").is_empty());
    assert!(analyze("SELECT * FROM orders WHERE user_id = 7").is_empty());
    assert!(analyze("SELECT * FROM users WHERE settings = '{}'").is_empty());
}

#[test]
fn test_type_mismatches() {
    let diagnostics = analyze("INSERT INTO users (name, age, active) VALUES (1, 'x', 3)");
    assert_eq!(
        diagnostics,
        vec![
            Diagnostic::warning(
                DiagnosticCode::TypeMismatch,
                "Type number is not assignable to type string.",
                Span::new(46, 47)
            ),
            Diagnostic::warning(
                DiagnosticCode::TypeMismatch,
                "Type string is not assignable to type number.",
                Span::new(49, 52)
            ),
            Diagnostic::warning(
                DiagnosticCode::TypeMismatch,
                "Type number is not assignable to type boolean.",
                Span::new(54, 55)
            ),
        ]
    );
}

#[test]
fn test_matching_types() {
    let diagnostics =
        analyze("INSERT INTO users (name, age, active, email) VALUES ('bob', 3, TRUE, NULL)");
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn test_null_into_required_column() {
    let diagnostics = analyze("INSERT INTO users (name) VALUES (NULL)");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].message,
        "Type null is not assignable to type string."
    );
}

#[test]
fn test_date_strings() {
    assert!(analyze("UPDATE users SET created_at = '2020-04-06T14:28:25.774Z'").is_empty());

    let diagnostics = analyze("UPDATE users SET created_at = 'some-string'");
    assert_eq!(
        diagnostics,
        vec![Diagnostic::warning(
            DiagnosticCode::TypeMismatch,
            "Type string is not assignable to type date.",
            Span::new(30, 43)
        )]
    );
}

#[test]
fn test_literal_spans_skip_unchecked_expressions() {
    let sql = "SELECT * FROM users WHERE created_at > NOW() - INTERVAL 1 DAY AND name = 1";
    let diagnostics = analyze(sql);
    assert_eq!(
        diagnostics[0],
        Diagnostic::warning(
            DiagnosticCode::TypeMismatch,
            "Type number is not assignable to type string.",
            Span::new(73, 74)
        )
    );

    let sql = "SELECT * FROM users WHERE name = TRIM('a') OR name = 'a' AND age = 'a'";
    let mismatch = analyze(sql)
        .into_iter()
        .find(|d| d.code == DiagnosticCode::TypeMismatch)
        .unwrap();
    assert_eq!(mismatch.span, Span::new(67, 70));
}

#[test]
fn test_typed_date_literal() {
    let diagnostics = analyze("SELECT * FROM users WHERE created_at = DATE '2020-01-01'");
    assert_eq!(codes(&diagnostics), vec![DiagnosticCode::MissingIndex]);
}

#[test]
fn test_diagnostics_in_source_order() {
    let diagnostics =
        analyze("SELECT u.nme, o.totl FROM users u JOIN orders o ON o.user_id = u.id");
    let messages: Vec<_> = diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Column 'nme' does not exist in table 'users'. Did you mean 'name'?",
            "Column 'totl' does not exist in table 'orders'. Did you mean 'total'?",
        ]
    );
}

#[test]
fn test_aliases_resolve() {
    let diagnostics = analyze("SELECT u.name AS n FROM users AS u WHERE u.age > 18 ORDER BY n");
    assert_eq!(
        diagnostics,
        vec![Diagnostic::suggestion(
            DiagnosticCode::MissingIndex,
            "You can optimize this query by adding a MySQL index for column 'age'.",
            Span::new(43, 46)
        )]
    );
}

#[test]
fn test_offsets_are_global_across_statements() {
    let diagnostics = analyze("SELECT * FROM users;\nSELECT * FROM usrs");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].span, Span::new(35, 39));
}

#[test]
fn test_ddl_is_not_checked() {
    assert!(analyze("CREATE TABLE ghosts (id INT); DROP TABLE ghosts").is_empty());
}

#[test]
fn test_no_schema_only_syntax_and_arity() {
    let diagnostics = Analyzer::default()
        .analyze("SELECT * FROM ghosts WHERE x = 1")
        .unwrap();
    assert!(diagnostics.is_empty());
}

#[test]
fn test_analyze_is_idempotent() {
    let analyzer = Analyzer::with_schema(setup_schema());
    let sql = "SELECT nme FROM users WHERE age = 'x'; INSERT INTO orders (id) VALUES (1, 2)";
    let first = analyzer.analyze(sql).unwrap();
    assert_eq!(
        codes(&first),
        vec![
            DiagnosticCode::MissingColumn,
            DiagnosticCode::TypeMismatch,
            DiagnosticCode::MissingIndex,
            DiagnosticCode::ColumnRowMismatch,
        ]
    );
    assert_eq!(analyzer.analyze(sql).unwrap(), first);
}

#[test]
fn test_postgres_dialect() {
    let options = AnalyzerOptions::default()
        .with_dialect(SqlDialect::PostgreSQL)
        .with_schema(setup_schema());
    let analyzer = Analyzer::new(options);

    assert!(analyzer
        .analyze("SELECT \"name\" FROM users WHERE id = $1")
        .unwrap()
        .is_empty());
    assert_eq!(
        codes(&analyzer.analyze("SELECT * FROM users WHERE age = 'x'").unwrap()),
        vec![DiagnosticCode::TypeMismatch, DiagnosticCode::MissingIndex]
    );
}

#[test]
fn test_schema_from_json() {
    let schema = Schema::from_json_str(
        r#"{
            "name": "shop",
            "tables": [
                {
                    "name": "products",
                    "columns": [
                        {"name": "sku", "declared_type": "string", "storage_type": "varchar(20)", "has_index": true},
                        {"name": "price", "declared_type": "number", "storage_type": "decimal(10,2)"}
                    ]
                }
            ]
        }"#,
    )
    .unwrap();

    let diagnostics = Analyzer::with_schema(schema)
        .analyze("SELECT * FROM products WHERE sku = 'a' AND price = 'cheap'")
        .unwrap();
    assert_eq!(
        codes(&diagnostics),
        vec![DiagnosticCode::TypeMismatch, DiagnosticCode::MissingIndex]
    );
}

#[test]
fn test_span_renders_with_miette() {
    let sql = "SELECT 'é' FROM usrs";
    let diagnostics = analyze(sql);
    assert_eq!(diagnostics[0].span, Span::new(16, 20));
    let source_span = diagnostics[0].span.to_source_span(sql);
    assert_eq!(source_span.offset(), 17);
    assert_eq!(source_span.len(), 4);
}
