// SQL識別子クォートユーティリティ
//
// 各データベース方言用の識別子クォート関数と、
// クォート済み修飾名（schema.name）の解析を提供します。

use crate::core::config::Dialect;

/// 方言ごとの識別子クォート文字
pub fn quote_char(dialect: Dialect) -> char {
    match dialect {
        Dialect::PostgreSQL | Dialect::SQLite => '"',
        Dialect::MySQL => '`',
    }
}

/// PostgreSQL用識別子クォート（ダブルクォート）
///
/// 識別子内のダブルクォートは二重にエスケープします。
///
/// # Examples
/// ```
/// use strata_lifecycle::adapters::sql_quote::quote_identifier_postgres;
/// assert_eq!(quote_identifier_postgres("users"), r#""users""#);
/// assert_eq!(quote_identifier_postgres(r#"table"name"#), r#""table""name""#);
/// ```
pub fn quote_identifier_postgres(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// MySQL用識別子クォート（バッククォート）
///
/// 識別子内のバッククォートは二重にエスケープします。
///
/// # Examples
/// ```
/// use strata_lifecycle::adapters::sql_quote::quote_identifier_mysql;
/// assert_eq!(quote_identifier_mysql("users"), "`users`");
/// assert_eq!(quote_identifier_mysql("table`name"), "`table``name`");
/// ```
pub fn quote_identifier_mysql(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// SQLite用識別子クォート（ダブルクォート）
///
/// 識別子内のダブルクォートは二重にエスケープします。
pub fn quote_identifier_sqlite(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// 方言に応じて識別子を常にエスケープしてクォート
///
/// カタログから得た生の識別子用。クォート文字で始まる名前もそのまま名前の一部として扱います。
pub fn escape_identifier(dialect: Dialect, name: &str) -> String {
    match dialect {
        Dialect::PostgreSQL => quote_identifier_postgres(name),
        Dialect::MySQL => quote_identifier_mysql(name),
        Dialect::SQLite => quote_identifier_sqlite(name),
    }
}

/// 方言に応じて識別子をクォート
///
/// 利用者が渡したテキスト用。すでに正しい形でクォートされた識別子はそのまま返します（冪等）。
/// カタログ上の生の名前には [`escape_identifier`] を使います。
pub fn quote_identifier(dialect: Dialect, name: &str) -> String {
    if is_quoted(dialect, name) {
        return name.to_string();
    }
    escape_identifier(dialect, name)
}

/// 生の識別子をクォートしてドットで連結（schema.table 形式）
///
/// 各部分は常にエスケープされます。
pub fn quote_qualified(dialect: Dialect, parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| escape_identifier(dialect, part))
        .collect::<Vec<_>>()
        .join(".")
}

/// 識別子が正しい形式でクォート済みかどうか
///
/// 先頭と末尾がクォート文字で、内部のクォート文字がすべて二重化されている場合のみtrue。
pub fn is_quoted(dialect: Dialect, name: &str) -> bool {
    let q = quote_char(dialect);
    let mut chars = name.chars();
    if chars.next() != Some(q) || chars.next_back() != Some(q) {
        return false;
    }
    let mut inner = chars.peekable();
    while let Some(c) = inner.next() {
        if c == q {
            if inner.peek() == Some(&q) {
                inner.next();
            } else {
                return false;
            }
        }
    }
    true
}

/// クォート済み修飾名を識別子の列に分解
///
/// `"app"."User"` → `["app", "User"]`。クォートされていない部分はそのまま扱います。
/// 不正な形式（閉じられていないクォート、空の部分）の場合は None を返します。
pub fn split_qualified_name(dialect: Dialect, qualified: &str) -> Option<Vec<String>> {
    let q = quote_char(dialect);
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = qualified.chars().peekable();
    let mut quoted_part = false;

    while let Some(c) = chars.next() {
        if c == q && current.is_empty() && !quoted_part {
            quoted_part = true;
            loop {
                match chars.next() {
                    Some(ch) if ch == q => {
                        if chars.peek() == Some(&q) {
                            current.push(q);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    Some(ch) => current.push(ch),
                    None => return None,
                }
            }
        } else if c == '.' {
            if current.is_empty() && !quoted_part {
                return None;
            }
            parts.push(std::mem::take(&mut current));
            quoted_part = false;
        } else if quoted_part {
            // 閉じクォートの後に区切り以外の文字
            return None;
        } else {
            current.push(c);
        }
    }

    if current.is_empty() && !quoted_part {
        return None;
    }
    parts.push(current);
    Some(parts)
}

/// クォート済み修飾名を (schema, name) に分解
pub fn parse_qualified_name(dialect: Dialect, qualified: &str) -> Option<(String, String)> {
    let mut parts = split_qualified_name(dialect, qualified)?;
    if parts.len() != 2 {
        return None;
    }
    let name = parts.pop()?;
    let schema = parts.pop()?;
    Some((schema, name))
}

/// SQL文字列リテラルとしてエスケープ
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
