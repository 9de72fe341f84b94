//! Search query translation
//!
//! User input never becomes SQL text. Each translator returns a
//! [`ParameterizedQuery`] whose SQL is a fixed template and whose parameters
//! carry the (escaped) user input.
//!
//! Two flavors exist:
//! - [`translate`]: recipe reference search with glob `*` over
//!   `name/version`, using `LIKE ... ESCAPE '\'`
//! - [`translate_listing`]: project listing search using FTS5 `MATCH`, with a
//!   page query and a total-count query over the same expression

/// Rows returned by a recipe search
pub const SEARCH_PAGE_SIZE: i64 = 100;
/// Rows returned per listing page
pub const LISTING_PAGE_SIZE: i64 = 100;
/// Packager recipes are published under
pub const PACKAGER: &str = "conan";

const LIKE_ESCAPE: char = '\\';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterizedQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchFlags {
    pub case_sensitive: bool,
}

/// Columns a listing search matches against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchScope {
    #[default]
    All,
    Name,
    Topic,
}

impl MatchScope {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            "name" => Some(Self::Name),
            "topic" => Some(Self::Topic),
            _ => None,
        }
    }

    fn column(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Name => Some("name"),
            Self::Topic => Some("topic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub text: String,
    pub scope: MatchScope,
    pub offset: i64,
}

/// Page and total-count queries for one listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQueries {
    pub page: ParameterizedQuery,
    pub count: ParameterizedQuery,
}

/// Turn a glob query into a LIKE pattern
///
/// Order matters: the escape character first, then literal `_`, then
/// literal `%`, and only then `*` becomes the `%` wildcard.
pub fn escape_pattern(raw: &str) -> String {
    raw.replace(LIKE_ESCAPE, "\\\\")
        .replace('_', "\\_")
        .replace('%', "\\%")
        .replace('*', "%")
}

/// Recipe reference search over `name/version`
pub fn translate(raw_query: &str, flags: SearchFlags) -> ParameterizedQuery {
    let condition = if flags.case_sensitive {
        "name || '/' || version LIKE ? ESCAPE '\\'"
    } else {
        "lower(name || '/' || version) LIKE lower(?) ESCAPE '\\'"
    };

    let sql = format!(
        "SELECT name || '/' || version || '@' || COALESCE(identity, '_/_') AS reference \
         FROM package \
         WHERE packager = ? AND {condition} \
         ORDER BY name, version, identity \
         LIMIT ?"
    );

    ParameterizedQuery {
        sql,
        params: vec![
            SqlParam::Text(PACKAGER.to_string()),
            SqlParam::Text(escape_pattern(raw_query)),
            SqlParam::Int(SEARCH_PAGE_SIZE),
        ],
    }
}

/// Build the FTS5 expression for free text, `None` when it has no terms
///
/// Every term is quoted as an FTS5 string so operators and column syntax in
/// the input stay literal. A trailing `*` survives as a prefix marker.
pub fn match_expression(text: &str, scope: MatchScope) -> Option<String> {
    let terms: Vec<String> = text
        .split_whitespace()
        .filter_map(|term| {
            let (body, prefix) = match term.strip_suffix('*') {
                Some(body) => (body.trim_end_matches('*'), true),
                None => (term, false),
            };
            if body.is_empty() {
                return None;
            }

            let mut phrase = format!("\"{}\"", body.replace('"', "\"\""));
            if prefix {
                phrase.push('*');
            }
            Some(match scope.column() {
                Some(column) => format!("{column} : {phrase}"),
                None => phrase,
            })
        })
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

/// Full-text project listing with pagination
pub fn translate_listing(query: &ListingQuery) -> Option<ListingQueries> {
    let expression = match_expression(&query.text, query.scope)?;

    let page = ParameterizedQuery {
        sql: "SELECT project.uuid, project.name, project.description_brief, project.topic, \
              project.license, project.updated, project.info, project.downloads \
              FROM project_fts JOIN project ON project.id = project_fts.rowid \
              WHERE project_fts MATCH ? \
              ORDER BY project.name, project.id \
              LIMIT ? OFFSET ?"
            .to_string(),
        params: vec![
            SqlParam::Text(expression.clone()),
            SqlParam::Int(LISTING_PAGE_SIZE),
            SqlParam::Int(query.offset),
        ],
    };

    let count = ParameterizedQuery {
        sql: "SELECT COUNT(*) FROM project_fts WHERE project_fts MATCH ?".to_string(),
        params: vec![SqlParam::Text(expression)],
    };

    Some(ListingQueries { page, count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_before_translating_glob() {
        assert_eq!(escape_pattern("a_b*"), "a\\_b%");
        assert_eq!(escape_pattern("100%*"), "100\\%%");
        assert_eq!(escape_pattern("zlib/*"), "zlib/%");
        assert_eq!(escape_pattern("*_%*"), "%\\_\\%%");
        assert_eq!(escape_pattern("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn raw_query_never_reaches_sql_text() {
        let hostile = "x' OR 1=1; DROP TABLE package; --";
        let query = translate(hostile, SearchFlags::default());

        assert!(!query.sql.contains(hostile));
        assert!(!query.sql.contains("DROP"));
        assert_eq!(query.params[1], SqlParam::Text(escape_pattern(hostile)));
    }

    #[test]
    fn case_flag_switches_comparison() {
        let insensitive = translate("zlib*", SearchFlags::default());
        assert!(insensitive.sql.contains("lower(name || '/' || version) LIKE lower(?)"));

        let sensitive = translate("zlib*", SearchFlags { case_sensitive: true });
        assert!(sensitive.sql.contains("name || '/' || version LIKE ?"));
        assert!(!sensitive.sql.contains("lower("));
    }

    #[test]
    fn search_is_capped_and_ordered() {
        let query = translate("*", SearchFlags::default());
        assert!(query.sql.contains("ORDER BY name"));
        assert_eq!(query.params.last(), Some(&SqlParam::Int(SEARCH_PAGE_SIZE)));
        assert_eq!(query.params[0], SqlParam::Text(PACKAGER.to_string()));
    }

    #[test]
    fn match_expression_quotes_terms() {
        assert_eq!(
            match_expression("json parser", MatchScope::All).as_deref(),
            Some("\"json\" \"parser\"")
        );
        assert_eq!(
            match_expression("say \"hi\" OR", MatchScope::All).as_deref(),
            Some("\"say\" \"\"\"hi\"\"\" \"OR\"")
        );
    }

    #[test]
    fn match_expression_scopes_and_prefixes() {
        assert_eq!(
            match_expression("boo*", MatchScope::Name).as_deref(),
            Some("name : \"boo\"*")
        );
        assert_eq!(
            match_expression("cli  header-only", MatchScope::Topic).as_deref(),
            Some("topic : \"cli\" topic : \"header-only\"")
        );
    }

    #[test]
    fn blank_text_has_no_expression() {
        assert!(match_expression("   ", MatchScope::All).is_none());
        assert!(match_expression("* **", MatchScope::Name).is_none());
        assert!(
            translate_listing(&ListingQuery {
                text: "".into(),
                scope: MatchScope::All,
                offset: 0
            })
            .is_none()
        );
    }

    #[test]
    fn listing_page_and_count_share_expression() {
        let queries = translate_listing(&ListingQuery {
            text: "json".into(),
            scope: MatchScope::Name,
            offset: 200,
        })
        .unwrap();

        assert_eq!(queries.page.params[0], queries.count.params[0]);
        assert_eq!(queries.page.params[1], SqlParam::Int(LISTING_PAGE_SIZE));
        assert_eq!(queries.page.params[2], SqlParam::Int(200));
        assert!(queries.count.sql.starts_with("SELECT COUNT(*)"));
    }
}
