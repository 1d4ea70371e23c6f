use super::quote_identifier;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Parse a `sortBy` option of the form `field:direction[,field:direction...]`.
    ///
    /// Direction `desc` (any case) sorts descending, anything else ascending.
    /// An entry without a colon sorts ascending on the whole token. Entries
    /// whose field is empty or not a plain identifier are dropped, so garbage
    /// input degrades to "no sort" instead of failing the request.
    pub fn parse_sort_by(sort_by: &str) -> Vec<FilterOrderInfo> {
        let mut out = Vec::new();
        for part in sort_by.split(',') {
            let mut it = part.splitn(2, ':');
            let column = it.next().unwrap_or_default().trim();
            if !Self::is_valid_column(column) {
                continue;
            }
            let sort = match it.next() {
                Some(dir) if dir.trim().eq_ignore_ascii_case("desc") => SortDirection::Desc,
                _ => SortDirection::Asc,
            };
            out.push(FilterOrderInfo { column: column.to_string(), sort });
        }
        out
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("{} {}", quote_identifier(&i.column), i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }

    fn is_valid_column(column: &str) -> bool {
        !column.is_empty() && column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_desc_key() {
        let keys = FilterOrder::parse_sort_by("name:desc");
        assert_eq!(keys, vec![FilterOrderInfo::desc("name")]);
    }

    #[test]
    fn direction_is_case_insensitive_and_defaults_to_asc() {
        let keys = FilterOrder::parse_sort_by("name:DESC,code:asc,status:sideways");
        assert_eq!(
            keys,
            vec![
                FilterOrderInfo::desc("name"),
                FilterOrderInfo::asc("code"),
                FilterOrderInfo::asc("status"),
            ]
        );
    }

    #[test]
    fn entry_without_colon_sorts_ascending_on_token() {
        assert_eq!(FilterOrder::parse_sort_by("lastName"), vec![FilterOrderInfo::asc("lastName")]);
    }

    #[test]
    fn garbage_yields_no_sort() {
        assert!(FilterOrder::parse_sort_by("").is_empty());
        assert!(FilterOrder::parse_sort_by(" , ,").is_empty());
        assert!(FilterOrder::parse_sort_by(":desc").is_empty());
        assert!(FilterOrder::parse_sort_by("name\"; drop table users:desc").is_empty());
    }

    #[test]
    fn generates_order_by_clause() {
        let sql = FilterOrder::generate(&[FilterOrderInfo::desc("createdAt"), FilterOrderInfo::asc("name")]);
        assert_eq!(sql, "ORDER BY \"createdAt\" DESC, \"name\" ASC");
        assert_eq!(FilterOrder::generate(&[]), "");
    }
}
