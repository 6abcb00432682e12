use crate::schema::{DependencyResolver, TableSchema};
use anyhow::{anyhow, bail, Result};
use log::{debug, info};

/// Resolves which tables to process based on include/exclude filters
pub fn resolve_tables(
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
) -> Result<Vec<&'static TableSchema>> {
    let resolver = DependencyResolver::new();

    match (include, exclude) {
        (Some(_), Some(_)) => {
            bail!("Cannot use both --include and --exclude at the same time");
        }
        (Some(include_list), None) => {
            let refs: Vec<&str> = include_list.iter().map(|s| s.as_str()).collect();
            let tables = resolver.resolve_includes(&refs).map_err(|e| anyhow!(e))?;

            info!(
                "event=resolve_tables module=filter mode=include requested={} resolved={}",
                refs.len(),
                tables.len()
            );
            for t in &tables {
                debug!("event=resolve_tables module=filter table={}", t.name);
            }

            Ok(tables)
        }
        (None, Some(exclude_list)) => {
            let refs: Vec<&str> = exclude_list.iter().map(|s| s.as_str()).collect();
            let tables = resolver.resolve_excludes(&refs).map_err(|e| anyhow!(e))?;

            info!(
                "event=resolve_tables module=filter mode=exclude excluded={} resolved={}",
                refs.len(),
                tables.len()
            );

            Ok(tables)
        }
        (None, None) => Ok(resolver.all_tables_ordered()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tables: &[&TableSchema]) -> Vec<&'static str> {
        tables.iter().map(|t| t.name).collect()
    }

    #[test]
    fn test_include_and_exclude_conflict() {
        let err = resolve_tables(Some(vec!["terms".into()]), Some(vec!["tag_dict".into()]));
        assert!(err.is_err());
    }

    #[test]
    fn test_include_lookup_table_alone() {
        let tables = resolve_tables(Some(vec!["terms".into()]), None).unwrap();
        assert_eq!(names(&tables), vec!["terms"]);
    }

    #[test]
    fn test_no_filter_is_everything() {
        let tables = resolve_tables(None, None).unwrap();
        assert_eq!(names(&tables), crate::schema::table_names());
    }

    #[test]
    fn test_unknown_table_is_an_error() {
        assert!(resolve_tables(Some(vec!["nope".into()]), None).is_err());
    }
}
