/// Recursively deep-merge `overlay` into `base`.
///
/// - Tables merge recursively per-field.
/// - Scalars and arrays from the overlay **replace** the base value.
pub(crate) fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

/// Whether a dotted path such as `"logging.level"` is set in `value`.
pub(crate) fn has_path(value: &toml::Value, path: &str) -> bool {
    let mut current = value;
    for key in path.split('.') {
        match current.get(key) {
            Some(next) => current = next,
            None => return false,
        }
    }
    true
}

/// Set a dotted path in `value`, creating intermediate tables.
pub(crate) fn set_path(value: &mut toml::Value, path: &str, new: toml::Value) {
    let mut current = value;
    let mut keys = path.split('.').peekable();
    while let Some(key) = keys.next() {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        if keys.peek().is_none() {
            table.insert(key.to_owned(), new);
            return;
        }
        current = table
            .entry(key.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn overlay_replaces_scalars_and_merges_tables() {
        let mut base = parse("[logging]\nlevel = \"info\"\nformat = \"compact\"");
        deep_merge(&mut base, &parse("[logging]\nlevel = \"debug\""));
        assert_eq!(base, parse("[logging]\nlevel = \"debug\"\nformat = \"compact\""));
    }

    #[test]
    fn arrays_are_replaced_not_appended() {
        let mut base = parse("[plugins]\ndisabled = [\"a\"]");
        deep_merge(&mut base, &parse("[plugins]\ndisabled = [\"b\"]"));
        assert_eq!(base, parse("[plugins]\ndisabled = [\"b\"]"));
    }

    #[test]
    fn paths_can_be_queried_and_set() {
        let mut value = parse("[logging]\nlevel = \"info\"");
        assert!(has_path(&value, "logging.level"));
        assert!(!has_path(&value, "plugins.directory"));

        set_path(&mut value, "plugins.directory", toml::Value::String("/opt".into()));
        assert!(has_path(&value, "plugins.directory"));
    }
}
