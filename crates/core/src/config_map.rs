//! Mapping spec files to the server configuration they run under.
//!
//! The companion `Main.hs` lists default specs in one `uncurry describe`
//! list and wires the rest individually behind `before <fixture>`. Both are
//! recognised by pattern only.

use std::sync::LazyLock;

use regex::Regex;

pub const DEFAULT_CONFIG: &str = "default";

static SPECS_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"specs\s*=\s*uncurry\s+describe\s*<\$>\s*\[([\s\S]*?)\]")
        .expect("static specs list pattern")
});

static SPECS_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\("([^"]+)"\s*,\s*\S+\)"#).expect("static entry pattern"));

/// `before <fixture>` names and the configuration each one selects.
const FIXTURE_CONFIGS: &[(&str, &str)] = &[
    ("maxRowsApp", "max-rows"),
    ("planEnabledApp", "plan-enabled"),
    ("aggregatesEnabled", "aggregates-enabled"),
    ("noAnonApp", "no-anon"),
    ("pgSafeUpdateApp", "pg-safe-update"),
    ("serverTiming", "server-timing"),
    ("unicodeApp", "unicode"),
    ("multipleSchemaApp", "multiple-schema"),
    ("obsApp", "observability"),
];

static FIXTURE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    FIXTURE_CONFIGS
        .iter()
        .map(|&(fixture, config)| {
            let src = format!(r#"before\s+{}[\s\S]*?describe\s+"([^"]+)""#, fixture);
            (Regex::new(&src).expect("static fixture pattern"), config)
        })
        .collect()
});

/// Spec names to configuration tags, in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMap {
    entries: Vec<(String, String)>,
}

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. An overwritten key keeps its original position.
    pub fn set(&mut self, key: impl Into<String>, config: impl Into<String>) {
        let key = key.into();
        let config = config.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = config,
            None => self.entries.push((key, config)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Configuration for a spec file stem such as `QuerySpec`.
    ///
    /// The first key containing the stem, or the stem without its `Spec`
    /// suffix, wins. Unknown specs run under [`DEFAULT_CONFIG`].
    pub fn config_for(&self, stem: &str) -> &str {
        let short = stem.replacen("Spec", "", 1);
        self.entries
            .iter()
            .find(|(k, _)| k.contains(stem) || k.contains(short.as_str()))
            .map_or(DEFAULT_CONFIG, |(_, v)| v.as_str())
    }
}

/// Build the configuration map from the text of `Main.hs`.
pub fn parse_config_map(main_hs: &str) -> ConfigMap {
    let mut map = ConfigMap::new();

    if let Some(list) = SPECS_LIST.captures(main_hs).and_then(|c| c.get(1)) {
        for entry in SPECS_ENTRY.captures_iter(list.as_str()) {
            map.set(&entry[1], DEFAULT_CONFIG);
        }
    }

    for (pattern, config) in FIXTURE_PATTERNS.iter() {
        if let Some(c) = pattern.captures(main_hs) {
            map.set(&c[1], *config);
        }
    }

    tracing::debug!(entries = map.len(), "parsed config map");
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN_HS: &str = r#"
main = do
  let specs = uncurry describe <$> [
          ("Feature.Query.QuerySpec"        , Feature.Query.QuerySpec.spec)
        , ("Feature.Query.RangeSpec"        , Feature.Query.RangeSpec.spec)
        , ("Feature.Query.PlanSpec"         , Feature.Query.PlanSpec.spec)
        ]

  hspec $ do
    mapM_ (parallel . before withApp) specs

    parallel $ before maxRowsApp $
      describe "Feature.Query.LimitedSpec" Feature.Query.LimitedSpec.spec

    parallel $ before planEnabledApp $
      describe "Feature.Query.PlanSpec" Feature.Query.PlanSpec.spec

    parallel $ before obsApp $
      describe "Feature.ObservabilitySpec" Feature.ObservabilitySpec.spec
"#;

    #[test]
    fn default_list_and_overrides() {
        let map = parse_config_map(MAIN_HS);
        assert_eq!(map.get("Feature.Query.QuerySpec"), Some("default"));
        assert_eq!(map.get("Feature.Query.LimitedSpec"), Some("max-rows"));
        assert_eq!(map.get("Feature.ObservabilitySpec"), Some("observability"));
        assert_eq!(map.len(), 5);
    }

    #[test]
    fn override_keeps_first_insertion_position() {
        let map = parse_config_map(MAIN_HS);
        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys[2], "Feature.Query.PlanSpec");
        assert_eq!(map.get("Feature.Query.PlanSpec"), Some("plan-enabled"));
    }

    #[test]
    fn lookup_by_stem() {
        let map = parse_config_map(MAIN_HS);
        assert_eq!(map.config_for("LimitedSpec"), "max-rows");
        assert_eq!(map.config_for("PlanSpec"), "plan-enabled");
        assert_eq!(map.config_for("RangeSpec"), "default");
        assert_eq!(map.config_for("UnlistedSpec"), "default");
    }

    #[test]
    fn empty_input_gives_empty_map() {
        let map = parse_config_map("");
        assert!(map.is_empty());
        assert_eq!(map.config_for("QuerySpec"), DEFAULT_CONFIG);
    }
}
