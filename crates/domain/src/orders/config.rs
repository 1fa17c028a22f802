use std::{
    collections::{BTreeMap, BTreeSet},
    env::{self, VarError},
    fmt, fs,
    path::Path,
};

use serde::{
    de::{self, MapAccess, Visitor},
    Deserialize, Deserializer, Serialize,
};

use crate::errors::Error;

use super::{OrderStatus, TransitionTable};

/// Names a JSON transition table to load instead of the built-in default.
pub const TRANSITIONS_FILE_ENV: &str = "ORDER_TRANSITIONS_FILE";

/// On-disk form of a [`TransitionTable`].
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct TransitionTableConfig {
    #[serde(default = "default_allow_noop")]
    pub allow_noop: bool,

    /// Statuses the table must leave without outgoing edges.
    #[serde(default)]
    pub terminal: Vec<OrderStatus>,

    #[serde(deserialize_with = "unique_sources")]
    pub transitions: BTreeMap<OrderStatus, Vec<OrderStatus>>,
}

fn default_allow_noop() -> bool {
    true
}

// A JSON object may repeat a key; the last one would silently win.
fn unique_sources<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<OrderStatus, Vec<OrderStatus>>, D::Error>
where
    D: Deserializer<'de>,
{
    struct UniqueSources;

    impl<'de> Visitor<'de> for UniqueSources {
        type Value = BTreeMap<OrderStatus, Vec<OrderStatus>>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map from order status to target statuses")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut transitions = BTreeMap::new();
            while let Some((from, targets)) = map.next_entry::<OrderStatus, Vec<OrderStatus>>()? {
                if transitions.insert(from, targets).is_some() {
                    return Err(de::Error::custom(format_args!(
                        "{from} is listed more than once in transitions"
                    )));
                }
            }
            Ok(transitions)
        }
    }

    deserializer.deserialize_map(UniqueSources)
}

impl TransitionTableConfig {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

impl TryFrom<TransitionTableConfig> for TransitionTable {
    type Error = Error;

    fn try_from(config: TransitionTableConfig) -> Result<Self, Self::Error> {
        let mut builder = TransitionTable::builder().allow_noop(config.allow_noop);

        for (from, targets) in &config.transitions {
            let mut seen = BTreeSet::new();
            for to in targets {
                if !seen.insert(*to) {
                    return Err(Error::Configuration {
                        message: format!("{from} -> {to} is listed more than once"),
                    });
                }
                builder = builder.allow(*from, *to);
            }
        }

        let table = builder.build()?;

        if let Some(status) = config
            .terminal
            .iter()
            .find(|status| !table.is_terminal(**status))
        {
            return Err(Error::Configuration {
                message: format!("terminal status {status} has outgoing transitions"),
            });
        }

        Ok(table)
    }
}

impl From<&TransitionTable> for TransitionTableConfig {
    fn from(table: &TransitionTable) -> Self {
        let mut transitions: BTreeMap<OrderStatus, Vec<OrderStatus>> = BTreeMap::new();
        for transition in table.transitions() {
            transitions
                .entry(transition.from)
                .or_default()
                .push(transition.to);
        }

        Self {
            allow_noop: table.allows_noop(),
            terminal: OrderStatus::ALL
                .into_iter()
                .filter(|status| table.is_terminal(*status))
                .collect(),
            transitions,
        }
    }
}

/// Loads the table named by `ORDER_TRANSITIONS_FILE`, or the default table when unset.
pub fn load_from_env() -> Result<TransitionTable, Error> {
    match env::var(TRANSITIONS_FILE_ENV) {
        Ok(path) if !path.trim().is_empty() => {
            tracing::info!(%path, "loading order transition table");
            TransitionTableConfig::from_file(path.trim())?.try_into()
        }
        Ok(_) | Err(VarError::NotPresent) => Ok(TransitionTable::default()),
        Err(VarError::NotUnicode(raw)) => Err(Error::Configuration {
            message: format!("{TRANSITIONS_FILE_ENV} is not valid Unicode: {raw:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::OrderStatus::*;

    #[test]
    fn parses_a_table_document() {
        let config = TransitionTableConfig::from_json(
            r#"{
                "allow_noop": false,
                "terminal": ["DELIVERED"],
                "transitions": {
                    "CREATED": ["CONFIRMED"],
                    "CONFIRMED": ["DELIVERED"]
                }
            }"#,
        )
        .unwrap();

        let table = TransitionTable::try_from(config).unwrap();
        assert!(!table.allows_noop());
        assert!(table.is_allowed(Created, Confirmed));
        assert!(table.is_allowed(Confirmed, Delivered));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn optional_fields_default() {
        let config =
            TransitionTableConfig::from_json(r#"{ "transitions": { "CREATED": ["CANCELLED"] } }"#)
                .unwrap();

        assert!(config.allow_noop);
        assert!(config.terminal.is_empty());
    }

    #[test]
    fn unknown_status_names_fail_to_parse() {
        let err =
            TransitionTableConfig::from_json(r#"{ "transitions": { "CREATED": ["SHIPPED"] } }"#)
                .unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn duplicate_targets_are_rejected() {
        let config = TransitionTableConfig::from_json(
            r#"{ "transitions": { "CREATED": ["CONFIRMED", "CONFIRMED"] } }"#,
        )
        .unwrap();

        let err = TransitionTable::try_from(config).unwrap_err();
        assert!(err.to_string().contains("CREATED -> CONFIRMED is listed more than once"));
    }

    #[test]
    fn repeated_sources_are_rejected() {
        let err = TransitionTableConfig::from_json(
            r#"{ "transitions": { "CREATED": ["CONFIRMED"], "CREATED": ["CANCELLED"] } }"#,
        )
        .unwrap_err();

        assert!(matches!(err, Error::ConfigParse { .. }));
        assert!(err.to_string().contains("CREATED is listed more than once"));
    }

    #[test]
    fn self_edges_are_rejected() {
        let config =
            TransitionTableConfig::from_json(r#"{ "transitions": { "PREPARING": ["PREPARING"] } }"#)
                .unwrap();

        assert!(matches!(
            TransitionTable::try_from(config),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn declared_terminal_with_edges_is_rejected() {
        let config = TransitionTableConfig::from_json(
            r#"{
                "terminal": ["DELIVERED"],
                "transitions": { "DELIVERED": ["CREATED"] }
            }"#,
        )
        .unwrap();

        let err = TransitionTable::try_from(config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid transition table: terminal status DELIVERED has outgoing transitions"
        );
    }

    #[test]
    fn exported_default_table_loads_back_unchanged() {
        let config = TransitionTableConfig::from(&TransitionTable::default());

        assert_eq!(config.terminal, vec![Delivered, Cancelled]);
        assert_eq!(config.transitions[&Created], vec![Confirmed, Cancelled]);
        assert_eq!(
            TransitionTable::try_from(config).unwrap(),
            TransitionTable::default()
        );
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = TransitionTableConfig::from_file("/nonexistent/transitions.json").unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
        assert!(err.to_string().contains("/nonexistent/transitions.json"));
    }
}
