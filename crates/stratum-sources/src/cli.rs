//! Command-line flag source.

use std::sync::Arc;

use async_trait::async_trait;
use clap::ArgMatches;
use stratum_core::merge::fill_missing;
use stratum_core::{ConfigMap, ConfigValue, Result, Snapshot};
use tracing::debug;

use crate::source::{Decoder, Loader};

/// Exposes already-parsed command-line flags as a configuration fragment.
///
/// Each flag name is lowercased and split on `.` and `_`, so
/// `--alert.enabled` and `--alert_enabled` both land at `alert.enabled`.
/// When two flags resolve to the same key the first one wins. The snapshot is
/// built once at construction and never changes.
#[derive(Debug, Clone)]
pub struct CliSource {
    snapshot: Arc<Snapshot>,
}

impl CliSource {
    /// Builds the source from every argument clap knows about, including
    /// those that only carry a default value.
    ///
    /// Values keep the type of the argument's value parser when it is a
    /// string, bool, integer or float, so `scan` into typed fields works.
    /// Other parsers fall back to the raw text. Arguments taking several values
    /// become arrays.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        Self::from_matches_with(matches, |_| true)
    }

    /// Like [`from_matches`](Self::from_matches), keeping only the arguments
    /// whose id passes `filter`.
    pub fn from_matches_with<F>(matches: &ArgMatches, filter: F) -> Result<Self>
    where
        F: Fn(&str) -> bool,
    {
        let flags = matches.ids().filter(|id| filter(id.as_str())).filter_map(|id| {
            let mut values = typed_values(matches, id.as_str())?;

            let value = match values.len() {
                0 => return None,
                1 => values.remove(0),
                _ => ConfigValue::Array(values),
            };
            Some((id.as_str().to_string(), value))
        });

        Self::from_flags(flags)
    }

    /// Builds the source from `(name, value)` pairs in declaration order.
    pub fn from_flags<I, K, V>(flags: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<ConfigValue>,
    {
        let mut data = ConfigMap::new();

        for (name, value) in flags {
            let name = name.as_ref().to_lowercase();
            let keys: Vec<&str> = name.split(['.', '_']).filter(|k| !k.is_empty()).collect();
            if let Some(fragment) = nest(&keys, value.into()) {
                fill_missing(&mut data, fragment);
            }
        }

        Ok(Self {
            snapshot: Arc::new(Snapshot::new(data.to_vec()?)),
        })
    }

    /// Returns the fixed snapshot.
    pub fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }
}

fn typed_values(matches: &ArgMatches, id: &str) -> Option<Vec<ConfigValue>> {
    many::<String>(matches, id)
        .or_else(|| many::<bool>(matches, id))
        .or_else(|| many::<i64>(matches, id))
        .or_else(|| many::<i32>(matches, id))
        .or_else(|| many::<u32>(matches, id))
        .or_else(|| many::<u16>(matches, id))
        .or_else(|| many::<u8>(matches, id))
        .or_else(|| many::<f64>(matches, id))
        .or_else(|| {
            let raw = matches.try_get_raw(id).ok()??;
            Some(
                raw.map(|v| ConfigValue::String(v.to_string_lossy().into_owned()))
                    .collect(),
            )
        })
}

/// Values of `id` if clap stored them as `T`.
fn many<T>(matches: &ArgMatches, id: &str) -> Option<Vec<ConfigValue>>
where
    T: Clone + Into<ConfigValue> + Send + Sync + 'static,
{
    let values = matches.try_get_many::<T>(id).ok()??;
    Some(values.cloned().map(Into::into).collect())
}

/// `["a", "b", "c"]` and `v` become `{"a": {"b": {"c": v}}}`.
fn nest(keys: &[&str], value: ConfigValue) -> Option<ConfigMap> {
    let (first, rest) = keys.split_first()?;
    let inner = rest.iter().rev().fold(value, |inner, key| {
        let mut level = ConfigMap::new();
        level.insert(*key, inner);
        level.into()
    });

    let mut fragment = ConfigMap::new();
    fragment.insert(*first, inner);
    Some(fragment)
}

#[async_trait]
impl Loader for CliSource {
    fn name(&self) -> &str {
        "cli"
    }

    async fn load(&self) -> Result<Arc<Snapshot>> {
        Ok(self.snapshot.clone())
    }

    fn set_decoder(&mut self, _decoder: Arc<dyn Decoder>) {
        debug!("Command-line source ignores decoders");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Arg, ArgAction, Command};

    fn decode(source: &CliSource) -> ConfigMap {
        ConfigMap::from_slice("cli", source.snapshot().data()).unwrap()
    }

    #[test]
    fn test_nests_on_dots_and_underscores() {
        let source = CliSource::from_flags([
            ("Alert.Enabled", "true"),
            ("db_primary_host", "localhost"),
        ])
        .unwrap();

        let data = decode(&source);
        assert_eq!(data.get("alert.enabled").unwrap().as_str(), Some("true"));
        assert_eq!(data.get("db.primary.host").unwrap().as_str(), Some("localhost"));
    }

    #[test]
    fn test_first_flag_wins() {
        let source = CliSource::from_flags([
            ("nested.props.deep", "first"),
            ("nested_props_deep", "second"),
            ("nested.props.other", "kept"),
        ])
        .unwrap();

        let data = decode(&source);
        assert_eq!(data.get("nested.props.deep").unwrap().as_str(), Some("first"));
        assert_eq!(data.get("nested.props.other").unwrap().as_str(), Some("kept"));
    }

    #[test]
    fn test_scalar_blocks_nested_flag() {
        let source = CliSource::from_flags([("name", "svc"), ("name.first", "x")]).unwrap();

        let data = decode(&source);
        assert_eq!(data.get("name").unwrap().as_str(), Some("svc"));
    }

    #[test]
    fn test_empty_segments_are_dropped() {
        let source = CliSource::from_flags([("a..b_", "1"), ("..", "ignored")]).unwrap();

        assert_eq!(source.snapshot().data(), br#"{"a":{"b":"1"}}"#);
    }

    #[test]
    fn test_from_matches_includes_defaults() {
        let matches = Command::new("app")
            .arg(Arg::new("name").long("name"))
            .arg(
                Arg::new("nested.props.really")
                    .long("nested.props.really")
                    .default_value("55"),
            )
            .arg(Arg::new("tag").long("tag").action(ArgAction::Append))
            .arg(Arg::new("unset").long("unset"))
            .get_matches_from(["app", "--name", "svc", "--tag", "a", "--tag", "b"]);

        let source = CliSource::from_matches(&matches).unwrap();
        let data = decode(&source);

        assert_eq!(data.get("name").unwrap().as_str(), Some("svc"));
        assert_eq!(data.get("nested.props.really").unwrap().as_str(), Some("55"));
        assert_eq!(data.get("tag").unwrap().as_array().map(<[_]>::len), Some(2));
        assert!(data.get("unset").is_none());
    }

    #[test]
    fn test_from_matches_keeps_parsed_types() {
        #[derive(serde::Deserialize)]
        struct Flags {
            port: u16,
            verbose: bool,
            ratio: f64,
            name: String,
        }

        let matches = Command::new("app")
            .arg(
                Arg::new("port")
                    .long("port")
                    .value_parser(clap::value_parser!(u16))
                    .default_value("55"),
            )
            .arg(Arg::new("verbose").long("verbose").action(ArgAction::SetTrue))
            .arg(
                Arg::new("ratio")
                    .long("ratio")
                    .value_parser(clap::value_parser!(f64)),
            )
            .arg(
                Arg::new("path")
                    .long("path")
                    .value_parser(clap::value_parser!(std::path::PathBuf)),
            )
            .arg(Arg::new("name").long("name"))
            .get_matches_from([
                "app", "--verbose", "--ratio", "0.5", "--path", "/tmp/x", "--name", "7",
            ]);

        let source = CliSource::from_matches(&matches).unwrap();
        let data = decode(&source);

        assert_eq!(data.get("port"), Some(&ConfigValue::Integer(55)));
        assert_eq!(data.get("verbose"), Some(&ConfigValue::Bool(true)));
        assert_eq!(data.get("path").unwrap().as_str(), Some("/tmp/x"));
        assert_eq!(data.get("name").unwrap().as_str(), Some("7"));

        let flags: Flags = serde_json::from_slice(source.snapshot().data()).unwrap();
        assert_eq!(flags.port, 55);
        assert!(flags.verbose);
        assert_eq!(flags.ratio, 0.5);
        assert_eq!(flags.name, "7");
    }

    #[test]
    fn test_from_matches_with_filter() {
        let matches = Command::new("app")
            .arg(Arg::new("config_key").long("config-key"))
            .arg(Arg::new("name").long("name"))
            .get_matches_from(["app", "--config-key", "secret", "--name", "svc"]);

        let source = CliSource::from_matches_with(&matches, |id| id != "config_key").unwrap();

        assert_eq!(source.snapshot().data(), br#"{"name":"svc"}"#);
    }

    #[tokio::test]
    async fn test_load_is_fixed() {
        let mut source = CliSource::from_flags([("k", "v")]).unwrap();
        source.set_decoder(Arc::new(|input: &[u8]| {
            crate::source::DecodeOutcome::Decoded(input.to_ascii_uppercase())
        }));

        let snapshot = source.load().await.unwrap();
        assert_eq!(snapshot.data(), br#"{"k":"v"}"#);
    }
}
