//! Docker Compose file format types.
//!
//! Types matching the subset of the Compose file format (v2/v3) that DCM
//! reads and writes. Every top-level block is a plain map so callers never
//! handle an absent container.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version written into newly created compose files.
pub const DEFAULT_COMPOSE_VERSION: &str = "3.8";

/// Root structure of a docker-compose.yml file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeFile {
    /// Compose file format version (e.g., "2", "3", "3.8")
    #[serde(default, deserialize_with = "de::scalar", skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// Services keyed by name
    #[serde(default, deserialize_with = "de::entries")]
    pub services: BTreeMap<String, Service>,

    /// Networks keyed by name
    #[serde(default, deserialize_with = "de::entries")]
    pub networks: BTreeMap<String, Network>,

    /// Named volumes keyed by name
    #[serde(default, deserialize_with = "de::entries")]
    pub volumes: BTreeMap<String, Volume>,
}

impl ComposeFile {
    /// Create an empty compose file. An empty `version` falls back to
    /// [`DEFAULT_COMPOSE_VERSION`].
    pub fn new(version: &str) -> Self {
        let version =
            if version.is_empty() { DEFAULT_COMPOSE_VERSION.to_string() } else { version.to_string() };
        Self {
            version,
            services: BTreeMap::new(),
            networks: BTreeMap::new(),
            volumes: BTreeMap::new(),
        }
    }
}

/// A service in a docker-compose file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Container image to use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Fixed container name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,

    /// Port mappings (e.g., ["8080:80", "443:443"])
    #[serde(default, deserialize_with = "de::scalar_list", skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,

    /// Environment variables
    #[serde(
        default,
        deserialize_with = "de::environment",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub environment: BTreeMap<String, String>,

    /// Volume mounts (e.g., ["./data:/data", "db:/var/lib/db:ro"])
    #[serde(default, deserialize_with = "de::scalar_list", skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,

    /// Services this service depends on
    #[serde(default, deserialize_with = "de::names", skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// Networks to connect to
    #[serde(default, deserialize_with = "de::names", skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,

    /// Restart policy ("no", "always", "on-failure", "unless-stopped")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<String>,

    /// Override the default command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Command>,

    /// Working directory inside the container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,

    /// User to run as
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Container hostname
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// Ports exposed to linked services only
    #[serde(default, deserialize_with = "de::scalar_list", skip_serializing_if = "Vec::is_empty")]
    pub expose: Vec<String>,

    /// Logging driver configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    /// Host device mappings
    #[serde(default, deserialize_with = "de::scalar_list", skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<String>,

    /// Added kernel capabilities
    #[serde(default, deserialize_with = "de::scalar_list", skip_serializing_if = "Vec::is_empty")]
    pub cap_add: Vec<String>,

    /// Dropped kernel capabilities
    #[serde(default, deserialize_with = "de::scalar_list", skip_serializing_if = "Vec::is_empty")]
    pub cap_drop: Vec<String>,

    /// Run in privileged mode
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub privileged: bool,

    /// Security options (e.g., ["no-new-privileges:true"])
    #[serde(default, deserialize_with = "de::scalar_list", skip_serializing_if = "Vec::is_empty")]
    pub security_opt: Vec<String>,

    /// Kernel parameters as `key=value` entries
    #[serde(
        default,
        deserialize_with = "de::key_value_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub sysctls: Vec<String>,

    /// Resource ulimits; values are kept verbatim (numbers or soft/hard maps)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ulimits: BTreeMap<String, serde_yaml::Value>,

    /// Metadata labels
    #[serde(default, deserialize_with = "de::scalar_map", skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Container health check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<HealthCheck>,

    /// Deployment configuration (Compose v3 swarm mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy: Option<DeployConfig>,
}

impl Service {
    /// Source tokens of the service's volume mounts: everything before the
    /// first `:`. Named volumes and host paths are returned alike.
    pub fn volume_sources(&self) -> impl Iterator<Item = &str> {
        self.volumes.iter().map(|mount| mount.split(':').next().unwrap_or(mount.as_str()))
    }
}

/// A command override, either a shell string or an exec-form list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Command {
    Shell(String),
    Exec(Vec<String>),
}

/// Logging driver configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,

    #[serde(default, deserialize_with = "de::scalar_map", skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

/// Container health check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Test command in list form; a plain string is read as `CMD-SHELL`.
    #[serde(default, deserialize_with = "de::health_test", skip_serializing_if = "Vec::is_empty")]
    pub test: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_period: Option<String>,
}

/// Deployment configuration (Compose v3 swarm mode).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Number of replicas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,

    /// Restart policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<RestartPolicy>,

    /// Resource limits and reservations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Resources>,

    /// Service labels (as opposed to container labels)
    #[serde(default, deserialize_with = "de::scalar_map", skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// Swarm restart policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestartPolicy {
    /// "none", "on-failure" or "any"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<String>,
}

/// Resource configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    /// Resource limits (maximum)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceLimit>,

    /// Resource reservations (minimum)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservations: Option<ResourceLimit>,
}

impl Resources {
    /// CPU limit as a float (e.g., "2.0" -> 2.0)
    pub fn cpu_limit(&self) -> Option<f64> {
        self.limits.as_ref().and_then(|l| l.cpus.as_ref()).and_then(|s| s.parse().ok())
    }

    /// Memory limit in megabytes
    pub fn memory_limit_mb(&self) -> Option<u64> {
        self.limits.as_ref().and_then(|l| l.memory.as_ref()).and_then(|s| parse_memory_string(s))
    }
}

/// Resource limits for CPU and memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimit {
    /// CPU limit (e.g., "2.0" for 2 cores)
    #[serde(default, deserialize_with = "de::optional_scalar", skip_serializing_if = "Option::is_none")]
    pub cpus: Option<String>,

    /// Memory limit (e.g., "1024M", "1G")
    #[serde(default, deserialize_with = "de::optional_scalar", skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

/// Network definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    /// Network driver to use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,

    /// Name override for the network on the host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Network is managed outside this compose file
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub external: bool,
}

/// Volume definition. A volume with no driver serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    /// Volume driver to use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
}

/// Parse memory string (e.g., "1G", "512M", "1024") to megabytes.
fn parse_memory_string(s: &str) -> Option<u64> {
    let s = s.trim().to_uppercase();

    if let Some(n) = s.strip_suffix('G') {
        n.parse::<u64>().ok().and_then(|n| n.checked_mul(1024))
    } else if let Some(n) = s.strip_suffix('M') {
        n.parse::<u64>().ok()
    } else {
        // Assume bytes if no suffix
        s.parse::<u64>().ok().map(|n| n / (1024 * 1024))
    }
}

/// Lenient deserializers for fields compose writes in more than one shape.
mod de {
    use super::Command;
    use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
    use serde::{Deserialize, Deserializer};
    use std::collections::BTreeMap;
    use std::fmt;
    use std::marker::PhantomData;

    /// A scalar kept as its source text. Plain YAML scalars are read as
    /// strings, so `3.10`, `1.50` and `0x1F` survive a load/save cycle.
    struct Scalar(String);

    impl From<Scalar> for String {
        fn from(scalar: Scalar) -> Self {
            scalar.0
        }
    }

    impl<'de> Deserialize<'de> for Scalar {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            d.deserialize_str(ScalarVisitor)
        }
    }

    struct ScalarVisitor;

    impl<'de> Visitor<'de> for ScalarVisitor {
        type Value = Scalar;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a scalar value")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Scalar, E> {
            Ok(Scalar(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Scalar, E> {
            Ok(Scalar(v))
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Scalar, E> {
            Ok(Scalar(v.to_string()))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Scalar, E> {
            Ok(Scalar(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Scalar, E> {
            Ok(Scalar(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Scalar, E> {
            Ok(Scalar(v.to_string()))
        }
    }

    /// A block written either as a list of scalars or as a mapping.
    enum Shape<V> {
        List(Vec<String>),
        Map(Vec<(String, Option<V>)>),
    }

    struct ShapeVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for ShapeVisitor<V> {
        type Value = Option<Shape<V>>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a list or a mapping")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut list = Vec::new();
            while let Some(Scalar(item)) = seq.next_element()? {
                list.push(item);
            }
            Ok(Some(Shape::List(list)))
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::new();
            while let Some(Scalar(key)) = map.next_key()? {
                entries.push((key, map.next_value::<Option<V>>()?));
            }
            Ok(Some(Shape::Map(entries)))
        }
    }

    fn shape<'de, D, V>(d: D) -> Result<Option<Shape<V>>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        d.deserialize_any(ShapeVisitor(PhantomData))
    }

    fn split_pairs(list: Vec<String>) -> BTreeMap<String, String> {
        list.iter()
            .filter_map(|entry| entry.split_once('=').map(|(k, v)| (k.to_string(), v.to_string())))
            .collect()
    }

    fn join_pairs(map: Vec<(String, Option<Scalar>)>) -> BTreeMap<String, String> {
        map.into_iter().map(|(k, v)| (k, v.map(String::from).unwrap_or_default())).collect()
    }

    pub fn scalar<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(Option::<Scalar>::deserialize(d)?.map(String::from).unwrap_or_default())
    }

    pub fn optional_scalar<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Scalar>::deserialize(d)?.map(String::from))
    }

    pub fn scalar_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        let list = Option::<Vec<Scalar>>::deserialize(d)?.unwrap_or_default();
        Ok(list.into_iter().map(String::from).collect())
    }

    /// Labels and options as a map, or as a list of `key=value` strings.
    pub fn scalar_map<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<BTreeMap<String, String>, D::Error> {
        Ok(match shape::<D, Scalar>(d)? {
            None => BTreeMap::new(),
            Some(Shape::Map(map)) => join_pairs(map),
            Some(Shape::List(list)) => split_pairs(list),
        })
    }

    /// Environment as a map, or as a list of `KEY=value` strings.
    /// List entries without `=` are dropped.
    pub fn environment<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<BTreeMap<String, String>, D::Error> {
        scalar_map(d)
    }

    /// Names given either as a list or as the keys of a long-form map.
    pub fn names<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match shape::<D, IgnoredAny>(d)? {
            None => Vec::new(),
            Some(Shape::List(list)) => list,
            Some(Shape::Map(map)) => map.into_iter().map(|(k, _)| k).collect(),
        })
    }

    /// `key=value` entries given either as a list or as a map.
    pub fn key_value_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match shape::<D, Scalar>(d)? {
            None => Vec::new(),
            Some(Shape::List(list)) => list,
            Some(Shape::Map(map)) => map
                .into_iter()
                .map(|(k, v)| match v {
                    Some(Scalar(v)) => format!("{}={}", k, v),
                    None => k,
                })
                .collect(),
        })
    }

    /// Healthcheck test. A bare string is shell form and becomes
    /// `["CMD-SHELL", <string>]`.
    pub fn health_test<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Option::<Command>::deserialize(d)? {
            None => Vec::new(),
            Some(Command::Shell(cmd)) => vec!["CMD-SHELL".to_string(), cmd],
            Some(Command::Exec(list)) => list,
        })
    }

    struct CommandVisitor;

    impl<'de> Visitor<'de> for CommandVisitor {
        type Value = Command;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a command string or list")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Command, E> {
            Ok(Command::Shell(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Command, E> {
            Ok(Command::Shell(v))
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Command, A::Error> {
            let mut args = Vec::new();
            while let Some(Scalar(arg)) = seq.next_element()? {
                args.push(arg);
            }
            Ok(Command::Exec(args))
        }
    }

    impl<'de> Deserialize<'de> for Command {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            d.deserialize_any(CommandVisitor)
        }
    }

    /// Top-level block entries. A missing or null block is empty, and a null
    /// entry (`volumes: { data: }`) becomes the default definition.
    pub fn entries<'de, D, T>(d: D) -> Result<BTreeMap<String, T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        let map = Option::<BTreeMap<String, Option<T>>>::deserialize(d)?.unwrap_or_default();
        Ok(map.into_iter().map(|(k, v)| (k, v.unwrap_or_default())).collect())
    }
}
