use std::env;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Default wall-clock limit for a single solve (one hour)
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(3600);

/// Backends run single-threaded so ties between incumbents are reproducible
pub const DEFAULT_THREADS: u32 = 1;

/// Largest instance accepted over HTTP. The models declare `n * n`
/// assignment binaries per layer, so this also bounds the problem size.
pub const DEFAULT_MAX_NODES: usize = 1000;

/// Limits handed to a backend for one `optimize` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverConfig {
    pub time_limit: Duration,
    pub threads: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            time_limit: DEFAULT_TIME_LIMIT,
            threads: DEFAULT_THREADS,
        }
    }
}

impl SolverConfig {
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }
}

/// Service settings, read from the environment after `dotenv`
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub json_limit: usize,
    pub solver: SolverConfig,
    pub cache_size: NonZeroUsize,
    pub max_nodes: usize,
    pub glpk_scale: i32,
    pub sentry_dsn: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = parse_var("PORT").unwrap_or(9000);

        // default 2 MB
        let json_limit = parse_var("JSON_PAYLOAD_LIMIT").unwrap_or(2 * 1024 * 1024);

        let time_limit = parse_var::<u64>("SOLVE_TIME_LIMIT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIME_LIMIT);

        let cache_size = parse_var::<usize>("SOLUTION_CACHE_SIZE")
            .and_then(NonZeroUsize::new)
            .unwrap_or(NonZeroUsize::MIN.saturating_add(63));

        let max_nodes = parse_var::<usize>("MAX_NODES")
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_NODES);

        let glpk_scale = parse_var::<i32>("GLPK_SCALE")
            .filter(|s| *s > 0)
            .unwrap_or(crate::domain::backends::glpk_backend::DEFAULT_SCALE);

        let sentry_dsn = env::var("SENTRY_DSN").ok().filter(|s| !s.is_empty());

        ServerConfig {
            port,
            json_limit,
            solver: SolverConfig::default().with_time_limit(time_limit),
            cache_size,
            max_nodes,
            glpk_scale,
            sentry_dsn,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}
