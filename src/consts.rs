/// Query used in place of empty input when the data was loaded from a dump,
/// where an unfiltered table has no natural default.
pub const FALLBACK_QUERY: &str = "pod_name like %";

/// How long the CLI waits for a deferred suggestion source.
pub const DEFAULT_SUGGESTION_TIMEOUT_MS: u64 = 500;

pub const KNOWN_COMPARATORS: [&str; 10] = [
    "=", "!=", ">", ">=", "<", "<=", "in", "not in", "like", "not like",
];

pub const POD_NAME: &str = "pod_name";
pub const SERVICE_NAME: &str = "service_name";
pub const NAMESPACE: &str = "namespace";
pub const POD_INFO: &str = "pod_info";
pub const RC_INFO: &str = "rc_info";
pub const DC_INFO: &str = "dc_info";
pub const DATE: &str = "date";
