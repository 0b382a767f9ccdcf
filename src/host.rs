//! Best-effort identity of the machine and operator, for stamping records.

/// Host name from the environment (`COMPUTERNAME` on Windows, `HOSTNAME` elsewhere),
/// falling back to `/etc/hostname`.
pub fn hostname() -> Option<String> {
    non_empty_var("COMPUTERNAME")
        .or_else(|| non_empty_var("HOSTNAME"))
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Login name of the operator (`USERNAME` or `USER`).
pub fn username() -> Option<String> {
    non_empty_var("USERNAME").or_else(|| non_empty_var("USER"))
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
