//! Naming of persisted hash buckets, fields and keys

pub const ALIVE_REMINDER_MUTE: &str = "alive_reminder_mute";

pub fn hash_blockchain(chain: &str) -> String {
    format!("hash_blockchain_{}", chain)
}

pub fn node_field(field: &str, node_name: &str) -> String {
    format!("node_{}_{}", field, node_name)
}

pub fn system_field(field: &str, system_name: &str) -> String {
    format!("system_{}_{}", field, system_name)
}

pub fn node_monitor_last_height_checked(monitor_name: &str) -> String {
    format!("node_monitor_last_height_checked_{}", monitor_name)
}

pub fn node_monitor_alive(monitor_name: &str) -> String {
    format!("node_monitor_alive_{}", monitor_name)
}

pub fn system_monitor_alive(monitor_name: &str) -> String {
    format!("system_monitor_alive_{}", monitor_name)
}

pub fn github_last_release_id(repo_name: &str) -> String {
    format!("github_last_release_id_{}", repo_name)
}
