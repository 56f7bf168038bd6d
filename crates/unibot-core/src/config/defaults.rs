// --- Default value functions ---

pub(super) fn default_name() -> String {
    "University Info Bot".to_string()
}
pub(super) fn default_log_level() -> String {
    "info".to_string()
}
pub(super) fn default_address() -> String {
    "Constructor University, Bremen".to_string()
}
pub(super) fn default_deny_message() -> String {
    "Access denied. You are not authorized to use this bot.".to_string()
}
pub(super) fn default_true() -> bool {
    true
}
pub(super) fn default_provider() -> String {
    "mistral".to_string()
}
pub(super) fn default_temperature() -> f32 {
    0.0
}
pub(super) fn default_max_retries() -> u32 {
    2
}
pub(super) fn default_dimensions() -> usize {
    1024
}
pub(super) fn default_max_connections() -> u32 {
    5
}
pub(super) fn default_handbook_bucket() -> String {
    "handbooks".to_string()
}
pub(super) fn default_signed_url_ttl() -> u64 {
    86_400
}
pub(super) fn default_general_k() -> i64 {
    6
}
pub(super) fn default_scoped_k() -> i64 {
    4
}
pub(super) fn default_handbook_k() -> i64 {
    10
}
pub(super) fn default_score_threshold() -> f64 {
    0.5
}
pub(super) fn default_max_locations() -> usize {
    13
}
pub(super) fn default_max_feature_matches() -> usize {
    8
}
pub(super) fn default_max_handbooks() -> usize {
    10
}
pub(super) fn default_chunk_size() -> usize {
    500
}
pub(super) fn default_chunk_overlap() -> usize {
    50
}
pub(super) fn default_batch_size() -> usize {
    100
}
pub(super) fn default_handbook_batch_size() -> usize {
    50
}
pub(super) fn default_min_chunk_chars() -> usize {
    50
}
