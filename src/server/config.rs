use super::RequestsLoggingLevel;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    /// Placeholder root prepended to the hyperlink strings in entity
    /// representations, e.g. `?/artists/{id}`.
    pub link_root: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            link_root: "?".to_owned(),
        }
    }
}
