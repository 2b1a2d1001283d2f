/// Kontalk stack service definitions and constants
///
/// Based on the three-service docker-compose.yml (db, httpupload, xmpp)

/// Service definition
#[derive(Debug, Clone)]
pub struct Service {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    /// Named volume suffix (prefixed with the instance name by compose)
    pub volume: &'static str,
    /// Mount point of the volume inside the service container
    pub data_dir: &'static str,
    pub dependencies: &'static [&'static str],
    pub critical: bool,
}

pub const DB_SERVICE: &str = "db";
pub const UPLOAD_SERVICE: &str = "httpupload";
pub const XMPP_SERVICE: &str = "xmpp";

/// All Kontalk services
pub fn get_services() -> Vec<Service> {
    vec![
        Service {
            name: DB_SERVICE,
            display_name: "Database (MySQL)",
            description: "Relational database holding accounts and messages",
            volume: DB_VOLUME,
            data_dir: "/var/lib/mysql",
            dependencies: &[],
            critical: true,
        },
        Service {
            name: UPLOAD_SERVICE,
            display_name: "HTTP Upload",
            description: "File upload component serving media attachments",
            volume: UPLOAD_VOLUME,
            data_dir: UPLOAD_DATA_DIR,
            dependencies: &[DB_SERVICE],
            critical: false,
        },
        Service {
            name: XMPP_SERVICE,
            display_name: "XMPP Server (Tigase)",
            description: "Kontalk XMPP core with the GPG keyring store",
            volume: XMPP_VOLUME,
            data_dir: XMPP_DATA_DIR,
            dependencies: &[DB_SERVICE],
            critical: true,
        },
    ]
}

/// Volume name suffixes (compose prefixes them with the project name)
pub const DB_VOLUME: &str = "db";
pub const UPLOAD_VOLUME: &str = "httpupload";
pub const XMPP_VOLUME: &str = "xmpp";

pub const VOLUMES: &[&str] = &[DB_VOLUME, UPLOAD_VOLUME, XMPP_VOLUME];

/// Startup order for services (dependencies first)
pub const STARTUP_ORDER: &[&str] = &[DB_SERVICE, UPLOAD_SERVICE, XMPP_SERVICE];

/// Archive layout. Members are addressed by these exact paths, never by
/// position.
pub const ARCHIVE_DOMAINS: &[&str] = &["db", "httpupload", "xmpp"];
pub const ARCHIVE_DB_MEMBER: &str = "db/kontalk.sql";
pub const ARCHIVE_UPLOAD_MEMBER: &str = "httpupload/disk.tar";
pub const ARCHIVE_KEYSTORE_MEMBER: &str = "xmpp/keyring.kch";

/// Container-side paths for the upload and key-store domains
pub const UPLOAD_DATA_DIR: &str = "/home/kontalk/disk";
pub const XMPP_DATA_DIR: &str = "/home/kontalk";
pub const KEYSTORE_FILE: &str = "keyring.kch";
pub const KEYSTORE_PATH: &str = "/home/kontalk/keyring.kch";

/// Token the operator must type before a restore wipes the instance
pub const CONFIRM_TOKEN: &str = "OK";

/// Image used for disposable volume-access containers
pub const HELPER_IMAGE: &str = "alpine:3.19";

/// Default paths
pub const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";
pub const DEFAULT_PROPERTIES_FILE: &str = "local.properties";
pub const VERSION_MARKER_FILE: &str = ".version";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_definitions() {
        let services = get_services();
        assert_eq!(services.len(), 3);
        assert!(services.iter().any(|s| s.name == DB_SERVICE));
        assert!(services.iter().any(|s| s.name == UPLOAD_SERVICE));
        assert!(services.iter().any(|s| s.name == XMPP_SERVICE));
    }

    #[test]
    fn test_startup_order_has_db_first() {
        assert_eq!(STARTUP_ORDER.first(), Some(&DB_SERVICE));
    }

    #[test]
    fn test_archive_members_live_in_their_domains() {
        assert!(ARCHIVE_DB_MEMBER.starts_with("db/"));
        assert!(ARCHIVE_UPLOAD_MEMBER.starts_with("httpupload/"));
        assert!(ARCHIVE_KEYSTORE_MEMBER.starts_with("xmpp/"));
        assert!(KEYSTORE_PATH.ends_with(KEYSTORE_FILE));
    }
}
