/// Backup and restore orchestration
///
/// Produces and consumes point-in-time snapshots of the instance's three
/// data domains: the MySQL database, the HTTP-upload volume tree and the
/// XMPP keyring file. A snapshot is packaged as a single gzip tar with a
/// fixed member layout (db/kontalk.sql, httpupload/disk.tar,
/// xmpp/keyring.kch) and is never mutated after creation.
///
/// Backup runs against the live stack; only the database dump is
/// transactionally consistent. Restore tears the whole instance down,
/// volumes included, and replays each domain in dependency order. A failed
/// restore leaves the instance partially restored; there is no rollback,
/// operator intervention is required.

use anyhow::{bail, Context, Result};
use chrono::Local;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};
use thiserror::Error;
use tokio::process::Command;

use crate::core::config::InstanceConfig;
use crate::core::docker::DockerManager;
use crate::utils::{
    is_dir_writable, is_file_readable, ARCHIVE_DB_MEMBER, ARCHIVE_DOMAINS, ARCHIVE_KEYSTORE_MEMBER,
    ARCHIVE_UPLOAD_MEMBER, CONFIRM_TOKEN, DB_SERVICE, KEYSTORE_FILE, KEYSTORE_PATH,
    STARTUP_ORDER, UPLOAD_DATA_DIR, UPLOAD_SERVICE, UPLOAD_VOLUME, VERSION_MARKER_FILE,
    XMPP_SERVICE, XMPP_VOLUME,
};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("backup destination {} does not exist or is not a writable directory", .0.display())]
    MissingBackupDir(PathBuf),
    #[error("instance is not bootstrapped: version marker {} not found", .0.display())]
    NotBootstrapped(PathBuf),
    #[error("instance is already bootstrapped (version marker {} exists)", .0.display())]
    AlreadyBootstrapped(PathBuf),
    #[error("archive {} does not exist or is not readable", .0.display())]
    ArchiveNotFound(PathBuf),
    #[error("archive member {0} is missing or empty")]
    BadArchiveMember(String),
    #[error("restore declined by operator")]
    Declined,
    #[error("database did not become ready after {0} attempts")]
    ReadinessTimeout(u32),
}

/// Fixed-delay retry policy for the database readiness probe.
///
/// Unbounded by default: right after `down -v` the database re-initializes
/// an empty volume, which can take minutes, and there is no way to tell
/// "still starting" from "will never start". Callers that prefer a fatal
/// timeout can bound the attempt count.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    pub fn bounded(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: Some(max_attempts),
        }
    }

    pub fn exhausted(&self, attempts: u32) -> bool {
        matches!(self.max_attempts, Some(max) if attempts >= max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(Duration::from_secs(2))
    }
}

/// Operator gate in front of destructive operations. Injected so tests can
/// substitute a scripted implementation for the console read.
#[cfg_attr(test, mockall::automock)]
pub trait ConfirmationPrompt {
    /// Returns true only when the operator typed the exact token
    fn confirm(&self, prompt: &str, token: &str) -> Result<bool>;
}

/// Blocking console prompt
pub struct ConsolePrompt;

impl ConfirmationPrompt for ConsolePrompt {
    fn confirm(&self, prompt: &str, token: &str) -> Result<bool> {
        print!("{} ", prompt);
        std::io::stdout().flush()?;

        let mut line = String::new();
        std::io::stdin()
            .read_line(&mut line)
            .context("Failed to read confirmation")?;

        Ok(line.trim() == token)
    }
}

#[derive(Debug, Clone)]
pub struct ArchiveMember {
    pub path: String,
    pub size: u64,
}

/// A backup archive on disk. Members are addressed by exact path.
#[derive(Debug, Clone)]
pub struct Archive {
    path: PathBuf,
    members: Vec<ArchiveMember>,
}

impl Archive {
    /// Open an existing archive and list its members
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !is_file_readable(&path) {
            return Err(OrchestratorError::ArchiveNotFound(path).into());
        }

        let output = std::process::Command::new("tar")
            .arg("-tzvf")
            .arg(&path)
            .output()
            .context("Failed to run tar")?;

        if !output.status.success() {
            bail!(
                "tar could not read {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr)
            );
        }

        let members = Self::parse_listing(&String::from_utf8_lossy(&output.stdout));
        Ok(Self { path, members })
    }

    /// Parse `tar -tv` listing lines, e.g.
    /// `-rw-r--r-- root/root 1234 2024-05-01 12:00 db/kontalk.sql`
    fn parse_listing(listing: &str) -> Vec<ArchiveMember> {
        listing
            .lines()
            .filter_map(|line| {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < 6 {
                    return None;
                }
                let size: u64 = parts[2].parse().ok()?;
                let path = parts[5..].join(" ").trim_end_matches('/').to_string();
                if path.is_empty() {
                    None
                } else {
                    Some(ArchiveMember { path, size })
                }
            })
            .collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a member, tolerating the `./` prefix some tar invocations
    /// store member names with
    pub fn member(&self, path: &str) -> Option<&ArchiveMember> {
        self.members
            .iter()
            .find(|m| m.path.trim_start_matches("./") == path)
    }

    /// A snapshot is valid only when all three domain members are present
    /// and non-empty
    pub fn validate(&self) -> Result<()> {
        for required in [ARCHIVE_DB_MEMBER, ARCHIVE_UPLOAD_MEMBER, ARCHIVE_KEYSTORE_MEMBER] {
            match self.member(required) {
                Some(member) if member.size > 0 => {}
                _ => return Err(OrchestratorError::BadArchiveMember(required.to_string()).into()),
            }
        }
        Ok(())
    }

    /// Command that streams one member to stdout. Extraction uses the name
    /// the member is actually stored under, so a `./`-prefixed archive that
    /// passed validation also extracts.
    pub fn extract_member_command(&self, member: &str) -> Command {
        let stored = self
            .member(member)
            .map(|m| m.path.as_str())
            .unwrap_or(member);
        let mut cmd = Command::new("tar");
        cmd.arg("-xzOf").arg(&self.path).arg(stored);
        cmd
    }
}

/// One archive in the backup destination
#[derive(Debug, Clone)]
pub struct BackupEntry {
    pub path: PathBuf,
    pub size: u64,
    pub modified: i64,
}

/// Require the exact confirmation token before destructive work. Anything
/// else counts as the operator declining, not as an error.
fn confirm_restore(
    prompt: &dyn ConfirmationPrompt,
    instance: &str,
    archive: &Path,
) -> Result<()> {
    let message = format!(
        "This will DESTROY all data of instance '{}' and replace it with the \
         contents of {}.\nType {} to continue:",
        instance,
        archive.display(),
        CONFIRM_TOKEN
    );

    if prompt.confirm(&message, CONFIRM_TOKEN)? {
        Ok(())
    } else {
        Err(OrchestratorError::Declined.into())
    }
}

pub struct BackupManager {
    docker: DockerManager,
    config: InstanceConfig,
}

impl BackupManager {
    pub fn new(docker: DockerManager, config: InstanceConfig) -> Self {
        Self { docker, config }
    }

    fn version_marker(&self) -> PathBuf {
        self.docker.project_root().join(VERSION_MARKER_FILE)
    }

    fn ensure_backup_dir(&self) -> Result<()> {
        if is_dir_writable(&self.config.backup_dir) {
            Ok(())
        } else {
            Err(OrchestratorError::MissingBackupDir(self.config.backup_dir.clone()).into())
        }
    }

    /// Bootstrap the instance: verify the compose stack defines the expected
    /// services, bring it up and write the version marker
    pub async fn bootstrap(&self) -> Result<()> {
        let marker = self.version_marker();
        if marker.exists() {
            return Err(OrchestratorError::AlreadyBootstrapped(marker).into());
        }

        self.docker.verify_services(STARTUP_ORDER)?;

        println!("Starting instance {}...", self.config.instance);
        self.docker.up_detached().await?;

        fs::write(&marker, concat!(env!("CARGO_PKG_VERSION"), "\n"))
            .context("Failed to write version marker")?;

        Ok(())
    }

    /// Snapshot Producer: dump the three data domains of the live stack and
    /// package them into `{instance}-{timestamp}.tar.gz` under the backup
    /// destination. Returns the archive path.
    pub async fn create_backup(&self) -> Result<PathBuf> {
        self.ensure_backup_dir()?;

        let marker = self.version_marker();
        if !marker.exists() {
            return Err(OrchestratorError::NotBootstrapped(marker).into());
        }

        let stamp = Local::now().format("%Y%m%d%H%M%S");
        let name = format!("{}-{}", self.config.instance, stamp);
        let workdir = self.config.backup_dir.join(&name);
        for domain in ARCHIVE_DOMAINS {
            fs::create_dir_all(workdir.join(domain))
                .with_context(|| format!("Failed to create {}", workdir.display()))?;
        }

        // Database first: most likely to fail, cheapest to fail fast on.
        // The dump step discards the working directory on failure, so no
        // archive is left behind on this path.
        println!("Dumping database...");
        self.dump_database(&workdir).await.with_context(|| {
            format!(
                "Database dump failed. Check that the db service is running \
                 (try: kontalk-cli start {})",
                DB_SERVICE
            )
        })?;

        println!("Exporting upload storage...");
        self.export_upload_volume(&workdir).await?;

        println!("Exporting key store...");
        self.export_keystore(&workdir).await?;

        let archive_path = self.config.backup_dir.join(format!("{}.tar.gz", name));
        println!("Packaging {}...", archive_path.display());
        self.package(&workdir, &archive_path)?;

        fs::remove_dir_all(&workdir).context("Failed to remove working directory")?;

        Ok(archive_path)
    }

    /// Transactionally-consistent streaming dump into the working directory
    async fn dump_database(&self, workdir: &Path) -> Result<()> {
        let db = &self.config.database;
        let cmd = self.docker.exec_command(
            DB_SERVICE,
            &[("MYSQL_PWD", db.password.as_str())],
            &[
                "mysqldump",
                "--single-transaction",
                "--quick",
                "-u",
                db.user.as_str(),
                db.name.as_str(),
            ],
        );

        Self::run_database_dump(cmd, workdir).await
    }

    /// Capture the dump command's output into the working directory. A dump
    /// that fails or produces nothing removes the working directory, so a
    /// failed backup cannot leave anything behind.
    async fn run_database_dump(cmd: Command, workdir: &Path) -> Result<()> {
        let dest = workdir.join(ARCHIVE_DB_MEMBER);
        match DockerManager::capture_to_file(cmd, &dest, "database dump").await {
            Ok(bytes) if bytes > 0 => Ok(()),
            Ok(_) => {
                let _ = fs::remove_dir_all(workdir);
                bail!("Database dump produced no output");
            }
            Err(err) => {
                let _ = fs::remove_dir_all(workdir);
                Err(err)
            }
        }
    }

    /// Export the upload volume's full file tree as a tar stream through a
    /// disposable helper container
    async fn export_upload_volume(&self, workdir: &Path) -> Result<()> {
        let volume = self.docker.volume_name(UPLOAD_VOLUME);
        let cmd = self
            .docker
            .volume_reader(&volume, &["tar", "-c", "-C", "/data", "."]);

        let dest = workdir.join(ARCHIVE_UPLOAD_MEMBER);
        let bytes = DockerManager::capture_to_file(cmd, &dest, "upload volume export").await?;
        if bytes == 0 {
            bail!("Upload volume export produced no output");
        }
        Ok(())
    }

    /// Export the single keyring file from the key-store volume
    async fn export_keystore(&self, workdir: &Path) -> Result<()> {
        let volume = self.docker.volume_name(XMPP_VOLUME);
        let file = format!("/data/{}", KEYSTORE_FILE);
        let cmd = self.docker.volume_reader(&volume, &["cat", &file]);

        let dest = workdir.join(ARCHIVE_KEYSTORE_MEMBER);
        let bytes = DockerManager::capture_to_file(cmd, &dest, "key store export").await?;
        if bytes == 0 {
            bail!("Key store export produced no output");
        }
        Ok(())
    }

    /// Package the three domain directories into one compressed archive
    fn package(&self, workdir: &Path, archive: &Path) -> Result<()> {
        let status = std::process::Command::new("tar")
            .arg("-czf")
            .arg(archive)
            .arg("-C")
            .arg(workdir)
            .args(ARCHIVE_DOMAINS)
            .status()
            .context("Failed to run tar")?;

        if !status.success() {
            let _ = fs::remove_file(archive);
            bail!("Packaging the archive failed with {}", status);
        }
        Ok(())
    }

    /// Snapshot Consumer: destroy the instance's volumes and replay the
    /// archive's three domains in dependency order. All precondition checks
    /// happen before the first destructive step; after that there is no
    /// rollback.
    pub async fn restore(
        &self,
        archive_path: &Path,
        prompt: &dyn ConfirmationPrompt,
        policy: RetryPolicy,
    ) -> Result<()> {
        let archive = Archive::open(archive_path)?;
        archive.validate()?;

        confirm_restore(prompt, &self.config.instance, archive_path)?;

        println!("Tearing down instance {} (volumes included)...", self.config.instance);
        self.docker.down_with_volumes().await?;
        self.docker.create_stopped().await?;

        println!("Starting database service...");
        self.docker.start_service(DB_SERVICE).await?;
        print!("Waiting for the database to become ready");
        std::io::stdout().flush().ok();
        self.wait_for_database(policy).await?;
        println!();

        println!("Restoring {}...", ARCHIVE_DB_MEMBER);
        let db = &self.config.database;
        let producer = archive.extract_member_command(ARCHIVE_DB_MEMBER);
        let consumer = self.docker.exec_command(
            DB_SERVICE,
            &[("MYSQL_PWD", db.password.as_str())],
            &["mysql", "-u", db.user.as_str(), db.name.as_str()],
        );
        DockerManager::pipe_commands(producer, consumer, "database restore").await?;

        println!("Restoring {}...", ARCHIVE_UPLOAD_MEMBER);
        self.docker.start_service(UPLOAD_SERVICE).await?;
        let producer = archive.extract_member_command(ARCHIVE_UPLOAD_MEMBER);
        let consumer =
            self.docker
                .exec_command(UPLOAD_SERVICE, &[], &["tar", "-x", "-C", UPLOAD_DATA_DIR]);
        DockerManager::pipe_commands(producer, consumer, "upload restore").await?;

        println!("Restoring {}...", ARCHIVE_KEYSTORE_MEMBER);
        self.docker.start_service(XMPP_SERVICE).await?;
        let producer = archive.extract_member_command(ARCHIVE_KEYSTORE_MEMBER);
        let consumer = self.docker.exec_command(
            XMPP_SERVICE,
            &[],
            &["sh", "-c", &format!("cat > {}", KEYSTORE_PATH)],
        );
        DockerManager::pipe_commands(producer, consumer, "key store restore").await?;

        Ok(())
    }

    /// Poll the database with a trivial status query until it answers,
    /// sleeping a fixed interval between attempts
    pub async fn wait_for_database(&self, policy: RetryPolicy) -> Result<()> {
        let mut attempts: u32 = 0;
        loop {
            if self.docker.ping_database(&self.config.database).await {
                return Ok(());
            }

            attempts += 1;
            if policy.exhausted(attempts) {
                return Err(OrchestratorError::ReadinessTimeout(attempts).into());
            }

            print!(".");
            std::io::stdout().flush().ok();
            tokio::time::sleep(policy.interval).await;
        }
    }

    /// List this instance's archives in the backup destination
    pub fn list_backups(&self) -> Result<Vec<BackupEntry>> {
        self.ensure_backup_dir()?;

        let prefix = format!("{}-", self.config.instance);
        let mut entries = Vec::new();

        for entry in fs::read_dir(&self.config.backup_dir)
            .with_context(|| format!("Failed to read {}", self.config.backup_dir.display()))?
        {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(&prefix) || !name.ends_with(".tar.gz") {
                continue;
            }

            let metadata = entry.metadata()?;
            let modified = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);

            entries.push(BackupEntry {
                path: entry.path(),
                size: metadata.len(),
                modified,
            });
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;
    use tempfile::TempDir;

    #[test]
    fn test_retry_policy() {
        let unbounded = RetryPolicy::default();
        assert!(!unbounded.exhausted(1_000_000));

        let bounded = RetryPolicy::bounded(Duration::from_millis(10), 3);
        assert!(!bounded.exhausted(2));
        assert!(bounded.exhausted(3));
    }

    #[test]
    fn test_parse_listing() {
        let listing = "\
drwxr-xr-x root/root 0 2024-05-01 12:00 db/
-rw-r--r-- root/root 1234 2024-05-01 12:00 db/kontalk.sql
-rw-r--r-- root/root 99 2024-05-01 12:00 httpupload/disk.tar
-rw-r--r-- root/root 42 2024-05-01 12:00 xmpp/keyring.kch
";
        let members = Archive::parse_listing(listing);
        assert_eq!(members.len(), 4);

        let sql = members.iter().find(|m| m.path == ARCHIVE_DB_MEMBER).unwrap();
        assert_eq!(sql.size, 1234);
    }

    #[test]
    fn test_parse_listing_keeps_stored_names() {
        let listing = "\
drwxr-xr-x root/root 0 2024-05-01 12:00 ./
drwxr-xr-x root/root 0 2024-05-01 12:00 ./db/
-rw-r--r-- root/root 1234 2024-05-01 12:00 ./db/kontalk.sql
";
        let members = Archive::parse_listing(listing);
        let sql = members
            .iter()
            .find(|m| m.path == "./db/kontalk.sql")
            .unwrap();
        assert_eq!(sql.size, 1234);
    }

    #[test]
    fn test_open_missing_archive() {
        let err = Archive::open("/nonexistent/foo-1.tar.gz").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OrchestratorError>(),
            Some(OrchestratorError::ArchiveNotFound(_))
        ));
    }

    /// Build a real archive with the given domain files using the host tar
    fn make_archive(dir: &TempDir, files: &[(&str, &str)]) -> PathBuf {
        let workdir = dir.path().join("work");
        for (member, content) in files {
            let path = workdir.join(member);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, content).unwrap();
        }

        let archive = dir.path().join("foo-20240501120000.tar.gz");
        let mut cmd = StdCommand::new("tar");
        cmd.arg("-czf").arg(&archive).arg("-C").arg(&workdir);
        for domain in ARCHIVE_DOMAINS {
            if workdir.join(domain).exists() {
                cmd.arg(domain);
            }
        }
        assert!(cmd.status().unwrap().success());
        archive
    }

    #[test]
    fn test_valid_archive_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = make_archive(
            &dir,
            &[
                (ARCHIVE_DB_MEMBER, "CREATE TABLE t (id INT);"),
                (ARCHIVE_UPLOAD_MEMBER, "tarball bytes"),
                (ARCHIVE_KEYSTORE_MEMBER, "keyring bytes"),
            ],
        );

        let archive = Archive::open(&path).unwrap();
        archive.validate().unwrap();
        assert!(archive.member(ARCHIVE_DB_MEMBER).unwrap().size > 0);
        assert!(archive.member(ARCHIVE_KEYSTORE_MEMBER).unwrap().size > 0);
    }

    #[test]
    fn test_archive_missing_member_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = make_archive(
            &dir,
            &[
                (ARCHIVE_DB_MEMBER, "CREATE TABLE t (id INT);"),
                (ARCHIVE_UPLOAD_MEMBER, "tarball bytes"),
            ],
        );

        let archive = Archive::open(&path).unwrap();
        let err = archive.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OrchestratorError>(),
            Some(OrchestratorError::BadArchiveMember(m)) if m == ARCHIVE_KEYSTORE_MEMBER
        ));
    }

    #[test]
    fn test_archive_empty_member_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = make_archive(
            &dir,
            &[
                (ARCHIVE_DB_MEMBER, ""),
                (ARCHIVE_UPLOAD_MEMBER, "tarball bytes"),
                (ARCHIVE_KEYSTORE_MEMBER, "keyring bytes"),
            ],
        );

        let archive = Archive::open(&path).unwrap();
        assert!(archive.validate().is_err());
    }

    #[tokio::test]
    async fn test_dot_prefixed_archive_extracts_by_stored_name() {
        let dir = TempDir::new().unwrap();
        let workdir = dir.path().join("work");
        for (member, content) in [
            (ARCHIVE_DB_MEMBER, "CREATE TABLE t (id INT);"),
            (ARCHIVE_UPLOAD_MEMBER, "tarball bytes"),
            (ARCHIVE_KEYSTORE_MEMBER, "keyring bytes"),
        ] {
            let path = workdir.join(member);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, content).unwrap();
        }

        // Packing with `-C workdir .` stores every member ./-prefixed, the
        // layout repackaged archives commonly arrive in
        let path = dir.path().join("foo-20240501120000.tar.gz");
        let status = StdCommand::new("tar")
            .arg("-czf")
            .arg(&path)
            .arg("-C")
            .arg(&workdir)
            .arg(".")
            .status()
            .unwrap();
        assert!(status.success());

        let archive = Archive::open(&path).unwrap();
        archive.validate().unwrap();

        let output = archive
            .extract_member_command(ARCHIVE_DB_MEMBER)
            .output()
            .await
            .unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout, b"CREATE TABLE t (id INT);");
    }

    #[tokio::test]
    async fn test_failed_dump_discards_workdir() {
        let dir = TempDir::new().unwrap();
        let workdir = dir.path().join("foo-20240501120000");
        for domain in ARCHIVE_DOMAINS {
            std::fs::create_dir_all(workdir.join(domain)).unwrap();
        }

        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo partial; exit 1"]);
        let err = BackupManager::run_database_dump(cmd, &workdir)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("database dump"));

        assert!(!workdir.exists());
        let archives = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tar.gz"))
            .count();
        assert_eq!(archives, 0);
    }

    #[tokio::test]
    async fn test_empty_dump_discards_workdir() {
        let dir = TempDir::new().unwrap();
        let workdir = dir.path().join("foo-20240501120000");
        for domain in ARCHIVE_DOMAINS {
            std::fs::create_dir_all(workdir.join(domain)).unwrap();
        }

        let mut cmd = Command::new("sh");
        cmd.args(["-c", "true"]);
        let err = BackupManager::run_database_dump(cmd, &workdir)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no output"));
        assert!(!workdir.exists());
    }

    #[test]
    fn test_confirm_restore_requires_exact_token() {
        let mut prompt = MockConfirmationPrompt::new();
        prompt
            .expect_confirm()
            .withf(|_, token| token == CONFIRM_TOKEN)
            .returning(|_, _| Ok(false));

        let err = confirm_restore(&prompt, "foo", Path::new("/backups/foo-1.tar.gz")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OrchestratorError>(),
            Some(OrchestratorError::Declined)
        ));

        let mut prompt = MockConfirmationPrompt::new();
        prompt.expect_confirm().returning(|_, _| Ok(true));
        confirm_restore(&prompt, "foo", Path::new("/backups/foo-1.tar.gz")).unwrap();
    }
}
