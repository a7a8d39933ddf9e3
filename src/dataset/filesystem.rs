//! Filesystem entity

use crate::command::{args, Invocation};
use crate::dataset::client::Zfs;
use crate::dataset::destroy::DestroyFlags;
use crate::dataset::info::{snapshot_name, DatasetKind, Depth, Info};
use crate::dataset::snapshot::Snapshot;
use crate::error::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A filesystem dataset as of the query that produced it
#[derive(Debug, Clone)]
pub struct Filesystem {
    pub info: Info,
    zfs: Zfs,
}

impl Filesystem {
    pub(crate) fn new(zfs: Zfs, info: Info) -> Self {
        Self { info, zfs }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Query the tool again for this filesystem's current attributes
    pub async fn refresh(&self, cancel: &CancellationToken) -> Result<Filesystem> {
        self.zfs.get_filesystem(cancel, &self.info.name).await
    }

    pub async fn destroy(&self, cancel: &CancellationToken, flags: DestroyFlags) -> Result<()> {
        self.zfs.destroy(cancel, &self.info.name, flags).await
    }

    pub async fn set_property(&self, cancel: &CancellationToken, key: &str, value: &str) -> Result<()> {
        self.zfs
            .set_property(cancel, &self.info.name, key, value)
            .await
    }

    /// Current value of a property and whether it is set at all
    pub async fn get_property(&self, cancel: &CancellationToken, key: &str) -> Result<(String, bool)> {
        self.zfs.get_property(cancel, &self.info.name, key).await
    }

    /// Snapshots of this filesystem only, oldest first
    pub async fn snapshots(&self, cancel: &CancellationToken) -> Result<Vec<Snapshot>> {
        self.zfs
            .snapshots_under(cancel, Some(&self.info.name), Depth::CHILDREN)
            .await
    }

    /// Take a snapshot named `parent@name`
    pub async fn snapshot(&self, cancel: &CancellationToken, name: &str) -> Result<Snapshot> {
        self.take_snapshot(cancel, name, false).await
    }

    /// Take `name` atomically on this filesystem and every descendant
    pub async fn snapshot_recursive(&self, cancel: &CancellationToken, name: &str) -> Result<Snapshot> {
        self.take_snapshot(cancel, name, true).await
    }

    async fn take_snapshot(
        &self,
        cancel: &CancellationToken,
        name: &str,
        recursive: bool,
    ) -> Result<Snapshot> {
        let full_name = snapshot_name(&self.info.name, name);
        self.zfs
            .zfs(cancel, args::snapshot(&full_name, recursive))
            .await?;
        info!("Created snapshot {}", full_name);
        self.zfs.get_snapshot(cancel, &full_name).await
    }

    /// Filesystems exactly one level below this one, in namespace order
    pub async fn children(&self, cancel: &CancellationToken) -> Result<Vec<Filesystem>> {
        let infos = self
            .zfs
            .list(
                cancel,
                DatasetKind::Filesystem,
                Some(&self.info.name),
                Depth::CHILDREN,
            )
            .await?;

        // row 0 is this filesystem
        Ok(infos
            .into_iter()
            .skip(1)
            .map(|info| Filesystem::new(self.zfs.clone(), info))
            .collect())
    }

    pub async fn mount(&self, cancel: &CancellationToken) -> Result<()> {
        self.zfs.zfs(cancel, args::mount(&self.info.name)).await?;
        Ok(())
    }

    pub async fn unmount(&self, cancel: &CancellationToken) -> Result<()> {
        self.zfs.zfs(cancel, args::unmount(&self.info.name)).await?;
        Ok(())
    }

    /// Load the encryption key, feeding the passphrase on stdin
    pub async fn load_key(&self, cancel: &CancellationToken, password: &str) -> Result<()> {
        let invocation = Invocation::zfs(args::load_key(&self.info.name))
            .with_stdin_bytes(password.as_bytes().to_vec());
        self.zfs.run(cancel, invocation).await?;
        Ok(())
    }

    pub async fn unload_key(&self, cancel: &CancellationToken) -> Result<()> {
        self.zfs.zfs(cancel, args::unload_key(&self.info.name)).await?;
        Ok(())
    }
}

impl Zfs {
    pub(crate) fn filesystem(&self, info: Info) -> Filesystem {
        Filesystem::new(self.clone(), info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Tool;
    use crate::dataset::destroy::DestroyFlag;
    use crate::testing::{info_line, FakeRunner, Reply};

    fn filesystem(runner: &std::sync::Arc<FakeRunner>, name: &str) -> Filesystem {
        Zfs::with_runner(runner.clone()).filesystem(Info {
            name: name.to_string(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_children_excludes_self() {
        let runner = FakeRunner::new();
        runner.reply(
            Tool::Zfs,
            "list",
            Reply::Stdout(
                ["tank/A", "tank/A/A", "tank/A/B"]
                    .iter()
                    .map(|n| info_line(n))
                    .collect(),
            ),
        );

        let children = filesystem(&runner, "tank/A")
            .children(&CancellationToken::new())
            .await
            .unwrap();

        let names: Vec<&str> = children.iter().map(|fs| fs.name()).collect();
        assert_eq!(names, ["tank/A/A", "tank/A/B"]);
        assert_eq!(&runner.call(0).args[6..], ["-d", "1", "tank/A"]);
    }

    #[tokio::test]
    async fn test_children_of_leaf_is_empty() {
        let runner = FakeRunner::new();
        runner.reply(Tool::Zfs, "list", Reply::Stdout(info_line("tank/leaf")));

        let children = filesystem(&runner, "tank/leaf")
            .children(&CancellationToken::new())
            .await
            .unwrap();
        assert!(children.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_name_and_refetch() {
        let runner = FakeRunner::new();
        runner.reply(Tool::Zfs, "list", Reply::Stdout(info_line("tank/fs@daily")));

        let snapshot = filesystem(&runner, "tank/fs")
            .snapshot(&CancellationToken::new(), "daily")
            .await
            .unwrap();

        assert_eq!(snapshot.info.name, "tank/fs@daily");
        assert_eq!(runner.call(0).args, vec!["snapshot", "tank/fs@daily"]);
        assert_eq!(runner.call(1).args.last().unwrap(), "tank/fs@daily");
    }

    #[tokio::test]
    async fn test_snapshot_recursive() {
        let runner = FakeRunner::new();
        runner.reply(Tool::Zfs, "list", Reply::Stdout(info_line("tank@all")));

        filesystem(&runner, "tank")
            .snapshot_recursive(&CancellationToken::new(), "all")
            .await
            .unwrap();
        assert_eq!(runner.call(0).args, vec!["snapshot", "-r", "tank@all"]);
    }

    #[tokio::test]
    async fn test_snapshots_lists_one_level() {
        let runner = FakeRunner::new();
        runner.reply(
            Tool::Zfs,
            "list",
            Reply::Stdout(format!("{}{}", info_line("tank/fs@1"), info_line("tank/fs@2"))),
        );

        let snapshots = filesystem(&runner, "tank/fs")
            .snapshots(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[1].info.name, "tank/fs@2");
        assert_eq!(runner.call(0).args[3], "snapshot");
    }

    #[tokio::test]
    async fn test_destroy_flags() {
        let runner = FakeRunner::new();
        filesystem(&runner, "tank/fs")
            .destroy(
                &CancellationToken::new(),
                DestroyFlag::Recursive | DestroyFlag::ForceUnmount,
            )
            .await
            .unwrap();
        assert_eq!(runner.call(0).args, vec!["destroy", "-r", "-f", "tank/fs"]);
    }

    #[tokio::test]
    async fn test_mount_failure_is_distinct_invocation_error() {
        let runner = FakeRunner::new();
        runner.reply(
            Tool::Zfs,
            "mount",
            Reply::Fail("encryption key not loaded".into()),
        );

        let fs = filesystem(&runner, "tank/secret");
        let cancel = CancellationToken::new();

        let err = fs.mount(&cancel).await.unwrap_err();
        assert!(err.is_invocation());
        assert!(!err.is_cancellation());
        assert_eq!(err.stderr(), Some("encryption key not loaded"));

        fs.load_key(&cancel, "supersecret").await.unwrap();
        fs.mount(&cancel).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls[1].args, vec!["load-key", "tank/secret"]);
        assert_eq!(calls[1].stdin.as_deref(), Some(&b"supersecret"[..]));
        assert_eq!(calls[2].args, vec!["mount", "tank/secret"]);
    }

    #[tokio::test]
    async fn test_mount_fails_again_after_unload_key() {
        let runner = FakeRunner::new();
        runner.reply(
            Tool::Zfs,
            "mount",
            Reply::Fail("encryption key not loaded".into()),
        );
        runner.reply(Tool::Zfs, "mount", Reply::Stdout(String::new()));
        runner.reply(
            Tool::Zfs,
            "mount",
            Reply::Fail("encryption key not loaded".into()),
        );
        runner.reply(Tool::Zfs, "mount", Reply::Stdout(String::new()));

        let fs = filesystem(&runner, "tank/secret");
        let cancel = CancellationToken::new();

        assert!(fs.mount(&cancel).await.unwrap_err().is_invocation());
        fs.load_key(&cancel, "supersecret").await.unwrap();
        fs.mount(&cancel).await.unwrap();

        fs.unmount(&cancel).await.unwrap();
        fs.unload_key(&cancel).await.unwrap();
        let err = fs.mount(&cancel).await.unwrap_err();
        assert!(err.is_invocation());
        assert_eq!(err.stderr(), Some("encryption key not loaded"));

        fs.load_key(&cancel, "supersecret").await.unwrap();
        fs.mount(&cancel).await.unwrap();

        let subcommands: Vec<String> = runner
            .calls()
            .into_iter()
            .map(|call| call.args[0].clone())
            .collect();
        assert_eq!(
            subcommands,
            [
                "mount", "load-key", "mount", "umount", "unload-key", "mount", "load-key", "mount"
            ]
        );
        assert_eq!(runner.call(6).stdin.as_deref(), Some(&b"supersecret"[..]));
    }

    #[tokio::test]
    async fn test_unmount_and_unload_key() {
        let runner = FakeRunner::new();
        let fs = filesystem(&runner, "tank/secret");
        let cancel = CancellationToken::new();

        fs.unmount(&cancel).await.unwrap();
        fs.unload_key(&cancel).await.unwrap();

        assert_eq!(runner.call(0).args, vec!["umount", "tank/secret"]);
        assert_eq!(runner.call(1).args, vec!["unload-key", "tank/secret"]);
    }

    #[tokio::test]
    async fn test_properties() {
        let runner = FakeRunner::new();
        runner.reply(
            Tool::Zfs,
            "get",
            Reply::Stdout("tank/fs\ttest:prop3\t-\t-\n".into()),
        );
        runner.reply(
            Tool::Zfs,
            "get",
            Reply::Stdout("tank/fs\ttest:prop3\tvalue3\tlocal\n".into()),
        );

        let fs = filesystem(&runner, "tank/fs");
        let cancel = CancellationToken::new();

        assert_eq!(
            fs.get_property(&cancel, "test:prop3").await.unwrap(),
            (String::new(), false)
        );
        fs.set_property(&cancel, "test:prop3", "value3").await.unwrap();
        assert_eq!(
            fs.get_property(&cancel, "test:prop3").await.unwrap(),
            ("value3".to_string(), true)
        );

        assert_eq!(
            runner.call(1).args,
            vec!["set", "test:prop3=value3", "tank/fs"]
        );
    }
}
