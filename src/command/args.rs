//! Argument-vector builders
//!
//! Pure functions from a subcommand and its typed options to the ordered
//! argument list handed to the tool. Nothing here spawns a process.

use crate::dataset::destroy::{flag_args, DestroyFlags};
use crate::dataset::info::{DatasetKind, Depth, PROPERTY_COLUMNS};
use crate::stream::SendOptions;
use std::collections::BTreeMap;

/// Property key that is never forwarded; it turns on passphrase encryption
pub const PASSWORD_PROPERTY: &str = "password";

fn args<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn property_args<'a>(properties: impl IntoIterator<Item = (&'a String, &'a String)>) -> Vec<String> {
    properties
        .into_iter()
        .flat_map(|(key, value)| ["-o".to_string(), format!("{}={}", key, value)])
        .collect()
}

// =============================================================================
// Dataset Tool
// =============================================================================

/// `list -Hp -t <kind> -o <columns> -d <depth> [<filter>]`
pub fn list(kind: DatasetKind, filter: Option<&str>, depth: Depth) -> Vec<String> {
    let mut out = args(["list", "-Hp", "-t"]);
    out.push(kind.to_string());
    out.push("-o".into());
    out.push(PROPERTY_COLUMNS.join(","));
    out.push("-d".into());
    out.push(depth.to_string());
    if let Some(filter) = filter.filter(|f| !f.is_empty()) {
        out.push(filter.to_string());
    }
    out
}

/// `create [-o k=v]* [encryption flags] <name>`
///
/// The reserved password entry is dropped from the property list; when
/// present, passphrase encryption flags are added instead.
pub fn create(name: &str, properties: &BTreeMap<String, String>) -> Vec<String> {
    let mut out = args(["create"]);
    out.extend(property_args(
        properties
            .iter()
            .filter(|(key, _)| key.as_str() != PASSWORD_PROPERTY),
    ));
    if properties.contains_key(PASSWORD_PROPERTY) {
        out.extend(args([
            "-o",
            "encryption=on",
            "-o",
            "keylocation=prompt",
            "-o",
            "keyformat=passphrase",
        ]));
    }
    out.push(name.to_string());
    out
}

/// Standard input for an encrypted create: the tool prompts twice
pub fn create_passphrase_input(password: &str) -> Vec<u8> {
    format!("{}\n{}", password, password).into_bytes()
}

/// `destroy [-r][-R][-d][-f] <name>`
pub fn destroy(name: &str, flags: DestroyFlags) -> Vec<String> {
    let mut out = args(["destroy"]);
    out.extend(flag_args(flags));
    out.push(name.to_string());
    out
}

/// `set <key=value> <name>`
pub fn set_property(name: &str, key: &str, value: &str) -> Vec<String> {
    vec!["set".into(), format!("{}={}", key, value), name.to_string()]
}

/// `get -H <key> <name>`
pub fn get_property(name: &str, key: &str) -> Vec<String> {
    args(["get", "-H", key, name])
}

/// `snapshot [-r] <name>`
pub fn snapshot(name: &str, recursive: bool) -> Vec<String> {
    let mut out = args(["snapshot"]);
    if recursive {
        out.push("-r".into());
    }
    out.push(name.to_string());
    out
}

/// `rollback -r <snapshot>`
pub fn rollback(name: &str) -> Vec<String> {
    args(["rollback", "-r", name])
}

/// `clone [-o k=v]* <snapshot> <dest>`
pub fn clone(snapshot: &str, dest: &str, properties: &BTreeMap<String, String>) -> Vec<String> {
    let mut out = args(["clone"]);
    out.extend(property_args(properties));
    out.push(snapshot.to_string());
    out.push(dest.to_string());
    out
}

pub fn mount(name: &str) -> Vec<String> {
    args(["mount", name])
}

pub fn unmount(name: &str) -> Vec<String> {
    args(["umount", name])
}

/// `load-key <name>`, passphrase on stdin
pub fn load_key(name: &str) -> Vec<String> {
    args(["load-key", name])
}

pub fn unload_key(name: &str) -> Vec<String> {
    args(["unload-key", name])
}

/// `send [-i <base>][-p][-w] <snapshot>`
pub fn send(name: &str, options: &SendOptions) -> Vec<String> {
    let mut out = args(["send"]);
    if let Some(base) = options.incremental_base() {
        out.push("-i".into());
        out.push(base.to_string());
    }
    if options.includes_properties() {
        out.push("-p".into());
    }
    if options.is_raw() {
        out.push("-w".into());
    }
    out.push(name.to_string());
    out
}

/// `receive <name>`, stream on stdin
pub fn receive(name: &str) -> Vec<String> {
    args(["receive", name])
}

pub fn hold(name: &str, tag: &str) -> Vec<String> {
    args(["hold", tag, name])
}

pub fn release(name: &str, tag: &str) -> Vec<String> {
    args(["release", tag, name])
}

/// `holds -H <snapshot>`
pub fn holds(name: &str) -> Vec<String> {
    args(["holds", "-H", name])
}

// =============================================================================
// Pool Tool
// =============================================================================

/// `list -H -o name [<name>]`
pub fn list_pools(name: Option<&str>) -> Vec<String> {
    let mut out = args(["list", "-H", "-o", "name"]);
    if let Some(name) = name {
        out.push(name.to_string());
    }
    out
}

pub fn import_pool(name: &str) -> Vec<String> {
    args(["import", name])
}

pub fn export_pool(name: &str) -> Vec<String> {
    args(["export", name])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::destroy::DestroyFlag;

    fn props(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_list_args() {
        let columns = "name,origin,used,available,mountpoint,compression,volsize,quota,referenced,written,logicalused,usedbydataset";

        assert_eq!(
            list(DatasetKind::Filesystem, None, Depth::UNBOUNDED),
            vec!["list", "-Hp", "-t", "filesystem", "-o", columns, "-d", "65535"]
        );
        assert_eq!(
            list(DatasetKind::Snapshot, Some("tank/a"), Depth::CHILDREN),
            vec!["list", "-Hp", "-t", "snapshot", "-o", columns, "-d", "1", "tank/a"]
        );
        assert_eq!(
            list(DatasetKind::Filesystem, Some(""), Depth::EXACT).len(),
            8
        );
    }

    #[test]
    fn test_create_plain() {
        let args = create("tank/fs", &props(&[("test:b", "2"), ("test:a", "1")]));
        assert_eq!(
            args,
            vec!["create", "-o", "test:a=1", "-o", "test:b=2", "tank/fs"]
        );
    }

    #[test]
    fn test_create_encrypted_never_forwards_password() {
        let args = create("tank/secret", &props(&[("password", "s3cret"), ("test:a", "1")]));
        assert_eq!(
            args,
            vec![
                "create",
                "-o",
                "test:a=1",
                "-o",
                "encryption=on",
                "-o",
                "keylocation=prompt",
                "-o",
                "keyformat=passphrase",
                "tank/secret"
            ]
        );
        assert!(!args.iter().any(|a| a.contains("s3cret")));
        assert_eq!(create_passphrase_input("s3cret"), b"s3cret\ns3cret".to_vec());
    }

    #[test]
    fn test_destroy_args() {
        assert_eq!(
            destroy("tank/fs", DestroyFlags::empty()),
            vec!["destroy", "tank/fs"]
        );
        assert_eq!(
            destroy(
                "tank/fs",
                DestroyFlag::RecursiveClones | DestroyFlag::Recursive
            ),
            vec!["destroy", "-r", "-R", "tank/fs"]
        );
    }

    #[test]
    fn test_property_args() {
        assert_eq!(
            set_property("tank/fs", "test:prop", "a b"),
            vec!["set", "test:prop=a b", "tank/fs"]
        );
        assert_eq!(
            get_property("tank/fs", "test:prop"),
            vec!["get", "-H", "test:prop", "tank/fs"]
        );
    }

    #[test]
    fn test_snapshot_args() {
        assert_eq!(snapshot("tank@s", false), vec!["snapshot", "tank@s"]);
        assert_eq!(snapshot("tank@s", true), vec!["snapshot", "-r", "tank@s"]);
        assert_eq!(rollback("tank@s"), vec!["rollback", "-r", "tank@s"]);
        assert_eq!(
            clone("tank/fs@s", "tank/c", &props(&[("test:p", "v")])),
            vec!["clone", "-o", "test:p=v", "tank/fs@s", "tank/c"]
        );
    }

    #[test]
    fn test_clone_forwards_every_property() {
        assert_eq!(
            clone("tank/fs@s", "tank/c", &props(&[("password", "x"), ("test:p", "v")])),
            vec!["clone", "-o", "password=x", "-o", "test:p=v", "tank/fs@s", "tank/c"]
        );
    }

    #[test]
    fn test_send_args() {
        assert_eq!(
            send("tank/fs@2", &SendOptions::default()),
            vec!["send", "tank/fs@2"]
        );
        let options = SendOptions::default()
            .incremental_from_name("tank/fs@1")
            .properties(true)
            .raw(true);
        assert_eq!(
            send("tank/fs@2", &options),
            vec!["send", "-i", "tank/fs@1", "-p", "-w", "tank/fs@2"]
        );
    }

    #[test]
    fn test_hold_args() {
        assert_eq!(hold("tank@s", "keep"), vec!["hold", "keep", "tank@s"]);
        assert_eq!(release("tank@s", "keep"), vec!["release", "keep", "tank@s"]);
        assert_eq!(holds("tank@s"), vec!["holds", "-H", "tank@s"]);
    }

    #[test]
    fn test_pool_args() {
        assert_eq!(list_pools(None), vec!["list", "-H", "-o", "name"]);
        assert_eq!(
            list_pools(Some("tank")),
            vec!["list", "-H", "-o", "name", "tank"]
        );
        assert_eq!(import_pool("tank"), vec!["import", "tank"]);
        assert_eq!(export_pool("tank"), vec!["export", "tank"]);
    }
}
