//! Destroy policy flags
//!
//! Compose with `|`; an empty set destroys only the named dataset.

use enumflags2::{bitflags, BitFlags};

/// One destroy policy bit
#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyFlag {
    /// Also destroy descendants (`-r`)
    Recursive = 0b0001,
    /// Also destroy dependent clones (`-R`)
    RecursiveClones = 0b0010,
    /// Mark for deferred destruction if still held (`-d`)
    DeferDeletion = 0b0100,
    /// Force-unmount before destroying (`-f`)
    ForceUnmount = 0b1000,
}

/// Set of destroy policy bits
pub type DestroyFlags = BitFlags<DestroyFlag>;

/// Flag emission order on the command line
const FLAG_ORDER: [(DestroyFlag, &str); 4] = [
    (DestroyFlag::Recursive, "-r"),
    (DestroyFlag::RecursiveClones, "-R"),
    (DestroyFlag::DeferDeletion, "-d"),
    (DestroyFlag::ForceUnmount, "-f"),
];

/// Command-line flags for a policy, in fixed order
pub fn flag_args(flags: DestroyFlags) -> Vec<String> {
    FLAG_ORDER
        .iter()
        .filter(|(flag, _)| flags.contains(*flag))
        .map(|(_, arg)| arg.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_flags() {
        assert!(flag_args(DestroyFlags::empty()).is_empty());
    }

    #[test]
    fn test_flags_emitted_in_fixed_order() {
        let flags = DestroyFlag::ForceUnmount | DestroyFlag::Recursive | DestroyFlag::DeferDeletion;
        assert_eq!(flag_args(flags), vec!["-r", "-d", "-f"]);

        assert_eq!(
            flag_args(DestroyFlags::all()),
            vec!["-r", "-R", "-d", "-f"]
        );
    }
}
