//! Conflict policies and mechanical resolution.
//!
//! Every sync item carries a [`ConflictPolicy`] chosen by its type's
//! strategy. When the remote reports a divergent version, the engine applies
//! the policy to the local and remote values and delivers the winner.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Policy deciding which of two divergent versions wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// The remote's current value always overrides local. Used for data a
    /// stale client must never clobber: quiz submissions, enrollment,
    /// payments, content updates.
    ServerWins,
    /// The local value always overrides remote. Used for user-local UI
    /// state: notification read/dismiss flags, analytics.
    ClientWins,
    /// Field-level union of local and remote; local fields take precedence.
    /// Used for profile edits, where users edit disjoint fields across
    /// devices.
    Merge,
    /// The version with the highest timestamp wins. Used for continuously
    /// updated progress, where overwriting is cheap and frequent.
    LastWriteWins,
    /// Deferred to explicit operator action. Reserved extension point; no
    /// default strategy selects it and it is never auto-resolved.
    Manual,
}

impl ConflictPolicy {
    /// Returns true if this policy resolves conflicts without operator action.
    pub fn auto_resolves(&self) -> bool {
        !matches!(self, ConflictPolicy::Manual)
    }

    /// Returns the wire name of this policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictPolicy::ServerWins => "server_wins",
            ConflictPolicy::ClientWins => "client_wins",
            ConflictPolicy::Merge => "merge",
            ConflictPolicy::LastWriteWins => "last_write_wins",
            ConflictPolicy::Manual => "manual",
        }
    }

    /// Resolves a divergence between `local` and `remote`.
    ///
    /// `local_ts_ms` and `remote_ts_ms` are the write times used by
    /// [`ConflictPolicy::LastWriteWins`]; a tie keeps the local version.
    pub fn resolve(
        &self,
        local: &Value,
        remote: &Value,
        local_ts_ms: u64,
        remote_ts_ms: u64,
    ) -> Resolution {
        match self {
            ConflictPolicy::ServerWins => Resolution::UseRemote,
            ConflictPolicy::ClientWins => Resolution::UseLocal,
            ConflictPolicy::Merge => Resolution::Merged(merge_fields(local, remote)),
            ConflictPolicy::LastWriteWins => {
                if local_ts_ms >= remote_ts_ms {
                    Resolution::UseLocal
                } else {
                    Resolution::UseRemote
                }
            }
            ConflictPolicy::Manual => Resolution::Unresolved,
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of applying a [`ConflictPolicy`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The local version wins.
    UseLocal,
    /// The remote version wins.
    UseRemote,
    /// A merged value wins.
    Merged(Value),
    /// The policy does not auto-resolve; operator action required.
    Unresolved,
}

impl Resolution {
    /// Materializes the winning value, cloning from `local`/`remote` as
    /// directed. Returns `None` for [`Resolution::Unresolved`].
    pub fn winner(&self, local: &Value, remote: &Value) -> Option<Value> {
        match self {
            Resolution::UseLocal => Some(local.clone()),
            Resolution::UseRemote => Some(remote.clone()),
            Resolution::Merged(value) => Some(value.clone()),
            Resolution::Unresolved => None,
        }
    }
}

/// Field-level union of two JSON objects, local fields taking precedence.
///
/// Non-object inputs fall back to the local value, since there is nothing
/// field-shaped to merge.
fn merge_fields(local: &Value, remote: &Value) -> Value {
    match (local, remote) {
        (Value::Object(local_map), Value::Object(remote_map)) => {
            let mut merged = remote_map.clone();
            for (key, value) in local_map {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => local.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_wins_takes_remote() {
        let local = json!({"a": 1});
        let remote = json!({"a": 2});
        let resolution = ConflictPolicy::ServerWins.resolve(&local, &remote, 10, 5);
        assert_eq!(resolution, Resolution::UseRemote);
        assert_eq!(resolution.winner(&local, &remote), Some(remote));
    }

    #[test]
    fn client_wins_takes_local() {
        let local = json!({"read": true});
        let remote = json!({"read": false});
        let resolution = ConflictPolicy::ClientWins.resolve(&local, &remote, 1, 100);
        assert_eq!(resolution.winner(&local, &remote), Some(local));
    }

    #[test]
    fn last_write_wins_compares_timestamps() {
        let local = json!({"percent": 40});
        let remote = json!({"percent": 80});

        let newer_remote = ConflictPolicy::LastWriteWins.resolve(&local, &remote, 10, 20);
        assert_eq!(newer_remote, Resolution::UseRemote);

        let newer_local = ConflictPolicy::LastWriteWins.resolve(&local, &remote, 30, 20);
        assert_eq!(newer_local, Resolution::UseLocal);

        // Tie keeps local
        let tie = ConflictPolicy::LastWriteWins.resolve(&local, &remote, 20, 20);
        assert_eq!(tie, Resolution::UseLocal);
    }

    #[test]
    fn merge_unions_fields_with_local_precedence() {
        let local = json!({"display_name": "Ada", "bio": "new bio"});
        let remote = json!({"display_name": "Ada L.", "avatar": "x.png"});

        let resolution = ConflictPolicy::Merge.resolve(&local, &remote, 0, 0);
        let Resolution::Merged(merged) = resolution else {
            panic!("expected merged resolution");
        };
        assert_eq!(merged["display_name"], "Ada");
        assert_eq!(merged["bio"], "new bio");
        assert_eq!(merged["avatar"], "x.png");
    }

    #[test]
    fn merge_of_non_objects_keeps_local() {
        let local = json!("local");
        let remote = json!({"a": 1});
        let resolution = ConflictPolicy::Merge.resolve(&local, &remote, 0, 0);
        assert_eq!(resolution, Resolution::Merged(local));
    }

    #[test]
    fn manual_never_auto_resolves() {
        assert!(!ConflictPolicy::Manual.auto_resolves());
        let resolution = ConflictPolicy::Manual.resolve(&json!(1), &json!(2), 0, 0);
        assert_eq!(resolution, Resolution::Unresolved);
        assert_eq!(resolution.winner(&json!(1), &json!(2)), None);
    }

    #[test]
    fn every_other_policy_auto_resolves() {
        for policy in [
            ConflictPolicy::ServerWins,
            ConflictPolicy::ClientWins,
            ConflictPolicy::Merge,
            ConflictPolicy::LastWriteWins,
        ] {
            assert!(policy.auto_resolves(), "{policy} should auto-resolve");
        }
    }
}
