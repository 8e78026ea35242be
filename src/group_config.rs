//! On-disk persistence for a multi-signature cohort: the joint public key
//! and the ordered list of members a client needs to dial.

use std::fs;
use std::io::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::keys::PublicKey;
use crate::multisig::aggregate_public_keys;

/// One cohort member's dial target and public key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub host_name: String,
    pub port: u16,
    pub pkey: String,
}

impl Member {
    pub fn new(host_name: impl Into<String>, port: u16, pkey: &PublicKey) -> Member {
        Member {
            host_name: host_name.into(),
            port,
            pkey: pkey.to_disk_repr(),
        }
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_disk_repr(&self.pkey)
    }
}

/// The persisted record a `sthresholdclient` invocation is driven by: the
/// aggregated joint key and the ordered member list. Member order indexes
/// the client's per-peer channels; the joint key itself is order-independent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    pub joint_key: String,
    pub members: Vec<Member>,
}

impl GroupConfig {
    /// Builds a `GroupConfig` from member public keys, aggregating the
    /// joint key from them.
    pub fn new(members: Vec<Member>) -> Result<GroupConfig> {
        let keys: Vec<PublicKey> = members
            .iter()
            .map(Member::public_key)
            .collect::<Result<_>>()?;
        let joint = aggregate_public_keys(&keys);
        Ok(GroupConfig {
            joint_key: joint.to_disk_repr(),
            members,
        })
    }

    pub fn joint_public_key(&self) -> Result<PublicKey> {
        PublicKey::from_disk_repr(&self.joint_key)
    }

    /// Writes the config as JSON with permission 0644.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        let mut file = fs::File::create(path.as_ref())?;
        file.write_all(&json)?;
        set_permissions(path.as_ref(), 0o644)?;
        Ok(())
    }

    pub fn read_from_file(path: impl AsRef<Path>) -> Result<GroupConfig> {
        let contents = fs::read(path.as_ref())?;
        Ok(serde_json::from_slice(&contents)?)
    }
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let perms = fs::Permissions::from_mode(mode);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::SecretKey;

    #[test]
    fn round_trips_through_a_file() {
        let mut rng = rand::thread_rng();
        let secrets: Vec<SecretKey> = (0..3).map(|_| SecretKey::generate(&mut rng)).collect();
        let members: Vec<Member> = secrets
            .iter()
            .enumerate()
            .map(|(i, sk)| Member::new(format!("member-{}", i), 9000 + i as u16, &sk.public()))
            .collect();

        let config = GroupConfig::new(members).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("group.json");
        config.write_to_file(&path).unwrap();

        let loaded = GroupConfig::read_from_file(&path).unwrap();
        assert_eq!(loaded.joint_key, config.joint_key);
        assert_eq!(loaded.members.len(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn file_permissions_are_0644() {
        use std::os::unix::fs::PermissionsExt;

        let mut rng = rand::thread_rng();
        let sk = SecretKey::generate(&mut rng);
        let members = vec![Member::new("localhost", 9000, &sk.public())];
        let config = GroupConfig::new(members).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("group.json");
        config.write_to_file(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn joint_key_matches_manual_aggregation() {
        let mut rng = rand::thread_rng();
        let secrets: Vec<SecretKey> = (0..4).map(|_| SecretKey::generate(&mut rng)).collect();
        let publics: Vec<PublicKey> = secrets.iter().map(|s| s.public()).collect();
        let expected = aggregate_public_keys(&publics);

        let members: Vec<Member> = secrets
            .iter()
            .enumerate()
            .map(|(i, sk)| Member::new(format!("m{}", i), 9100 + i as u16, &sk.public()))
            .collect();
        let config = GroupConfig::new(members).unwrap();

        assert_eq!(config.joint_public_key().unwrap(), expected);
    }
}
