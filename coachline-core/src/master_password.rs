use chrono::{DateTime, Utc};
use coachline_shared::Masked;
use serde::{Deserialize, Serialize};

use crate::password::{check_policy, hash_password, verify_password};
use crate::repository::Documents;
use crate::{paths, CoreError, CoreResult, UserId};

/// Stored per account at `users/{uid}/settings/masterPassword`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MasterPasswordRecord {
    active: bool,
    #[serde(default)]
    hash: Option<Masked<String>>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MasterPasswordStatus {
    pub active: bool,
    pub configured: bool,
}

/// Secondary credential that gates destructive operations.
#[derive(Clone)]
pub struct MasterPasswordGate {
    docs: Documents,
}

impl MasterPasswordGate {
    pub fn new(docs: Documents) -> Self {
        Self { docs }
    }

    async fn load(&self, uid: &UserId) -> CoreResult<Option<MasterPasswordRecord>> {
        self.docs.get(&paths::master_password(uid)).await
    }

    pub async fn exists(&self, uid: &UserId) -> CoreResult<bool> {
        Ok(self.load(uid).await?.and_then(|r| r.hash).is_some())
    }

    pub async fn status(&self, uid: &UserId) -> CoreResult<MasterPasswordStatus> {
        let record = self.load(uid).await?;
        Ok(MasterPasswordStatus {
            active: record.as_ref().map(|r| r.active).unwrap_or(false),
            configured: record.and_then(|r| r.hash).is_some(),
        })
    }

    /// Set or replace the password. Replacing requires the current one.
    /// A first-time password is activated immediately.
    pub async fn set(&self, uid: &UserId, new_password: &str, current: Option<&str>) -> CoreResult<()> {
        check_policy(new_password)?;

        let existing = self.load(uid).await?;
        if let Some(hash) = existing.as_ref().and_then(|r| r.hash.as_ref()) {
            let current = current.ok_or(CoreError::MasterPasswordRequired)?;
            if !verify_password(current, hash.expose())? {
                tracing::warn!("Master password change rejected for user {}", uid);
                return Err(CoreError::MasterPasswordIncorrect);
            }
        }

        let record = MasterPasswordRecord {
            active: existing.map(|r| r.active || r.hash.is_none()).unwrap_or(true),
            hash: Some(Masked::new(hash_password(new_password)?)),
            updated_at: Utc::now(),
        };
        self.docs.put(&paths::master_password(uid), &record).await?;
        tracing::info!("Master password updated for user {}", uid);
        Ok(())
    }

    /// Turning the gate on needs a configured password; turning it off needs
    /// the password itself.
    pub async fn set_active(&self, uid: &UserId, active: bool, candidate: Option<&str>) -> CoreResult<MasterPasswordStatus> {
        let mut record = self.load(uid).await?.ok_or(CoreError::MasterPasswordRequired)?;
        let hash = record.hash.clone().ok_or(CoreError::MasterPasswordRequired)?;

        if !active && record.active {
            let candidate = candidate.ok_or(CoreError::MasterPasswordRequired)?;
            if !verify_password(candidate, hash.expose())? {
                return Err(CoreError::MasterPasswordIncorrect);
            }
        }

        record.active = active;
        record.updated_at = Utc::now();
        self.docs.put(&paths::master_password(uid), &record).await?;
        tracing::info!("Master password gate {} for user {}", if active { "enabled" } else { "disabled" }, uid);

        Ok(MasterPasswordStatus { active, configured: true })
    }

    /// Passes when the gate is inactive or `candidate` matches. An active gate
    /// without a stored password blocks everything until a password is set.
    pub async fn validate(&self, uid: &UserId, candidate: Option<&str>) -> CoreResult<()> {
        let record = match self.load(uid).await? {
            Some(record) if record.active => record,
            _ => return Ok(()),
        };

        let hash = record.hash.ok_or(CoreError::MasterPasswordRequired)?;
        let candidate = candidate
            .filter(|c| !c.is_empty())
            .ok_or(CoreError::MasterPasswordRequired)?;

        if verify_password(candidate, hash.expose())? {
            Ok(())
        } else {
            tracing::warn!("Master password mismatch for user {}", uid);
            Err(CoreError::MasterPasswordIncorrect)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryDocumentStore;
    use std::sync::Arc;

    fn gate() -> (MasterPasswordGate, Documents) {
        let docs = Documents::new(Arc::new(MemoryDocumentStore::new()));
        (MasterPasswordGate::new(docs.clone()), docs)
    }

    #[tokio::test]
    async fn test_validate_passes_when_not_configured() {
        let (gate, _) = gate();
        let uid = UserId::new("u1");

        assert!(!gate.exists(&uid).await.unwrap());
        gate.validate(&uid, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_validate_checks_candidate_when_active() {
        let (gate, _) = gate();
        let uid = UserId::new("u1");
        gate.set(&uid, "Secret1", None).await.unwrap();

        let status = gate.status(&uid).await.unwrap();
        assert_eq!(status, MasterPasswordStatus { active: true, configured: true });

        assert!(matches!(gate.validate(&uid, None).await, Err(CoreError::MasterPasswordRequired)));
        assert!(matches!(gate.validate(&uid, Some("nope")).await, Err(CoreError::MasterPasswordIncorrect)));
        gate.validate(&uid, Some("Secret1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_change_requires_current_password() {
        let (gate, _) = gate();
        let uid = UserId::new("u1");
        gate.set(&uid, "Secret1", None).await.unwrap();

        assert!(matches!(gate.set(&uid, "Other22", None).await, Err(CoreError::MasterPasswordRequired)));
        assert!(matches!(gate.set(&uid, "Other22", Some("bad")).await, Err(CoreError::MasterPasswordIncorrect)));
        gate.set(&uid, "Other22", Some("Secret1")).await.unwrap();
        gate.validate(&uid, Some("Other22")).await.unwrap();
    }

    #[tokio::test]
    async fn test_weak_password_rejected() {
        let (gate, _) = gate();
        let uid = UserId::new("u1");
        assert!(matches!(gate.set(&uid, "weak", None).await, Err(CoreError::ValidationFailed(_))));
    }

    #[tokio::test]
    async fn test_active_without_password_blocks() {
        let (gate, docs) = gate();
        let uid = UserId::new("u1");
        docs.put(
            &paths::master_password(&uid),
            &serde_json::json!({"active": true, "updatedAt": Utc::now()}),
        )
        .await
        .unwrap();

        assert!(matches!(gate.validate(&uid, Some("x")).await, Err(CoreError::MasterPasswordRequired)));
    }

    #[tokio::test]
    async fn test_disable_requires_password() {
        let (gate, _) = gate();
        let uid = UserId::new("u1");
        gate.set(&uid, "Secret1", None).await.unwrap();

        assert!(gate.set_active(&uid, false, Some("wrong")).await.is_err());
        let status = gate.set_active(&uid, false, Some("Secret1")).await.unwrap();
        assert!(!status.active);
        gate.validate(&uid, None).await.unwrap();
    }
}
